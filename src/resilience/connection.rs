//! # Resilient broker connection: retry, self-heal, dispose.
//!
//! [`ResilientConnection`] keeps one stateful broker connection alive for
//! adapters that require a persistent connection. It owns the
//! [`ConnectionState`] machine, retries the underlying connect operation
//! under the bounded backoff schedule, and re-connects when the live
//! connection reports an asynchronous fault.
//!
//! ## Architecture
//! ```text
//! try_connect()                         fault listener (one per live conn)
//!   │ (single caller at a time)            │
//!   ├─ Disposed?  → false                  │  select {
//!   ├─ Connected? → true  ◄────────────────┤    disposed  → exit
//!   ├─ state = Connecting                  │    fault     → state = Disconnected
//!   ├─ loop ≤ retry_count:                 │                try_connect()  (best effort)
//!   │    connector.connect()               │                exit
//!   │      ├─ Ok  → state = Connected      │  }
//!   │      │        spawn fault listener ──┘
//!   │      │        true
//!   │      └─ Err → sleep(2^k), retry
//!   └─ exhausted → state = Disconnected, false
//! ```
//!
//! ## Rules
//! - `try_connect` is a critical section; concurrent callers queue on one
//!   async mutex. A fault-triggered reconnect that loses the race is absorbed
//!   by the `Connected` short-circuit once the winner finishes.
//! - `Disposed` is terminal. Every state write goes through a
//!   compare-and-swap loop that refuses to overwrite `Disposed`.
//! - A fault listener handles exactly one fault, then exits; a successful
//!   reconnect spawns a fresh listener for the new connection.
//! - With the connection dead and no retry in flight, the state stays
//!   `Disconnected` until the next explicit `try_connect`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;
use crate::resilience::backoff::BackoffPolicy;
use crate::resilience::state::ConnectionState;

/// Asynchronous fault signal raised by a live broker connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultKind {
    /// The connection was shut down by the broker or the network.
    Shutdown,
    /// The broker blocked the connection (e.g. resource pressure).
    Blocked,
    /// A connection-level callback raised an exception.
    CallbackException,
}

impl FaultKind {
    /// Returns a short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            FaultKind::Shutdown => "shutdown",
            FaultKind::Blocked => "blocked",
            FaultKind::CallbackException => "callback_exception",
        }
    }
}

/// Receiver for fault signals of one live connection.
///
/// The sender side is owned by the adapter's connection handle; dropping the
/// handle closes the channel, which the listener treats as a shutdown fault.
pub type FaultSignals = mpsc::Receiver<FaultKind>;

/// # Wire-level connect operation, provided by the broker adapter.
///
/// One `Connect` implementation is owned by exactly one
/// [`ResilientConnection`]; it is never shared across adapters.
#[async_trait]
pub trait Connect: Send + Sync + 'static {
    /// Attempts to open the underlying connection.
    ///
    /// On success, returns the fault-signal receiver for the new connection.
    async fn connect(&self) -> Result<FaultSignals, TransportError>;

    /// Releases the underlying connection handle.
    ///
    /// Called once from `dispose`; must tolerate being called with no live
    /// connection.
    async fn close(&self);
}

/// Keeps a stateful broker connection alive across transient failures.
pub struct ResilientConnection {
    connector: Arc<dyn Connect>,
    retry_count: u32,
    backoff: BackoffPolicy,
    state: AtomicU8,
    /// Serializes `try_connect` callers.
    connect_gate: Mutex<()>,
    /// Cancelled on dispose; stops fault listeners.
    disposed: CancellationToken,
}

impl ResilientConnection {
    /// Creates a new resilient connection around `connector`.
    ///
    /// `retry_count` is the number of connect attempts per `try_connect` call
    /// (`0` means a call fails immediately without touching the wire).
    pub fn new(
        connector: Arc<dyn Connect>,
        retry_count: u32,
        backoff: BackoffPolicy,
    ) -> Arc<Self> {
        Arc::new(Self {
            connector,
            retry_count,
            backoff,
            state: AtomicU8::new(ConnectionState::Disconnected as u8),
            connect_gate: Mutex::new(()),
            disposed: CancellationToken::new(),
        })
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Returns whether the connection is currently established.
    ///
    /// A pure read of `state == Connected`; never touches the wire.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Attempts to establish the connection.
    ///
    /// Only one caller runs at a time. Returns immediately with `false` when
    /// disposed and with `true` when already connected (so racing
    /// fault-triggered reconnects collapse into one attempt). Otherwise makes
    /// up to `retry_count` attempts, sleeping `backoff.next(k - 1)` after
    /// failed attempt `k`; on exhaustion the state returns to
    /// `Disconnected` and the call reports `false`.
    pub async fn try_connect(self: &Arc<Self>) -> bool {
        let _gate = self.connect_gate.lock().await;

        match self.state() {
            ConnectionState::Disposed => return false,
            ConnectionState::Connected => return true,
            _ => {}
        }
        if !self.transition(ConnectionState::Connecting) {
            return false;
        }

        for attempt in 1..=self.retry_count {
            if self.state() == ConnectionState::Disposed {
                return false;
            }

            match self.connector.connect().await {
                Ok(faults) => {
                    if !self.transition(ConnectionState::Connected) {
                        // Disposed mid-attempt; drop the fresh connection.
                        self.connector.close().await;
                        return false;
                    }
                    self.spawn_fault_listener(faults);
                    log::debug!("broker connection established (attempt {attempt})");
                    return true;
                }
                Err(e) => {
                    log::warn!(
                        "connect attempt {attempt}/{} failed: {e}",
                        self.retry_count
                    );
                    if attempt < self.retry_count {
                        let delay = self.backoff.next(attempt - 1);
                        tokio::select! {
                            _ = time::sleep(delay) => {}
                            _ = self.disposed.cancelled() => return false,
                        }
                    }
                }
            }
        }

        self.transition(ConnectionState::Disconnected);
        log::warn!(
            "broker unavailable after {} connect attempts",
            self.retry_count
        );
        false
    }

    /// Disposes the connection.
    ///
    /// Transitions to `Disposed` unconditionally (terminal), stops fault
    /// listeners, and releases the underlying handle. Idempotent — a second
    /// call has no additional effect.
    pub async fn dispose(&self) {
        let prev = self
            .state
            .swap(ConnectionState::Disposed as u8, Ordering::SeqCst);
        if ConnectionState::from_u8(prev) == ConnectionState::Disposed {
            return;
        }
        self.disposed.cancel();
        self.connector.close().await;
    }

    /// Spawns the single-shot fault listener for a freshly established
    /// connection.
    fn spawn_fault_listener(self: &Arc<Self>, mut faults: FaultSignals) {
        let me = Arc::clone(self);
        let disposed = self.disposed.clone();

        tokio::spawn(async move {
            let fault = tokio::select! {
                _ = disposed.cancelled() => return,
                fault = faults.recv() => fault,
            };

            if me.state() == ConnectionState::Disposed {
                return;
            }

            // A closed channel means the connection handle is gone; treat it
            // like a shutdown signal.
            let kind = fault.unwrap_or(FaultKind::Shutdown);
            log::warn!("connection fault ({}); reconnecting", kind.as_label());

            // The faulted connection is no longer healthy; without this the
            // Connected short-circuit would absorb our own reconnect.
            me.transition(ConnectionState::Disconnected);
            let _ = me.try_connect().await;
        });
    }

    /// Moves to `next` unless the state is already `Disposed`.
    ///
    /// Returns whether the transition happened; `Disposed` is never
    /// overwritten.
    fn transition(&self, next: ConnectionState) -> bool {
        let mut current = self.state.load(Ordering::SeqCst);
        loop {
            if ConnectionState::from_u8(current) == ConnectionState::Disposed {
                return false;
            }
            match self.state.compare_exchange(
                current,
                next as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    use super::*;

    /// Connector whose attempts follow a script of failures and successes.
    struct ScriptedConnector {
        /// Outcomes for upcoming attempts; exhausted script means success.
        script: std::sync::Mutex<VecDeque<bool>>,
        attempts: AtomicU32,
        /// Sender half of the last successful connection's fault channel.
        fault_tx: std::sync::Mutex<Option<mpsc::Sender<FaultKind>>>,
    }

    impl ScriptedConnector {
        fn new(script: impl IntoIterator<Item = bool>) -> Arc<Self> {
            Arc::new(Self {
                script: std::sync::Mutex::new(script.into_iter().collect()),
                attempts: AtomicU32::new(0),
                fault_tx: std::sync::Mutex::new(None),
            })
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }

        async fn fire_fault(&self, kind: FaultKind) {
            let tx = self.fault_tx.lock().unwrap().clone();
            if let Some(tx) = tx {
                let _ = tx.send(kind).await;
            }
        }
    }

    #[async_trait]
    impl Connect for ScriptedConnector {
        async fn connect(&self) -> Result<FaultSignals, TransportError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let ok = self.script.lock().unwrap().pop_front().unwrap_or(true);
            if ok {
                let (tx, rx) = mpsc::channel(4);
                *self.fault_tx.lock().unwrap() = Some(tx);
                Ok(rx)
            } else {
                Err(TransportError::SendFailed {
                    reason: "connection refused".into(),
                    retryable: true,
                })
            }
        }

        async fn close(&self) {}
    }

    fn fast_backoff() -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(1),
            max: Duration::from_millis(8),
            factor: 2.0,
        }
    }

    async fn wait_until(deadline: Duration, mut check: impl FnMut() -> bool) -> bool {
        let start = time::Instant::now();
        while start.elapsed() < deadline {
            if check() {
                return true;
            }
            time::sleep(Duration::from_millis(5)).await;
        }
        check()
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let connector = ScriptedConnector::new([false, false, true]);
        let conn = ResilientConnection::new(connector.clone(), 3, fast_backoff());

        assert!(conn.try_connect().await);
        assert_eq!(connector.attempts(), 3, "connect must be invoked 3 times");
        assert!(conn.is_connected());
        assert_eq!(conn.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_to_disconnected() {
        let connector = ScriptedConnector::new([false, false, false]);
        let conn = ResilientConnection::new(connector.clone(), 3, fast_backoff());

        assert!(!conn.try_connect().await);
        assert_eq!(connector.attempts(), 3);
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(!conn.is_connected());
    }

    #[tokio::test]
    async fn test_zero_retry_count_fails_without_touching_the_wire() {
        let connector = ScriptedConnector::new([]);
        let conn = ResilientConnection::new(connector.clone(), 0, fast_backoff());

        assert!(!conn.try_connect().await);
        assert_eq!(connector.attempts(), 0);
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connected_short_circuit_skips_new_attempts() {
        let connector = ScriptedConnector::new([true]);
        let conn = ResilientConnection::new(connector.clone(), 3, fast_backoff());

        assert!(conn.try_connect().await);
        assert_eq!(connector.attempts(), 1);

        // Second call must not open a second connection.
        assert!(conn.try_connect().await);
        assert_eq!(connector.attempts(), 1);
    }

    #[tokio::test]
    async fn test_fault_triggers_self_heal() {
        let connector = ScriptedConnector::new([true, true]);
        let conn = ResilientConnection::new(connector.clone(), 3, fast_backoff());

        assert!(conn.try_connect().await);
        assert_eq!(connector.attempts(), 1);

        connector.fire_fault(FaultKind::Shutdown).await;

        let healed = wait_until(Duration::from_secs(2), || {
            connector.attempts() == 2 && conn.is_connected()
        })
        .await;
        assert!(healed, "fault signal must trigger exactly one reconnect");
    }

    #[tokio::test]
    async fn test_disposed_connection_ignores_faults() {
        let connector = ScriptedConnector::new([true]);
        let conn = ResilientConnection::new(connector.clone(), 3, fast_backoff());

        assert!(conn.try_connect().await);
        conn.dispose().await;
        assert_eq!(conn.state(), ConnectionState::Disposed);

        connector.fire_fault(FaultKind::CallbackException).await;
        time::sleep(Duration::from_millis(50)).await;

        assert_eq!(
            connector.attempts(),
            1,
            "no reconnect may happen after dispose"
        );
    }

    #[tokio::test]
    async fn test_try_connect_after_dispose_is_refused() {
        let connector = ScriptedConnector::new([true]);
        let conn = ResilientConnection::new(connector.clone(), 3, fast_backoff());

        conn.dispose().await;
        assert!(!conn.try_connect().await);
        assert_eq!(connector.attempts(), 0);
    }

    #[tokio::test]
    async fn test_dispose_is_idempotent_and_terminal() {
        let connector = ScriptedConnector::new([true]);
        let conn = ResilientConnection::new(connector.clone(), 3, fast_backoff());

        assert!(conn.try_connect().await);
        conn.dispose().await;
        conn.dispose().await;
        assert_eq!(conn.state(), ConnectionState::Disposed);
        assert!(!conn.is_connected());
    }
}
