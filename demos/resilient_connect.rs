//! # Example: resilient_connect
//!
//! Drives a [`ResilientConnection`] through a flaky connect operation and a
//! runtime fault, showing the bounded retry schedule and the self-healing
//! reconnect.
//!
//! ## Flow
//! ```text
//! try_connect()
//!   attempt 1 ── refused
//!   (2s backoff, shortened here)
//!   attempt 2 ── refused
//!   attempt 3 ── connected
//!
//! ... later: broker shutdown fault ──► listener ──► try_connect() again
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use busbar::{BackoffPolicy, Connect, FaultKind, FaultSignals, ResilientConnection, TransportError};

/// Connect operation that refuses the first two attempts of each round.
struct FlakyBroker {
    attempts: AtomicU32,
    fault_tx: std::sync::Mutex<Option<mpsc::Sender<FaultKind>>>,
}

#[async_trait]
impl Connect for FlakyBroker {
    async fn connect(&self) -> Result<FaultSignals, TransportError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt % 3 != 0 {
            println!("[broker] attempt {attempt}: connection refused");
            return Err(TransportError::SendFailed {
                reason: "connection refused".into(),
                retryable: true,
            });
        }

        println!("[broker] attempt {attempt}: connected");
        let (tx, rx) = mpsc::channel(4);
        *self.fault_tx.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn close(&self) {
        println!("[broker] connection handle released");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let broker = Arc::new(FlakyBroker {
        attempts: AtomicU32::new(0),
        fault_tx: std::sync::Mutex::new(None),
    });

    // Shortened schedule so the demo finishes quickly; the default is 2^k seconds.
    let backoff = BackoffPolicy {
        first: Duration::from_millis(200),
        max: Duration::from_secs(2),
        factor: 2.0,
    };
    let conn = ResilientConnection::new(broker.clone(), 3, backoff);

    assert!(conn.try_connect().await, "third attempt should succeed");
    println!("[demo] state: {}", conn.state().as_label());

    // Simulate a broker-side shutdown; the fault listener reconnects.
    let tx = broker.fault_tx.lock().unwrap().clone().unwrap();
    tx.send(FaultKind::Shutdown).await?;

    while !conn.is_connected() || broker.attempts.load(Ordering::SeqCst) < 6 {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    println!("[demo] self-healed, state: {}", conn.state().as_label());

    conn.dispose().await;
    println!("[demo] disposed, state: {}", conn.state().as_label());
    Ok(())
}
