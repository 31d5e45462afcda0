//! # EventBus: the transport-agnostic orchestrator.
//!
//! [`EventBus`] wires the pieces together: the subscription registry, the
//! dispatch engine, the name processor, and one [`Transport`]. Producers call
//! [`EventBus::publish`]; consumers register typed handlers via
//! [`EventBus::subscribe`].
//!
//! ## Control flow
//! ```text
//! publish(event)
//!   ├─► NameProcessor (raw type name → logical name)
//!   ├─► encode payload, stamp message-id metadata
//!   ├─► ensure transport connected
//!   └─► Transport::send, retried under the backoff schedule
//!           └─ exhausted → PublishError::Transport(Unavailable)
//!
//! delivery (from broker runtime)
//!   └─► BusConsumer ─► DispatchEngine::process_event ─► true  → acknowledge
//!                                                      false → reject
//! ```
//!
//! ## Rules
//! - One registry per bus; the registry is never shared across instances.
//! - The first subscription for an event name creates routing resources and
//!   starts receiving; removing the last one tears the resources down —
//!   driven synchronously by the registry's removal notification, so
//!   teardown ordering is deterministic.
//! - `publish` may block for the whole retry/backoff schedule; there is no
//!   cancellation or deadline parameter.
//! - `close` is idempotent: stops accepting deliveries, tears down remaining
//!   resources, clears the registry, and closes the transport. In-flight
//!   handler invocations are not interrupted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::time;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::bus::consumer::BusConsumer;
use crate::config::BusConfig;
use crate::dispatch::{DispatchEngine, HandlerFactory};
use crate::error::{PublishError, SubscribeError, TransportError};
use crate::events::{EventDescriptor, IntegrationEvent, NameProcessor, encode_event};
use crate::registry::SubscriptionRegistry;
use crate::transport::{ConsumerRef, Transport};

/// Publish/subscribe front door over one broker transport.
pub struct EventBus {
    cfg: BusConfig,
    registry: Arc<SubscriptionRegistry>,
    transport: Arc<dyn Transport>,
    consumer: ConsumerRef,
    names: NameProcessor,
    /// Event names emptied by the registry, awaiting resource teardown.
    pending_teardowns: Arc<Mutex<Vec<String>>>,
    /// Cancelled on close; the consumer stops accepting deliveries.
    gate: CancellationToken,
    closed: AtomicBool,
}

impl EventBus {
    /// Creates a bus over an explicit transport.
    ///
    /// `factory` resolves handler kind identifiers to handler instances; the
    /// bus never constructs handlers itself.
    pub fn new(
        cfg: BusConfig,
        transport: Arc<dyn Transport>,
        factory: Arc<dyn HandlerFactory>,
    ) -> Arc<Self> {
        let names = NameProcessor::new(
            cfg.event_name_prefix.clone(),
            cfg.event_name_suffix.clone(),
        );
        let registry = Arc::new(SubscriptionRegistry::new());
        let engine = Arc::new(DispatchEngine::new(
            Arc::clone(&registry),
            factory,
            names.clone(),
        ));

        // The removal notification only records the emptied name; the actual
        // (async) teardown runs in the unsubscribe/close call that caused it.
        let pending_teardowns = Arc::new(Mutex::new(Vec::new()));
        let pending = Arc::clone(&pending_teardowns);
        registry.on_event_removed(Box::new(move |event| {
            pending
                .lock()
                .expect("teardown queue lock poisoned")
                .push(event.to_string());
        }));

        let gate = CancellationToken::new();
        let consumer: ConsumerRef =
            BusConsumer::new(engine, Arc::clone(&transport), gate.clone());

        Arc::new(Self {
            cfg,
            registry,
            transport,
            consumer,
            names,
            pending_teardowns,
            gate,
            closed: AtomicBool::new(false),
        })
    }

    /// Publishes one integration event.
    ///
    /// The raw type name is normalized to the logical routing name, the
    /// payload encoded, and the send retried under the configured backoff
    /// schedule for retryable transport failures. Exhausting `retry_count`
    /// attempts surfaces [`TransportError::Unavailable`].
    ///
    /// Blocks the caller for the duration of the schedule in the worst case.
    pub async fn publish<E: IntegrationEvent>(&self, event: &E) -> Result<(), PublishError> {
        self.ensure_usable().map_err(PublishError::Transport)?;
        let logical = self.names.process(E::NAME).to_string();

        let payload = encode_event(event).map_err(|reason| PublishError::Encode {
            event: logical.clone(),
            reason,
        })?;

        self.ensure_connected()
            .await
            .map_err(PublishError::Transport)?;

        let mut metadata = HashMap::new();
        metadata.insert("message-id".to_string(), Uuid::new_v4().to_string());
        metadata.insert("event-name".to_string(), logical.clone());

        self.send_with_retry(&logical, &payload, &metadata)
            .await
            .map_err(PublishError::Transport)
    }

    /// Subscribes a handler kind to an event type.
    ///
    /// The first binding for a logical event name idempotently creates the
    /// routing resources and starts receiving; every binding records the
    /// `(event, handler_kind)` pair in the registry. Handler instances are
    /// resolved per dispatch through the injected factory.
    pub async fn subscribe<E: IntegrationEvent>(
        &self,
        handler_kind: &str,
    ) -> Result<(), SubscribeError> {
        self.ensure_usable().map_err(SubscribeError::Transport)?;
        let logical = self.names.process(E::NAME).to_string();

        let first = !self.registry.has_subscriptions_for(&logical);
        if first {
            self.ensure_connected()
                .await
                .map_err(SubscribeError::Transport)?;
            self.transport
                .ensure_subscription_resources(&logical)
                .await?;
        }

        self.registry
            .add_subscription(&logical, handler_kind, EventDescriptor::of::<E>())?;

        if first {
            log::debug!("subscribing to '{logical}' with handler '{handler_kind}'");
            self.transport
                .start_receiving(&logical, Arc::clone(&self.consumer))
                .await?;
        }
        Ok(())
    }

    /// Removes the subscription of a handler kind from an event type.
    ///
    /// Removing the last binding for an event name tears down its routing
    /// resources before this call returns. A missing binding is an explicit
    /// [`SubscribeError::NotFound`].
    pub async fn unsubscribe<E: IntegrationEvent>(
        &self,
        handler_kind: &str,
    ) -> Result<(), SubscribeError> {
        let logical = self.names.process(E::NAME).to_string();
        self.registry.remove_subscription(&logical, handler_kind)?;
        self.drain_teardowns().await;
        Ok(())
    }

    /// Returns whether any handler kind is subscribed to the event type.
    pub fn is_subscribed<E: IntegrationEvent>(&self) -> bool {
        let logical = self.names.process(E::NAME);
        self.registry.has_subscriptions_for(logical)
    }

    /// Closes the bus.
    ///
    /// Stops accepting deliveries, removes every subscription (tearing down
    /// the routing resources), and closes the transport. Idempotent.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.gate.cancel();
        self.registry.clear();
        self.drain_teardowns().await;
        self.transport.close().await;
    }

    fn ensure_usable(&self) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(TransportError::Closed)
        } else {
            Ok(())
        }
    }

    async fn ensure_connected(&self) -> Result<(), TransportError> {
        if self.transport.is_connected() {
            return Ok(());
        }
        self.transport.connect().await
    }

    /// Sends under the bounded retry schedule.
    ///
    /// Retryable failures sleep `backoff.next(k - 1)` after failed attempt
    /// `k` and try to restore the connection before the next attempt;
    /// non-retryable failures propagate immediately.
    async fn send_with_retry(
        &self,
        logical: &str,
        payload: &[u8],
        metadata: &HashMap<String, String>,
    ) -> Result<(), TransportError> {
        let attempts = self.cfg.retry_count;

        for attempt in 1..=attempts {
            match self.transport.send(logical, payload, metadata).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() => {
                    log::warn!("send attempt {attempt}/{attempts} for '{logical}' failed: {e}");
                    if attempt < attempts {
                        time::sleep(self.cfg.backoff.next(attempt - 1)).await;
                        if !self.transport.is_connected() {
                            let _ = self.transport.connect().await;
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Err(TransportError::Unavailable { attempts })
    }

    /// Tears down resources for every event name the registry emptied.
    ///
    /// Teardown failures are logged and skipped; the broker keeps orphaned
    /// resources, which re-subscribing reuses idempotently.
    async fn drain_teardowns(&self) {
        let pending: Vec<String> = {
            let mut queue = self
                .pending_teardowns
                .lock()
                .expect("teardown queue lock poisoned");
            queue.drain(..).collect()
        };

        for name in pending {
            log::debug!("tearing down subscription resources for '{name}'");
            if let Err(e) = self.transport.teardown_subscription_resources(&name).await {
                log::warn!("teardown for '{name}' failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU64;

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::dispatch::{HandlerFn, HandlerMap};
    use crate::error::HandlerError;
    use crate::transport::InMemoryTransport;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct OrderCreated {
        order_id: u64,
    }

    impl IntegrationEvent for OrderCreated {
        const NAME: &'static str = "OrderCreatedIntegrationEvent";
    }

    fn harness() -> (Arc<EventBus>, Arc<InMemoryTransport>, Arc<HandlerMap>) {
        let cfg = BusConfig {
            retry_count: 3,
            backoff: crate::resilience::BackoffPolicy {
                first: std::time::Duration::from_millis(1),
                max: std::time::Duration::from_millis(4),
                factor: 2.0,
            },
            ..BusConfig::default()
        };
        let transport = Arc::new(InMemoryTransport::new());
        let factory = Arc::new(HandlerMap::new());
        let bus = EventBus::new(
            cfg,
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&factory) as Arc<dyn HandlerFactory>,
        );
        (bus, transport, factory)
    }

    #[tokio::test]
    async fn test_end_to_end_roundtrip() {
        let (bus, transport, factory) = harness();

        let seen = Arc::new(AtomicU64::new(0));
        let calls = Arc::new(AtomicU64::new(0));
        let seen_in = Arc::clone(&seen);
        let calls_in = Arc::clone(&calls);
        factory.register(
            "order-recorder",
            HandlerFn::arc(move |event: OrderCreated| {
                let seen = Arc::clone(&seen_in);
                let calls = Arc::clone(&calls_in);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    seen.store(event.order_id, Ordering::SeqCst);
                    Ok(())
                }
            }),
        );

        bus.subscribe::<OrderCreated>("order-recorder").await.unwrap();
        assert!(bus.is_subscribed::<OrderCreated>());
        assert!(transport.has_resource("OrderCreated"));

        bus.publish(&OrderCreated { order_id: 42 }).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1, "exactly one handle call");
        assert_eq!(seen.load(Ordering::SeqCst), 42);
        assert_eq!(transport.acknowledged().len(), 1);
        assert!(transport.rejected_tags().is_empty());
    }

    #[tokio::test]
    async fn test_failing_handler_rejects_but_others_run() {
        let (bus, transport, factory) = harness();

        let survivor_calls = Arc::new(AtomicU64::new(0));
        let calls_in = Arc::clone(&survivor_calls);
        factory.register(
            "faulty",
            HandlerFn::arc(|_event: OrderCreated| async move {
                Err(HandlerError::fail("downstream unavailable"))
            }),
        );
        factory.register(
            "survivor",
            HandlerFn::arc(move |_event: OrderCreated| {
                let calls = Arc::clone(&calls_in);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
        );

        bus.subscribe::<OrderCreated>("faulty").await.unwrap();
        bus.subscribe::<OrderCreated>("survivor").await.unwrap();

        bus.publish(&OrderCreated { order_id: 1 }).await.unwrap();

        assert_eq!(survivor_calls.load(Ordering::SeqCst), 1);
        assert!(transport.acknowledged().is_empty());
        assert_eq!(transport.rejected_tags().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_subscription_fails() {
        let (bus, _transport, factory) = harness();
        factory.register(
            "recorder",
            HandlerFn::arc(|_event: OrderCreated| async move { Ok(()) }),
        );

        bus.subscribe::<OrderCreated>("recorder").await.unwrap();
        let err = bus
            .subscribe::<OrderCreated>("recorder")
            .await
            .expect_err("same (event, handler) pair twice must fail");
        assert!(matches!(err, SubscribeError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_unsubscribing_last_handler_tears_down_resources() {
        let (bus, transport, factory) = harness();
        factory.register(
            "recorder",
            HandlerFn::arc(|_event: OrderCreated| async move { Ok(()) }),
        );

        bus.subscribe::<OrderCreated>("recorder").await.unwrap();
        assert!(transport.has_resource("OrderCreated"));

        bus.unsubscribe::<OrderCreated>("recorder").await.unwrap();
        assert!(!bus.is_subscribed::<OrderCreated>());
        assert!(
            !transport.has_resource("OrderCreated"),
            "resources must be torn down with the last binding"
        );

        // Events published now are dropped by the broker, not errors.
        bus.publish(&OrderCreated { order_id: 5 }).await.unwrap();
        assert_eq!(transport.unrouted(), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_missing_binding_is_not_found() {
        let (bus, _transport, _factory) = harness();
        let err = bus
            .unsubscribe::<OrderCreated>("ghost")
            .await
            .expect_err("unsubscribing an absent binding must fail");
        assert!(matches!(err, SubscribeError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_stops_the_bus() {
        let (bus, transport, factory) = harness();
        factory.register(
            "recorder",
            HandlerFn::arc(|_event: OrderCreated| async move { Ok(()) }),
        );
        bus.subscribe::<OrderCreated>("recorder").await.unwrap();

        bus.close().await;
        bus.close().await;

        assert!(!transport.has_resource("OrderCreated"));
        let err = bus
            .publish(&OrderCreated { order_id: 9 })
            .await
            .expect_err("publishing on a closed bus must fail");
        assert!(matches!(
            err,
            PublishError::Transport(TransportError::Closed)
        ));

        let err = bus
            .subscribe::<OrderCreated>("late")
            .await
            .expect_err("subscribing on a closed bus must fail");
        assert!(matches!(
            err,
            SubscribeError::Transport(TransportError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_publish_connects_lazily() {
        let (bus, transport, _factory) = harness();
        assert!(!transport.is_connected());

        bus.publish(&OrderCreated { order_id: 3 }).await.unwrap();
        assert!(transport.is_connected(), "publish must establish the connection");
    }
}
