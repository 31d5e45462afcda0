//! # Dispatch engine: inbound message → handler invocations.
//!
//! [`DispatchEngine::process_event`] turns one raw inbound message into a
//! sequence of handler invocations with defined ordering and failure
//! containment, and reports a boolean the transport uses for its
//! acknowledge/reject decision.
//!
//! ## Flow
//! ```text
//! process_event(name, payload)
//!   ├─► NameProcessor::process(name)          (receive-side normalization)
//!   ├─► registry.handlers_for(logical)
//!   │       └─ empty → warn unknown event → false
//!   ├─► registry.descriptor_for(logical).decode(payload)
//!   │       └─ error → error non-retryable decode → false
//!   └─► for each binding, in registration order:
//!           factory.resolve(kind) ─► handler.handle(decoded).await
//!               └─ error/panic → log, keep going with remaining handlers
//! ```
//!
//! ## Rules
//! - Handlers for one message run **sequentially, in registration order**;
//!   one inbound message fans out to all its handlers as one unit of work.
//! - The payload is decoded **once**; handlers share the decoded value.
//! - A failing handler never aborts the remaining ones (fixed policy); it
//!   only forces the overall result to `false`.
//! - Handler panics are caught and contained the same way as errors.
//! - Returns `true` iff decoding succeeded and every handler succeeded.

use std::sync::Arc;

use futures::FutureExt;

use crate::dispatch::factory::HandlerFactory;
use crate::error::DispatchError;
use crate::events::NameProcessor;
use crate::registry::SubscriptionRegistry;

/// Consumes inbound messages and fans them out to registered handlers.
pub struct DispatchEngine {
    registry: Arc<SubscriptionRegistry>,
    factory: Arc<dyn HandlerFactory>,
    names: NameProcessor,
}

impl DispatchEngine {
    /// Creates an engine over the given registry, handler factory, and name
    /// processor.
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        factory: Arc<dyn HandlerFactory>,
        names: NameProcessor,
    ) -> Self {
        Self {
            registry,
            factory,
            names,
        }
    }

    /// Processes one inbound message.
    ///
    /// `event_name` is the routing key as delivered by the transport; it is
    /// normalized with the same prefix/suffix rules the publish side uses, so
    /// raw and already-logical names both resolve.
    ///
    /// Returns `true` only if the payload decoded and **every** bound handler
    /// completed without error; the caller uses this to acknowledge or reject
    /// the underlying delivery. An unmatched event name or an undecodable
    /// payload is reported (`false`), never an engine crash.
    pub async fn process_event(&self, event_name: &str, payload: &[u8]) -> bool {
        let logical = self.names.process(event_name);

        let bindings = self.registry.handlers_for(logical);
        if bindings.is_empty() {
            let err = DispatchError::UnknownEvent {
                event: logical.to_string(),
            };
            log::warn!("[{}] {err}", err.as_label());
            return false;
        }

        // The descriptor lives and dies with the bindings entry, but a
        // concurrent unsubscribe can empty it between the two lookups.
        let Some(descriptor) = self.registry.descriptor_for(logical) else {
            let err = DispatchError::UnknownEvent {
                event: logical.to_string(),
            };
            log::warn!("[{}] {err}", err.as_label());
            return false;
        };

        let decoded = match descriptor.decode(payload) {
            Ok(decoded) => decoded,
            Err(reason) => {
                let err = DispatchError::Decode {
                    event: logical.to_string(),
                    reason,
                };
                log::error!("[{}] {err}", err.as_label());
                return false;
            }
        };

        let mut all_ok = true;
        for binding in &bindings {
            let kind = binding.handler_kind();

            let Some(handler) = self.factory.resolve(kind) else {
                let err = DispatchError::HandlerFailed {
                    event: logical.to_string(),
                    handler: kind.to_string(),
                    reason: "handler kind not resolvable".to_string(),
                };
                log::error!("[{}] {err}", err.as_label());
                all_ok = false;
                continue;
            };

            let outcome = std::panic::AssertUnwindSafe(handler.handle(Arc::clone(&decoded)))
                .catch_unwind()
                .await;

            let reason = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e.to_string(),
                Err(panic) => panic_message(panic),
            };

            let err = DispatchError::HandlerFailed {
                event: logical.to_string(),
                handler: kind.to_string(),
                reason,
            };
            log::error!("[{}] {err}", err.as_label());
            all_ok = false;
        }

        all_ok
    }
}

/// Extracts a readable message from a caught panic payload.
fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {msg}")
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("handler panicked: {msg}")
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::dispatch::factory::HandlerMap;
    use crate::dispatch::handler::EventHandler;
    use crate::error::HandlerError;
    use crate::events::{DecodedEvent, EventDescriptor, IntegrationEvent, encode_event};

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct OrderCreated {
        order_id: u64,
    }

    impl IntegrationEvent for OrderCreated {
        const NAME: &'static str = "OrderCreatedIntegrationEvent";
    }

    /// Records invocation order; optionally fails.
    struct Probe {
        name: &'static str,
        fail: bool,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl EventHandler for Probe {
        async fn handle(&self, _event: DecodedEvent) -> Result<(), HandlerError> {
            self.calls.lock().unwrap().push(self.name);
            if self.fail {
                Err(HandlerError::fail("boom"))
            } else {
                Ok(())
            }
        }
    }

    struct Panicker;

    #[async_trait]
    impl EventHandler for Panicker {
        async fn handle(&self, _event: DecodedEvent) -> Result<(), HandlerError> {
            panic!("handler exploded");
        }
    }

    fn engine_with(
        probes: Vec<(&'static str, bool)>,
        calls: &Arc<Mutex<Vec<&'static str>>>,
    ) -> DispatchEngine {
        let registry = Arc::new(SubscriptionRegistry::new());
        let factory = Arc::new(HandlerMap::new());

        for (name, fail) in probes {
            registry
                .add_subscription("OrderCreated", name, EventDescriptor::of::<OrderCreated>())
                .unwrap();
            factory.register(
                name,
                Arc::new(Probe {
                    name,
                    fail,
                    calls: Arc::clone(calls),
                }),
            );
        }

        DispatchEngine::new(registry, factory, NameProcessor::new("", "IntegrationEvent"))
    }

    fn payload() -> Vec<u8> {
        encode_event(&OrderCreated { order_id: 42 }).unwrap()
    }

    #[tokio::test]
    async fn test_two_handlers_invoked_once_each_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let engine = engine_with(vec![("first", false), ("second", false)], &calls);

        let ok = engine
            .process_event("OrderCreatedIntegrationEvent", &payload())
            .await;

        assert!(ok);
        assert_eq!(calls.lock().unwrap().as_slice(), ["first", "second"]);
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_stop_the_next_one() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let engine = engine_with(vec![("first", true), ("second", false)], &calls);

        let ok = engine
            .process_event("OrderCreatedIntegrationEvent", &payload())
            .await;

        assert!(!ok, "any handler failure must fail the delivery");
        assert_eq!(
            calls.lock().unwrap().as_slice(),
            ["first", "second"],
            "second handler must still run after the first fails"
        );
    }

    #[tokio::test]
    async fn test_unknown_event_is_reported_not_crashed() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let engine = engine_with(vec![], &calls);

        let ok = engine
            .process_event("NobodyListensIntegrationEvent", b"{}")
            .await;
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_undecodable_payload_skips_handlers() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let engine = engine_with(vec![("first", false)], &calls);

        let ok = engine
            .process_event("OrderCreatedIntegrationEvent", b"not json at all")
            .await;

        assert!(!ok);
        assert!(
            calls.lock().unwrap().is_empty(),
            "handlers must not run when decoding fails"
        );
    }

    #[tokio::test]
    async fn test_receive_side_normalization_matches_logical_names() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let engine = engine_with(vec![("first", false)], &calls);

        // Already-logical routing keys resolve the same subscription.
        let ok = engine.process_event("OrderCreated", &payload()).await;
        assert!(ok);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unresolvable_handler_kind_fails_delivery() {
        let calls = Arc::new(Mutex::new(Vec::<&'static str>::new()));
        let registry = Arc::new(SubscriptionRegistry::new());
        registry
            .add_subscription(
                "OrderCreated",
                "ghost",
                EventDescriptor::of::<OrderCreated>(),
            )
            .unwrap();
        let engine = DispatchEngine::new(
            registry,
            Arc::new(HandlerMap::new()),
            NameProcessor::new("", "IntegrationEvent"),
        );

        let ok = engine
            .process_event("OrderCreatedIntegrationEvent", &payload())
            .await;
        assert!(!ok);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_panicking_handler_is_contained() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let factory = Arc::new(HandlerMap::new());
        let calls = Arc::new(Mutex::new(Vec::new()));

        registry
            .add_subscription(
                "OrderCreated",
                "panicker",
                EventDescriptor::of::<OrderCreated>(),
            )
            .unwrap();
        registry
            .add_subscription(
                "OrderCreated",
                "survivor",
                EventDescriptor::of::<OrderCreated>(),
            )
            .unwrap();

        factory.register("panicker", Arc::new(Panicker));
        factory.register(
            "survivor",
            Arc::new(Probe {
                name: "survivor",
                fail: false,
                calls: Arc::clone(&calls),
            }),
        );

        let engine = DispatchEngine::new(
            registry,
            factory,
            NameProcessor::new("", "IntegrationEvent"),
        );

        let ok = engine
            .process_event("OrderCreatedIntegrationEvent", &payload())
            .await;

        assert!(!ok);
        assert_eq!(
            calls.lock().unwrap().as_slice(),
            ["survivor"],
            "handler after the panicking one must still run"
        );
    }
}
