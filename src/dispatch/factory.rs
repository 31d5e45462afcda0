//! # Handler factory: resolving handler kinds to instances.
//!
//! The dispatch engine never constructs handler instances itself; it asks an
//! injected [`HandlerFactory`] for "a handler capable of kind X". Instance
//! lifetime and scoping are entirely the factory's concern — a factory may
//! hand out one shared instance per kind, build one per dispatch, or bridge
//! into an application's own dependency-injection container.
//!
//! [`HandlerMap`] is the built-in map-backed factory: one shared instance per
//! kind, registered up front. Sufficient for tests, demos, and most
//! single-process applications.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::dispatch::handler::HandlerRef;

/// Resolves a handler kind identifier to a ready-to-invoke handler instance.
pub trait HandlerFactory: Send + Sync {
    /// Returns a handler for `kind`, or `None` when the kind is unknown.
    ///
    /// Called once per handler binding per dispatched message.
    fn resolve(&self, kind: &str) -> Option<HandlerRef>;
}

/// Map-backed handler factory: one shared instance per handler kind.
///
/// # Example
/// ```
/// use busbar::{HandlerFactory, HandlerFn, HandlerMap, IntegrationEvent};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Debug, Serialize, Deserialize)]
/// struct OrderCreated { order_id: u64 }
///
/// impl IntegrationEvent for OrderCreated {
///     const NAME: &'static str = "OrderCreatedIntegrationEvent";
/// }
///
/// let factory = HandlerMap::new();
/// factory.register("order-created-logger", HandlerFn::arc(|e: OrderCreated| async move {
///     println!("order {}", e.order_id);
///     Ok(())
/// }));
///
/// assert!(factory.resolve("order-created-logger").is_some());
/// assert!(factory.resolve("unknown").is_none());
/// ```
#[derive(Default)]
pub struct HandlerMap {
    handlers: RwLock<HashMap<String, HandlerRef>>,
}

impl HandlerMap {
    /// Creates an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the handler instance for `kind`.
    pub fn register(&self, kind: impl Into<String>, handler: HandlerRef) {
        self.handlers
            .write()
            .expect("handler map lock poisoned")
            .insert(kind.into(), handler);
    }
}

impl HandlerFactory for HandlerMap {
    fn resolve(&self, kind: &str) -> Option<HandlerRef> {
        self.handlers
            .read()
            .expect("handler map lock poisoned")
            .get(kind)
            .cloned()
    }
}
