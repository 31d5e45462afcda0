//! Subscription tracking: handler bindings per logical event name.
//!
//! ## Contents
//! - [`HandlerBinding`] one `(event, handler_kind)` association
//! - [`SubscriptionRegistry`] the mutable mapping, guarded by a single mutex
//! - [`RemovalListener`] callback fired when an event loses its last binding
//!
//! ## Quick wiring
//! ```text
//! EventBus::subscribe ──► add_subscription(event, kind, descriptor)
//! EventBus::unsubscribe ─► remove_subscription(event, kind)
//!                              └─ last binding? → removal listeners
//!                                   └─ EventBus tears down routing resources
//! DispatchEngine ────────► handlers_for(event) / descriptor_for(event)
//! ```

mod binding;
mod registry;

pub use binding::HandlerBinding;
pub use registry::{RemovalListener, SubscriptionRegistry};
