//! Dispatch: handler abstractions, handler resolution, and the engine.
//!
//! ## Contents
//! - [`EventHandler`] type-erased handler invoked by the engine
//! - [`Handles`] typed handler trait, with [`TypedHandler`] / [`HandlerFn`]
//!   adapters
//! - [`HandlerFactory`] injected resolution seam, [`HandlerMap`] built-in
//!   map-backed factory
//! - [`DispatchEngine`] inbound message → ordered handler invocations
//!
//! ## Quick wiring
//! ```text
//! Transport delivery ──► DispatchEngine::process_event(name, payload)
//!                              ├─► SubscriptionRegistry (bindings, decoder)
//!                              └─► HandlerFactory::resolve(kind)
//!                                       └─► EventHandler::handle(decoded)
//! ```

mod engine;
mod factory;
mod handler;

pub use engine::DispatchEngine;
pub use factory::{HandlerFactory, HandlerMap};
pub use handler::{EventHandler, HandlerFn, HandlerRef, Handles, TypedHandler};
