//! Bus core: orchestration over one broker transport.
//!
//! This module contains the embedded orchestrator of the crate. The public
//! API from this module is [`EventBus`] (publish/subscribe/unsubscribe/close)
//! and [`create_bus`] (transport selection from configuration).
//!
//! Internal modules:
//! - [`bus`]: the orchestrator — naming, encoding, retries, subscription
//!   lifecycle, teardown draining;
//! - [`consumer`]: glue between transport deliveries and the dispatch engine;
//! - [`factory`]: built-in transport selection per broker kind.

mod bus;
mod consumer;
mod factory;

pub use bus::EventBus;
pub use factory::create_bus;
