//! Transports: the broker contract and the in-process implementation.
//!
//! ## Contents
//! - [`Transport`] the wire-level contract consumed by the bus core
//! - [`Consume`], [`Delivery`], [`AckHandle`] the inbound delivery seam
//! - [`InMemoryTransport`] in-process broker for tests, demos, and
//!   single-process deployments
//!
//! Adapters for real brokers implement [`Transport`] (and usually
//! [`Connect`](crate::resilience::Connect) for their persistent connection)
//! in their own crates; the core never names a broker technology.

mod in_memory;
mod transport;

pub use in_memory::InMemoryTransport;
pub use transport::{AckHandle, Consume, ConsumerRef, Delivery, Transport};
