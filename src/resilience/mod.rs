//! Connection resilience: state machine, retry schedule, self-healing.
//!
//! ## Contents
//! - [`ConnectionState`] lifecycle states (`Disposed` is terminal)
//! - [`BackoffPolicy`] bounded, jitter-free exponential retry schedule
//! - [`Connect`] the adapter-side connect seam, [`FaultKind`]/[`FaultSignals`]
//!   asynchronous fault notifications
//! - [`ResilientConnection`] retries, short-circuits, self-heals, disposes
//!
//! ## Quick wiring
//! ```text
//! BrokerAdapter ──► ResilientConnection::try_connect() before any network op
//!                        └─► Connect::connect() up to retry_count times,
//!                            2^k-second delays between failures
//! live connection ──► FaultSignals ──► listener ──► try_connect()  (self-heal)
//! ```

mod backoff;
mod connection;
mod state;

pub use backoff::BackoffPolicy;
pub use connection::{Connect, FaultKind, FaultSignals, ResilientConnection};
pub use state::ConnectionState;
