//! # busbar
//!
//! **Busbar** is a transport-agnostic publish/subscribe event bus for Rust.
//!
//! Producers publish named integration events, consumers register typed
//! handlers against logical event names, and a pluggable broker transport
//! moves the serialized payload between processes. The crate provides the
//! transport-independent core; adapters for concrete brokers implement the
//! [`Transport`] contract in their own crates.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  Producer                            Consumer app (startup)
//!     │ publish(event)                    │ subscribe::<E>(handler_kind)
//!     ▼                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  EventBus (orchestrator)                                          │
//! │  - NameProcessor (raw type name → logical routing name)          │
//! │  - SubscriptionRegistry (event → ordered handler bindings)       │
//! │  - DispatchEngine (decode once, invoke handlers in order)        │
//! │  - send retries under a bounded jitter-free backoff schedule     │
//! └──────────────┬───────────────────────────────────┬────────────────┘
//!                │ Transport::send                   │ deliveries
//!                ▼                                   │
//! ┌───────────────────────────────┐                  │
//! │  Transport (per broker)       │──────────────────┘
//! │  - InMemoryTransport (built-in, in-process)                      │
//! │  - AMQP-style / topic-subscription adapters (external crates)    │
//! │  - ResilientConnection: retry + self-heal on fault signals       │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Receive path
//! ```text
//! broker delivery(routing_key, payload, ack)
//!   └─► BusConsumer
//!         └─► DispatchEngine::process_event
//!               ├─► normalize name (receive side mirrors publish side)
//!               ├─► registry.handlers_for(name)      (empty → warn, false)
//!               ├─► decode payload once              (error → false)
//!               └─► handlers, sequentially, in registration order
//!                     (one failure logs and continues; result → false)
//!         └─► true → Transport::acknowledge, false → Transport::reject
//! ```
//!
//! ## Features
//! | Area              | Description                                                        | Key types / traits                        |
//! |-------------------|--------------------------------------------------------------------|-------------------------------------------|
//! | **Events**        | Plain serde structs as integration events.                         | [`IntegrationEvent`], [`EventDescriptor`] |
//! | **Handlers**      | Typed async handlers, resolved per dispatch through a factory.     | [`Handles`], [`HandlerFactory`]           |
//! | **Registry**      | Concurrent-safe bindings with removal notifications.               | [`SubscriptionRegistry`]                  |
//! | **Dispatch**      | Ordered fan-out with failure containment.                          | [`DispatchEngine`]                        |
//! | **Resilience**    | Bounded exponential retries, self-healing connections.             | [`ResilientConnection`], [`BackoffPolicy`]|
//! | **Transports**    | Broker contract + in-process implementation.                       | [`Transport`], [`InMemoryTransport`]      |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use serde::{Deserialize, Serialize};
//! use busbar::{BusConfig, HandlerFn, HandlerMap, IntegrationEvent, create_bus};
//!
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! struct OrderCreated {
//!     order_id: u64,
//! }
//!
//! impl IntegrationEvent for OrderCreated {
//!     const NAME: &'static str = "OrderCreatedIntegrationEvent";
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handlers = Arc::new(HandlerMap::new());
//!     handlers.register("order-logger", HandlerFn::arc(|event: OrderCreated| async move {
//!         println!("order {} created", event.order_id);
//!         Ok(())
//!     }));
//!
//!     let bus = create_bus(BusConfig::default(), handlers)?;
//!     bus.subscribe::<OrderCreated>("order-logger").await?;
//!     bus.publish(&OrderCreated { order_id: 42 }).await?;
//!     bus.close().await;
//!     Ok(())
//! }
//! ```

mod bus;
mod config;
mod dispatch;
mod error;
mod events;
mod registry;
mod resilience;
mod transport;

// ---- Public re-exports ----

pub use bus::{EventBus, create_bus};
pub use config::{BrokerKind, BusConfig};
pub use dispatch::{
    DispatchEngine, EventHandler, HandlerFactory, HandlerFn, HandlerMap, HandlerRef, Handles,
    TypedHandler,
};
pub use error::{DispatchError, HandlerError, PublishError, SubscribeError, TransportError};
pub use events::{DecodedEvent, EventDescriptor, IntegrationEvent, NameProcessor, encode_event};
pub use registry::{HandlerBinding, RemovalListener, SubscriptionRegistry};
pub use resilience::{
    BackoffPolicy, Connect, ConnectionState, FaultKind, FaultSignals, ResilientConnection,
};
pub use transport::{AckHandle, Consume, ConsumerRef, Delivery, InMemoryTransport, Transport};
