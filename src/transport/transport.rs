//! # The Transport contract.
//!
//! A transport implements wire-level send/receive for one specific broker
//! technology. The bus core consumes this contract and nothing else about
//! the broker; adapters for real brokers (AMQP-style, managed
//! topic/subscription services) live in their own crates.
//!
//! ## Rules
//! - `ensure_subscription_resources` must be **idempotent**: creating routing
//!   resources that already exist is a no-op.
//! - `teardown_subscription_resources` is called exactly once per emptied
//!   event name, driven by the registry's removal notification.
//! - Deliveries carry an opaque [`AckHandle`]; the consumer's verdict comes
//!   back through [`Transport::acknowledge`] / [`Transport::reject`], which
//!   control broker-side redelivery.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;

/// Opaque token identifying one delivery for acknowledgment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AckHandle(u64);

impl AckHandle {
    /// Creates a handle from an adapter-assigned delivery tag.
    pub fn new(tag: u64) -> Self {
        Self(tag)
    }

    /// The adapter-assigned delivery tag.
    pub fn tag(&self) -> u64 {
        self.0
    }
}

/// One inbound message handed to a consumer.
#[derive(Debug)]
pub struct Delivery {
    /// Routing key as carried on the wire (raw or logical event name).
    pub routing_key: String,
    /// Serialized event payload.
    pub payload: Vec<u8>,
    /// Handle for the acknowledge/reject verdict.
    pub ack: AckHandle,
}

/// # Inbound message callback registered via [`Transport::start_receiving`].
#[async_trait]
pub trait Consume: Send + Sync {
    /// Processes one delivery.
    ///
    /// Implementations decide the delivery's fate by calling
    /// [`Transport::acknowledge`] or [`Transport::reject`] with the
    /// delivery's handle.
    async fn on_delivery(&self, delivery: Delivery);
}

/// Shared handle to a consumer (`Arc<dyn Consume>`).
pub type ConsumerRef = Arc<dyn Consume>;

/// # Wire-level contract implemented by each broker adapter.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establishes the broker connection.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Returns whether the transport currently holds a live connection.
    fn is_connected(&self) -> bool;

    /// Publishes one serialized event under its logical name.
    ///
    /// `metadata` carries transport-agnostic message attributes (message id,
    /// event name); adapters map them onto broker-native properties.
    async fn send(
        &self,
        logical_name: &str,
        payload: &[u8],
        metadata: &HashMap<String, String>,
    ) -> Result<(), TransportError>;

    /// Idempotently creates whatever routing resources (queue, subscription,
    /// filter) are required for `logical_name` to receive matching traffic.
    async fn ensure_subscription_resources(
        &self,
        logical_name: &str,
    ) -> Result<(), TransportError>;

    /// Removes the routing resources for `logical_name`.
    ///
    /// Called exactly once, when the last handler binding for the name is
    /// removed.
    async fn teardown_subscription_resources(
        &self,
        logical_name: &str,
    ) -> Result<(), TransportError>;

    /// Starts delivering messages for `logical_name` to `consumer`.
    ///
    /// Replaces any previously registered consumer for the same name.
    async fn start_receiving(
        &self,
        logical_name: &str,
        consumer: ConsumerRef,
    ) -> Result<(), TransportError>;

    /// Marks a delivery as successfully processed (no redelivery).
    async fn acknowledge(&self, ack: AckHandle);

    /// Marks a delivery as failed (broker may redeliver).
    async fn reject(&self, ack: AckHandle);

    /// Closes the transport; subsequent operations fail with
    /// [`TransportError::Closed`].
    async fn close(&self);
}
