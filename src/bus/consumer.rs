//! # Bus-side delivery consumer.
//!
//! [`BusConsumer`] is the glue the bus registers with
//! [`Transport::start_receiving`]: it runs each delivery through the dispatch
//! engine and turns the engine's boolean into the transport's
//! acknowledge/reject verdict.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::dispatch::DispatchEngine;
use crate::transport::{Consume, Delivery, Transport};

/// Routes deliveries through the dispatch engine and acknowledges them.
pub(crate) struct BusConsumer {
    engine: Arc<DispatchEngine>,
    transport: Arc<dyn Transport>,
    /// Cancelled when the owning bus closes; stops accepting new deliveries.
    gate: CancellationToken,
}

impl BusConsumer {
    pub(crate) fn new(
        engine: Arc<DispatchEngine>,
        transport: Arc<dyn Transport>,
        gate: CancellationToken,
    ) -> Arc<Self> {
        Arc::new(Self {
            engine,
            transport,
            gate,
        })
    }
}

#[async_trait]
impl Consume for BusConsumer {
    async fn on_delivery(&self, delivery: Delivery) {
        // A closed bus stops accepting deliveries; the broker keeps the
        // message for whoever consumes next. In-flight dispatches are not
        // interrupted.
        if self.gate.is_cancelled() {
            self.transport.reject(delivery.ack).await;
            return;
        }

        let ok = self
            .engine
            .process_event(&delivery.routing_key, &delivery.payload)
            .await;

        if ok {
            self.transport.acknowledge(delivery.ack).await;
        } else {
            self.transport.reject(delivery.ack).await;
        }
    }
}
