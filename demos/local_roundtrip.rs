//! # Example: local_roundtrip
//!
//! Publishes integration events through the in-process transport and handles
//! them with two typed handlers bound to the same event name.
//!
//! Demonstrates how to:
//! - Define an event as a plain serde struct implementing [`IntegrationEvent`].
//! - Register handler instances in a [`HandlerMap`].
//! - Subscribe two handler kinds to one event and observe dispatch order.
//!
//! ## Flow
//! ```text
//! publish(OrderCreated) ──► EventBus ──► InMemoryTransport
//!                                             └─► BusConsumer
//!                                                   ├─► "order-mailer"
//!                                                   └─► "order-auditor"
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use busbar::{BusConfig, HandlerFn, HandlerMap, IntegrationEvent, create_bus};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct OrderCreated {
    order_id: u64,
    buyer: String,
}

impl IntegrationEvent for OrderCreated {
    const NAME: &'static str = "OrderCreatedIntegrationEvent";
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let handlers = Arc::new(HandlerMap::new());

    handlers.register(
        "order-mailer",
        HandlerFn::arc(|event: OrderCreated| async move {
            println!("[mailer] confirmation for order {} → {}", event.order_id, event.buyer);
            Ok(())
        }),
    );
    handlers.register(
        "order-auditor",
        HandlerFn::arc(|event: OrderCreated| async move {
            println!("[auditor] order {} recorded", event.order_id);
            Ok(())
        }),
    );

    let bus = create_bus(BusConfig::default(), handlers)?;

    bus.subscribe::<OrderCreated>("order-mailer").await?;
    bus.subscribe::<OrderCreated>("order-auditor").await?;

    for order_id in 1..=3 {
        bus.publish(&OrderCreated {
            order_id,
            buyer: format!("buyer-{order_id}"),
        })
        .await?;
    }

    // Removing the last binding tears the routing resources down.
    bus.unsubscribe::<OrderCreated>("order-mailer").await?;
    bus.unsubscribe::<OrderCreated>("order-auditor").await?;

    bus.close().await;
    Ok(())
}
