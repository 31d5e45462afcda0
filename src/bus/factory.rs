//! # Bus factory: pick a transport by broker kind.
//!
//! [`create_bus`] builds an [`EventBus`] from configuration alone. Only
//! [`BrokerKind::InProcess`] resolves to a built-in transport; wire-protocol
//! brokers are served by external adapter crates, which construct their
//! transport themselves and hand it to [`EventBus::new`].

use std::sync::Arc;

use super::bus::EventBus;
use crate::config::{BrokerKind, BusConfig};
use crate::dispatch::HandlerFactory;
use crate::error::TransportError;
use crate::transport::{InMemoryTransport, Transport};

/// Creates a bus with the built-in transport for the configured broker kind.
///
/// ## Errors
/// [`TransportError::UnsupportedBroker`] for kinds without a built-in
/// transport (`Amqp`, `TopicSubscription`).
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use busbar::{BusConfig, HandlerMap, create_bus};
///
/// let bus = create_bus(BusConfig::default(), Arc::new(HandlerMap::new())).unwrap();
/// # let _ = bus;
/// ```
pub fn create_bus(
    cfg: BusConfig,
    handlers: Arc<dyn HandlerFactory>,
) -> Result<Arc<EventBus>, TransportError> {
    let transport: Arc<dyn Transport> = match cfg.broker {
        BrokerKind::InProcess => Arc::new(InMemoryTransport::with_options(
            cfg.client_name_prefix.clone(),
            cfg.max_concurrent,
        )),
        other => {
            return Err(TransportError::UnsupportedBroker {
                kind: other.as_label().to_string(),
            });
        }
    };
    Ok(EventBus::new(cfg, transport, handlers))
}
