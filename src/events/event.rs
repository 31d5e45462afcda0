//! # Integration event model.
//!
//! An integration event is an immutable, serializable payload identified by a
//! logical event name and published across process boundaries. This module
//! defines:
//!
//! - [`IntegrationEvent`] — the trait implemented by concrete event types;
//! - [`DecodedEvent`] — a shared, type-erased decoded event value;
//! - [`EventDescriptor`] — the `eventName → decoder` entry recorded by the
//!   subscription registry at subscription time.
//!
//! ## Rules
//! - Payloads are decoded **once** per inbound message via the descriptor
//!   recorded for the event name; handlers share the decoded value.
//! - No runtime reflection: the descriptor captures the concrete type when
//!   the subscription is added, and nothing else in the core ever names it.

use std::any::Any;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A named, serializable payload representing a fact published across
/// process boundaries.
///
/// `NAME` is the **raw** type identifier (as a producer would emit it); the
/// bus derives the logical routing name by stripping the configured
/// prefix/suffix via [`NameProcessor`](crate::NameProcessor).
///
/// # Example
/// ```
/// use serde::{Deserialize, Serialize};
/// use busbar::IntegrationEvent;
///
/// #[derive(Clone, Debug, Serialize, Deserialize)]
/// struct OrderCreated {
///     order_id: u64,
/// }
///
/// impl IntegrationEvent for OrderCreated {
///     const NAME: &'static str = "OrderCreatedIntegrationEvent";
/// }
/// ```
pub trait IntegrationEvent:
    Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    /// Raw event type identifier, before prefix/suffix stripping.
    const NAME: &'static str;
}

/// A decoded event value shared between sequentially invoked handlers.
///
/// Typed handlers downcast this back to the concrete event type; the
/// [`TypedHandler`](crate::dispatch::TypedHandler) adapter does so
/// transparently.
pub type DecodedEvent = Arc<dyn Any + Send + Sync>;

type DecodeFn = Arc<dyn Fn(&[u8]) -> Result<DecodedEvent, String> + Send + Sync>;

/// Decoder entry for one event name, recorded at subscription time.
///
/// Replaces runtime type reflection: the first `subscribe` for an event name
/// captures how to turn raw payload bytes back into the concrete event value.
#[derive(Clone)]
pub struct EventDescriptor {
    raw_name: Arc<str>,
    decode: DecodeFn,
}

impl EventDescriptor {
    /// Builds the descriptor for a concrete event type.
    pub fn of<E: IntegrationEvent>() -> Self {
        Self {
            raw_name: Arc::from(E::NAME),
            decode: Arc::new(|raw| {
                serde_json::from_slice::<E>(raw)
                    .map(|event| Arc::new(event) as DecodedEvent)
                    .map_err(|e| e.to_string())
            }),
        }
    }

    /// Raw event type identifier this descriptor was recorded for.
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    /// Decodes raw payload bytes into the recorded event type.
    ///
    /// The error is the decoder's failure message; the dispatch engine wraps
    /// it into [`DispatchError::Decode`](crate::DispatchError::Decode).
    pub fn decode(&self, raw: &[u8]) -> Result<DecodedEvent, String> {
        (self.decode)(raw)
    }
}

impl std::fmt::Debug for EventDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDescriptor")
            .field("raw_name", &self.raw_name)
            .finish_non_exhaustive()
    }
}

/// Encodes an event value into payload bytes.
///
/// The publish-side counterpart of [`EventDescriptor::decode`]; the error is
/// the encoder's failure message.
pub fn encode_event<E: IntegrationEvent>(event: &E) -> Result<Vec<u8>, String> {
    serde_json::to_vec(event).map_err(|e| e.to_string())
}
