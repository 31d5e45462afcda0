//! # Event handler abstractions.
//!
//! This module defines the object-safe [`EventHandler`] trait invoked by the
//! dispatch engine, the typed [`Handles`] trait implemented by application
//! code, and two adapters bridging the two:
//!
//! - [`TypedHandler`] wraps any `Handles<E>` implementation;
//! - [`HandlerFn`] wraps a plain async closure over the concrete event type.
//!
//! The engine only ever sees `Arc<dyn EventHandler>` ([`HandlerRef`]); the
//! downcast from the shared [`DecodedEvent`] back to the concrete type lives
//! in the adapters, so application handlers never touch `dyn Any`.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::events::{DecodedEvent, IntegrationEvent};

/// Shared handle to an event handler (`Arc<dyn EventHandler>`).
pub type HandlerRef = Arc<dyn EventHandler>;

/// # Type-erased event handler, as seen by the dispatch engine.
///
/// Implementations receive the decoded event value shared by all handlers of
/// one inbound message. Prefer implementing [`Handles`] and wrapping with
/// [`TypedHandler`] instead of implementing this trait directly.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Processes one decoded event.
    ///
    /// Invoked sequentially, in registration order, for each handler bound
    /// to the event name. Returning an error (or panicking — the engine
    /// isolates panics) marks the overall delivery as failed but does not
    /// stop the remaining handlers.
    async fn handle(&self, event: DecodedEvent) -> Result<(), HandlerError>;
}

/// # Typed event handler implemented by application code.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use serde::{Deserialize, Serialize};
/// use busbar::{Handles, HandlerError, IntegrationEvent};
///
/// #[derive(Clone, Debug, Serialize, Deserialize)]
/// struct OrderCreated { order_id: u64 }
///
/// impl IntegrationEvent for OrderCreated {
///     const NAME: &'static str = "OrderCreatedIntegrationEvent";
/// }
///
/// struct Mailer;
///
/// #[async_trait]
/// impl Handles<OrderCreated> for Mailer {
///     async fn handle(&self, event: &OrderCreated) -> Result<(), HandlerError> {
///         // send confirmation mail for event.order_id ...
///         let _ = event.order_id;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Handles<E: IntegrationEvent>: Send + Sync {
    /// Processes one event of the concrete type.
    async fn handle(&self, event: &E) -> Result<(), HandlerError>;
}

/// Adapter turning a [`Handles<E>`] implementation into a type-erased
/// [`EventHandler`].
pub struct TypedHandler<E, H> {
    inner: H,
    _event: PhantomData<fn() -> E>,
}

impl<E, H> TypedHandler<E, H>
where
    E: IntegrationEvent,
    H: Handles<E> + 'static,
{
    /// Wraps a typed handler.
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            _event: PhantomData,
        }
    }

    /// Wraps a typed handler and returns it as a shared [`HandlerRef`].
    pub fn arc(inner: H) -> HandlerRef {
        Arc::new(Self::new(inner))
    }
}

#[async_trait]
impl<E, H> EventHandler for TypedHandler<E, H>
where
    E: IntegrationEvent,
    H: Handles<E> + 'static,
{
    async fn handle(&self, event: DecodedEvent) -> Result<(), HandlerError> {
        let event = event.downcast_ref::<E>().ok_or_else(|| {
            HandlerError::fail(format!(
                "decoded event is not a {}",
                std::any::type_name::<E>()
            ))
        })?;
        self.inner.handle(event).await
    }
}

/// Function-backed event handler.
///
/// Wraps a closure over the concrete event type; the event value is cloned
/// out of the shared decoded payload per invocation.
///
/// # Example
/// ```
/// use serde::{Deserialize, Serialize};
/// use busbar::{HandlerFn, HandlerRef, IntegrationEvent};
///
/// #[derive(Clone, Debug, Serialize, Deserialize)]
/// struct OrderCreated { order_id: u64 }
///
/// impl IntegrationEvent for OrderCreated {
///     const NAME: &'static str = "OrderCreatedIntegrationEvent";
/// }
///
/// let handler: HandlerRef = HandlerFn::arc(|event: OrderCreated| async move {
///     println!("order {}", event.order_id);
///     Ok(())
/// });
/// # let _ = handler;
/// ```
pub struct HandlerFn<E, F> {
    f: F,
    _event: PhantomData<fn() -> E>,
}

impl<E, F, Fut> HandlerFn<E, F>
where
    E: IntegrationEvent,
    F: Fn(E) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a [`HandlerRef`].
    pub fn new(f: F) -> Self {
        Self {
            f,
            _event: PhantomData,
        }
    }

    /// Creates the handler and returns it as a shared [`HandlerRef`].
    pub fn arc(f: F) -> HandlerRef {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<E, F, Fut> EventHandler for HandlerFn<E, F>
where
    E: IntegrationEvent,
    F: Fn(E) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, event: DecodedEvent) -> Result<(), HandlerError> {
        let event = event
            .downcast_ref::<E>()
            .cloned()
            .ok_or_else(|| {
                HandlerError::fail(format!(
                    "decoded event is not a {}",
                    std::any::type_name::<E>()
                ))
            })?;
        (self.f)(event).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct OrderCreated {
        order_id: u64,
    }

    impl IntegrationEvent for OrderCreated {
        const NAME: &'static str = "OrderCreatedIntegrationEvent";
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct OrderShipped {
        order_id: u64,
    }

    impl IntegrationEvent for OrderShipped {
        const NAME: &'static str = "OrderShippedIntegrationEvent";
    }

    struct Recorder {
        last: AtomicU64,
    }

    #[async_trait]
    impl Handles<OrderCreated> for Recorder {
        async fn handle(&self, event: &OrderCreated) -> Result<(), HandlerError> {
            self.last.store(event.order_id, Ordering::SeqCst);
            Ok(())
        }
    }

    fn decoded(event: OrderCreated) -> DecodedEvent {
        Arc::new(event)
    }

    #[tokio::test]
    async fn test_typed_handler_downcasts_and_delegates() {
        let recorder = TypedHandler::arc(Recorder {
            last: AtomicU64::new(0),
        });

        recorder
            .handle(decoded(OrderCreated { order_id: 7 }))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_typed_handler_rejects_wrong_type() {
        let recorder = TypedHandler::arc(Recorder {
            last: AtomicU64::new(0),
        });

        let wrong: DecodedEvent = Arc::new(OrderShipped { order_id: 7 });
        let err = recorder
            .handle(wrong)
            .await
            .expect_err("wrong concrete type must be rejected");
        assert!(matches!(err, HandlerError::Fail { .. }));
    }

    #[tokio::test]
    async fn test_handler_fn_receives_cloned_event() {
        let seen = Arc::new(AtomicU64::new(0));
        let seen_in = Arc::clone(&seen);

        let handler = HandlerFn::arc(move |event: OrderCreated| {
            let seen = Arc::clone(&seen_in);
            async move {
                seen.store(event.order_id, Ordering::SeqCst);
                Ok(())
            }
        });

        handler
            .handle(decoded(OrderCreated { order_id: 42 }))
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 42);
    }
}
