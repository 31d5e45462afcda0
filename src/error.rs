//! Error types used by the bus core and its collaborators.
//!
//! This module defines the error taxonomy of the crate:
//!
//! - [`SubscribeError`] — registration failures raised by the subscription registry.
//! - [`DispatchError`] — inbound-message failures observed by the dispatch engine.
//! - [`TransportError`] — wire-level failures raised by broker transports.
//! - [`PublishError`] — failures surfaced to `publish` callers.
//! - [`HandlerError`] — failures returned by individual event handlers.
//!
//! Types provide `as_label` helpers (stable snake_case tags for logs/metrics)
//! and, where retry decisions exist, `is_retryable`.

use thiserror::Error;

/// # Errors raised when adding or removing subscriptions.
///
/// `Duplicate` and `NotFound` are terminal for the failing call and are never
/// retried. `Transport` wraps a wire-level failure hit while establishing or
/// tearing down routing resources for a subscription.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SubscribeError {
    /// The `(event, handler)` pair is already registered.
    #[error("handler '{handler}' already registered for event '{event}'")]
    Duplicate {
        /// Logical event name.
        event: String,
        /// Handler kind identifier.
        handler: String,
    },

    /// No such `(event, handler)` binding exists.
    ///
    /// Raised by `remove_subscription` when the binding is absent. This is the
    /// documented behavior; removal is never a silent no-op.
    #[error("no subscription of handler '{handler}' for event '{event}'")]
    NotFound {
        /// Logical event name.
        event: String,
        /// Handler kind identifier.
        handler: String,
    },

    /// A wire-level failure while managing subscription resources.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SubscribeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SubscribeError::Duplicate { .. } => "subscription_duplicate",
            SubscribeError::NotFound { .. } => "subscription_not_found",
            SubscribeError::Transport(_) => "subscription_transport",
        }
    }
}

/// # Failures observed while dispatching one inbound message.
///
/// These are logged by the dispatch engine and reported to the transport as an
/// overall `false` processing result; they never abort the receive loop.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The message names an event with no registered bindings.
    #[error("no subscriptions registered for event '{event}'")]
    UnknownEvent {
        /// Logical event name from the message routing key.
        event: String,
    },

    /// The payload could not be decoded into the recorded event type.
    ///
    /// Non-retryable: redelivering the same bytes cannot succeed.
    #[error("cannot decode payload for event '{event}': {reason}")]
    Decode {
        /// Logical event name.
        event: String,
        /// Decoder failure message.
        reason: String,
    },

    /// A bound handler returned an error (or panicked) for this message.
    #[error("handler '{handler}' failed for event '{event}': {reason}")]
    HandlerFailed {
        /// Logical event name.
        event: String,
        /// Handler kind identifier.
        handler: String,
        /// Underlying failure message.
        reason: String,
    },
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use busbar::DispatchError;
    ///
    /// let err = DispatchError::UnknownEvent { event: "OrderCreated".into() };
    /// assert_eq!(err.as_label(), "dispatch_unknown_event");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::UnknownEvent { .. } => "dispatch_unknown_event",
            DispatchError::Decode { .. } => "dispatch_decode",
            DispatchError::HandlerFailed { .. } => "dispatch_handler_failed",
        }
    }
}

/// # Wire-level failures raised by broker transports.
///
/// Some failures are transient (`SendFailed { retryable: true }`,
/// `NotConnected`) and safe to retry under the backoff schedule; others are
/// terminal for the operation.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TransportError {
    /// The broker could not be reached after exhausting the retry schedule.
    #[error("broker unavailable after {attempts} attempts")]
    Unavailable {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// A send operation failed.
    #[error("send failed: {reason}")]
    SendFailed {
        /// Underlying failure message.
        reason: String,
        /// Whether retrying the same send may succeed.
        retryable: bool,
    },

    /// The transport has no live connection.
    #[error("transport is not connected")]
    NotConnected,

    /// No built-in transport exists for the configured broker kind.
    #[error("no built-in transport for broker kind '{kind}'")]
    UnsupportedBroker {
        /// The configured broker kind.
        kind: String,
    },

    /// The transport has been closed and accepts no further operations.
    #[error("transport closed")]
    Closed,
}

impl TransportError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TransportError::Unavailable { .. } => "transport_unavailable",
            TransportError::SendFailed { .. } => "transport_send_failed",
            TransportError::NotConnected => "transport_not_connected",
            TransportError::UnsupportedBroker { .. } => "transport_unsupported_broker",
            TransportError::Closed => "transport_closed",
        }
    }

    /// Indicates whether the failure is safe to retry.
    ///
    /// `NotConnected` is retryable (the resilience layer may re-establish the
    /// connection); `Unavailable` is what retrying *produces* once the
    /// schedule is exhausted, so it is not retryable itself.
    ///
    /// # Example
    /// ```
    /// use busbar::TransportError;
    ///
    /// let transient = TransportError::SendFailed { reason: "socket reset".into(), retryable: true };
    /// assert!(transient.is_retryable());
    ///
    /// let exhausted = TransportError::Unavailable { attempts: 5 };
    /// assert!(!exhausted.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::SendFailed { retryable, .. } => *retryable,
            TransportError::NotConnected => true,
            _ => false,
        }
    }
}

/// # Failures surfaced to `publish` callers.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PublishError {
    /// The event value could not be encoded to payload bytes.
    #[error("failed to encode event '{event}': {reason}")]
    Encode {
        /// Logical event name.
        event: String,
        /// Encoder failure message.
        reason: String,
    },

    /// A wire-level failure, including retry exhaustion (`Unavailable`).
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// # Failure returned by an event handler.
///
/// Handler failures are logged per handler by the dispatch engine, do not
/// stop remaining handlers, and make the overall processing result `false`
/// (the transport then rejects the delivery).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Handler execution failed.
    #[error("handler execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },
}

impl HandlerError {
    /// Creates a `Fail` from any displayable error.
    pub fn fail(error: impl Into<String>) -> Self {
        HandlerError::Fail {
            error: error.into(),
        }
    }
}
