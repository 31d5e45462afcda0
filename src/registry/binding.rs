//! # Handler binding.
//!
//! A [`HandlerBinding`] names one handler kind bound to one logical event
//! name. The registry guarantees at most one binding per
//! `(event, handler_kind)` pair.

use std::sync::Arc;

/// One registered association between a logical event name and a handler
/// kind capable of processing it.
///
/// Cheap to clone; names are shared `Arc<str>`s.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandlerBinding {
    event: Arc<str>,
    handler_kind: Arc<str>,
}

impl HandlerBinding {
    /// Creates a binding for the given logical event name and handler kind.
    pub fn new(event: impl Into<Arc<str>>, handler_kind: impl Into<Arc<str>>) -> Self {
        Self {
            event: event.into(),
            handler_kind: handler_kind.into(),
        }
    }

    /// Logical event name this binding routes.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Handler kind identifier resolved through the handler factory.
    pub fn handler_kind(&self) -> &str {
        &self.handler_kind
    }
}
