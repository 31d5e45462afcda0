//! # Subscription registry: event name → handler bindings.
//!
//! [`SubscriptionRegistry`] owns the mapping from logical event names to the
//! ordered set of handler bindings, plus the decoder descriptor recorded for
//! each event name. One registry instance is owned by exactly one bus; it is
//! never shared across bus instances and never ambient/static state.
//!
//! ## Architecture
//! ```text
//! add_subscription(event, kind, descriptor)
//!        │
//!        ▼
//! ┌────────────────────────────────────────────────┐
//! │ Mutex<State>                                   │
//! │   bindings:    event → [HandlerBinding, ...]   │  insertion order =
//! │   descriptors: event → EventDescriptor         │  dispatch order
//! └────────────────────────────────────────────────┘
//!        │
//!        ▼ (last binding removed)
//! removal listeners ── fired synchronously with the emptied event name
//! ```
//!
//! ## Rules
//! - An event name is present in `bindings` **iff** it has at least one
//!   binding; its descriptor entry lives and dies with it.
//! - At most one binding per `(event, handler_kind)` pair; a second add
//!   fails with [`SubscribeError::Duplicate`].
//! - Removing a binding that does not exist fails with
//!   [`SubscribeError::NotFound`]; removal is never a silent no-op.
//! - Removing the **last** binding for an event name drops both map entries
//!   atomically and fires every removal listener, synchronously, before
//!   `remove_subscription` returns.
//! - All mutations serialize on a single mutex; the registry is safe for
//!   concurrent callers.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::SubscribeError;
use crate::events::EventDescriptor;
use crate::registry::binding::HandlerBinding;

/// Callback fired with the event name when its last binding is removed.
///
/// Listeners run synchronously inside `remove_subscription`/`clear`, after
/// the state lock is released — they may call back into the registry, but
/// must not block indefinitely.
pub type RemovalListener = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
struct State {
    /// Ordered bindings per logical event name (insertion order preserved).
    bindings: HashMap<String, Vec<HandlerBinding>>,
    /// Decoder descriptor per logical event name.
    descriptors: HashMap<String, EventDescriptor>,
}

/// Tracks which handler kinds are bound to which logical event names.
pub struct SubscriptionRegistry {
    state: Mutex<State>,
    removal_listeners: Mutex<Vec<RemovalListener>>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            removal_listeners: Mutex::new(Vec::new()),
        }
    }

    /// Registers a callback fired when an event name loses its last binding.
    ///
    /// Intended to be wired once, at bus construction time, so teardown
    /// ordering stays deterministic.
    pub fn on_event_removed(&self, listener: RemovalListener) {
        self.removal_listeners
            .lock()
            .expect("removal listener lock poisoned")
            .push(listener);
    }

    /// Inserts a binding for `(event, handler_kind)`.
    ///
    /// The first binding for a new event name also records `descriptor`,
    /// which later decodes inbound payloads for that name. Subsequent
    /// bindings keep the originally recorded descriptor.
    ///
    /// ## Errors
    /// [`SubscribeError::Duplicate`] if the pair is already registered.
    pub fn add_subscription(
        &self,
        event: &str,
        handler_kind: &str,
        descriptor: EventDescriptor,
    ) -> Result<(), SubscribeError> {
        let mut state = self.lock_state();

        let bindings = state.bindings.entry(event.to_string()).or_default();
        if bindings.iter().any(|b| b.handler_kind() == handler_kind) {
            return Err(SubscribeError::Duplicate {
                event: event.to_string(),
                handler: handler_kind.to_string(),
            });
        }
        bindings.push(HandlerBinding::new(event, handler_kind));

        state
            .descriptors
            .entry(event.to_string())
            .or_insert(descriptor);
        Ok(())
    }

    /// Removes the binding for `(event, handler_kind)`.
    ///
    /// If this was the last binding for `event`, the bindings entry and the
    /// descriptor entry are removed together and every removal listener is
    /// invoked with `event` before this call returns.
    ///
    /// ## Errors
    /// [`SubscribeError::NotFound`] if no such binding exists.
    pub fn remove_subscription(
        &self,
        event: &str,
        handler_kind: &str,
    ) -> Result<(), SubscribeError> {
        let emptied = {
            let mut state = self.lock_state();

            let bindings = state.bindings.get_mut(event).ok_or_else(|| {
                SubscribeError::NotFound {
                    event: event.to_string(),
                    handler: handler_kind.to_string(),
                }
            })?;

            let idx = bindings
                .iter()
                .position(|b| b.handler_kind() == handler_kind)
                .ok_or_else(|| SubscribeError::NotFound {
                    event: event.to_string(),
                    handler: handler_kind.to_string(),
                })?;
            bindings.remove(idx);

            if bindings.is_empty() {
                state.bindings.remove(event);
                state.descriptors.remove(event);
                true
            } else {
                false
            }
        };

        // Fired outside the state lock so listeners may re-enter the registry.
        if emptied {
            self.notify_removed(event);
        }
        Ok(())
    }

    /// Returns whether any binding exists for `event`.
    pub fn has_subscriptions_for(&self, event: &str) -> bool {
        self.lock_state().bindings.contains_key(event)
    }

    /// Returns the bindings for `event` in registration order.
    ///
    /// Returns an **empty** `Vec` when no bindings exist — callers decide
    /// what an unmatched event means; the registry never treats the lookup
    /// itself as an error.
    pub fn handlers_for(&self, event: &str) -> Vec<HandlerBinding> {
        self.lock_state()
            .bindings
            .get(event)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the decoder descriptor recorded for `event`, if any.
    pub fn descriptor_for(&self, event: &str) -> Option<EventDescriptor> {
        self.lock_state().descriptors.get(event).cloned()
    }

    /// Returns whether no event names are registered.
    pub fn is_empty(&self) -> bool {
        self.lock_state().bindings.is_empty()
    }

    /// Returns the sorted list of registered logical event names.
    pub fn event_names(&self) -> Vec<String> {
        let state = self.lock_state();
        let mut names: Vec<String> = state.bindings.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Removes every binding and descriptor.
    ///
    /// Fires one removal notification per previously registered event name,
    /// in sorted order, after the state is already empty.
    pub fn clear(&self) {
        let removed = {
            let mut state = self.lock_state();
            let mut names: Vec<String> = state.bindings.keys().cloned().collect();
            names.sort_unstable();
            state.bindings.clear();
            state.descriptors.clear();
            names
        };

        for name in &removed {
            self.notify_removed(name);
        }
    }

    fn notify_removed(&self, event: &str) {
        let listeners = self
            .removal_listeners
            .lock()
            .expect("removal listener lock poisoned");
        for listener in listeners.iter() {
            listener(event);
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("registry state lock poisoned")
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
