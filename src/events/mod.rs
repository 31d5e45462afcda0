//! Integration events: data model and name normalization.
//!
//! This module groups the event **data model** (trait, decoded value,
//! decoder descriptors) and the **name processor** that maps raw event type
//! identifiers onto the logical names used for routing.
//!
//! ## Contents
//! - [`IntegrationEvent`], [`DecodedEvent`], [`EventDescriptor`] event typing
//!   and decode seam
//! - [`NameProcessor`] prefix/suffix stripping for logical names
//!
//! ## Quick reference
//! - **Producers** implement [`IntegrationEvent`] on plain serde structs.
//! - **The registry** records one [`EventDescriptor`] per event name at
//!   subscription time; the dispatch engine decodes through it exactly once
//!   per inbound message.

mod event;
mod name;

pub use event::{DecodedEvent, EventDescriptor, IntegrationEvent, encode_event};
pub use name::NameProcessor;
