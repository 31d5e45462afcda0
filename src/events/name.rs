//! # Event name normalization.
//!
//! [`NameProcessor`] turns a raw event type identifier into the logical bus
//! name used for routing, by stripping a configured prefix and suffix.
//!
//! Publish-side and receive-side use the same processor, so a routing key
//! produced from `"Ordering.OrderCreatedIntegrationEvent"` matches the
//! subscription registered for `"OrderCreated"`.
//!
//! ## Rules
//! - Pure and deterministic: no side effects, no allocation.
//! - Idempotent: a name that no longer carries the prefix/suffix is returned
//!   unchanged, so processing an already-processed name is safe.
//! - Either affix may be empty, disabling that strip.

/// Strips a configured prefix/suffix from raw event type names.
///
/// # Example
/// ```
/// use busbar::NameProcessor;
///
/// let names = NameProcessor::new("Ordering.", "IntegrationEvent");
/// assert_eq!(names.process("Ordering.OrderCreatedIntegrationEvent"), "OrderCreated");
/// // Idempotent: processing the logical name again is a no-op.
/// assert_eq!(names.process("OrderCreated"), "OrderCreated");
/// ```
#[derive(Clone, Debug, Default)]
pub struct NameProcessor {
    prefix: String,
    suffix: String,
}

impl NameProcessor {
    /// Creates a processor with the given affixes.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Returns the logical name for a raw event type identifier.
    ///
    /// Strips `prefix` from the start if present, then `suffix` from the end
    /// if present. Borrows from the input; never allocates.
    pub fn process<'a>(&self, raw: &'a str) -> &'a str {
        let without_prefix = if self.prefix.is_empty() {
            raw
        } else {
            raw.strip_prefix(&self.prefix).unwrap_or(raw)
        };

        if self.suffix.is_empty() {
            without_prefix
        } else {
            without_prefix
                .strip_suffix(&self.suffix)
                .unwrap_or(without_prefix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_prefix_and_suffix() {
        let names = NameProcessor::new("Ordering.", "IntegrationEvent");
        assert_eq!(
            names.process("Ordering.OrderCreatedIntegrationEvent"),
            "OrderCreated"
        );
    }

    #[test]
    fn test_idempotent_on_processed_name() {
        let names = NameProcessor::new("Ordering.", "IntegrationEvent");
        let logical = names.process("Ordering.OrderCreatedIntegrationEvent");
        assert_eq!(names.process(logical), logical);
    }

    #[test]
    fn test_empty_affixes_disable_strip() {
        let names = NameProcessor::new("", "");
        assert_eq!(names.process("OrderCreated"), "OrderCreated");

        let suffix_only = NameProcessor::new("", "IntegrationEvent");
        assert_eq!(
            suffix_only.process("OrderCreatedIntegrationEvent"),
            "OrderCreated"
        );

        let prefix_only = NameProcessor::new("Ordering.", "");
        assert_eq!(prefix_only.process("Ordering.OrderCreated"), "OrderCreated");
    }

    #[test]
    fn test_absent_affixes_leave_name_unchanged() {
        let names = NameProcessor::new("Basket.", "IntegrationEvent");
        assert_eq!(names.process("Ordering.OrderCreated"), "Ordering.OrderCreated");
    }

    #[test]
    fn test_suffix_only_in_middle_is_kept() {
        let names = NameProcessor::new("", "Event");
        // The affix must sit at the end; occurrences elsewhere are untouched.
        assert_eq!(names.process("EventStoreUpdated"), "EventStoreUpdated");
    }
}
