//! # Bus configuration.
//!
//! Provides [`BusConfig`] centralized settings consumed (not owned) by the
//! bus core and handed to broker transports at construction time.
//!
//! Config is used in two ways:
//! 1. **Bus creation**: `EventBus::new(config, transport, factory)`
//! 2. **Transport selection**: `bus::factory::create(config, factory)` picks a
//!    built-in transport by [`BusConfig::broker`]
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → unlimited concurrent deliveries (no semaphore)
//! - `retry_count = 0` → a single `try_connect`/`send` never attempts the wire
//!   and fails immediately (useful to make outages surface fast in tests)

use crate::resilience::BackoffPolicy;

/// The broker technology a bus instance talks to.
///
/// Only [`BrokerKind::InProcess`] has a built-in transport; the wire-protocol
/// kinds are served by external adapter crates implementing
/// [`Transport`](crate::transport::Transport).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrokerKind {
    /// In-process channel broker (tests, demos, single-process deployments).
    InProcess,
    /// An AMQP-style broker (exchange/queue/routing-key model).
    Amqp,
    /// A managed topic/subscription service (topic/subscription/filter model).
    TopicSubscription,
}

impl BrokerKind {
    /// Returns a short stable label (snake_case) for logs and error messages.
    pub fn as_label(&self) -> &'static str {
        match self {
            BrokerKind::InProcess => "in_process",
            BrokerKind::Amqp => "amqp",
            BrokerKind::TopicSubscription => "topic_subscription",
        }
    }
}

/// Configuration for one bus instance.
///
/// Defines:
/// - **Broker addressing**: connection string, default topic/exchange name
/// - **Resilience**: connection/send retry count and backoff schedule
/// - **Event naming**: prefix/suffix stripped from raw event type names
/// - **Delivery**: maximum concurrent inbound deliveries
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct BusConfig {
    /// Broker connection string, passed through to the transport.
    pub connection_string: String,

    /// Name of the default topic or exchange all events are published to.
    pub default_topic: String,

    /// Number of connection/send attempts before reporting the broker
    /// unavailable.
    ///
    /// Applies to `ResilientConnection::try_connect` and to the publish retry
    /// schedule alike.
    pub retry_count: u32,

    /// Prefix stripped from raw event type names (e.g. `"Ordering."`).
    ///
    /// Empty string disables the strip.
    pub event_name_prefix: String,

    /// Suffix stripped from raw event type names (e.g. `"IntegrationEvent"`).
    ///
    /// Empty string disables the strip.
    pub event_name_suffix: String,

    /// Which broker technology this bus instance talks to.
    pub broker: BrokerKind,

    /// Prefix for per-event subscription resources (queues, subscriptions).
    ///
    /// Usually the subscribing application's name; see
    /// [`BusConfig::subscription_name`].
    pub client_name_prefix: String,

    /// Maximum number of inbound messages processed concurrently.
    ///
    /// - `0` = unlimited (no semaphore)
    /// - `n > 0` = at most `n` deliveries in flight
    pub max_concurrent: usize,

    /// Backoff schedule applied between connection/send retries.
    pub backoff: BackoffPolicy,
}

impl BusConfig {
    /// Returns the delivery concurrency limit as an `Option`.
    ///
    /// - `None` → unlimited (no semaphore)
    /// - `Some(n)` → at most `n` concurrent deliveries
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }

    /// Returns the broker-side resource name for one logical event name.
    ///
    /// Subscription resources are namespaced per subscribing application so
    /// multiple consumers of the same event get independent queues.
    ///
    /// # Example
    /// ```
    /// use busbar::BusConfig;
    ///
    /// let mut cfg = BusConfig::default();
    /// cfg.client_name_prefix = "ordering-api".into();
    /// assert_eq!(cfg.subscription_name("OrderCreated"), "ordering-api.OrderCreated");
    /// ```
    pub fn subscription_name(&self, logical_name: &str) -> String {
        format!("{}.{}", self.client_name_prefix, logical_name)
    }
}

impl Default for BusConfig {
    /// Default configuration:
    ///
    /// - `broker = BrokerKind::InProcess` (no external broker required)
    /// - `default_topic = "busbar_events"`
    /// - `retry_count = 5`
    /// - no event name prefix, suffix = `"IntegrationEvent"`
    /// - `max_concurrent = 10`
    /// - `backoff = BackoffPolicy::default()` (2s, 4s, 8s, … capped at 60s)
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            default_topic: "busbar_events".to_string(),
            retry_count: 5,
            event_name_prefix: String::new(),
            event_name_suffix: "IntegrationEvent".to_string(),
            broker: BrokerKind::InProcess,
            client_name_prefix: "busbar".to_string(),
            max_concurrent: 10,
            backoff: BackoffPolicy::default(),
        }
    }
}
