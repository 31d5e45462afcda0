//! # In-process broker transport.
//!
//! [`InMemoryTransport`] routes sends directly to the consumer registered for
//! the logical event name, entirely inside the process. It backs
//! [`BrokerKind::InProcess`](crate::BrokerKind::InProcess), the end-to-end
//! tests, and the demos; it is **not** a broker adapter — there is no wire.
//!
//! ## Rules
//! - A send with no registered consumer is dropped (counted, logged at debug)
//!   — matching a broker topic with no bound subscription.
//! - Deliveries are awaited inline inside `send`, bounded by an optional
//!   concurrency semaphore, so tests observe handler effects as soon as
//!   `send`/`publish` returns.
//! - Acknowledged and rejected delivery tags are recorded and queryable,
//!   which is what makes this transport a usable test double.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::error::TransportError;
use crate::transport::transport::{AckHandle, ConsumerRef, Delivery, Transport};

#[derive(Default)]
struct Routing {
    /// Declared subscription resources, keyed by logical name.
    resources: HashSet<String>,
    /// Active consumer per logical name.
    consumers: HashMap<String, ConsumerRef>,
}

/// In-process broker: routes sends to registered consumers.
pub struct InMemoryTransport {
    /// Namespace for subscription resource names.
    client_name: String,
    routing: Mutex<Routing>,
    /// Optional cap on concurrent deliveries.
    semaphore: Option<Arc<Semaphore>>,
    connected: AtomicBool,
    closed: AtomicBool,
    next_tag: AtomicU64,
    unrouted: AtomicUsize,
    acked: Mutex<Vec<u64>>,
    rejected: Mutex<Vec<u64>>,
}

impl InMemoryTransport {
    /// Creates a transport with no delivery concurrency cap.
    pub fn new() -> Self {
        Self::with_options("busbar", 0)
    }

    /// Creates a transport with an explicit client namespace and delivery
    /// concurrency cap (`0` = unlimited).
    pub fn with_options(client_name: impl Into<String>, max_concurrent: usize) -> Self {
        Self {
            client_name: client_name.into(),
            routing: Mutex::new(Routing::default()),
            semaphore: match max_concurrent {
                0 => None,
                n => Some(Arc::new(Semaphore::new(n))),
            },
            connected: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            next_tag: AtomicU64::new(1),
            unrouted: AtomicUsize::new(0),
            acked: Mutex::new(Vec::new()),
            rejected: Mutex::new(Vec::new()),
        }
    }

    /// Delivery tags acknowledged so far.
    pub fn acknowledged(&self) -> Vec<u64> {
        self.acked.lock().expect("ack lock poisoned").clone()
    }

    /// Delivery tags rejected so far.
    pub fn rejected_tags(&self) -> Vec<u64> {
        self.rejected.lock().expect("reject lock poisoned").clone()
    }

    /// Number of sends that found no registered consumer.
    pub fn unrouted(&self) -> usize {
        self.unrouted.load(Ordering::SeqCst)
    }

    /// Returns whether subscription resources exist for `logical_name`.
    pub fn has_resource(&self, logical_name: &str) -> bool {
        self.routing
            .lock()
            .expect("routing lock poisoned")
            .resources
            .contains(logical_name)
    }

    /// Broker-side resource name for one logical event name.
    pub fn resource_name(&self, logical_name: &str) -> String {
        format!("{}.{}", self.client_name, logical_name)
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(TransportError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        self.ensure_open()?;
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && !self.closed.load(Ordering::SeqCst)
    }

    async fn send(
        &self,
        logical_name: &str,
        payload: &[u8],
        _metadata: &HashMap<String, String>,
    ) -> Result<(), TransportError> {
        self.ensure_open()?;
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let consumer = {
            let routing = self.routing.lock().expect("routing lock poisoned");
            routing.consumers.get(logical_name).cloned()
        };

        let Some(consumer) = consumer else {
            // A topic with no bound subscription: the broker accepts the
            // message and drops it.
            self.unrouted.fetch_add(1, Ordering::SeqCst);
            log::debug!("no consumer for '{logical_name}'; message dropped");
            return Ok(());
        };

        let _permit = match &self.semaphore {
            Some(sem) => Some(
                Arc::clone(sem)
                    .acquire_owned()
                    .await
                    .map_err(|_| TransportError::Closed)?,
            ),
            None => None,
        };

        let tag = self.next_tag.fetch_add(1, Ordering::SeqCst);
        consumer
            .on_delivery(Delivery {
                routing_key: logical_name.to_string(),
                payload: payload.to_vec(),
                ack: AckHandle::new(tag),
            })
            .await;
        Ok(())
    }

    async fn ensure_subscription_resources(
        &self,
        logical_name: &str,
    ) -> Result<(), TransportError> {
        self.ensure_open()?;
        let mut routing = self.routing.lock().expect("routing lock poisoned");
        routing.resources.insert(logical_name.to_string());
        Ok(())
    }

    async fn teardown_subscription_resources(
        &self,
        logical_name: &str,
    ) -> Result<(), TransportError> {
        self.ensure_open()?;
        let mut routing = self.routing.lock().expect("routing lock poisoned");
        routing.resources.remove(logical_name);
        routing.consumers.remove(logical_name);
        Ok(())
    }

    async fn start_receiving(
        &self,
        logical_name: &str,
        consumer: ConsumerRef,
    ) -> Result<(), TransportError> {
        self.ensure_open()?;
        let mut routing = self.routing.lock().expect("routing lock poisoned");
        routing
            .consumers
            .insert(logical_name.to_string(), consumer);
        Ok(())
    }

    async fn acknowledge(&self, ack: AckHandle) {
        self.acked
            .lock()
            .expect("ack lock poisoned")
            .push(ack.tag());
    }

    async fn reject(&self, ack: AckHandle) {
        self.rejected
            .lock()
            .expect("reject lock poisoned")
            .push(ack.tag());
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        let mut routing = self.routing.lock().expect("routing lock poisoned");
        routing.consumers.clear();
    }
}
