//! Publish/subscribe bus abstraction.
//!
//! The component only needs three things from a bus:
//! - fire-and-forget `publish` to a subject
//! - `publish_request`, which carries a reply subject for request–reply exchanges
//! - `subscribe`, which yields every message sent to a subject
//!
//! Any transport (NATS, an in-process channel fabric, ...) can back the [`Bus`] trait.
//! [`LocalBus`] is the in-process implementation shipped with this crate.
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tokio::sync::mpsc;

mod error;
pub use error::BusError;

mod local;
pub use local::LocalBus;

static DEFAULT_BUS: OnceLock<Arc<dyn Bus>> = OnceLock::new();

/// Message delivered to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub subject: String,
    /// Subject the sender expects an answer on, if any.
    pub reply: Option<String>,
    pub payload: Vec<u8>,
}

/// Stream of messages for one subject.
///
/// Dropping the subscription unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    subject: String,
    rx: mpsc::UnboundedReceiver<BusMessage>,
}

impl Subscription {
    pub fn new(subject: impl Into<String>, rx: mpsc::UnboundedReceiver<BusMessage>) -> Self {
        Self {
            subject: subject.into(),
            rx,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Wait for the next message; `None` once the bus side is gone.
    pub async fn next(&mut self) -> Option<BusMessage> {
        self.rx.recv().await
    }
}

#[async_trait]
pub trait Bus: Send + Sync + 'static {
    /// Whether the underlying connection is established.
    fn is_connected(&self) -> bool;

    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError>;

    async fn publish_request(
        &self,
        subject: &str,
        reply: &str,
        payload: Vec<u8>,
    ) -> Result<(), BusError>;

    async fn subscribe(&self, subject: &str) -> Result<Subscription, BusError>;
}

/// Install the process-wide bus used when registration options carry none.
///
/// Can be called once per process.
pub fn install_default_bus(bus: Arc<dyn Bus>) -> Result<(), BusError> {
    DEFAULT_BUS
        .set(bus)
        .map_err(|_| BusError::DefaultAlreadyInstalled)
}

/// Process-wide bus, if one was installed.
pub fn default_bus() -> Option<Arc<dyn Bus>> {
    DEFAULT_BUS.get().cloned()
}
