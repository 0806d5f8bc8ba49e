use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tracing::trace;

use crate::bus::{Bus, BusError, BusMessage, Subscription};

const INBOX_PREFIX: &str = "_INBOX.";

/// In-process bus with exact-match subjects.
///
/// Every subscriber of a subject receives its own copy of each message.
/// Cloning shares the same fabric.
#[derive(Clone)]
pub struct LocalBus {
    inner: Arc<Inner>,
}

struct Inner {
    connected: AtomicBool,
    subjects: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<BusMessage>>>>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                connected: AtomicBool::new(true),
                subjects: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Drop every subscription and refuse further traffic.
    pub async fn disconnect(&self) {
        self.inner.connected.store(false, Ordering::Release);
        self.inner.subjects.lock().await.clear();
    }

    /// Send a request on `subject` and wait for the first reply on a fresh inbox.
    pub async fn request(
        &self,
        subject: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<BusMessage, BusError> {
        let inbox = new_inbox();
        let mut sub = self.subscribe(&inbox).await?;
        self.publish_request(subject, &inbox, payload).await?;

        match tokio::time::timeout(timeout, sub.next()).await {
            Ok(Some(msg)) => Ok(msg),
            Ok(None) => Err(BusError::Closed),
            Err(_) => Err(BusError::Timeout(timeout)),
        }
    }

    /// Number of live subscriptions on `subject`.
    pub async fn subscribers(&self, subject: &str) -> usize {
        self.inner
            .subjects
            .lock()
            .await
            .get(subject)
            .map(|subs| subs.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    async fn deliver(&self, msg: BusMessage) -> Result<(), BusError> {
        if !self.is_connected() {
            return Err(BusError::NotConnected);
        }
        let mut subjects = self.inner.subjects.lock().await;
        if let Some(subs) = subjects.get_mut(&msg.subject) {
            subs.retain(|tx| tx.send(msg.clone()).is_ok());
            trace!(subject = %msg.subject, receivers = subs.len(), "message delivered");
            if subs.is_empty() {
                subjects.remove(&msg.subject);
            }
        }
        Ok(())
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bus for LocalBus {
    fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError> {
        self.deliver(BusMessage {
            subject: subject.to_string(),
            reply: None,
            payload,
        })
        .await
    }

    async fn publish_request(
        &self,
        subject: &str,
        reply: &str,
        payload: Vec<u8>,
    ) -> Result<(), BusError> {
        self.deliver(BusMessage {
            subject: subject.to_string(),
            reply: Some(reply.to_string()),
            payload,
        })
        .await
    }

    async fn subscribe(&self, subject: &str) -> Result<Subscription, BusError> {
        if !self.is_connected() {
            return Err(BusError::NotConnected);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .subjects
            .lock()
            .await
            .entry(subject.to_string())
            .or_default()
            .push(tx);
        Ok(Subscription::new(subject, rx))
    }
}

fn new_inbox() -> String {
    format!("{INBOX_PREFIX}{}", uuid::Uuid::new_v4().simple())
}
