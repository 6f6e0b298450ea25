//! Inbound SMS handling
//!
//! Delivery is at-least-once and carries no dedup key: every event handled is
//! stored as a new received message.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::contacts_db::{ContactsDatabase, Message};

/// One received text as delivered by the messaging transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundSms {
    pub sender: String,
    pub body: String,
    /// Arrival time, milliseconds since the Unix epoch.
    pub received_at: i64,
}

impl InboundSms {
    pub fn new(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            body: body.into(),
            received_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Parse one `sender<TAB>body` line as fed to `hangouts listen`.
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);
        let (sender, body) = line.split_once('\t')?;
        Some(Self::new(sender, body))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    Stored {
        contact_id: i64,
        message_id: i64,
        contact_created: bool,
    },
    /// The sender could not be resolved to a contact; the text was discarded.
    Dropped { reason: String },
}

pub struct InboundHandler {
    db: Arc<ContactsDatabase>,
}

impl InboundHandler {
    pub fn new(db: Arc<ContactsDatabase>) -> Self {
        Self { db }
    }

    /// Resolve (or create) the sender's contact and append the text to its thread.
    ///
    /// Failing to create the contact drops the message and is not an error.
    /// Failing to store the message is.
    pub fn handle(&self, event: &InboundSms) -> anyhow::Result<InboundOutcome> {
        let sender = event.sender.as_str();
        if sender.trim().is_empty() {
            warn!("Dropping inbound SMS without originating address");
            return Ok(InboundOutcome::Dropped {
                reason: "missing sender address".to_string(),
            });
        }

        let (contact, contact_created) = match self.db.contacts.find_or_create_by_phone(sender) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("Dropping inbound SMS from {}: contact creation failed: {}", sender, e);
                return Ok(InboundOutcome::Dropped {
                    reason: format!("contact creation failed: {}", e),
                });
            }
        };

        let message = Message::at(contact.id, event.body.clone(), false, event.received_at);
        let message_id = self.db.messages.insert_message(&message)?;

        debug!(
            "Stored inbound SMS {} from {} (contact {}, created: {})",
            message_id, sender, contact.id, contact_created
        );
        Ok(InboundOutcome::Stored {
            contact_id: contact.id,
            message_id,
            contact_created,
        })
    }
}

/// Bounded queue feeding [`spawn_inbound_worker`], sized by `HANGOUTS_INBOUND_QUEUE`.
pub fn inbound_queue(config: &Config) -> (mpsc::Sender<InboundSms>, mpsc::Receiver<InboundSms>) {
    mpsc::channel(config.inbound_queue_size)
}

/// Drain `rx` on a background task until every sender is dropped.
///
/// Each event is handled on the blocking pool. Failures are logged and the event
/// is not retried. The task resolves to the number of messages stored.
pub fn spawn_inbound_worker(
    handler: Arc<InboundHandler>,
    mut rx: mpsc::Receiver<InboundSms>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        info!("Inbound SMS worker started");
        let mut stored = 0usize;
        while let Some(event) = rx.recv().await {
            let handler = Arc::clone(&handler);
            let result = tokio::task::spawn_blocking(move || handler.handle(&event)).await;
            match result {
                Ok(Ok(InboundOutcome::Stored { .. })) => stored += 1,
                Ok(Ok(InboundOutcome::Dropped { reason })) => {
                    debug!("Inbound SMS dropped: {}", reason)
                }
                Ok(Err(e)) => error!("Failed to store inbound SMS: {:#}", e),
                Err(e) => error!("Inbound SMS handler panicked: {}", e),
            }
        }
        info!("Inbound SMS worker stopped after storing {} messages", stored);
        stored
    })
}
