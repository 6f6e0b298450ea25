//! Outbound SMS sending
//!
//! A message is written to the thread only after the transport accepted it.

use std::sync::Arc;

use anyhow::{bail, Context};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::contacts_db::{ContactsDatabase, Message};

/// The device's SMS sending facility.
#[async_trait]
pub trait SmsTransport: Send + Sync {
    async fn send(&self, destination: &str, body: &str) -> anyhow::Result<()>;
}

/// Transport that only logs. Used when no radio is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

#[async_trait]
impl SmsTransport for LogTransport {
    async fn send(&self, destination: &str, body: &str) -> anyhow::Result<()> {
        info!("SMS to {} ({} chars)", destination, body.chars().count());
        Ok(())
    }
}

pub struct Messenger<T: SmsTransport> {
    db: Arc<ContactsDatabase>,
    transport: T,
}

impl<T: SmsTransport> Messenger<T> {
    pub fn new(db: Arc<ContactsDatabase>, transport: T) -> Self {
        Self { db, transport }
    }

    /// Send `text` to the contact and record it as a sent message.
    pub async fn send(&self, contact_id: i64, text: &str) -> anyhow::Result<Message> {
        let text = text.trim();
        if text.is_empty() {
            bail!("Refusing to send an empty message");
        }

        let contact = self
            .db
            .contacts
            .get_contact_by_id(contact_id)?
            .with_context(|| format!("Contact {} not found", contact_id))?;

        if let Err(e) = self.transport.send(&contact.phone, text).await {
            warn!("Sending SMS to {} failed: {}", contact.phone, e);
            return Err(e.context(format!("Failed to send SMS to {}", contact.phone)));
        }

        let mut message = Message::new(contact.id, text, true);
        message.id = self.db.messages.insert_message(&message)?;
        Ok(message)
    }
}
