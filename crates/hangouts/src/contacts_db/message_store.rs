//! Message thread storage
use crate::contacts_db::schema::*;
use crate::contacts_db::DbPool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Row};
use tracing::debug;

pub struct MessageStore {
    pool: DbPool,
}

impl MessageStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn get_conn(&self) -> anyhow::Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| anyhow::anyhow!("Failed to get connection from pool: {}", e))
    }

    /// Append a message to its contact's thread and return the new row id.
    /// Fails when `contact_id` does not reference an existing contact.
    pub fn insert_message(&self, message: &Message) -> anyhow::Result<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO messages (contact_id, message, timestamp, is_sent)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                message.contact_id,
                &message.message,
                message.timestamp,
                message.is_sent,
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(
            "Stored {} message {} for contact {}",
            if message.is_sent { "sent" } else { "received" },
            id,
            message.contact_id
        );
        Ok(id)
    }

    /// The contact's thread, oldest first.
    pub fn get_messages_for_contact(&self, contact_id: i64) -> anyhow::Result<Vec<Message>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT _id, contact_id, message, timestamp, is_sent
             FROM messages WHERE contact_id = ?1
             ORDER BY timestamp ASC, _id ASC",
        )?;
        let messages = stmt
            .query_map([contact_id], row_to_message)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(messages)
    }

    pub fn message_count_for_contact(&self, contact_id: i64) -> anyhow::Result<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE contact_id = ?1",
            [contact_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

// timestamp, is_sent and contact_id are nullable in the schema
fn row_to_message(row: &Row) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        contact_id: row.get::<_, Option<i64>>(1)?.unwrap_or(UNSAVED_ID),
        message: row.get(2)?,
        timestamp: row.get::<_, Option<i64>>(3)?.unwrap_or_default(),
        is_sent: row.get::<_, Option<bool>>(4)?.unwrap_or(false),
    })
}
