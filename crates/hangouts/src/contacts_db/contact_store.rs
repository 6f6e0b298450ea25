//! Contact storage and lookup operations
use crate::contacts_db::schema::*;
use crate::contacts_db::DbPool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info};

const CONTACT_COLUMNS: &str = "_id, name, firstname, phone, email, address, photo";

pub struct ContactStore {
    pool: DbPool,
}

impl ContactStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn get_conn(&self) -> anyhow::Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| anyhow::anyhow!("Failed to get connection from pool: {}", e))
    }

    /// Insert a contact and return its new row id. The contact's own `id` is ignored.
    ///
    /// Nothing is validated here; a missing required column surfaces as an error
    /// from SQLite.
    pub fn insert_contact(&self, contact: &Contact) -> anyhow::Result<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO contacts (name, firstname, phone, email, address, photo)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &contact.name,
                &contact.firstname,
                &contact.phone,
                &contact.email,
                &contact.address,
                &contact.photo,
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Inserted contact {} ({})", id, contact.phone);
        Ok(id)
    }

    /// Overwrite every field of the contact matching `contact.id`.
    /// Returns the number of rows changed, `0` when no such contact exists.
    pub fn update_contact(&self, contact: &Contact) -> anyhow::Result<usize> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            "UPDATE contacts
             SET name = ?1, firstname = ?2, phone = ?3, email = ?4, address = ?5, photo = ?6
             WHERE _id = ?7",
            params![
                &contact.name,
                &contact.firstname,
                &contact.phone,
                &contact.email,
                &contact.address,
                &contact.photo,
                contact.id,
            ],
        )?;
        debug!("Updated contact {} ({} rows)", contact.id, updated);
        Ok(updated)
    }

    /// Delete a contact together with its whole message thread.
    ///
    /// Both deletes run in one transaction, so a failure can never leave messages
    /// behind without their owner. Returns the number of contact rows removed.
    pub fn delete_contact(&self, contact_id: i64) -> anyhow::Result<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let messages = tx.execute("DELETE FROM messages WHERE contact_id = ?1", [contact_id])?;
        let deleted = tx.execute("DELETE FROM contacts WHERE _id = ?1", [contact_id])?;
        tx.commit()?;

        info!(
            "Deleted contact {} ({} rows) and {} messages",
            contact_id, deleted, messages
        );
        Ok(deleted)
    }

    pub fn get_contact_by_id(&self, contact_id: i64) -> anyhow::Result<Option<Contact>> {
        let conn = self.get_conn()?;
        let contact = conn
            .query_row(
                &format!("SELECT {} FROM contacts WHERE _id = ?1", CONTACT_COLUMNS),
                [contact_id],
                row_to_contact,
            )
            .optional()?;
        Ok(contact)
    }

    /// All contacts ordered by name. Always a fresh query.
    pub fn get_all_contacts(&self) -> anyhow::Result<Vec<Contact>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM contacts ORDER BY name ASC, _id ASC",
            CONTACT_COLUMNS
        ))?;
        let contacts = stmt
            .query_map([], row_to_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(contacts)
    }

    /// First contact (lowest id) whose phone matches exactly.
    pub fn get_contact_by_phone(&self, phone: &str) -> anyhow::Result<Option<Contact>> {
        let conn = self.get_conn()?;
        let contact = conn
            .query_row(
                &format!(
                    "SELECT {} FROM contacts WHERE phone = ?1 ORDER BY _id ASC LIMIT 1",
                    CONTACT_COLUMNS
                ),
                [phone],
                row_to_contact,
            )
            .optional()?;
        Ok(contact)
    }

    /// Return the contact for `phone`, creating a placeholder named after the
    /// number when none exists. The boolean is `true` when a contact was created.
    ///
    /// Lookup and insert share an immediate transaction, so concurrent callers for
    /// the same unknown number end up with a single contact.
    pub fn find_or_create_by_phone(&self, phone: &str) -> anyhow::Result<(Contact, bool)> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = tx
            .query_row(
                &format!(
                    "SELECT {} FROM contacts WHERE phone = ?1 ORDER BY _id ASC LIMIT 1",
                    CONTACT_COLUMNS
                ),
                [phone],
                row_to_contact,
            )
            .optional()?;
        if let Some(contact) = existing {
            tx.commit()?;
            return Ok((contact, false));
        }

        let mut contact = Contact::new(phone, phone);
        tx.execute(
            "INSERT INTO contacts (name, firstname, phone, email, address, photo)
             VALUES (?1, ?2, ?3, NULL, NULL, NULL)",
            params![&contact.name, &contact.firstname, &contact.phone],
        )?;
        contact.id = tx.last_insert_rowid();
        tx.commit()?;

        info!("Created contact {} for unknown number {}", contact.id, phone);
        Ok((contact, true))
    }

    pub fn count(&self) -> anyhow::Result<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn row_to_contact(row: &Row) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        name: row.get(1)?,
        firstname: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        address: row.get(5)?,
        photo: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::contacts_db::{Contact, ContactsDatabase, Message};

    fn full_contact() -> Contact {
        Contact {
            id: -1,
            name: "Doe".to_string(),
            firstname: "Jane".to_string(),
            phone: "555-0100".to_string(),
            email: Some("jane@example.org".to_string()),
            address: Some("1 Main Street".to_string()),
            photo: Some("file:///photos/jane.jpg".to_string()),
        }
    }

    #[test]
    fn test_insert_then_get_round_trips_every_field() {
        let db = ContactsDatabase::new_in_memory().unwrap();
        let contact = full_contact();

        let id = db.contacts.insert_contact(&contact).unwrap();
        assert!(id > 0);

        let stored = db.contacts.get_contact_by_id(id).unwrap().unwrap();
        assert_eq!(stored, Contact { id, ..contact });
    }

    #[test]
    fn test_missing_contact_is_none() {
        let db = ContactsDatabase::new_in_memory().unwrap();
        assert!(db.contacts.get_contact_by_id(42).unwrap().is_none());
    }

    #[test]
    fn test_get_all_contacts_is_sorted_by_name() {
        let db = ContactsDatabase::new_in_memory().unwrap();
        for name in ["Martin", "Adams", "Zola", "Baker", "Adams"] {
            db.contacts.insert_contact(&Contact::new(name, "555-0000")).unwrap();
        }

        let names: Vec<String> = db
            .contacts
            .get_all_contacts()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Adams", "Adams", "Baker", "Martin", "Zola"]);
    }

    #[test]
    fn test_update_contact() {
        let db = ContactsDatabase::new_in_memory().unwrap();
        let id = db.contacts.insert_contact(&full_contact()).unwrap();

        let mut contact = db.contacts.get_contact_by_id(id).unwrap().unwrap();
        contact.phone = "555-0199".to_string();
        contact.email = None;
        assert_eq!(db.contacts.update_contact(&contact).unwrap(), 1);
        assert_eq!(db.contacts.get_contact_by_id(id).unwrap().unwrap(), contact);
    }

    #[test]
    fn test_update_missing_contact_affects_no_rows() {
        let db = ContactsDatabase::new_in_memory().unwrap();
        let mut contact = full_contact();
        contact.id = 77;
        assert_eq!(db.contacts.update_contact(&contact).unwrap(), 0);
    }

    #[test]
    fn test_delete_contact_removes_its_messages() {
        let db = ContactsDatabase::new_in_memory().unwrap();
        let id = db.contacts.insert_contact(&full_contact()).unwrap();
        let other = db.contacts.insert_contact(&Contact::new("Roe", "555-0101")).unwrap();
        for i in 0..3 {
            db.messages
                .insert_message(&Message::at(id, format!("msg {}", i), i % 2 == 0, 1_000 + i))
                .unwrap();
        }
        db.messages.insert_message(&Message::at(other, "keep", false, 5)).unwrap();

        assert_eq!(db.contacts.delete_contact(id).unwrap(), 1);

        assert!(db.contacts.get_contact_by_id(id).unwrap().is_none());
        assert!(db.messages.get_messages_for_contact(id).unwrap().is_empty());
        assert_eq!(db.messages.get_messages_for_contact(other).unwrap().len(), 1);
        assert_eq!(db.get_stats().unwrap().total_messages, 1);
    }

    #[test]
    fn test_delete_missing_contact_returns_zero() {
        let db = ContactsDatabase::new_in_memory().unwrap();
        assert_eq!(db.contacts.delete_contact(9).unwrap(), 0);
    }

    #[test]
    fn test_get_contact_by_phone() {
        let db = ContactsDatabase::new_in_memory().unwrap();
        assert!(db.contacts.get_contact_by_phone("555-0100").unwrap().is_none());

        let id = db.contacts.insert_contact(&full_contact()).unwrap();
        let found = db.contacts.get_contact_by_phone("555-0100").unwrap().unwrap();
        assert_eq!(found.id, id);
    }

    #[test]
    fn test_get_contact_by_phone_first_match_wins() {
        let db = ContactsDatabase::new_in_memory().unwrap();
        let first = db.contacts.insert_contact(&Contact::new("Zed", "555-0100")).unwrap();
        db.contacts.insert_contact(&Contact::new("Abe", "555-0100")).unwrap();

        let found = db.contacts.get_contact_by_phone("555-0100").unwrap().unwrap();
        assert_eq!(found.id, first);
    }

    #[test]
    fn test_find_or_create_by_phone() {
        let db = ContactsDatabase::new_in_memory().unwrap();

        let (created, was_created) = db.contacts.find_or_create_by_phone("555-9999").unwrap();
        assert!(was_created);
        assert_eq!(created.name, "555-9999");
        assert_eq!(created.phone, "555-9999");
        assert!(created.firstname.is_empty());
        assert!(created.email.is_none());

        let (found, was_created) = db.contacts.find_or_create_by_phone("555-9999").unwrap();
        assert!(!was_created);
        assert_eq!(found, created);
        assert_eq!(db.contacts.count().unwrap(), 1);
    }
}
