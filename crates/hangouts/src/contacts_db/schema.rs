//! Record types stored in the contacts database
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Id carried by records that have not been written to the database yet.
pub const UNSAVED_ID: i64 = -1;

/// A stored person/number record.
///
/// `phone` is not unique at the schema level but inbound SMS resolution treats it
/// as a lookup key, first match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Contact {
    pub id: i64,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    pub firstname: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[validate(email(message = "email is not well formed"))]
    pub email: Option<String>,
    pub address: Option<String>,
    /// Opaque reference (usually a URI) to an externally stored picture.
    pub photo: Option<String>,
}

impl Contact {
    /// New, unsaved contact with only the required fields set.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: UNSAVED_ID,
            name: name.into(),
            firstname: String::new(),
            phone: phone.into(),
            email: None,
            address: None,
            photo: None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    /// Trim every field and turn blank optional fields into `None`, the way the
    /// edit form submits them.
    pub fn trimmed(self) -> Self {
        fn optional(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        Self {
            id: self.id,
            name: self.name.trim().to_string(),
            firstname: self.firstname.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: optional(self.email),
            address: optional(self.address),
            photo: optional(self.photo),
        }
    }

    /// "Firstname Name", or just the name when no firstname is stored.
    pub fn display_name(&self) -> String {
        if self.firstname.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.firstname, self.name)
        }
    }
}

/// A single SMS text tied to one contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub contact_id: i64,
    pub message: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// `true` for messages the user sent, `false` for received ones.
    pub is_sent: bool,
}

impl Message {
    /// New, unsaved message stamped with the current time.
    pub fn new(contact_id: i64, message: impl Into<String>, is_sent: bool) -> Self {
        Self::at(contact_id, message, is_sent, chrono::Utc::now().timestamp_millis())
    }

    pub fn at(contact_id: i64, message: impl Into<String>, is_sent: bool, timestamp: i64) -> Self {
        Self {
            id: UNSAVED_ID,
            contact_id,
            message: message.into(),
            timestamp,
            is_sent,
        }
    }
}

/// Row counts and on-disk size
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub total_contacts: i64,
    pub total_messages: i64,
    pub schema_version: i32,
    pub database_size_bytes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_contact_is_unsaved() {
        let contact = Contact::new("Doe", "555-0100");
        assert_eq!(contact.id, UNSAVED_ID);
        assert!(!contact.is_persisted());
        assert!(contact.firstname.is_empty());
    }

    #[test]
    fn test_display_name() {
        let mut contact = Contact::new("Doe", "555-0100");
        assert_eq!(contact.display_name(), "Doe");
        contact.firstname = "Jane".to_string();
        assert_eq!(contact.display_name(), "Jane Doe");
    }

    #[test]
    fn test_validation_requires_name_and_phone() {
        assert!(Contact::new("Doe", "555-0100").validate().is_ok());

        let errors = Contact::new("", "").validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("phone"));
    }

    #[test]
    fn test_trimmed_blanks_become_none() {
        let mut contact = Contact::new("  Doe ", " 555-0100");
        contact.email = Some("   ".to_string());
        contact.address = Some(" 1 Main Street ".to_string());

        let contact = contact.trimmed();
        assert_eq!(contact.name, "Doe");
        assert_eq!(contact.phone, "555-0100");
        assert!(contact.email.is_none());
        assert_eq!(contact.address.as_deref(), Some("1 Main Street"));
    }

    #[test]
    fn test_validation_checks_email_when_present() {
        let mut contact = Contact::new("Doe", "555-0100");
        contact.email = Some("not-an-email".to_string());
        assert!(contact.validate().is_err());

        contact.email = Some("jane@example.org".to_string());
        assert!(contact.validate().is_ok());
    }
}
