use serde::Serialize;

use crate::contacts_db::Contact;
use crate::presenter::{diff, ListUpdate};

/// What one line of the contact list shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactRow {
    pub contact_id: i64,
    pub title: String,
    pub phone: String,
    pub photo: Option<String>,
}

impl From<&Contact> for ContactRow {
    fn from(contact: &Contact) -> Self {
        Self {
            contact_id: contact.id,
            title: contact.display_name(),
            phone: contact.phone.clone(),
            photo: contact.photo.clone().filter(|p| !p.is_empty()),
        }
    }
}

/// Holds the contact list currently on screen.
#[derive(Debug, Default)]
pub struct ContactListPresenter {
    contacts: Vec<Contact>,
}

impl ContactListPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot with a fresh `get_all_contacts()` result.
    pub fn submit(&mut self, contacts: Vec<Contact>) -> ListUpdate {
        let diff = diff(&self.contacts, &contacts);
        self.contacts = contacts;
        ListUpdate {
            diff,
            is_empty: self.contacts.is_empty(),
        }
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn rows(&self) -> Vec<ContactRow> {
        self.contacts.iter().map(ContactRow::from).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::ListChange;

    fn contact(id: i64, name: &str, phone: &str) -> Contact {
        Contact { id, ..Contact::new(name, phone) }
    }

    #[test]
    fn test_empty_snapshot_signals_empty_state() {
        let mut presenter = ContactListPresenter::new();
        let update = presenter.submit(Vec::new());
        assert!(update.is_empty);
        assert!(update.diff.is_empty());
    }

    #[test]
    fn test_first_snapshot_inserts_everything() {
        let mut presenter = ContactListPresenter::new();
        let update = presenter.submit(vec![contact(1, "Adams", "1"), contact(2, "Baker", "2")]);
        assert!(!update.is_empty);
        assert_eq!(update.diff.inserted().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_edit_only_touches_that_row() {
        let mut presenter = ContactListPresenter::new();
        presenter.submit(vec![contact(1, "Adams", "1"), contact(2, "Baker", "2")]);

        let update = presenter.submit(vec![contact(1, "Adams", "1"), contact(2, "Baker", "22")]);
        assert_eq!(update.diff.changes, vec![ListChange::Updated { index: 1 }]);
    }

    #[test]
    fn test_rename_reorders_row() {
        let mut presenter = ContactListPresenter::new();
        presenter.submit(vec![
            contact(1, "Adams", "1"),
            contact(2, "Baker", "2"),
            contact(3, "Clark", "3"),
        ]);

        // Adams renamed to Young moves to the end
        let update = presenter.submit(vec![
            contact(2, "Baker", "2"),
            contact(3, "Clark", "3"),
            contact(1, "Young", "1"),
        ]);
        assert_eq!(update.diff.moved().collect::<Vec<_>>(), vec![(0, 2)]);
        assert_eq!(update.diff.updated().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_rows_use_display_name() {
        let mut presenter = ContactListPresenter::new();
        let mut jane = contact(1, "Doe", "555-0100");
        jane.firstname = "Jane".to_string();
        jane.photo = Some(String::new());
        presenter.submit(vec![jane]);

        let rows = presenter.rows();
        assert_eq!(rows[0].title, "Jane Doe");
        assert_eq!(rows[0].phone, "555-0100");
        assert!(rows[0].photo.is_none());
    }
}
