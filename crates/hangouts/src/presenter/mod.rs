//! In-memory list snapshots for display, refreshed by diffing against the previous snapshot
pub mod diff;
pub mod contact_list;
pub mod message_list;
pub use diff::{diff, Keyed, ListChange, ListDiff};
pub use contact_list::{ContactListPresenter, ContactRow};
pub use message_list::{timestamp_visibility, Direction, MessageListPresenter, MessageRow};

/// Result of submitting a new snapshot to a presenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListUpdate {
    pub diff: ListDiff,
    /// `true` when the new snapshot has no rows and the empty state should show.
    pub is_empty: bool,
}
