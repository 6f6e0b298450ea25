// hangouts/crates/hangouts/src/lib.rs

pub mod config;
pub mod contacts_db;
pub mod inbound;
pub mod messenger;
pub mod presenter;
pub mod session;
pub mod telemetry;

// Public API exports
pub use config::Config;
pub use contacts_db::{Contact, ContactsDatabase, DatabaseStats, Message, UNSAVED_ID};
pub use inbound::{
    inbound_queue, spawn_inbound_worker, InboundHandler, InboundOutcome, InboundSms,
};
pub use messenger::{LogTransport, Messenger, SmsTransport};
pub use presenter::{
    diff, ContactListPresenter, ContactRow, Keyed, ListChange, ListDiff, ListUpdate,
    MessageListPresenter, MessageRow,
};
pub use session::{BackgroundNotice, SessionState};
