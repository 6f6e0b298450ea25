//! Conversation thread view model
//!
//! Consecutive messages from the same side within the same clock minute share a
//! single timestamp label; see [`timestamp_visibility`].

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;

use crate::contacts_db::Message;
use crate::presenter::{diff, Keyed, ListUpdate};

const MILLIS_PER_MINUTE: i64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Sent,
    Received,
}

/// What one bubble of the thread shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRow {
    pub message_id: i64,
    pub body: String,
    pub direction: Direction,
    /// `HH:MM` in the presenter's time zone, `None` when the label is hidden.
    pub time_label: Option<String>,
}

impl MessageRow {
    pub fn shows_timestamp(&self) -> bool {
        self.time_label.is_some()
    }
}

impl Keyed for MessageRow {
    type Key = i64;

    fn key(&self) -> i64 {
        self.message_id
    }
}

/// For each message of a thread ordered by timestamp, whether its time label is shown.
pub fn timestamp_visibility(messages: &[Message]) -> Vec<bool> {
    messages
        .iter()
        .enumerate()
        .map(|(i, current)| match i.checked_sub(1).map(|p| &messages[p]) {
            None => true,
            Some(previous) if previous.is_sent != current.is_sent => true,
            Some(previous) => {
                minute_of(previous.timestamp) != minute_of(current.timestamp)
            }
        })
        .collect()
}

fn minute_of(timestamp_ms: i64) -> i64 {
    timestamp_ms.div_euclid(MILLIS_PER_MINUTE)
}

/// `HH:MM` of `timestamp_ms` in `tz`, using the offset in force at that instant.
pub fn format_clock<Tz>(timestamp_ms: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match DateTime::<Utc>::from_timestamp_millis(timestamp_ms) {
        Some(dt) => dt.with_timezone(tz).format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

/// Holds the thread currently on screen.
///
/// Labels are recomputed for the whole thread on every refresh, so appending a
/// message can also change the row above it.
#[derive(Debug)]
pub struct MessageListPresenter<Tz: TimeZone = Local> {
    messages: Vec<Message>,
    rows: Vec<MessageRow>,
    tz: Tz,
}

impl Default for MessageListPresenter<Local> {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListPresenter<Local> {
    /// Presenter labelling times in the machine's local time zone.
    pub fn new() -> Self {
        Self::with_timezone(Local)
    }
}

impl<Tz> MessageListPresenter<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub fn with_timezone(tz: Tz) -> Self {
        Self {
            messages: Vec::new(),
            rows: Vec::new(),
            tz,
        }
    }

    /// Replace the snapshot with a fresh `get_messages_for_contact()` result.
    pub fn submit(&mut self, messages: Vec<Message>) -> ListUpdate {
        let rows = self.build_rows(&messages);
        let diff = diff(&self.rows, &rows);
        self.messages = messages;
        self.rows = rows;
        ListUpdate {
            diff,
            is_empty: self.rows.is_empty(),
        }
    }

    fn build_rows(&self, messages: &[Message]) -> Vec<MessageRow> {
        messages
            .iter()
            .zip(timestamp_visibility(messages))
            .map(|(message, show)| MessageRow {
                message_id: message.id,
                body: message.message.clone(),
                direction: if message.is_sent { Direction::Sent } else { Direction::Received },
                time_label: show.then(|| format_clock(message.timestamp, &self.tz)),
            })
            .collect()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn rows(&self) -> &[MessageRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use chrono_tz::Europe::Paris;

    use crate::presenter::ListChange;

    const T0: i64 = 1_700_000_040_000; // exactly on a minute boundary
    const WINTER_NOON_UTC: i64 = 1_705_320_000_000; // 2024-01-15 12:00:00 UTC
    const SUMMER_NOON_UTC: i64 = 1_721_044_800_000; // 2024-07-15 12:00:00 UTC

    fn msg(id: i64, is_sent: bool, timestamp: i64) -> Message {
        Message { id, ..Message::at(1, format!("m{}", id), is_sent, timestamp) }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_same_minute_same_sender_is_grouped() {
        let thread = vec![msg(1, true, T0), msg(2, true, T0 + 10_000), msg(3, true, T0 + 70_000)];
        assert_eq!(timestamp_visibility(&thread), vec![true, false, true]);
    }

    #[test]
    fn test_sender_change_always_shows() {
        let thread = vec![msg(1, true, T0), msg(2, false, T0 + 5_000)];
        assert_eq!(timestamp_visibility(&thread), vec![true, true]);
    }

    #[test]
    fn test_minute_boundary_not_elapsed_time() {
        // 2 seconds apart but across a minute boundary
        let thread = vec![msg(1, false, T0 - 1_000), msg(2, false, T0 + 1_000)];
        assert_eq!(timestamp_visibility(&thread), vec![true, true]);
    }

    #[test]
    fn test_empty_thread() {
        assert!(timestamp_visibility(&[]).is_empty());
        let mut presenter = MessageListPresenter::with_timezone(utc());
        assert!(presenter.submit(Vec::new()).is_empty);
    }

    #[test]
    fn test_format_clock() {
        // 2023-11-14 22:14:00 UTC
        assert_eq!(format_clock(T0, &utc()), "22:14");
        let paris = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(format_clock(T0, &paris), "23:14");
    }

    #[test]
    fn test_labels_follow_daylight_saving_per_message() {
        assert_eq!(format_clock(WINTER_NOON_UTC, &Paris), "13:00");
        assert_eq!(format_clock(SUMMER_NOON_UTC, &Paris), "14:00");

        let mut presenter = MessageListPresenter::with_timezone(Paris);
        presenter.submit(vec![msg(1, false, WINTER_NOON_UTC), msg(2, false, SUMMER_NOON_UTC)]);
        let labels: Vec<_> = presenter.rows().iter().map(|r| r.time_label.as_deref()).collect();
        assert_eq!(labels, vec![Some("13:00"), Some("14:00")]);
    }

    #[test]
    fn test_local_presenter_resolves_offset_per_timestamp() {
        let mut presenter = MessageListPresenter::new();
        presenter.submit(vec![msg(1, true, WINTER_NOON_UTC), msg(2, true, SUMMER_NOON_UTC)]);

        for (row, ts) in presenter.rows().iter().zip([WINTER_NOON_UTC, SUMMER_NOON_UTC]) {
            let expected = Local.timestamp_millis_opt(ts).unwrap().format("%H:%M").to_string();
            assert_eq!(row.time_label.as_deref(), Some(expected.as_str()));
        }
    }

    #[test]
    fn test_rows_carry_direction_and_labels() {
        let mut presenter = MessageListPresenter::with_timezone(utc());
        presenter.submit(vec![msg(1, true, T0), msg(2, true, T0 + 1_000), msg(3, false, T0 + 2_000)]);

        let rows = presenter.rows();
        assert_eq!(rows[0].direction, Direction::Sent);
        assert_eq!(rows[0].time_label.as_deref(), Some("22:14"));
        assert!(!rows[1].shows_timestamp());
        assert_eq!(rows[2].direction, Direction::Received);
        assert!(rows[2].shows_timestamp());
    }

    #[test]
    fn test_append_in_same_minute_is_single_insert() {
        let mut presenter = MessageListPresenter::with_timezone(utc());
        presenter.submit(vec![msg(1, true, T0)]);

        let update = presenter.submit(vec![msg(1, true, T0), msg(2, true, T0 + 3_000)]);
        assert_eq!(update.diff.changes, vec![ListChange::Inserted { index: 1 }]);
        assert!(!presenter.rows()[1].shows_timestamp());
    }

    #[test]
    fn test_label_change_is_reported_as_update() {
        let mut presenter = MessageListPresenter::with_timezone(utc());
        presenter.submit(vec![msg(1, true, T0), msg(3, true, T0 + 5_000)]);
        assert!(!presenter.rows()[1].shows_timestamp());

        // an earlier received message slots in between and splits the group
        let update = presenter.submit(vec![
            msg(1, true, T0),
            msg(2, false, T0 + 1_000),
            msg(3, true, T0 + 5_000),
        ]);
        assert_eq!(update.diff.inserted().collect::<Vec<_>>(), vec![1]);
        assert_eq!(update.diff.updated().collect::<Vec<_>>(), vec![2]);
        assert!(presenter.rows()[2].shows_timestamp());
    }
}
