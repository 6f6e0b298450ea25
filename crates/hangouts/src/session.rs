//! Foreground/background tracking for the "away since" notice
//!
//! The notice is shown when the app comes back to the foreground after being
//! backgrounded, except on the very first start and when the only reason for
//! leaving was the system photo picker.

use chrono::{DateTime, Utc};

/// Shown once when the app returns from the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundNotice {
    pub backgrounded_at: i64,
}

impl BackgroundNotice {
    /// `yyyy-MM-dd HH:mm:ss` in UTC.
    pub fn formatted(&self) -> String {
        DateTime::<Utc>::from_timestamp_millis(self.backgrounded_at)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    visible_screens: usize,
    first_start: bool,
    photo_selection_active: bool,
    backgrounded_at: Option<i64>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            visible_screens: 0,
            first_start: true,
            photo_selection_active: false,
            backgrounded_at: None,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call before handing control to the photo picker.
    pub fn begin_photo_selection(&mut self) {
        self.photo_selection_active = true;
    }

    pub fn is_foreground(&self) -> bool {
        self.visible_screens > 0
    }

    /// A screen became visible. Returns the notice to show, if any.
    pub fn screen_started(&mut self) -> Option<BackgroundNotice> {
        let returning = self.visible_screens == 0;
        self.visible_screens += 1;
        if !returning {
            return None;
        }

        if self.photo_selection_active {
            self.photo_selection_active = false;
            self.backgrounded_at = None;
            None
        } else if self.first_start {
            self.first_start = false;
            None
        } else {
            self.backgrounded_at
                .take()
                .filter(|ts| *ts > 0)
                .map(|backgrounded_at| BackgroundNotice { backgrounded_at })
        }
    }

    /// A screen stopped being visible at `now` (epoch milliseconds).
    pub fn screen_stopped(&mut self, now: i64) {
        self.visible_screens = self.visible_screens.saturating_sub(1);
        if self.visible_screens == 0 {
            self.backgrounded_at = Some(now);
        }
    }
}
