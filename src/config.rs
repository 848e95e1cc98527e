//! Support for library configuration options

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::calendar::TimeWindow;

/// The configuration of a [`Merger`](crate::Merger).
///
/// This is an owned value handed to the merger, so several mergers with different
/// settings can coexist in the same process.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeConfig {
    /// The display name of the destination calendar. It is resolved (or created) again on every run.
    pub destination_calendar_name: String,
    /// How many days in the past a run looks at
    pub lookback_days: i64,
    /// How many days in the future a run looks at
    pub lookahead_days: i64,
    /// The prefix of every property-store key this merger writes
    pub mapping_key_prefix: String,
    /// An overall deadline for a run. When it is exceeded, the run stops cleanly between
    /// two calendars: already-processed calendars stay committed, the remaining ones
    /// will be picked up by the next run.
    pub run_deadline: Option<Duration>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            destination_calendar_name: "Merged".to_string(),
            lookback_days: 30,
            lookahead_days: 365,
            mapping_key_prefix: "calmerge/".to_string(),
            run_deadline: None,
        }
    }
}

impl MergeConfig {
    /// The time window a run starting at `now` considers
    pub fn window_from(&self, now: DateTime<Utc>) -> TimeWindow {
        TimeWindow::around(now, self.lookback_days, self.lookahead_days)
    }
}
