//! Calendars as the remote service describes them, and the time window a run considers

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The identifier of a calendar, as the remote service knows it
pub type CalendarId = String;

/// The access level the account has on a given calendar.
///
/// Only the two read-only levels make a calendar eligible for mirroring.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AccessRole {
    Reader,
    FreeBusyReader,
    Owner,
    Writer,
    /// An access level this crate does not know about. It is kept verbatim, and is not eligible for mirroring.
    Other(String),
}

impl AccessRole {
    /// Whether the account can only read this calendar, i.e. whether it is eligible to be mirrored
    pub fn is_read_only(&self) -> bool {
        match self {
            AccessRole::Reader => true,
            AccessRole::FreeBusyReader => true,
            _ => false,
        }
    }
}

impl From<String> for AccessRole {
    fn from(role: String) -> Self {
        match role.as_str() {
            "reader" => AccessRole::Reader,
            "freeBusyReader" => AccessRole::FreeBusyReader,
            "owner" => AccessRole::Owner,
            "writer" => AccessRole::Writer,
            _ => AccessRole::Other(role),
        }
    }
}

impl From<AccessRole> for String {
    fn from(role: AccessRole) -> Self {
        match role {
            AccessRole::Reader => "reader".to_string(),
            AccessRole::FreeBusyReader => "freeBusyReader".to_string(),
            AccessRole::Owner => "owner".to_string(),
            AccessRole::Writer => "writer".to_string(),
            AccessRole::Other(role) => role,
        }
    }
}

/// A calendar as enumerated from the account's subscription list.
///
/// These are listed fresh on every run and never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalendarRef {
    pub id: CalendarId,
    /// The display name of the calendar
    #[serde(default, rename = "summary")]
    pub name: String,
    #[serde(rename = "accessRole")]
    pub access_role: AccessRole,
}

/// The bounded time range a run considers.
///
/// Both edges are inclusive: an event starting exactly at `end` is still mirrored,
/// an event starting right after it is not.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// The window that spans `lookback_days` before `now` to `lookahead_days` after it
    pub fn around(now: DateTime<Utc>, lookback_days: i64, lookahead_days: i64) -> Self {
        Self {
            start: now - Duration::days(lookback_days),
            end: now + Duration::days(lookahead_days),
        }
    }

    /// Whether an event starting at `instant` falls within this window
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        self.start <= *instant && *instant <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_role_eligibility() {
        assert!(AccessRole::Reader.is_read_only());
        assert!(AccessRole::FreeBusyReader.is_read_only());
        assert!(AccessRole::Owner.is_read_only() == false);
        assert!(AccessRole::Writer.is_read_only() == false);
        assert!(AccessRole::Other("commenter".to_string()).is_read_only() == false);
    }

    #[test]
    fn access_role_round_trip() {
        let role = AccessRole::from("freeBusyReader".to_string());
        assert_eq!(role, AccessRole::FreeBusyReader);
        assert_eq!(String::from(role), "freeBusyReader");

        let unknown = AccessRole::from("commenter".to_string());
        assert_eq!(unknown, AccessRole::Other("commenter".to_string()));
        assert_eq!(String::from(unknown), "commenter");
    }

    #[test]
    fn window_edges_are_inclusive() {
        let now = Utc::now();
        let window = TimeWindow::around(now, 30, 365);

        assert!(window.contains(&now));
        assert!(window.contains(&window.start));
        assert!(window.contains(&window.end));
        assert!(window.contains(&(window.start - Duration::seconds(1))) == false);
        assert!(window.contains(&(window.end + Duration::seconds(1))) == false);
    }
}
