//! Source events, and the destination-compatible bodies mirrored from them

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// The lifecycle status of an event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Confirmed,
    Tentative,
    Cancelled,
}

impl Default for EventStatus {
    fn default() -> Self {
        EventStatus::Confirmed
    }
}

/// The start or end of an event: either a whole day, or a precise moment with its time zone.
///
/// The two forms are kept strictly apart: mirroring an event never upgrades an
/// all-day date to a timestamp, nor the other way around.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTime {
    AllDay {
        date: NaiveDate,
    },
    Moment {
        #[serde(rename = "dateTime")]
        date_time: DateTime<Utc>,
        #[serde(rename = "timeZone", skip_serializing_if = "Option::is_none")]
        time_zone: Option<String>,
    },
}

impl EventTime {
    /// The instant this time describes, for window comparisons.
    /// All-day dates count as midnight UTC of that day.
    pub fn as_instant(&self) -> DateTime<Utc> {
        match self {
            EventTime::Moment { date_time, .. } => *date_time,
            EventTime::AllDay { date } => {
                let midnight = date.and_hms_opt(0, 0, 0).unwrap(/* midnight always exists */);
                Utc.from_utc_datetime(&midnight)
            },
        }
    }
}

/// An attendee as the source calendar reports it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<String>,
    /// Whether this attendee organizes the event on the source calendar
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_guests: Option<u32>,
}

/// The projection of an [`Attendee`] that is safe to mirror: identity and response only
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirroredAttendee {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<String>,
}

impl From<&Attendee> for MirroredAttendee {
    fn from(attendee: &Attendee) -> Self {
        Self {
            email: attendee.email.clone(),
            display_name: attendee.display_name.clone(),
            response_status: attendee.response_status.clone(),
        }
    }
}

/// A single reminder override (e.g. "popup, 10 minutes before")
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReminderOverride {
    pub method: String,
    pub minutes: u32,
}

/// The reminder settings of an event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    pub use_default: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<ReminderOverride>,
}

/// An event fetched from a source calendar.
///
/// These are listed fresh on every run, within a bounded time window, and are never
/// mutated by this crate. Recurring events are expanded by the service into
/// individual occurrence instances, so each instance shows up as its own `SourceEvent`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEvent {
    pub id: String,
    /// The modification stamp of the event. This is opaque: it is compared byte-wise
    /// against the stored stamp of the mirrored copy, and never parsed.
    pub updated: String,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Cancelled events may come through as bare stubs without a start or an end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventTime>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<Attendee>,
    /// RRULE/RDATE/EXDATE lines, kept verbatim
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recurrence: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Reminders>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,

    // The fields below only make sense on the original calendar. They are listed here
    // so that a translator can knowingly leave them behind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conference_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<serde_json::Value>,
}

/// The private extended-property block stamped on every mirrored event.
///
/// This records where a mirrored copy came from, so that orphaned copies can
/// in principle be audited later on.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedProperties {
    pub private: HashMap<String, String>,
}

/// The destination-compatible payload of a mirrored event.
///
/// Produced by [`translate`](crate::translate::translate), written by inserts and
/// patches, and never read back from the destination.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventTime>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<MirroredAttendee>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recurrence: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Reminders>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(default)]
    pub status: EventStatus,
    pub extended_properties: ExtendedProperties,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_time_forms_stay_apart() {
        let all_day: EventTime = serde_json::from_str(r#"{"date": "2024-05-12"}"#).unwrap();
        match &all_day {
            EventTime::AllDay { date } => assert_eq!(date.to_string(), "2024-05-12"),
            _ => panic!("an all-day date must not deserialize as a moment"),
        }

        let moment: EventTime = serde_json::from_str(
            r#"{"dateTime": "2024-05-12T09:30:00Z", "timeZone": "Europe/Paris"}"#).unwrap();
        match &moment {
            EventTime::Moment { time_zone, .. } => assert_eq!(time_zone.as_deref(), Some("Europe/Paris")),
            _ => panic!("a timestamp must not deserialize as an all-day date"),
        }

        // And each form serializes back to its own keys
        assert!(serde_json::to_string(&all_day).unwrap().contains("date"));
        assert!(serde_json::to_string(&moment).unwrap().contains("dateTime"));
    }

    #[test]
    fn cancelled_stub_deserializes() {
        let text = r#"{"id": "abc123", "updated": "2024-05-12T10:00:00.000Z", "status": "cancelled"}"#;
        let event: SourceEvent = serde_json::from_str(text).unwrap();
        assert_eq!(event.status, EventStatus::Cancelled);
        assert_eq!(event.start, None);
    }
}
