//! Translation of source events into destination-compatible bodies

use crate::calendar::CalendarId;
use crate::event::{EventBody, ExtendedProperties, MirroredAttendee, SourceEvent};

/// Private extended-property key recording which calendar a mirrored event came from
pub const PROP_SOURCE_CALENDAR_ID: &str = "sourceCalendarId";
/// Private extended-property key recording which source event a mirrored event copies
pub const PROP_SOURCE_EVENT_ID: &str = "sourceEventId";

/// The provenance footer appended to the description of every mirrored event
fn provenance_footer(source_calendar_id: &str, source_event_id: &str) -> String {
    format!("[SyncedFrom] {} | sourceEventId: {}", source_calendar_id, source_event_id)
}

/// Maps a source event to the body of its mirrored copy.
///
/// This is a pure function: no side effects, and the same event always translates to
/// the same body.
///
/// The title, location, start/end (keeping whichever of the all-day or timestamp form
/// was present), recurrence rule set, reminder overrides, transparency, visibility and
/// lifecycle status are carried over as-is. The description gains a provenance footer,
/// attendees are projected down to their identity and response, and a private
/// extended-property block records the source calendar and event ids.
///
/// The organizer identity, conferencing data and attachments are deliberately left
/// behind: they only make sense on the original calendar.
pub fn translate(event: &SourceEvent, source_calendar_id: &CalendarId) -> EventBody {
    let footer = provenance_footer(source_calendar_id, &event.id);
    let description = match &event.description {
        None => footer,
        Some(text) => format!("{}\n\n{}", text, footer),
    };

    let mut extended_properties = ExtendedProperties::default();
    extended_properties.private.insert(PROP_SOURCE_CALENDAR_ID.to_string(), source_calendar_id.clone());
    extended_properties.private.insert(PROP_SOURCE_EVENT_ID.to_string(), event.id.clone());

    EventBody {
        summary: event.summary.clone(),
        description: Some(description),
        location: event.location.clone(),
        start: event.start.clone(),
        end: event.end.clone(),
        attendees: event.attendees.iter().map(MirroredAttendee::from).collect(),
        recurrence: event.recurrence.clone(),
        reminders: event.reminders.clone(),
        transparency: event.transparency.clone(),
        visibility: event.visibility.clone(),
        status: event.status.clone(),
        extended_properties,
    }
}
