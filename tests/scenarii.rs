//! Shared helpers that build mocked worlds for the integration tests

use chrono::{DateTime, Duration, Utc};

use calmerge::event::{EventStatus, EventTime, SourceEvent};
use calmerge::mock_service::MockService;
use calmerge::store::MemoryStore;
use calmerge::translate::PROP_SOURCE_EVENT_ID;
use calmerge::{MergeConfig, Merger};

/// A confirmed one-hour event starting at `start`
pub fn event_starting_at(id: &str, updated: &str, title: &str, start: DateTime<Utc>) -> SourceEvent {
    SourceEvent {
        id: id.to_string(),
        updated: updated.to_string(),
        status: EventStatus::Confirmed,
        summary: Some(title.to_string()),
        description: Some(format!("About: {}", title)),
        location: None,
        start: Some(EventTime::Moment { date_time: start, time_zone: None }),
        end: Some(EventTime::Moment { date_time: start + Duration::hours(1), time_zone: None }),
        attendees: Vec::new(),
        recurrence: Vec::new(),
        reminders: None,
        transparency: None,
        visibility: None,
        organizer: None,
        conference_data: None,
        attachments: None,
    }
}

/// A confirmed one-hour event starting `offset_hours` from now (i.e. well within the default window)
pub fn timed_event(id: &str, updated: &str, title: &str, offset_hours: i64) -> SourceEvent {
    event_starting_at(id, updated, title, Utc::now() + Duration::hours(offset_hours))
}

/// The bare tombstone a service typically yields for a cancelled event
pub fn cancelled_stub(id: &str, updated: &str) -> SourceEvent {
    SourceEvent {
        id: id.to_string(),
        updated: updated.to_string(),
        status: EventStatus::Cancelled,
        summary: None,
        description: None,
        location: None,
        start: None,
        end: None,
        attendees: Vec::new(),
        recurrence: Vec::new(),
        reminders: None,
        transparency: None,
        visibility: None,
        organizer: None,
        conference_data: None,
        attachments: None,
    }
}

/// A world with a single read-only source calendar (id `work`) holding `events`
pub fn single_calendar_world(events: Vec<SourceEvent>) -> MockService {
    let mut service = MockService::new();
    service.add_source_calendar("work", "Work");
    for event in events {
        service.add_source_event("work", event);
    }
    service
}

/// A merger over `service`, with an in-memory mapping store and the default configuration
pub fn merger_over(service: MockService) -> Merger<MockService, MemoryStore> {
    Merger::new(service, MemoryStore::new(), MergeConfig::default())
}

/// The destination-side id of the mirrored copy of `source_event_id`, found through its provenance block
#[allow(dead_code)]
pub fn mirrored_id_of(service: &MockService, destination_id: &str, source_event_id: &str) -> String {
    service.mirrored_events(destination_id).iter()
        .find(|(_, body)| {
            body.extended_properties.private.get(PROP_SOURCE_EVENT_ID).map(|id| id.as_str()) == Some(source_event_id)
        })
        .map(|(id, _)| id.clone())
        .unwrap_or_else(|| panic!("No mirrored copy of source event {}", source_event_id))
}
