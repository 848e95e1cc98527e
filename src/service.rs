//! The seam to the remote calendar service

use std::error::Error;

use async_trait::async_trait;

use crate::calendar::{CalendarId, CalendarRef, TimeWindow};
use crate::event::{EventBody, SourceEvent};

/// One page of the account's calendar list
#[derive(Clone, Debug, Default)]
pub struct CalendarPage {
    pub items: Vec<CalendarRef>,
    pub next_page_token: Option<String>,
}

/// One page of a calendar's events
#[derive(Clone, Debug, Default)]
pub struct EventPage {
    pub items: Vec<SourceEvent>,
    pub next_page_token: Option<String>,
}

/// The result of a destination write that can discover its target is gone.
///
/// A missing destination event is a value, not an error: the reconciler branches on it
/// (e.g. to re-insert a copy that was deleted out-of-band), whereas transport failures
/// are reported as `Err` and retried on the next run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteStatus {
    /// The write was applied
    Done,
    /// The destination event does not exist (anymore)
    Missing,
}

/// A remote calendar service, consumed as a capability-backed collaborator.
///
/// Implementations are expected to be honest about pagination: callers follow
/// `next_page_token` until it is `None`, and every item must show up on exactly one page.
#[async_trait]
pub trait CalendarService {
    /// Returns one page of the calendars visible to the account
    async fn list_calendars(&self, page_token: Option<&str>) -> Result<CalendarPage, Box<dyn Error>>;

    /// Returns one page of the events of `calendar_id` within `window` (both edges inclusive).
    ///
    /// When `expand_recurring` is set, recurring events come back as individual
    /// occurrence instances, never as raw recurrence masters.
    async fn list_events(
        &self,
        calendar_id: &CalendarId,
        window: &TimeWindow,
        expand_recurring: bool,
        page_token: Option<&str>,
    ) -> Result<EventPage, Box<dyn Error>>;

    /// Creates an event in `calendar_id` and returns the id the service assigned to it
    async fn insert_event(&mut self, calendar_id: &CalendarId, body: &EventBody) -> Result<String, Box<dyn Error>>;

    /// Overwrites the content of an existing event
    async fn patch_event(
        &mut self,
        calendar_id: &CalendarId,
        event_id: &str,
        body: &EventBody,
    ) -> Result<WriteStatus, Box<dyn Error>>;

    /// Removes an event. Removing an already-gone event reports `Missing`, not an error
    async fn remove_event(&mut self, calendar_id: &CalendarId, event_id: &str) -> Result<WriteStatus, Box<dyn Error>>;

    /// Returns the id of the calendar named `name`, creating it first when it does not
    /// exist yet. Idempotent: calling this twice must not create two calendars.
    ///
    /// Several existing calendars sharing `name` is ambiguous, and an error.
    async fn find_or_create_calendar(&mut self, name: &str) -> Result<CalendarId, Box<dyn Error>>;
}
