//! An in-memory calendar service, so that integration tests can mock the remote service

use std::collections::HashMap;
use std::error::Error;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::calendar::{AccessRole, CalendarId, CalendarRef, TimeWindow};
use crate::event::{EventBody, EventStatus, SourceEvent};
use crate::mock_behaviour::MockBehaviour;
use crate::service::{CalendarPage, CalendarService, EventPage, WriteStatus};

/// One calendar known to a [`MockService`].
///
/// Source events are what `list_events` yields (for read-only subscriptions);
/// mirrored events are what destination writes land in (for the merged calendar).
#[derive(Debug)]
struct MockCalendar {
    reference: CalendarRef,
    source_events: Vec<SourceEvent>,
    mirrored: HashMap<String, EventBody>,
}

/// An in-memory [`CalendarService`].
///
/// Pages can be made arbitrarily small to exercise pagination, individual operations
/// can be made to fail through a [`MockBehaviour`], and every event write is counted so
/// tests can assert that an unchanged world triggers zero writes.
#[derive(Debug)]
pub struct MockService {
    calendars: Vec<MockCalendar>,
    page_size: usize,
    behaviour: Mutex<MockBehaviour>,
    insert_count: u32,
    patch_count: u32,
    remove_count: u32,
}

impl MockService {
    pub fn new() -> Self {
        Self::with_page_size(50)
    }

    /// A service whose list calls return at most `page_size` items per page
    pub fn with_page_size(page_size: usize) -> Self {
        assert!(page_size > 0, "a page must be able to hold at least one item");
        Self {
            calendars: Vec::new(),
            page_size,
            behaviour: Mutex::new(MockBehaviour::new()),
            insert_count: 0,
            patch_count: 0,
            remove_count: 0,
        }
    }

    pub fn set_behaviour(&mut self, behaviour: MockBehaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    /// Adds a calendar with an arbitrary access role
    pub fn add_calendar(&mut self, id: &str, name: &str, access_role: AccessRole) {
        self.calendars.push(MockCalendar {
            reference: CalendarRef {
                id: id.to_string(),
                name: name.to_string(),
                access_role,
            },
            source_events: Vec::new(),
            mirrored: HashMap::new(),
        });
    }

    /// Adds a read-only subscription, i.e. a calendar eligible for mirroring
    pub fn add_source_calendar(&mut self, id: &str, name: &str) {
        self.add_calendar(id, name, AccessRole::Reader);
    }

    pub fn add_source_event(&mut self, calendar_id: &str, event: SourceEvent) {
        self.calendar_mut(calendar_id).source_events.push(event);
    }

    /// Replaces the source event sharing `event.id`, e.g. to simulate an upstream edit
    pub fn update_source_event(&mut self, calendar_id: &str, event: SourceEvent) {
        let events = &mut self.calendar_mut(calendar_id).source_events;
        match events.iter_mut().find(|candidate| candidate.id == event.id) {
            Some(existing) => *existing = event,
            None => panic!("No source event {} in mocked calendar {}", event.id, calendar_id),
        }
    }

    /// Deletes a mirrored copy behind the merger's back, to simulate an out-of-band deletion
    pub fn remove_mirrored_event(&mut self, calendar_id: &str, event_id: &str) {
        if self.calendar_mut(calendar_id).mirrored.remove(event_id).is_none() {
            panic!("No mirrored event {} in mocked calendar {}", event_id, calendar_id);
        }
    }

    /// The mirrored copies currently present in `calendar_id`
    pub fn mirrored_events(&self, calendar_id: &str) -> &HashMap<String, EventBody> {
        &self.calendar(calendar_id).mirrored
    }

    pub fn calendar_id_by_name(&self, name: &str) -> Option<CalendarId> {
        self.calendars.iter()
            .find(|calendar| calendar.reference.name == name)
            .map(|calendar| calendar.reference.id.clone())
    }

    pub fn insert_count(&self) -> u32 { self.insert_count }
    pub fn patch_count(&self) -> u32 { self.patch_count }
    pub fn remove_count(&self) -> u32 { self.remove_count }

    /// Every write call issued against events so far, regardless of the calendar
    pub fn event_write_count(&self) -> u32 {
        self.insert_count + self.patch_count + self.remove_count
    }

    fn calendar(&self, calendar_id: &str) -> &MockCalendar {
        self.calendars.iter()
            .find(|calendar| calendar.reference.id == calendar_id)
            .unwrap_or_else(|| panic!("No mocked calendar {}", calendar_id))
    }

    fn calendar_mut(&mut self, calendar_id: &str) -> &mut MockCalendar {
        self.calendars.iter_mut()
            .find(|calendar| calendar.reference.id == calendar_id)
            .unwrap_or_else(|| panic!("No mocked calendar {}", calendar_id))
    }

    /// Slices `items` into the page starting at `page_token`
    fn page_of<T: Clone>(&self, items: &[T], page_token: Option<&str>) -> Result<(Vec<T>, Option<String>), Box<dyn Error>> {
        let start = match page_token {
            None => 0,
            Some(token) => token.parse::<usize>()?,
        };
        let end = std::cmp::min(start + self.page_size, items.len());
        let next_page_token = match end < items.len() {
            true => Some(end.to_string()),
            false => None,
        };
        Ok((items[start..end].to_vec(), next_page_token))
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `list_events` should yield this event for this window.
/// Cancelled events are always yielded, as bare tombstones usually are by real services.
fn in_window(event: &SourceEvent, window: &TimeWindow) -> bool {
    if event.status == EventStatus::Cancelled {
        return true;
    }
    match &event.start {
        None => false,
        Some(start) => window.contains(&start.as_instant()),
    }
}

#[async_trait]
impl CalendarService for MockService {
    async fn list_calendars(&self, page_token: Option<&str>) -> Result<CalendarPage, Box<dyn Error>> {
        self.behaviour.lock().unwrap().can_list_calendars()?;

        let references: Vec<CalendarRef> = self.calendars.iter()
            .map(|calendar| calendar.reference.clone())
            .collect();
        let (items, next_page_token) = self.page_of(&references, page_token)?;
        Ok(CalendarPage { items, next_page_token })
    }

    async fn list_events(
        &self,
        calendar_id: &CalendarId,
        window: &TimeWindow,
        _expand_recurring: bool,
        page_token: Option<&str>,
    ) -> Result<EventPage, Box<dyn Error>> {
        self.behaviour.lock().unwrap().can_list_events()?;

        let visible: Vec<SourceEvent> = self.calendar(calendar_id).source_events.iter()
            .filter(|event| in_window(event, window))
            .cloned()
            .collect();
        let (items, next_page_token) = self.page_of(&visible, page_token)?;
        Ok(EventPage { items, next_page_token })
    }

    async fn insert_event(&mut self, calendar_id: &CalendarId, body: &EventBody) -> Result<String, Box<dyn Error>> {
        self.insert_count += 1;
        self.behaviour.lock().unwrap().can_insert_event()?;

        let event_id = uuid::Uuid::new_v4().to_hyphenated().to_string();
        self.calendar_mut(calendar_id).mirrored.insert(event_id.clone(), body.clone());
        Ok(event_id)
    }

    async fn patch_event(
        &mut self,
        calendar_id: &CalendarId,
        event_id: &str,
        body: &EventBody,
    ) -> Result<WriteStatus, Box<dyn Error>> {
        self.patch_count += 1;
        self.behaviour.lock().unwrap().can_patch_event()?;

        let mirrored = &mut self.calendar_mut(calendar_id).mirrored;
        match mirrored.get_mut(event_id) {
            None => Ok(WriteStatus::Missing),
            Some(existing) => {
                *existing = body.clone();
                Ok(WriteStatus::Done)
            },
        }
    }

    async fn remove_event(&mut self, calendar_id: &CalendarId, event_id: &str) -> Result<WriteStatus, Box<dyn Error>> {
        self.remove_count += 1;
        self.behaviour.lock().unwrap().can_remove_event()?;

        match self.calendar_mut(calendar_id).mirrored.remove(event_id) {
            None => Ok(WriteStatus::Missing),
            Some(_) => Ok(WriteStatus::Done),
        }
    }

    async fn find_or_create_calendar(&mut self, name: &str) -> Result<CalendarId, Box<dyn Error>> {
        self.behaviour.lock().unwrap().can_find_or_create()?;

        let matches: Vec<CalendarId> = self.calendars.iter()
            .filter(|calendar| calendar.reference.name == name)
            .map(|calendar| calendar.reference.id.clone())
            .collect();

        match matches.len() {
            0 => {
                let id = uuid::Uuid::new_v4().to_hyphenated().to_string();
                self.add_calendar(&id, name, AccessRole::Owner);
                Ok(id)
            },
            1 => Ok(matches.into_iter().next().unwrap(/* there is exactly one */)),
            _ => Err(format!("Several calendars are named {:?}: refusing to pick one", name).into()),
        }
    }
}
