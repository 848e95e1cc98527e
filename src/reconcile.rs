//! Per-event reconciliation: deciding and applying the minimal destination write

use std::error::Error;

use crate::calendar::CalendarId;
use crate::event::{EventStatus, SourceEvent};
use crate::mapping::{MappingKey, MappingStore, SyncRecord};
use crate::service::{CalendarService, WriteStatus};
use crate::store::PropertyStore;
use crate::translate::translate;

/// What should be done for one source event, given its stored mapping
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    /// Never seen before: create a mirrored copy and record it
    Insert,
    /// Already mirrored, and the source changed since: patch the recorded copy
    Patch { destination_event_id: String },
    /// Already mirrored, and the stamps are byte-identical: leave the destination alone
    Skip,
    /// Cancelled at the source: drop the mirrored copy and forget it
    Delete { destination_event_id: String },
    /// Cancelled at the source, and nothing was ever mirrored: nothing to do
    Ignore,
}

/// Evaluates the decision table for one source event.
///
/// Only the source status, the stored mapping and the two modification stamps take
/// part in the decision. The current destination state is never consulted: the stored
/// mapping is the sole source of truth for what the destination holds.
pub fn decide(event: &SourceEvent, mapping: Option<&SyncRecord>) -> Decision {
    match (&event.status, mapping) {
        (EventStatus::Cancelled, Some(record)) => Decision::Delete {
            destination_event_id: record.destination_event_id.clone(),
        },
        (EventStatus::Cancelled, None) => Decision::Ignore,
        (_, None) => Decision::Insert,
        (_, Some(record)) => {
            // Stamps are opaque and compared byte-wise. Any difference at all (clock skew,
            // non-monotonic stamps...) counts as a change: an extra write is cheaper than a missed update
            if record.last_source_updated == event.updated {
                Decision::Skip
            } else {
                Decision::Patch {
                    destination_event_id: record.destination_event_id.clone(),
                }
            }
        },
    }
}

/// How one source event ended up being reconciled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Inserted,
    Patched,
    /// The patch found the mirrored copy gone, so a fresh copy was inserted and the mapping overwritten
    Reinserted,
    Skipped,
    Deleted,
    /// Cancelled at the source with nothing mirrored
    Ignored,
}

/// Applies the decision table to source events, one at a time.
///
/// Every branch is idempotent across repeated runs, as long as the mapping store
/// persists correctly: reconciling an unchanged event again issues no write at all.
pub struct Reconciler<'a, S, P>
where
    S: CalendarService,
    P: PropertyStore,
{
    service: &'a mut S,
    mappings: &'a mut MappingStore<P>,
    destination_calendar_id: &'a CalendarId,
}

impl<'a, S, P> Reconciler<'a, S, P>
where
    S: CalendarService,
    P: PropertyStore,
{
    pub fn new(service: &'a mut S, mappings: &'a mut MappingStore<P>, destination_calendar_id: &'a CalendarId) -> Self {
        Self { service, mappings, destination_calendar_id }
    }

    /// Reconciles one source event against the destination calendar.
    ///
    /// An `Err` means this event could not be brought in sync this time (a transport
    /// failure, say). It will be reconciled again on the next run; the caller should
    /// log it and move on to the next event rather than abort.
    pub async fn reconcile(&mut self, source_calendar_id: &CalendarId, event: &SourceEvent) -> Result<Outcome, Box<dyn Error>> {
        let key = MappingKey::new(source_calendar_id.clone(), event.id.clone());
        let mapping = self.mappings.get(&key)?;

        match decide(event, mapping.as_ref()) {
            Decision::Skip => {
                log::trace!("{} is unchanged since the last run", key);
                Ok(Outcome::Skipped)
            },

            Decision::Ignore => {
                log::trace!("{} is cancelled and was never mirrored", key);
                Ok(Outcome::Ignored)
            },

            Decision::Insert => {
                let body = translate(event, source_calendar_id);
                let destination_event_id = self.service.insert_event(self.destination_calendar_id, &body).await?;
                // The mapping is only written once the insert succeeded: a failed insert
                // leaves no record behind, so the event is retried on the next run
                self.mappings.put(&key, &SyncRecord {
                    destination_event_id,
                    last_source_updated: event.updated.clone(),
                })?;
                Ok(Outcome::Inserted)
            },

            Decision::Patch { destination_event_id } => {
                let body = translate(event, source_calendar_id);
                match self.service.patch_event(self.destination_calendar_id, &destination_event_id, &body).await? {
                    WriteStatus::Done => {
                        self.mappings.put(&key, &SyncRecord {
                            destination_event_id,
                            last_source_updated: event.updated.clone(),
                        })?;
                        Ok(Outcome::Patched)
                    },
                    WriteStatus::Missing => {
                        // The mirrored copy was deleted out-of-band: transition to the insert
                        // path and overwrite the mapping. In case the old copy still exists
                        // under some other id, it is now orphaned; nothing hunts for it
                        log::warn!("Mirrored copy {} of {} is gone. Inserting a fresh copy", destination_event_id, key);
                        let new_destination_event_id = self.service.insert_event(self.destination_calendar_id, &body).await?;
                        self.mappings.put(&key, &SyncRecord {
                            destination_event_id: new_destination_event_id,
                            last_source_updated: event.updated.clone(),
                        })?;
                        Ok(Outcome::Reinserted)
                    },
                }
            },

            Decision::Delete { destination_event_id } => {
                let removal = self.service.remove_event(self.destination_calendar_id, &destination_event_id).await;
                // The mapping goes away no matter how the removal went: a cancelled event
                // must never resurrect its copy on a later run
                self.mappings.remove(&key)?;
                match removal {
                    Err(err) => Err(format!("Unable to remove mirrored copy {} of {}: {}", destination_event_id, key, err).into()),
                    Ok(WriteStatus::Missing) => {
                        log::debug!("Mirrored copy {} of {} was already gone", destination_event_id, key);
                        Ok(Outcome::Deleted)
                    },
                    Ok(WriteStatus::Done) => Ok(Outcome::Deleted),
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventTime;
    use chrono::{TimeZone, Utc};

    fn an_event(status: EventStatus, updated: &str) -> SourceEvent {
        SourceEvent {
            id: "evt1".to_string(),
            updated: updated.to_string(),
            status,
            summary: Some("Standup".to_string()),
            description: None,
            location: None,
            start: Some(EventTime::Moment {
                date_time: Utc.with_ymd_and_hms(2024, 5, 13, 9, 0, 0).unwrap(),
                time_zone: None,
            }),
            end: Some(EventTime::Moment {
                date_time: Utc.with_ymd_and_hms(2024, 5, 13, 9, 15, 0).unwrap(),
                time_zone: None,
            }),
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

    fn a_record(stamp: &str) -> SyncRecord {
        SyncRecord {
            destination_event_id: "dest1".to_string(),
            last_source_updated: stamp.to_string(),
        }
    }

    #[test]
    fn unseen_active_event_is_inserted() {
        let event = an_event(EventStatus::Confirmed, "T1");
        assert_eq!(decide(&event, None), Decision::Insert);

        // Tentative counts as active too
        let event = an_event(EventStatus::Tentative, "T1");
        assert_eq!(decide(&event, None), Decision::Insert);
    }

    #[test]
    fn unchanged_mapped_event_is_skipped() {
        let event = an_event(EventStatus::Confirmed, "T1");
        assert_eq!(decide(&event, Some(&a_record("T1"))), Decision::Skip);
    }

    #[test]
    fn any_stamp_difference_is_a_change() {
        let event = an_event(EventStatus::Confirmed, "T2");
        assert_eq!(
            decide(&event, Some(&a_record("T1"))),
            Decision::Patch { destination_event_id: "dest1".to_string() },
        );

        // Even a stamp that "went backwards" counts as a change
        let event = an_event(EventStatus::Confirmed, "T0");
        assert_eq!(
            decide(&event, Some(&a_record("T1"))),
            Decision::Patch { destination_event_id: "dest1".to_string() },
        );
    }

    #[test]
    fn cancelled_mapped_event_is_deleted() {
        let event = an_event(EventStatus::Cancelled, "T2");
        assert_eq!(
            decide(&event, Some(&a_record("T1"))),
            Decision::Delete { destination_event_id: "dest1".to_string() },
        );
    }

    #[test]
    fn cancelled_unmapped_event_is_ignored() {
        let event = an_event(EventStatus::Cancelled, "T1");
        assert_eq!(decide(&event, None), Decision::Ignore);
    }
}
