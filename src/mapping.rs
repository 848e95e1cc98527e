//! The persisted links between source events and their mirrored copies

use std::error::Error;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::calendar::CalendarId;
use crate::store::PropertyStore;

/// The key of a [`SyncRecord`]: one event of one source calendar
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MappingKey {
    source_calendar_id: CalendarId,
    source_event_id: String,
}

impl MappingKey {
    pub fn new(source_calendar_id: CalendarId, source_event_id: String) -> Self {
        Self { source_calendar_id, source_event_id }
    }

    /// The property-store key this maps to, under `prefix`.
    /// The calendar id is embedded, so keys never collide across calendars.
    fn property_key(&self, prefix: &str) -> String {
        format!("{}{}/{}", prefix, self.source_calendar_id, self.source_event_id)
    }
}

impl Display for MappingKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}/{}", self.source_calendar_id, self.source_event_id)
    }
}

/// What the mapping ledger remembers about one mirrored event.
///
/// A record exists if and only if a mirrored copy is believed to exist in the
/// destination calendar. This record alone decides insert-vs-patch-vs-skip: the
/// current destination state is never consulted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncRecord {
    /// The id of the mirrored copy in the destination calendar
    pub destination_event_id: String,
    /// The source `updated` stamp at the time of the last successful write.
    /// Compared byte-wise: any difference at all counts as a change.
    pub last_source_updated: String,
}

/// The durable ledger of every mirrored event, on top of a [`PropertyStore`].
///
/// Records are serialized to JSON. A stored value that cannot be parsed back is
/// treated as absent (so the event is simply mirrored afresh), never as a hard failure.
pub struct MappingStore<P: PropertyStore> {
    store: P,
    key_prefix: String,
}

impl<P: PropertyStore> MappingStore<P> {
    pub fn new(store: P, key_prefix: &str) -> Self {
        Self { store, key_prefix: key_prefix.to_string() }
    }

    /// Returns the record stored for this key, or `None` when there is none (including
    /// when the stored value turned out to be unreadable)
    pub fn get(&self, key: &MappingKey) -> Result<Option<SyncRecord>, Box<dyn Error>> {
        let raw = self.store.get(&key.property_key(&self.key_prefix))?;
        match raw {
            None => Ok(None),
            Some(text) => match serde_json::from_str(&text) {
                Ok(record) => Ok(Some(record)),
                Err(err) => {
                    log::warn!("Stored mapping for {} is unreadable ({}). Considering it absent", key, err);
                    Ok(None)
                },
            },
        }
    }

    pub fn put(&mut self, key: &MappingKey, record: &SyncRecord) -> Result<(), Box<dyn Error>> {
        let text = serde_json::to_string(record)?;
        self.store.set(&key.property_key(&self.key_prefix), &text)
    }

    pub fn remove(&mut self, key: &MappingKey) -> Result<(), Box<dyn Error>> {
        self.store.remove(&key.property_key(&self.key_prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn a_record(destination_event_id: &str, stamp: &str) -> SyncRecord {
        SyncRecord {
            destination_event_id: destination_event_id.to_string(),
            last_source_updated: stamp.to_string(),
        }
    }

    #[test]
    fn put_then_get_round_trips() {
        let mut mappings = MappingStore::new(MemoryStore::new(), "test/");
        let key = MappingKey::new("cal-a".to_string(), "evt1".to_string());

        assert_eq!(mappings.get(&key).unwrap(), None);

        let record = a_record("dest1", "2024-05-12T10:00:00.000Z");
        mappings.put(&key, &record).unwrap();
        assert_eq!(mappings.get(&key).unwrap(), Some(record));

        mappings.remove(&key).unwrap();
        assert_eq!(mappings.get(&key).unwrap(), None);
    }

    #[test]
    fn keys_do_not_collide_across_calendars() {
        let mut mappings = MappingStore::new(MemoryStore::new(), "test/");
        let key_a = MappingKey::new("cal-a".to_string(), "evt1".to_string());
        let key_b = MappingKey::new("cal-b".to_string(), "evt1".to_string());

        mappings.put(&key_a, &a_record("dest-a", "T1")).unwrap();
        mappings.put(&key_b, &a_record("dest-b", "T2")).unwrap();

        assert_eq!(mappings.get(&key_a).unwrap().unwrap().destination_event_id, "dest-a");
        assert_eq!(mappings.get(&key_b).unwrap().unwrap().destination_event_id, "dest-b");
    }

    #[test]
    fn unreadable_values_read_as_absent() {
        let mut raw_store = MemoryStore::new();
        raw_store.set("test/cal-a/evt1", "{ not json at all").unwrap();

        let mappings = MappingStore::new(raw_store, "test/");
        let key = MappingKey::new("cal-a".to_string(), "evt1".to_string());
        assert_eq!(mappings.get(&key).unwrap(), None);
    }
}
