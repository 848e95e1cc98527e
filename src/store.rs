//! Durable key/value property stores, which back the mapping ledger

use std::collections::HashMap;
use std::error::Error;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A durable, account-scoped string key/value store.
///
/// No transactional guarantee is expected across keys. Within a key, reads and writes
/// are expected to be issued by a single run at a time (running two concurrent mergers
/// against the same store is a caller-side precondition violation, not something this
/// crate detects).
pub trait PropertyStore {
    /// Returns the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error>>;
    /// Stores `value` under `key`. Once this returns `Ok`, the value must survive a restart
    fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>>;
    /// Removes `key`. Removing an absent key is not an error
    fn remove(&mut self, key: &str) -> Result<(), Box<dyn Error>>;
}

/// A property store that persists its values in a local JSON file.
///
/// Every mutation is written through to the backing file before it returns, so that a
/// mapping recorded just before a crash is still there on the next run.
#[derive(Debug, PartialEq)]
pub struct FileStore {
    backing_file: PathBuf,
    data: StoredData,
}

#[derive(Default, Debug, PartialEq, Serialize, Deserialize)]
struct StoredData {
    properties: HashMap<String, String>,
}

impl FileStore {
    /// Initialize a store from the content of a valid backing file if it exists.
    /// Returns an error otherwise
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let data = match std::fs::File::open(path) {
            Err(err) => {
                return Err(format!("Unable to open file {:?}: {}", path, err).into());
            },
            Ok(file) => serde_json::from_reader(file)?,
        };

        Ok(Self {
            backing_file: PathBuf::from(path),
            data,
        })
    }

    /// Initialize an empty store that will persist to `path`
    pub fn new(path: &Path) -> Self {
        Self {
            backing_file: PathBuf::from(path),
            data: StoredData::default(),
        }
    }

    /// Store the current contents to the backing file
    fn save_to_file(&self) -> Result<(), Box<dyn Error>> {
        let path = &self.backing_file;
        let file = match std::fs::File::create(path) {
            Err(err) => {
                return Err(format!("Unable to save file {:?}: {}", path, err).into());
            },
            Ok(f) => f,
        };

        serde_json::to_writer(file, &self.data)?;
        Ok(())
    }
}

impl PropertyStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        Ok(self.data.properties.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        self.data.properties.insert(key.to_string(), value.to_string());
        self.save_to_file()
    }

    fn remove(&mut self, key: &str) -> Result<(), Box<dyn Error>> {
        self.data.properties.remove(key);
        self.save_to_file()
    }
}

/// A property store that keeps its values in memory.
///
/// Nothing survives the process: this is meant for tests, or for callers that handle
/// durability on their own.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryStore {
    properties: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PropertyStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        Ok(self.properties.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        self.properties.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), Box<dyn Error>> {
        self.properties.remove(key);
        Ok(())
    }
}
