use std::{
    fs::File,
    io::{ErrorKind, Read, Write},
    path::PathBuf,
};

use anyhow::Result;
use fs4::fs_std::FileExt;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::entities::{ActivitySession, TrackerSettings};

const CURRENT_KEY: &str = "current";
const HISTORY_KEY: &str = "history";
const SETTINGS_KEY: &str = "settings";

/// Minimal durable key-value contract the engine persists through. Values
/// are json blobs.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Keeps one `<key>.json` file per key inside a directory. Reads and
/// writes hold a file lock so a concurrently running command never
/// observes a half-written record.
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut file = match File::open(self.path_for(key)) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        file.lock_shared()?;
        let mut value = String::new();
        let result = file.read_to_string(&mut value);
        FileExt::unlock(&file)?;
        result?;
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut file = File::create(self.path_for(key))?;
        file.lock_exclusive()?;
        let result = file.write_all(value.as_bytes());
        FileExt::unlock(&file)?;
        result?;
        Ok(())
    }
}

/// Adapter between the engine and the raw key-value records. Owns
/// timestamp (de)serialization and the defensive defaults for missing or
/// corrupt blobs.
pub struct SessionStore<K> {
    kv: K,
}

impl<K: KeyValueStore> SessionStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    pub fn save(
        &self,
        current: Option<&ActivitySession>,
        history: &[ActivitySession],
    ) -> Result<()> {
        self.kv.set(CURRENT_KEY, &serde_json::to_string(&current)?)?;
        self.kv.set(HISTORY_KEY, &serde_json::to_string(history)?)?;
        Ok(())
    }

    /// Restores the persisted session state. A missing or corrupt record
    /// never fails the load, it comes back as empty state so the
    /// application always starts.
    pub fn load(&self) -> (Option<ActivitySession>, Vec<ActivitySession>) {
        let current = self
            .read_record::<Option<ActivitySession>>(CURRENT_KEY)
            .flatten();
        let history = self
            .read_record::<Vec<ActivitySession>>(HISTORY_KEY)
            .unwrap_or_default();
        (current, history)
    }

    pub fn tracker_settings(&self) -> TrackerSettings {
        self.read_record(SETTINGS_KEY).unwrap_or_default()
    }

    pub fn save_tracker_settings(&self, settings: &TrackerSettings) -> Result<()> {
        self.kv.set(SETTINGS_KEY, &serde_json::to_string(settings)?)
    }

    fn read_record<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = match self.kv.get(key) {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read record {key}: {e:?}");
                return None;
            }
        };
        match serde_json::from_str(&value) {
            Ok(record) => Some(record),
            Err(e) => {
                // ignore illegal values. Might happen after shutdowns
                warn!("Found illegal json string in record {key}: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::tempdir;

    use crate::storage::entities::{ActivitySession, TrackerSettings};

    use super::{FileKeyValueStore, KeyValueStore, SessionStore};

    fn closed_session(id: u64, name: &str) -> ActivitySession {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
            + Duration::milliseconds(250);
        ActivitySession {
            id,
            app_name: name.into(),
            start_time: start,
            end_time: Some(start + Duration::minutes(30)),
            duration: Duration::minutes(30),
        }
    }

    #[test]
    fn state_round_trips_through_files() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(FileKeyValueStore::new(dir.path().to_path_buf()).unwrap());

        let mut current = closed_session(2, "Notes");
        current.end_time = None;
        let history = vec![closed_session(0, "Quarterly Report"), closed_session(1, "Budget")];

        store.save(Some(&current), &history).unwrap();
        let (loaded_current, loaded_history) = store.load();

        assert_eq!(loaded_current, Some(current));
        assert_eq!(loaded_history, history);
    }

    #[test]
    fn empty_store_loads_as_empty_state() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(FileKeyValueStore::new(dir.path().to_path_buf()).unwrap());

        let (current, history) = store.load();

        assert_eq!(current, None);
        assert!(history.is_empty());
        assert_eq!(store.tracker_settings(), TrackerSettings::default());
    }

    #[test]
    fn corrupt_records_load_as_empty_state() {
        let dir = tempdir().unwrap();
        let kv = FileKeyValueStore::new(dir.path().to_path_buf()).unwrap();
        kv.set("current", "{not json").unwrap();
        kv.set("history", "[{\"id\": \"broken\"}]").unwrap();
        kv.set("settings", "also not json").unwrap();

        let store = SessionStore::new(kv);
        let (current, history) = store.load();

        assert_eq!(current, None);
        assert!(history.is_empty());
        assert_eq!(store.tracker_settings(), TrackerSettings::default());
    }

    #[test]
    fn settings_round_trip() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(FileKeyValueStore::new(dir.path().to_path_buf()).unwrap());

        let settings = TrackerSettings {
            auto_track_enabled: true,
            start_time: "08:30".into(),
            end_time: "16:45".into(),
            track_dormant_activity: true,
        };
        store.save_tracker_settings(&settings).unwrap();

        assert_eq!(store.tracker_settings(), settings);
    }

    #[test]
    fn missing_keys_read_as_none() {
        let dir = tempdir().unwrap();
        let kv = FileKeyValueStore::new(dir.path().to_path_buf()).unwrap();

        assert_eq!(kv.get("nothing").unwrap(), None);
        kv.set("something", "\"value\"").unwrap();
        assert_eq!(kv.get("something").unwrap().as_deref(), Some("\"value\""));
    }
}
