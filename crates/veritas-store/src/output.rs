//! Directory-backed output storage.
//!
//! Mirrors the hosted runtime's local storage layout so a CLI run leaves
//! the same artefacts an actor run would:
//!
//! - `datasets/default.jsonl`: one JSON line per pushed item
//! - `key_value_stores/<KEY>.json`: one pretty-printed record per key
//! - `usage.jsonl`: one timestamped usage event per line

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::StoreError;

/// A billable usage event emitted after a verdict is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEvent {
    pub event_name: String,
    pub amount: u32,
    pub recorded_at: DateTime<Utc>,
}

impl UsageEvent {
    pub fn new(event_name: impl Into<String>, amount: u32) -> Self {
        Self {
            event_name: event_name.into(),
            amount,
            recorded_at: Utc::now(),
        }
    }
}

/// Shareable between threads. Writes are serialised, so concurrent writers
/// never interleave partial lines or records.
pub struct OutputStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl OutputStore {
    pub const DATASET_FILE: &'static str = "datasets/default.jsonl";
    pub const USAGE_FILE: &'static str = "usage.jsonl";
    pub const KV_DIR: &'static str = "key_value_stores";

    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(root.join("datasets"))?;
        fs::create_dir_all(root.join(Self::KV_DIR))?;
        info!(root = %root.display(), "opened output store");
        Ok(Self {
            root: root.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Append one item to the default dataset.
    pub fn push_data(&self, item: &Value) -> Result<(), StoreError> {
        self.append_line(Self::DATASET_FILE, &serde_json::to_string(item)?)
    }

    /// Store `value` under `key`, replacing any previous record.
    pub fn set_value(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let path = self.record_path(key)?;
        let bytes = serde_json::to_vec_pretty(value)?;
        let _guard = self.lock();
        fs::write(path, bytes)?;
        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.record_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&fs::read(path)?)?))
    }

    pub fn record_usage(&self, event: &UsageEvent) -> Result<(), StoreError> {
        self.append_line(Self::USAGE_FILE, &serde_json::to_string(event)?)
    }

    /// All items pushed to the default dataset, oldest first.
    pub fn dataset_items(&self) -> Result<Vec<Value>, StoreError> {
        self.read_lines(Self::DATASET_FILE)
    }

    pub fn usage_events(&self) -> Result<Vec<UsageEvent>, StoreError> {
        self.read_lines(Self::USAGE_FILE)
    }

    // Each line goes out in one write, so a poisoned lock leaves no torn data.
    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(Self::KV_DIR).join(format!("{key}.json")))
    }

    fn append_line(&self, relative: &str, line: &str) -> Result<(), StoreError> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        let _guard = self.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(relative))?;
        file.write_all(buf.as_bytes())?;
        Ok(())
    }

    fn read_lines<T: serde::de::DeserializeOwned>(
        &self,
        relative: &str,
    ) -> Result<Vec<T>, StoreError> {
        let path = self.root.join(relative);
        if !path.exists() {
            return Ok(Vec::new());
        }
        fs::read_to_string(path)?
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(StoreError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn pushed_items_accumulate_in_order() {
        let dir = TempDir::new().unwrap();
        let store = OutputStore::open(dir.path()).unwrap();
        store.push_data(&json!({ "tier": "S1" })).unwrap();
        store.push_data(&json!({ "tier": "S2" })).unwrap();
        let items = store.dataset_items().unwrap();
        assert_eq!(items, vec![json!({ "tier": "S1" }), json!({ "tier": "S2" })]);
    }

    #[test]
    fn concurrent_appends_keep_lines_whole() {
        let dir = TempDir::new().unwrap();
        let store = OutputStore::open(dir.path()).unwrap();
        let payload = "x".repeat(512);

        std::thread::scope(|scope| {
            for worker in 0..16 {
                let store = &store;
                let payload = &payload;
                scope.spawn(move || {
                    for seq in 0..200 {
                        store
                            .push_data(&json!({ "worker": worker, "seq": seq, "pad": payload }))
                            .unwrap();
                        store.record_usage(&UsageEvent::new("case_scored", 1)).unwrap();
                    }
                });
            }
        });

        // Every line must parse; a torn write would fail the whole read.
        assert_eq!(store.dataset_items().unwrap().len(), 16 * 200);
        assert_eq!(store.usage_events().unwrap().len(), 16 * 200);
    }

    #[test]
    fn set_value_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = OutputStore::open(dir.path()).unwrap();
        store.set_value("OUTPUT", &json!({ "tier": "S1" })).unwrap();
        store.set_value("OUTPUT", &json!({ "tier": "S3" })).unwrap();
        assert_eq!(store.get_value("OUTPUT").unwrap(), Some(json!({ "tier": "S3" })));
        assert_eq!(store.get_value("INPUT").unwrap(), None);
    }

    #[test]
    fn path_like_keys_rejected() {
        let dir = TempDir::new().unwrap();
        let store = OutputStore::open(dir.path()).unwrap();
        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(
                store.set_value(key, &json!(1)),
                Err(StoreError::InvalidKey(_))
            ));
        }
    }

    #[test]
    fn usage_events_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let store = OutputStore::open(dir.path()).unwrap();
        store.record_usage(&UsageEvent::new("case_scored", 1)).unwrap();
        let events = store.usage_events().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_name, "case_scored");
        assert_eq!(events[0].amount, 1);
    }
}
