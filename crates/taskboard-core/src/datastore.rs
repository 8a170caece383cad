use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::task::{Task, is_blank};

pub const DEFAULT_STORAGE_KEY: &str = "tasks";

/// A named-slot key/value store holding whole serialized snapshots.
pub trait Storage {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// One `<key>.json` file per slot inside a data directory.
#[derive(Debug)]
pub struct FileStorage {
    pub data_dir: PathBuf,
}

impl FileStorage {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        info!(data_dir = %data_dir.display(), "opened file storage");
        Ok(Self { data_dir })
    }

    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    #[tracing::instrument(skip(self))]
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.slot_path(key);
        if !path.exists() {
            debug!(file = %path.display(), "slot file absent");
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        Ok(Some(raw))
    }

    #[tracing::instrument(skip(self, value), fields(bytes = value.len()))]
    fn write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.slot_path(key);
        debug!(file = %path.display(), "writing slot atomically");

        let mut temp = NamedTempFile::new_in(&self.data_dir)?;
        temp.write_all(value.as_bytes())?;
        writeln!(temp)?;
        temp.flush()?;

        temp.persist(&path)
            .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;
        Ok(())
    }
}

/// In-process slots. `fail_writes` makes every write error out.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: RefCell<HashMap<String, String>>,
    fail_writes: Cell<bool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage
            .slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        storage
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn slot(&self, key: &str) -> Option<String> {
        self.slots.borrow().get(key).cloned()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.slot(key))
    }

    fn write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        if self.fail_writes.get() {
            return Err(anyhow!("storage slot {key} is not writable"));
        }
        self.slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<S: Storage + ?Sized> Storage for &S {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        (**self).write(key, value)
    }
}

/// JSON snapshot codec for the task list over one storage slot.
#[derive(Debug)]
pub struct DataStore<S> {
    storage: S,
    key: String,
}

impl<S: Storage> DataStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Never fails: an absent, unreadable or malformed slot yields an empty
    /// list.
    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub fn load_tasks(&self) -> Vec<Task> {
        let raw = match self.storage.read(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("no saved tasks; starting empty");
                return Vec::new();
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "could not read saved tasks; starting empty");
                return Vec::new();
            }
        };

        match decode_tasks(&raw) {
            Ok(tasks) => {
                debug!(count = tasks.len(), "loaded tasks");
                tasks
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "saved tasks are malformed; starting empty");
                Vec::new()
            }
        }
    }

    #[tracing::instrument(skip(self, tasks), fields(key = %self.key, count = tasks.len()))]
    pub fn save_tasks(&self, tasks: &[Task]) -> anyhow::Result<()> {
        let serialized = serde_json::to_string(tasks)?;
        self.storage
            .write(&self.key, &serialized)
            .with_context(|| format!("failed to save tasks to slot {}", self.key))
    }
}

pub fn decode_tasks(raw: &str) -> anyhow::Result<Vec<Task>> {
    let tasks: Vec<Task> = serde_json::from_str(raw).context("failed parsing saved tasks")?;

    let mut seen = BTreeSet::new();
    for task in &tasks {
        if !seen.insert(task.id) {
            return Err(anyhow!("duplicate task id {}", task.id));
        }
        if is_blank(&task.text) {
            return Err(anyhow!("task {} has blank text", task.id));
        }
    }
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use taskboard_shared::Priority;
    use tempfile::tempdir;

    use super::*;

    fn sample() -> Vec<Task> {
        vec![
            Task::new(1, "A").with_priority(Priority::High),
            Task::new(2, "B").with_completed(true),
        ]
    }

    #[test]
    fn absent_slot_loads_empty() {
        let store = DataStore::new(MemoryStorage::new());
        assert!(store.load_tasks().is_empty());
    }

    #[test]
    fn malformed_slot_loads_empty() {
        for raw in [
            "not json {{{",
            r#"{"id":1}"#,
            r#"[{"id":1,"title":"other schema"}]"#,
            r#"[{"id":1,"text":"A","completed":false,"priority":"urgent"}]"#,
            r#"[{"id":1,"text":"A","completed":false,"priority":"low"},{"id":1,"text":"B","completed":false,"priority":"low"}]"#,
            r#"[{"id":1,"text":"  ","completed":false,"priority":"low"}]"#,
        ] {
            let store = DataStore::new(MemoryStorage::with_slot(DEFAULT_STORAGE_KEY, raw));
            assert!(store.load_tasks().is_empty(), "expected empty for {raw}");
        }
    }

    #[test]
    fn memory_round_trip() {
        let store = DataStore::new(MemoryStorage::new());
        store.save_tasks(&sample()).expect("save");
        assert_eq!(store.load_tasks(), sample());
        assert_eq!(
            store.storage().slot("tasks").as_deref(),
            Some(
                r#"[{"id":1,"text":"A","completed":false,"priority":"high"},{"id":2,"text":"B","completed":true,"priority":"medium"}]"#
            )
        );
    }

    #[test]
    fn failed_write_reports_error() {
        let storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        let store = DataStore::new(storage);
        let err = store.save_tasks(&sample()).expect_err("write should fail");
        assert!(format!("{err:#}").contains("not writable"));
    }

    #[test]
    fn custom_key_uses_its_own_slot() {
        let store = DataStore::with_key(MemoryStorage::new(), "board");
        store.save_tasks(&sample()).expect("save");
        assert!(store.storage().slot("tasks").is_none());
        assert!(store.storage().slot("board").is_some());
    }

    #[test]
    fn file_round_trip_and_overwrite() {
        let temp = tempdir().expect("tempdir");
        let storage = FileStorage::open(&temp.path().join("nested")).expect("open storage");
        let path = storage.slot_path("tasks");
        let store = DataStore::new(storage);

        assert!(store.load_tasks().is_empty());

        store.save_tasks(&sample()).expect("save");
        assert!(path.exists());
        assert_eq!(store.load_tasks(), sample());

        store.save_tasks(&sample()[..1]).expect("overwrite");
        assert_eq!(store.load_tasks().len(), 1);
    }

    #[test]
    fn file_with_garbage_loads_empty() {
        let temp = tempdir().expect("tempdir");
        let storage = FileStorage::open(temp.path()).expect("open storage");
        fs::write(storage.slot_path("tasks"), "[{broken").expect("write garbage");
        assert!(DataStore::new(storage).load_tasks().is_empty());
    }
}
