//! Result store backends: in-memory and a JSON file on disk.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TypecastError};
use crate::schema::ReadableSchema;

use super::record::{JobListing, JobRecord, NewJobRecord, RecordId};

/// Storage for job records.
pub trait ResultStore: Send + Sync {
    /// Store a new record, assigning its id and timestamps.
    fn create(&self, record: NewJobRecord) -> Result<JobRecord>;

    /// All records, newest first.
    fn list(&self) -> Result<Vec<JobListing>>;

    /// One record by id.
    fn get(&self, id: RecordId) -> Result<JobRecord>;

    /// Replace the stored dtypes of a record.
    fn update_dtypes(&self, id: RecordId, dtypes: ReadableSchema) -> Result<JobRecord>;
}

/// Records plus the next id to hand out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreState {
    next_id: RecordId,
    records: Vec<JobRecord>,
}

impl StoreState {
    fn create(&mut self, record: NewJobRecord) -> JobRecord {
        self.next_id += 1;
        let now = Utc::now();
        let record = JobRecord {
            id: self.next_id,
            file_name: record.file_name,
            completed: record.completed,
            data_types: record.data_types,
            created_at: now,
            updated_at: now,
        };
        self.records.push(record.clone());
        record
    }

    fn list(&self) -> Vec<JobListing> {
        let mut records: Vec<&JobRecord> = self.records.iter().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        records.into_iter().map(JobRecord::listing).collect()
    }

    fn get(&self, id: RecordId) -> Result<JobRecord> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(TypecastError::NotFound(id))
    }

    fn update_dtypes(&mut self, id: RecordId, dtypes: ReadableSchema) -> Result<JobRecord> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(TypecastError::NotFound(id))?;
        record.data_types = dtypes;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| TypecastError::Persistence("Result store lock poisoned".to_string()))
}

/// Records held in memory for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStore for MemoryStore {
    fn create(&self, record: NewJobRecord) -> Result<JobRecord> {
        Ok(lock(&self.state)?.create(record))
    }

    fn list(&self) -> Result<Vec<JobListing>> {
        Ok(lock(&self.state)?.list())
    }

    fn get(&self, id: RecordId) -> Result<JobRecord> {
        lock(&self.state)?.get(id)
    }

    fn update_dtypes(&self, id: RecordId, dtypes: ReadableSchema) -> Result<JobRecord> {
        lock(&self.state)?.update_dtypes(id, dtypes)
    }
}

/// Records kept in a single pretty-printed JSON file.
///
/// Every write goes to a temporary sibling that is then renamed over the
/// store file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonFileStore {
    /// Open (or lazily create) a store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            path: path.into(),
            guard: Mutex::new(()),
        };
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StoreState> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(StoreState::default()),
            Err(e) => {
                return Err(TypecastError::Persistence(format!(
                    "Failed to open store '{}': {}",
                    self.path.display(),
                    e
                )));
            }
        };

        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            TypecastError::Persistence(format!(
                "Failed to parse store '{}': {}",
                self.path.display(),
                e
            ))
        })
    }

    fn save(&self, state: &StoreState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    TypecastError::Persistence(format!(
                        "Failed to create directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        let file = File::create(&tmp).map_err(|e| {
            TypecastError::Persistence(format!("Failed to create file '{}': {}", tmp.display(), e))
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, state).map_err(|e| {
            TypecastError::Persistence(format!("Failed to serialize store: {}", e))
        })?;
        writer.flush().map_err(|e| {
            TypecastError::Persistence(format!("Failed to write file '{}': {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            TypecastError::Persistence(format!(
                "Failed to replace store '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        debug!(path = %self.path.display(), records = state.records.len(), "Saved result store");
        Ok(())
    }

    /// Load, modify, and save under the store lock.
    fn modify<T>(&self, f: impl FnOnce(&mut StoreState) -> Result<T>) -> Result<T> {
        let _guard = lock(&self.guard)?;
        let mut state = self.load()?;
        let out = f(&mut state)?;
        self.save(&state)?;
        Ok(out)
    }
}

impl ResultStore for JsonFileStore {
    fn create(&self, record: NewJobRecord) -> Result<JobRecord> {
        self.modify(|state| Ok(state.create(record)))
    }

    fn list(&self) -> Result<Vec<JobListing>> {
        let _guard = lock(&self.guard)?;
        Ok(self.load()?.list())
    }

    fn get(&self, id: RecordId) -> Result<JobRecord> {
        let _guard = lock(&self.guard)?;
        self.load()?.get(id)
    }

    fn update_dtypes(&self, id: RecordId, dtypes: ReadableSchema) -> Result<JobRecord> {
        self.modify(|state| state.update_dtypes(id, dtypes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JobStatus;
    use tempfile::TempDir;

    fn dtypes(pairs: &[(&str, &str)]) -> ReadableSchema {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn exercise(store: &dyn ResultStore) {
        let first = store
            .create(NewJobRecord::succeeded("a.csv", dtypes(&[("x", "Number")])))
            .unwrap();
        let second = store.create(NewJobRecord::failed("b.xlsx")).unwrap();
        assert!(second.id > first.id);

        let listing = store.list().unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].id, second.id);
        assert_eq!(listing[0].status, JobStatus::Failed);
        assert_eq!(listing[1].status, JobStatus::Success);
        assert_eq!(listing[1].dtypes["x"], "Number");

        let updated = store
            .update_dtypes(first.id, dtypes(&[("x", "Text")]))
            .unwrap();
        assert_eq!(updated.data_types["x"], "Text");
        assert!(updated.updated_at >= updated.created_at);
        assert_eq!(store.get(first.id).unwrap().data_types["x"], "Text");

        assert!(matches!(
            store.update_dtypes(999, ReadableSchema::new()),
            Err(TypecastError::NotFound(999))
        ));
        assert!(matches!(store.get(999), Err(TypecastError::NotFound(999))));
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn test_json_file_store() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("jobs.json")).unwrap();
        exercise(&store);
    }

    #[test]
    fn test_json_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("jobs.json");

        let id = {
            let store = JsonFileStore::open(&path).unwrap();
            store
                .create(NewJobRecord::succeeded("a.csv", dtypes(&[("x", "Date")])))
                .unwrap()
                .id
        };

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get(id).unwrap().data_types["x"], "Date");
        let next = reopened.create(NewJobRecord::failed("b.csv")).unwrap();
        assert!(next.id > id);
    }

    #[test]
    fn test_json_file_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(TypecastError::Persistence(_))
        ));
    }
}
