use crate::inbox::{RecordView, classify, view_record};
use crate::labels::Translate;
use crate::logging::ndjson;
use crate::records::directory::{ListingKind, MaterialEntry, NewMaterial, NewWorker, WorkerEntry};
use crate::records::store::RecordStore;
use crate::records::{EventRecord, NewRecord};
use rusqlite::ErrorCode;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("backend rejected request: {0}")]
    Rejected(String),
}

impl From<anyhow::Error> for BackendError {
    fn from(err: anyhow::Error) -> Self {
        let transient = err
            .chain()
            .filter_map(|cause| cause.downcast_ref::<rusqlite::Error>())
            .any(|e| {
                matches!(
                    e.sqlite_error_code(),
                    Some(
                        ErrorCode::DatabaseBusy
                            | ErrorCode::DatabaseLocked
                            | ErrorCode::CannotOpen
                            | ErrorCode::SystemIoFailure
                    )
                )
            });
        if transient {
            BackendError::Unavailable(format!("{err:#}"))
        } else {
            BackendError::Rejected(format!("{err:#}"))
        }
    }
}

/// Storage seam for the record list.
pub trait RecordBackend {
    fn fetch_all(&self) -> Result<Vec<EventRecord>, BackendError>;
    fn fetch_one(&self, id: i64) -> Result<Option<EventRecord>, BackendError>;
    fn append(&self, record: &NewRecord) -> Result<EventRecord, BackendError>;
    /// `Ok(false)` when no record had that id.
    fn remove(&self, id: i64) -> Result<bool, BackendError>;
    fn remove_all(&self) -> Result<usize, BackendError>;
}

/// Storage seam for the worker and material directories.
pub trait DirectoryBackend {
    fn workers(&self, category: Option<&str>) -> Result<Vec<WorkerEntry>, BackendError>;
    fn add_worker(&self, worker: &NewWorker) -> Result<WorkerEntry, BackendError>;
    fn remove_worker(&self, id: i64) -> Result<bool, BackendError>;
    fn materials(&self, category: Option<&str>) -> Result<Vec<MaterialEntry>, BackendError>;
    fn add_material(&self, material: &NewMaterial) -> Result<MaterialEntry, BackendError>;
    fn remove_material(&self, id: i64) -> Result<bool, BackendError>;
    /// `(workers, materials)`.
    fn listing_counts(&self) -> Result<(usize, usize), BackendError>;
}

pub struct SqliteBackend {
    store: RecordStore,
}

impl SqliteBackend {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }
}

impl RecordBackend for SqliteBackend {
    fn fetch_all(&self) -> Result<Vec<EventRecord>, BackendError> {
        Ok(self.store.list_records()?)
    }

    fn fetch_one(&self, id: i64) -> Result<Option<EventRecord>, BackendError> {
        Ok(self.store.get_record(id)?)
    }

    fn append(&self, record: &NewRecord) -> Result<EventRecord, BackendError> {
        Ok(self.store.add_record(record)?)
    }

    fn remove(&self, id: i64) -> Result<bool, BackendError> {
        Ok(self.store.delete_record(id)?)
    }

    fn remove_all(&self) -> Result<usize, BackendError> {
        Ok(self.store.delete_all_records()?)
    }
}

impl DirectoryBackend for SqliteBackend {
    fn workers(&self, category: Option<&str>) -> Result<Vec<WorkerEntry>, BackendError> {
        let rows = match category {
            Some(c) => self.store.list_workers_by_category(c),
            None => self.store.list_workers(),
        };
        Ok(rows?)
    }

    fn add_worker(&self, worker: &NewWorker) -> Result<WorkerEntry, BackendError> {
        Ok(self.store.add_worker(worker)?)
    }

    fn remove_worker(&self, id: i64) -> Result<bool, BackendError> {
        Ok(self.store.delete_worker(id)?)
    }

    fn materials(&self, category: Option<&str>) -> Result<Vec<MaterialEntry>, BackendError> {
        let rows = match category {
            Some(c) => self.store.list_materials_by_category(c),
            None => self.store.list_materials(),
        };
        Ok(rows?)
    }

    fn add_material(&self, material: &NewMaterial) -> Result<MaterialEntry, BackendError> {
        Ok(self.store.add_material(material)?)
    }

    fn remove_material(&self, id: i64) -> Result<bool, BackendError> {
        Ok(self.store.delete_material(id)?)
    }

    fn listing_counts(&self) -> Result<(usize, usize), BackendError> {
        let workers = self.store.count_workers()?;
        let materials = self.store.count_materials()?;
        Ok((workers as usize, materials as usize))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Waits between attempts: `base`, `2 * base`, `4 * base`, ... capped at
    /// `max_delay`, one per retry. An odd millisecond base rounds down.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let retries = self.max_attempts.max(1) - 1;
        ExponentialBackoff::from_millis(2)
            .factor(base_ms / 2)
            .max_delay(self.max_delay)
            .take(retries as usize)
    }

    pub fn run<T>(
        &self,
        op: &str,
        mut call: impl FnMut() -> Result<T, BackendError>,
    ) -> Result<T, ServiceError> {
        let mut delays = self.delays();
        let mut attempt = 1;
        loop {
            match call() {
                Ok(v) => return Ok(v),
                Err(BackendError::Rejected(message)) => {
                    return Err(ServiceError::Backend { message });
                }
                Err(BackendError::Unavailable(message)) => match delays.next() {
                    Some(delay) => {
                        warn!(op, attempt, ?delay, error = %message, "transient failure, retrying");
                        thread::sleep(delay);
                        attempt += 1;
                    }
                    None => {
                        warn!(op, attempts = attempt, error = %message, "giving up after retries");
                        return Err(ServiceError::Network {
                            attempts: attempt,
                            message,
                        });
                    }
                },
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("network error after {attempts} attempt(s): {message}. Check the connection and retry")]
    Network { attempts: u32, message: String },

    #[error("backend error: {message}. Retry, or contact support if it persists")]
    Backend { message: String },

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InboxSummary {
    pub total: usize,
    pub plain: usize,
    pub by_origin: BTreeMap<String, usize>,
    pub workers: usize,
    pub materials: usize,
}

impl InboxSummary {
    /// Messages plus directory listings.
    pub fn activity(&self) -> usize {
        self.total + self.workers + self.materials
    }
}

struct CachedList {
    records: Vec<EventRecord>,
    fetched_at: Instant,
}

pub struct Inbox<B: RecordBackend> {
    backend: B,
    policy: RetryPolicy,
    stale_after: Duration,
    audit_log: Option<PathBuf>,
    cache: Option<CachedList>,
}

impl<B: RecordBackend> Inbox<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            policy: RetryPolicy::default(),
            stale_after: Duration::from_secs(30),
            audit_log: None,
            cache: None,
        }
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn with_audit_log(mut self, path: Option<PathBuf>) -> Self {
        self.audit_log = path;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_cached(&self) -> bool {
        self.cache
            .as_ref()
            .is_some_and(|c| c.fetched_at.elapsed() < self.stale_after)
    }

    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    fn mirror(&self, what: &str, write: impl FnOnce(&Path) -> anyhow::Result<()>) {
        if let Some(path) = self.audit_log.as_deref()
            && let Err(err) = write(path)
        {
            warn!(error = %err, "failed to mirror {} to ndjson log", what);
        }
    }

    pub fn refresh(&mut self) -> Result<&[EventRecord], ServiceError> {
        let records = self.policy.run("fetch", || self.backend.fetch_all())?;
        debug!(count = records.len(), "record list fetched");
        let cache = self.cache.insert(CachedList {
            records,
            fetched_at: Instant::now(),
        });
        Ok(&cache.records)
    }

    pub fn records(&mut self) -> Result<&[EventRecord], ServiceError> {
        if self.is_cached() {
            debug!("record list served from cache");
        } else {
            self.refresh()?;
        }
        Ok(self
            .cache
            .as_ref()
            .map(|c| c.records.as_slice())
            .unwrap_or_default())
    }

    pub fn views(&mut self, t: &dyn Translate) -> Result<Vec<RecordView>, ServiceError> {
        Ok(self.records()?.iter().map(|r| view_record(r, t)).collect())
    }

    /// Served from a fresh cache when there is one, otherwise fetched alone.
    pub fn view(&self, id: i64, t: &dyn Translate) -> Result<RecordView, ServiceError> {
        let cached = self.is_cached().then(|| {
            self.cache
                .as_ref()
                .and_then(|c| c.records.iter().find(|r| r.id == id).cloned())
        });
        let record = match cached {
            Some(hit) => hit,
            None => self.policy.run("fetch_one", || self.backend.fetch_one(id))?,
        };
        record
            .map(|r| view_record(&r, t))
            .ok_or(ServiceError::NotFound { kind: "record", id })
    }

    pub fn submit(&mut self, record: NewRecord) -> Result<EventRecord, ServiceError> {
        let inserted = self.policy.run("append", || self.backend.append(&record))?;
        self.invalidate();
        info!(id = inserted.id, "record added");
        self.mirror("record", |path| ndjson::mirror_added(path, &inserted));
        Ok(inserted)
    }

    pub fn delete(&mut self, id: i64) -> Result<(), ServiceError> {
        let removed = self.policy.run("delete", || self.backend.remove(id))?;
        if !removed {
            return Err(ServiceError::NotFound { kind: "record", id });
        }
        self.invalidate();
        info!(id, "record deleted");
        self.mirror("deletion", |path| ndjson::mirror_deleted(path, id));
        Ok(())
    }

    pub fn clear(&mut self) -> Result<usize, ServiceError> {
        let removed = self.policy.run("clear", || self.backend.remove_all())?;
        self.invalidate();
        info!(removed, "records cleared");
        self.mirror("clear", |path| ndjson::mirror_cleared(path, removed));
        Ok(removed)
    }
}

impl<B: RecordBackend + DirectoryBackend> Inbox<B> {
    pub fn workers(&self, category: Option<&str>) -> Result<Vec<WorkerEntry>, ServiceError> {
        self.policy.run("workers", || self.backend.workers(category))
    }

    pub fn materials(&self, category: Option<&str>) -> Result<Vec<MaterialEntry>, ServiceError> {
        self.policy.run("materials", || self.backend.materials(category))
    }

    pub fn add_worker(&self, worker: &NewWorker) -> Result<WorkerEntry, ServiceError> {
        let entry = self.policy.run("add_worker", || self.backend.add_worker(worker))?;
        info!(id = entry.id, category = %entry.category, "worker listed");
        self.mirror("listing", |path| {
            ndjson::mirror_listing_added(path, ListingKind::Worker, entry.id, &entry.name)
        });
        Ok(entry)
    }

    pub fn add_material(&self, material: &NewMaterial) -> Result<MaterialEntry, ServiceError> {
        let entry = self.policy.run("add_material", || self.backend.add_material(material))?;
        info!(id = entry.id, category = %entry.category, "material listed");
        self.mirror("listing", |path| {
            ndjson::mirror_listing_added(path, ListingKind::Material, entry.id, &entry.name)
        });
        Ok(entry)
    }

    pub fn delete_listing(&self, kind: ListingKind, id: i64) -> Result<(), ServiceError> {
        let removed = match kind {
            ListingKind::Worker => {
                self.policy
                    .run("remove_worker", || self.backend.remove_worker(id))?
            }
            ListingKind::Material => {
                self.policy
                    .run("remove_material", || self.backend.remove_material(id))?
            }
        };
        if !removed {
            return Err(ServiceError::NotFound {
                kind: kind.as_str(),
                id,
            });
        }
        info!(kind = kind.as_str(), id, "listing deleted");
        self.mirror("listing deletion", |path| {
            ndjson::mirror_listing_deleted(path, kind, id)
        });
        Ok(())
    }

    pub fn summary(&mut self) -> Result<InboxSummary, ServiceError> {
        let (workers, materials) = self
            .policy
            .run("listing_counts", || self.backend.listing_counts())?;
        let mut out = InboxSummary {
            workers,
            materials,
            ..InboxSummary::default()
        };
        for record in self.records()? {
            out.total += 1;
            let classification = classify(&record.raw_text);
            if classification.is_structured() {
                *out
                    .by_origin
                    .entry(classification.origin().label_key().to_string())
                    .or_default() += 1;
            } else {
                out.plain += 1;
            }
        }
        Ok(out)
    }
}
