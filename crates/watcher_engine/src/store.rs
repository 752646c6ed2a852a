use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use watch_logging::{watch_debug, watch_info};
use watcher_core::Link;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("link store unavailable: {0}")]
    Unavailable(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("link store snapshot is corrupt: {0}")]
    Corrupt(String),
    #[error("could not serialize link store snapshot: {0}")]
    Serialize(String),
}

/// One durable record: a link and the UTC instant it was first observed.
/// Created once at commit time, immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub link: String,
    pub first_seen_utc: String,
}

/// Outcome of an `append` call. Links already present are skipped, never
/// duplicated, and counted in `already_present`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppendReport {
    pub appended: usize,
    pub already_present: usize,
}

/// Durable set of previously observed links. Append-only: no delete, no
/// update, and appending a link that is already present is a no-op.
pub trait LinkStore: Send + Sync {
    /// Deterministic membership test against the known-link set.
    fn contains(&self, link: &Link) -> bool;

    /// Persists each absent link with the current UTC timestamp.
    ///
    /// All-or-nothing: either every new record is durable after this
    /// returns `Ok`, or none is and the previous state is intact.
    fn append(&self, links: &BTreeSet<Link>) -> Result<AppendReport, StoreError>;

    /// Number of committed link records.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct StoreSnapshot {
    records: Vec<LinkRecord>,
}

#[derive(Debug, Default)]
struct Inner {
    records: Vec<LinkRecord>,
    index: HashSet<String>,
}

impl Inner {
    fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let mut inner = Inner::default();
        for record in snapshot.records {
            inner.insert(record);
        }
        inner
    }

    /// Keeps the first record per link; later duplicates are dropped.
    fn insert(&mut self, record: LinkRecord) -> bool {
        if self.index.contains(&record.link) {
            return false;
        }
        self.index.insert(record.link.clone());
        self.records.push(record);
        true
    }
}

/// File-backed [`LinkStore`]: a RON snapshot loaded at open, membership
/// served from an in-memory index, appends rewriting the snapshot atomically
/// (temp file then rename) so a crash mid-commit leaves the previous state.
#[derive(Debug)]
pub struct FileLinkStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl FileLinkStore {
    /// Opens the store at `path`. A missing file is an empty store; a file
    /// that exists but does not parse is reported, never truncated.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let snapshot = read_snapshot(&path)?;
        let inner = Inner::from_snapshot(snapshot);
        watch_info!(
            "Opened link store at {:?} with {} known links",
            path,
            inner.records.len()
        );
        Ok(Self {
            path,
            inner: Mutex::new(inner),
        })
    }

    /// Snapshot of all records, for reporting and tests.
    pub fn records(&self) -> Vec<LinkRecord> {
        self.inner.lock().expect("link store lock").records.clone()
    }

    /// First-seen timestamp for an exact link string, if committed.
    pub fn first_seen_utc(&self, link: &Link) -> Option<String> {
        let inner = self.inner.lock().expect("link store lock");
        inner
            .records
            .iter()
            .find(|record| record.link == link.as_str())
            .map(|record| record.first_seen_utc.clone())
    }
}

impl LinkStore for FileLinkStore {
    fn contains(&self, link: &Link) -> bool {
        let inner = self.inner.lock().expect("link store lock");
        inner.index.contains(link.as_str())
    }

    fn append(&self, links: &BTreeSet<Link>) -> Result<AppendReport, StoreError> {
        let mut inner = self.inner.lock().expect("link store lock");

        // Merge whatever is on disk first, so an overlapping cycle that
        // committed since we opened cannot be overwritten or re-appended.
        let mut candidate = Inner::default();
        for record in read_snapshot(&self.path)?.records {
            candidate.insert(record);
        }
        for record in inner.records.clone() {
            candidate.insert(record);
        }

        // One timestamp for the whole batch: the commit instant.
        let first_seen_utc = Utc::now().to_rfc3339();
        let mut report = AppendReport::default();
        for link in links {
            let record = LinkRecord {
                link: link.as_str().to_string(),
                first_seen_utc: first_seen_utc.clone(),
            };
            if candidate.insert(record) {
                report.appended += 1;
            } else {
                report.already_present += 1;
            }
        }

        if report.appended > 0 || candidate.records.len() != inner.records.len() {
            write_snapshot(&self.path, &candidate.records)?;
        }

        // Memory reflects disk only once the rename succeeded.
        *inner = candidate;
        watch_debug!(
            "Appended {} links ({} already present), store now holds {}",
            report.appended,
            report.already_present,
            inner.records.len()
        );
        Ok(report)
    }

    fn len(&self) -> usize {
        self.inner.lock().expect("link store lock").records.len()
    }
}

fn read_snapshot(path: &Path) -> Result<StoreSnapshot, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Ok(StoreSnapshot::default());
        }
        Err(err) => return Err(StoreError::Io(err)),
    };

    ron::from_str(&content).map_err(|err| StoreError::Corrupt(err.to_string()))
}

fn write_snapshot(path: &Path, records: &[LinkRecord]) -> Result<(), StoreError> {
    let snapshot = StoreSnapshot {
        records: records.to_vec(),
    };
    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(&snapshot, pretty)
        .map_err(|err| StoreError::Serialize(err.to_string()))?;

    let dir = state_dir(path);
    fs::create_dir_all(&dir).map_err(|err| StoreError::Unavailable(err.to_string()))?;

    let mut tmp = NamedTempFile::new_in(&dir)
        .map_err(|err| StoreError::Unavailable(err.to_string()))?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|err| StoreError::Io(err.error))?;
    Ok(())
}

fn state_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
