//! Hit recorder for unknown URLs, with JSON persistence.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::observability::metrics;

/// Placeholder stored when a request carried no `Referer`.
pub const NO_REFERER: &str = "NULL";

/// Identity of a not-found hit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HitKey {
    pub uri: String,
    pub referer: String,
    pub client_ip: IpAddr,
}

impl HitKey {
    pub fn new(uri: impl Into<String>, referer: Option<&str>, client_ip: IpAddr) -> Self {
        let referer = referer
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(NO_REFERER);
        Self {
            uri: uri.into(),
            referer: referer.to_string(),
            client_ip,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HitCounter {
    count: u64,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
}

/// Flattened entry, as persisted and as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotFoundEntry {
    pub uri: String,
    pub referer: String,
    pub client_ip: IpAddr,
    pub count: u64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Concurrent log of not-found hits, cheap to clone.
///
/// Holds at most `max_entries` distinct keys. Once full, hits on known keys
/// still count while hits on new keys are dropped. Concurrent first hits may
/// overshoot the cap by the number of racing writers.
#[derive(Clone)]
pub struct NotFoundLog {
    inner: Arc<DashMap<HitKey, HitCounter>>,
    persist_path: Option<PathBuf>,
    max_entries: usize,
}

impl NotFoundLog {
    /// Create an empty log that saves to `persist_path`, if any.
    pub fn new(persist_path: Option<PathBuf>, max_entries: usize) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persist_path,
            max_entries,
        }
    }

    /// Open the log at `path`, loading existing entries when the file exists.
    ///
    /// Keeps the `max_entries` most hit entries of the file.
    pub fn load_from_file(path: impl AsRef<Path>, max_entries: usize) -> io::Result<Self> {
        let path = path.as_ref();
        let log = Self::new(Some(path.to_path_buf()), max_entries);
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let mut entries: Vec<NotFoundEntry> = serde_json::from_reader(reader)?;
            if entries.len() > max_entries {
                tracing::warn!(
                    path = %path.display(),
                    entries = entries.len(),
                    max_entries,
                    "Persisted not-found log exceeds capacity, keeping most hit entries"
                );
                entries.sort_by(|a, b| b.count.cmp(&a.count));
                entries.truncate(max_entries);
            }
            for entry in entries {
                log.inner.insert(
                    HitKey {
                        uri: entry.uri,
                        referer: entry.referer,
                        client_ip: entry.client_ip,
                    },
                    HitCounter {
                        count: entry.count,
                        created: entry.created,
                        updated: entry.updated,
                    },
                );
            }
            tracing::info!(path = %path.display(), entries = log.len(), "Loaded not-found log");
        }
        Ok(log)
    }

    /// Like [`load_from_file`](Self::load_from_file), but an unreadable file
    /// is moved to `<path>.corrupt` and the log starts empty.
    pub fn open(path: impl AsRef<Path>, max_entries: usize) -> Self {
        let path = path.as_ref();
        match Self::load_from_file(path, max_entries) {
            Ok(log) => log,
            Err(e) => {
                let aside = corrupt_path(path);
                match fs::rename(path, &aside) {
                    Ok(()) => tracing::warn!(
                        path = %path.display(),
                        moved_to = %aside.display(),
                        error = %e,
                        "Cannot load not-found log, moved it aside and starting empty"
                    ),
                    Err(rename_err) => tracing::error!(
                        path = %path.display(),
                        error = %e,
                        rename_error = %rename_err,
                        "Cannot load not-found log nor move it aside, starting empty"
                    ),
                }
                Self::new(Some(path.to_path_buf()), max_entries)
            }
        }
    }

    /// Write all entries to the persist path. No-op without one.
    pub fn save_to_file(&self) -> io::Result<()> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        let entries = self.entries();
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &entries)?;
        tracing::info!(path = %path.display(), entries = entries.len(), "Saved not-found log");
        Ok(())
    }

    /// Record a hit; returns the hit count for `key` after recording, or
    /// `None` when `key` is new and the log is full.
    pub fn record(&self, key: HitKey) -> Option<u64> {
        self.record_at(key, Utc::now())
    }

    fn record_at(&self, key: HitKey, now: DateTime<Utc>) -> Option<u64> {
        let count = self.bump(key, now);
        metrics::record_not_found(self.inner.len(), count.is_some());
        count
    }

    fn bump(&self, key: HitKey, now: DateTime<Utc>) -> Option<u64> {
        if let Some(mut counter) = self.inner.get_mut(&key) {
            counter.count += 1;
            counter.updated = now;
            return Some(counter.count);
        }
        if self.inner.len() >= self.max_entries {
            return None;
        }
        let mut counter = self.inner.entry(key).or_insert(HitCounter {
            count: 0,
            created: now,
            updated: now,
        });
        counter.count += 1;
        counter.updated = now;
        Some(counter.count)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Snapshot of every entry, most hit first.
    pub fn entries(&self) -> Vec<NotFoundEntry> {
        let mut entries: Vec<NotFoundEntry> = self
            .inner
            .iter()
            .map(|r| {
                let (key, counter) = r.pair();
                NotFoundEntry {
                    uri: key.uri.clone(),
                    referer: key.referer.clone(),
                    client_ip: key.client_ip,
                    count: counter.count,
                    created: counter.created,
                    updated: counter.updated,
                }
            })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.uri.cmp(&b.uri)));
        entries
    }

    /// The `limit` most requested URIs with their hit totals, summed over
    /// referers and clients.
    pub fn top_uris(&self, limit: usize) -> Vec<(String, u64)> {
        let mut totals = std::collections::HashMap::<String, u64>::new();
        for r in self.inner.iter() {
            *totals.entry(r.key().uri.clone()).or_default() += r.value().count;
        }
        let mut top: Vec<(String, u64)> = totals.into_iter().collect();
        top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top.truncate(limit);
        top
    }
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".corrupt");
    PathBuf::from(name)
}
