//! Versioned local cache for time-series rows.
//!
//! Each logical cache owns two storage entries: `{key}` holds the compressed
//! JSON row array and `{key}-Version` holds the plain version tag. Rows written
//! under another version are invisible and are discarded by the next append.
//!
//! Rows are ordered by comparing `time` as strings, so timestamps must sort
//! lexicographically (ISO-8601 does).

mod codec;
mod storage;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{config::CacheConfig, error::CacheError};

pub use codec::{compress, decompress};
pub use storage::{DiskStorage, MemStorage, Storage};

/// Suffix of the entry holding a cache's version tag.
pub const VERSION_SUFFIX: &str = "-Version";

/// One cached row. Fields other than `time` and `conceptUuid` are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_uuid: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SeriesRow {
    pub fn new(time: impl Into<String>, concept_uuid: impl Into<String>) -> Self {
        Self { time: Some(time.into()), concept_uuid: Some(concept_uuid.into()), extra: Map::new() }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(field.into(), value.into());
        self
    }

    /// `time-conceptUuid`, or `None` when either part is missing.
    pub fn key(&self) -> Option<String> {
        Some(format!("{}-{}", self.time.as_ref()?, self.concept_uuid.as_ref()?))
    }
}

/// What a read returns when the decompressed payload is not JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnParseError {
    Null,
    Raw,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CachedItem {
    Json(Value),
    Raw(String),
}

/// Reads and decompresses `key`. Missing or undecodable entries read as `None`.
pub fn read_item(store: &dyn Storage, key: &str, mode: OnParseError) -> Option<CachedItem> {
    let bytes = match store.get(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(err) => {
            warn!(key, err = %format!("{err:#}"), "cache read failed");
            return None;
        }
    };
    let text = match decompress(&bytes) {
        Ok(text) => text,
        Err(err) => {
            debug!(key, %err, "cache entry is not decompressible");
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(value) => Some(CachedItem::Json(value)),
        Err(_) if mode == OnParseError::Raw => Some(CachedItem::Raw(text)),
        Err(err) => {
            debug!(key, %err, "cache entry is not JSON");
            None
        }
    }
}

/// Existing rows deduplicated by key, then incoming rows with unseen keys,
/// sorted by `time` descending. Rows without a key are always kept.
pub fn merge_rows(existing: Vec<SeriesRow>, incoming: Vec<SeriesRow>) -> Vec<SeriesRow> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(existing.len() + incoming.len());
    for row in existing.into_iter().chain(incoming) {
        if let Some(key) = row.key() {
            if !seen.insert(key) { continue }
        }
        merged.push(row);
    }
    merged.sort_by(|a, b| b.time.cmp(&a.time));
    merged
}

/// Series persisted under one key and tagged with a version.
pub struct VersionedCache<S: Storage> {
    store: S,
    key: String,
    version: String,
}

impl VersionedCache<DiskStorage> {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(DiskStorage::new(&config.dir), &config.key, &config.version)
    }
}

impl<S: Storage> VersionedCache<S> {
    pub fn new(store: S, key: impl Into<String>, version: impl Into<String>) -> Self {
        Self { store, key: key.into(), version: version.into() }
    }

    pub fn key(&self) -> &str { &self.key }

    pub fn version(&self) -> &str { &self.version }

    pub fn store(&self) -> &S { &self.store }

    pub fn into_inner(self) -> S { self.store }

    fn version_key(&self) -> String { format!("{}{VERSION_SUFFIX}", self.key) }

    /// Version tag currently on storage, if readable.
    pub fn stored_version(&self) -> Option<String> {
        match self.store.get(&self.version_key()) {
            Ok(bytes) => bytes.and_then(|b| String::from_utf8(b).ok()),
            Err(err) => {
                warn!(key = %self.key, err = %format!("{err:#}"), "cache version read failed");
                None
            }
        }
    }

    pub fn is_current(&self) -> bool {
        self.stored_version().as_deref() == Some(self.version.as_str())
    }

    fn load_rows(&self) -> Option<Vec<SeriesRow>> {
        match read_item(&self.store, &self.key, OnParseError::Null)? {
            CachedItem::Json(value) => serde_json::from_value(value)
                .map_err(|err| debug!(key = %self.key, %err, "cached rows have the wrong shape"))
                .ok(),
            CachedItem::Raw(_) => None,
        }
    }

    /// Stored rows, or `None` on a version mismatch or unreadable entry.
    pub fn get(&self) -> Option<Vec<SeriesRow>> {
        if !self.is_current() {
            debug!(key = %self.key, expected = %self.version, "cache version mismatch");
            return None;
        }
        self.load_rows()
    }

    fn write(&mut self, rows: &[SeriesRow]) -> Result<(), CacheError> {
        let packed = compress(&serde_json::to_string(rows)?)?;
        self.store.put(&self.key, &packed)?;
        let version_key = self.version_key();
        self.store.put(&version_key, self.version.as_bytes())?;
        Ok(())
    }

    /// Overwrites the stored rows and stamps the current version.
    pub fn replace_data(&mut self, rows: Vec<SeriesRow>) -> Result<(), CacheError> {
        self.write(&rows)
    }

    /// Merges `rows` into the stored series and returns the number of rows stored.
    /// Rows stored under another version are dropped first.
    pub fn append_data(&mut self, rows: Vec<SeriesRow>) -> Result<usize, CacheError> {
        let existing = if self.is_current() {
            self.load_rows().unwrap_or_default()
        } else {
            debug!(key = %self.key, version = %self.version, "starting cold");
            Vec::new()
        };
        let merged = merge_rows(existing, rows);
        self.write(&merged)?;
        Ok(merged.len())
    }

    /// Removes both entries of this cache.
    pub fn clear(&mut self) -> Result<(), CacheError> {
        self.store.remove(&self.key)?;
        let version_key = self.version_key();
        self.store.remove(&version_key)?;
        Ok(())
    }
}
