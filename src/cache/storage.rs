use std::{collections::HashMap, fs, io::{ErrorKind, Write}, path::PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

/// Durable key-value storage for cache entries.
/// Writers to the same key are not coordinated; the last `put` wins.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn put(&mut self, key: &str, bytes: &[u8]) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// One file per key under `root`. File names are the hex-encoded key.
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    fn full(&self, key: &str) -> PathBuf { self.root.join(hex::encode(key.as_bytes())) }
}

impl Storage for DiskStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.full(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("read cache entry {key}")),
        }
    }

    /// Write-then-rename so readers never see a partial entry.
    fn put(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("create dir {}", self.root.display()))?;
        let mut tmp = NamedTempFile::new_in(&self.root).context("create temp file")?;
        tmp.write_all(bytes).with_context(|| format!("write cache entry {key}"))?;
        tmp.as_file().sync_all().ok(); // best-effort fsync
        tmp.persist(self.full(key))
            .with_context(|| format!("rename cache entry {key}"))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.full(key)) {
            Err(err) if err.kind() != ErrorKind::NotFound => {
                Err(err).with_context(|| format!("remove cache entry {key}"))
            }
            _ => Ok(()),
        }
    }
}

/// Simple in-memory storage.
#[derive(Default, Clone)]
pub struct MemStorage {
    pub(crate) entries: HashMap<String, Vec<u8>>,
}

impl MemStorage {
    pub fn new() -> Self { Self::default() }
}

impl Storage for MemStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        self.entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DiskStorage::new(dir.path().join("cache"));
        assert_eq!(store.get("indicator/values").unwrap(), None);

        store.put("indicator/values", b"abc").unwrap();
        assert_eq!(store.get("indicator/values").unwrap().as_deref(), Some(&b"abc"[..]));

        store.put("indicator/values", b"xyz").unwrap();
        assert_eq!(store.get("indicator/values").unwrap().as_deref(), Some(&b"xyz"[..]));

        store.remove("indicator/values").unwrap();
        store.remove("indicator/values").unwrap();
        assert_eq!(store.get("indicator/values").unwrap(), None);
    }

    #[test]
    fn disk_keys_do_not_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStorage::new(dir.path());
        let path = store.full("../outside");
        assert_eq!(path.parent(), Some(dir.path()));
    }
}
