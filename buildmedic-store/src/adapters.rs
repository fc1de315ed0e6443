//! Filesystem and in-memory [`StateStore`] implementations.

use crate::ports::StateStore;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::debug;

/// One file per blob inside a state directory, created on first write.
#[derive(Debug, Clone)]
pub struct FsStateStore {
    dir: Utf8PathBuf,
}

impl FsStateStore {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> Utf8PathBuf {
        self.dir.join(name)
    }
}

impl StateStore for FsStateStore {
    fn read(&self, name: &str) -> anyhow::Result<Option<String>> {
        let path = self.path(name);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).with_context(|| format!("read {}", path))?;
        Ok(Some(text))
    }

    fn write(&self, name: &str, contents: &str) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| format!("create_dir_all {}", self.dir))?;
        let path = self.path(name);
        fs::write(&path, contents).with_context(|| format!("write {}", path))?;
        debug!(%path, bytes = contents.len(), "state written");
        Ok(())
    }
}

/// Keeps blobs in memory; for embedding and tests.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    files: Mutex<BTreeMap<String, String>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a blob, e.g. a legacy file.
    pub fn with(self, name: &str, contents: impl Into<String>) -> Self {
        self.lock().insert(name.to_string(), contents.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.lock().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.files.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl StateStore for InMemoryStateStore {
    fn read(&self, name: &str) -> anyhow::Result<Option<String>> {
        Ok(self.get(name))
    }

    fn write(&self, name: &str, contents: &str) -> anyhow::Result<()> {
        self.lock().insert(name.to_string(), contents.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_store_creates_dir_on_first_write() {
        let temp = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::from_path_buf(temp.path().join(".buildmedic")).unwrap();
        let store = FsStateStore::new(dir.clone());

        assert_eq!(store.read("alerts.json").unwrap(), None);
        store.write("alerts.json", "{}").unwrap();
        assert!(dir.join("alerts.json").exists());
        assert_eq!(store.read("alerts.json").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn in_memory_store_round_trips() {
        let store = InMemoryStateStore::new().with("metrics.json", "[]");
        assert_eq!(store.read("metrics.json").unwrap().as_deref(), Some("[]"));
        store.write("alerts.json", "{}").unwrap();
        assert_eq!(store.names(), vec!["alerts.json", "metrics.json"]);
    }
}
