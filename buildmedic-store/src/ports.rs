//! Port trait abstracting the state directory.

/// Named text blobs (`metrics.json`, `alerts.json`, ...).
pub trait StateStore: Send + Sync {
    /// `Ok(None)` when the blob has never been written.
    fn read(&self, name: &str) -> anyhow::Result<Option<String>>;
    fn write(&self, name: &str, contents: &str) -> anyhow::Result<()>;
}
