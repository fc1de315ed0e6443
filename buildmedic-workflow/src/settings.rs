use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Project layout knobs. Paths are relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    pub ios_workspace: Utf8PathBuf,
    pub ios_scheme: String,
    /// JSON manifest carrying the development flag.
    pub manifest: Utf8PathBuf,
    pub env_file: Utf8PathBuf,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            ios_workspace: Utf8PathBuf::from("ios/App.xcworkspace"),
            ios_scheme: "App".to_string(),
            manifest: Utf8PathBuf::from("app.json"),
            env_file: Utf8PathBuf::from(".env"),
        }
    }
}
