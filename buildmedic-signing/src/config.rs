use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Debug signing identity, from the `[signing]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Application id as installed on the device.
    pub package_name: String,
    /// Keystore path relative to the project root.
    pub keystore: Utf8PathBuf,
    pub alias: String,
    pub store_password: String,
    pub key_password: String,
    pub dname: String,
    pub validity_days: u32,
    /// Gradle module file holding `signingConfigs`, relative to the project root.
    pub build_gradle: Utf8PathBuf,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            package_name: "com.example.app".to_string(),
            keystore: Utf8PathBuf::from("android/app/debug.keystore"),
            alias: "androiddebugkey".to_string(),
            store_password: "android".to_string(),
            key_password: "android".to_string(),
            dname: "CN=Android Debug,O=Android,C=US".to_string(),
            validity_days: 10000,
            build_gradle: Utf8PathBuf::from("android/app/build.gradle"),
        }
    }
}
