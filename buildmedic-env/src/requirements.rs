use serde::{Deserialize, Serialize};

/// Minimum tool versions and required variables, from `[requirements]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvRequirements {
    pub node: String,
    pub npm: String,
    /// Minimum JDK major version.
    pub java: u32,
    /// Required platform directory under `$ANDROID_HOME/platforms`.
    pub android_platform: String,
    pub build_tools: String,
    pub react_native: String,
    pub react: String,
    pub required_vars: Vec<String>,
}

impl Default for EnvRequirements {
    fn default() -> Self {
        Self {
            node: "18.0.0".to_string(),
            npm: "9.0.0".to_string(),
            java: 17,
            android_platform: "android-34".to_string(),
            build_tools: "34.0.0".to_string(),
            react_native: "0.72.0".to_string(),
            react: "18.2.0".to_string(),
            required_vars: vec!["ANDROID_HOME".to_string(), "JAVA_HOME".to_string()],
        }
    }
}
