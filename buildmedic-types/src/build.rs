use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target platform of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Android, Platform::Ios];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => Err(ParseVariantError {
                kind: "platform",
                value: other.to_string(),
            }),
        }
    }
}

/// Deployment environment a build is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub const ALL: [Environment; 3] = [
        Environment::Development,
        Environment::Staging,
        Environment::Production,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    pub fn is_development(self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ParseVariantError {
                kind: "environment",
                value: other.to_string(),
            }),
        }
    }
}

/// Error returned when a platform/environment name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVariantError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseVariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseVariantError {}

/// Metric key for a platform/environment pair, e.g. `android_development`.
pub fn metric_key(platform: Platform, environment: Environment) -> String {
    format!("{}_{}", platform.as_str(), environment.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Success,
    Failure,
}

/// One build outcome. Records are append-only; metrics are derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub platform: Platform,
    pub environment: Environment,
    pub status: BuildStatus,

    /// Wall-clock build duration in seconds.
    #[serde(
        default,
        alias = "buildTime",
        skip_serializing_if = "Option::is_none"
    )]
    pub build_time: Option<f64>,

    /// Artifact size in bytes.
    #[serde(
        default,
        alias = "artifactSize",
        skip_serializing_if = "Option::is_none"
    )]
    pub artifact_size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BuildRecord {
    pub fn success(
        timestamp: DateTime<Utc>,
        platform: Platform,
        environment: Environment,
        build_time: Option<f64>,
        artifact_size: Option<u64>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp,
            platform,
            environment,
            status: BuildStatus::Success,
            build_time,
            artifact_size,
            error: None,
        }
    }

    pub fn failure(
        timestamp: DateTime<Utc>,
        platform: Platform,
        environment: Environment,
        error: impl Into<String>,
        build_time: Option<f64>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp,
            platform,
            environment,
            status: BuildStatus::Failure,
            build_time,
            artifact_size: None,
            error: Some(error.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == BuildStatus::Failure
    }

    pub fn key(&self) -> String {
        metric_key(self.platform, self.environment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_and_environment_parse_case_insensitively() {
        assert_eq!("Android".parse::<Platform>().unwrap(), Platform::Android);
        assert_eq!("IOS".parse::<Platform>().unwrap(), Platform::Ios);
        assert_eq!(
            "prod".parse::<Environment>().unwrap(),
            Environment::Production
        );
        let err = "web".parse::<Platform>().unwrap_err();
        assert_eq!(err.to_string(), "unknown platform: 'web'");
    }

    #[test]
    fn metric_key_joins_platform_and_environment() {
        assert_eq!(
            metric_key(Platform::Android, Environment::Development),
            "android_development"
        );
        assert_eq!(metric_key(Platform::Ios, Environment::Staging), "ios_staging");
    }

    #[test]
    fn failure_record_carries_error_and_no_artifact() {
        let r = BuildRecord::failure(
            Utc::now(),
            Platform::Ios,
            Environment::Production,
            "boom",
            Some(3.0),
        );
        assert!(r.is_failure());
        assert_eq!(r.error.as_deref(), Some("boom"));
        assert!(r.artifact_size.is_none());
        assert_eq!(r.key(), "ios_production");
    }
}
