use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Success,
    Warning,
    Error,
}

/// Result of a single environment check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentCheck {
    pub name: String,
    pub status: CheckStatus,

    /// Detected version or other identifying info.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    pub message: String,

    /// Suggested fix when the check is not `success`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

impl EnvironmentCheck {
    pub fn success(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(name, CheckStatus::Success, message)
    }

    pub fn warning(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(name, CheckStatus::Warning, message)
    }

    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(name, CheckStatus::Error, message)
    }

    fn with_status(name: impl Into<String>, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            version: None,
            message: message.into(),
            resolution: None,
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = Some(resolution.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.status == CheckStatus::Error
    }
}

/// Aggregate of all checks run by the validator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub success: bool,
    pub checks: Vec<EnvironmentCheck>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationSummary {
    pub fn from_checks(checks: Vec<EnvironmentCheck>) -> Self {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();
        for c in &checks {
            match c.status {
                CheckStatus::Success => {}
                CheckStatus::Warning => warnings.push(format!("{}: {}", c.name, c.message)),
                CheckStatus::Error => errors.push(format!("{}: {}", c.name, c.message)),
            }
        }
        Self {
            success: errors.is_empty(),
            checks,
            warnings,
            errors,
        }
    }
}
