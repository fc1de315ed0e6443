use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    HighFailureRate,
    SlowBuild,
    RecurringError,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::HighFailureRate => "high_failure_rate",
            AlertKind::SlowBuild => "slow_build",
            AlertKind::RecurringError => "recurring_error",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Medium,
    High,
}

impl AlertSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
        }
    }
}

/// A raised alert. At most one unresolved alert exists per `(kind, message)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub timestamp: DateTime<Utc>,

    #[serde(rename = "type")]
    pub kind: AlertKind,

    pub message: String,
    pub severity: AlertSeverity,

    #[serde(default)]
    pub resolved: bool,

    #[serde(
        default,
        alias = "resolvedAt",
        skip_serializing_if = "Option::is_none"
    )]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn new(
        timestamp: DateTime<Utc>,
        kind: AlertKind,
        severity: AlertSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp,
            kind,
            message: message.into(),
            severity,
            resolved: false,
            resolved_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.resolved
    }

    /// True when this alert is unresolved and describes the same issue.
    pub fn duplicates(&self, kind: AlertKind, message: &str) -> bool {
        self.is_active() && self.kind == kind && self.message == message
    }

    pub fn resolve(&mut self, at: DateTime<Utc>) {
        self.resolved = true;
        self.resolved_at = Some(at);
    }
}
