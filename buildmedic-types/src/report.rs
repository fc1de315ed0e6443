use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Generated health report, persisted as `health-report.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub schema: String,
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,

    /// Keyed by `<platform>_<environment>`.
    #[serde(default)]
    pub performance: BTreeMap<String, PerformanceSummary>,

    /// Keyed by error category.
    #[serde(default)]
    pub errors: BTreeMap<String, ErrorFrequency>,

    pub alerts: AlertRollup,

    #[serde(default)]
    pub recommendations: Vec<Recommendation>,

    pub health_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_builds: u64,
    pub successful_builds: u64,
    pub failed_builds: u64,
    pub success_rate: f64,
    pub builds_last_24h: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_build: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_builds: u64,
    pub successful_builds: u64,
    pub success_rate: f64,
    pub average_build_time: f64,
    pub trend: Trend,
}

/// Direction of recent build times relative to the older part of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
            Trend::InsufficientData => "insufficient_data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorFrequency {
    pub count: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_occurrence: Option<DateTime<Utc>>,

    pub frequency: Frequency,
}

/// Bucket by days since the last occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Rare,
}

impl Frequency {
    pub fn from_days(days: f64) -> Self {
        if days < 1.0 {
            Frequency::Daily
        } else if days < 7.0 {
            Frequency::Weekly
        } else if days < 30.0 {
            Frequency::Monthly
        } else {
            Frequency::Rare
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Rare => "rare",
        }
    }
}

/// Alert counts. `high`/`medium` count active alerts only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRollup {
    pub active: u64,
    pub resolved: u64,
    pub high: u64,
    pub medium: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    SlowBuilds,
    RecurringErrors,
    LowSuccessRate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,

    /// Metric key or error category the recommendation is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    pub message: String,
}
