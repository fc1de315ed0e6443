use crate::build::{Environment, Platform};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of build times kept per platform/environment key.
pub const BUILD_TIME_WINDOW: usize = 10;

/// Maximum number of example occurrences kept per error category.
pub const ERROR_EXAMPLE_WINDOW: usize = 3;

/// Rolling performance figures for one platform/environment key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetric {
    #[serde(alias = "totalBuilds")]
    pub total_builds: u64,

    #[serde(alias = "successfulBuilds")]
    pub successful_builds: u64,

    /// Percentage in `[0, 100]`.
    #[serde(default, alias = "successRate", deserialize_with = "de_rate")]
    pub success_rate: f64,

    /// Oldest first; never longer than [`BUILD_TIME_WINDOW`].
    #[serde(default, alias = "buildTimes")]
    pub build_times: Vec<f64>,

    #[serde(default, alias = "averageBuildTime")]
    pub average_build_time: f64,
}

impl PerformanceMetric {
    /// Count one build. Only successful builds contribute a build time.
    pub fn record(&mut self, success: bool, build_time: Option<f64>) {
        self.total_builds += 1;
        if success {
            self.successful_builds += 1;
            if let Some(t) = build_time {
                self.build_times.push(t);
                if self.build_times.len() > BUILD_TIME_WINDOW {
                    let excess = self.build_times.len() - BUILD_TIME_WINDOW;
                    self.build_times.drain(..excess);
                }
            }
        }
        self.recompute();
    }

    fn recompute(&mut self) {
        self.success_rate = if self.total_builds == 0 {
            0.0
        } else {
            self.successful_builds as f64 / self.total_builds as f64 * 100.0
        };
        self.average_build_time = mean(&self.build_times).unwrap_or(0.0);
    }

    /// Success rate with one decimal, e.g. `"50.0"`.
    pub fn success_rate_display(&self) -> String {
        format!("{:.1}", self.success_rate)
    }
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

// Legacy files stored the rate as a preformatted string ("50.0").
fn de_rate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Rate {
        Num(f64),
        Text(String),
    }

    match Rate::deserialize(deserializer)? {
        Rate::Num(n) => Ok(n),
        Rate::Text(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}

/// Coarse classification of a failed build's error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    SignatureIssues,
    MemoryIssues,
    BuildIssues,
    DependencyIssues,
    EnvironmentIssues,
    Other,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::SignatureIssues => "signature_issues",
            ErrorCategory::MemoryIssues => "memory_issues",
            ErrorCategory::BuildIssues => "build_issues",
            ErrorCategory::DependencyIssues => "dependency_issues",
            ErrorCategory::EnvironmentIssues => "environment_issues",
            ErrorCategory::Other => "other",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorExample {
    pub timestamp: DateTime<Utc>,
    pub platform: Platform,
    pub environment: Environment,
    #[serde(alias = "error")]
    pub message: String,
}

/// Occurrence counters for one error category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetric {
    pub count: u64,

    #[serde(default, alias = "lastOccurrence")]
    pub last_occurrence: Option<DateTime<Utc>>,

    /// Oldest first; never longer than [`ERROR_EXAMPLE_WINDOW`].
    #[serde(default)]
    pub examples: Vec<ErrorExample>,
}

impl ErrorMetric {
    pub fn record(&mut self, example: ErrorExample) {
        self.count += 1;
        self.last_occurrence = Some(example.timestamp);
        self.examples.push(example);
        if self.examples.len() > ERROR_EXAMPLE_WINDOW {
            let excess = self.examples.len() - ERROR_EXAMPLE_WINDOW;
            self.examples.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_keeps_last_ten_successful_times() {
        let mut m = PerformanceMetric::default();
        for i in 0..15 {
            m.record(true, Some(i as f64));
        }
        assert_eq!(m.build_times.len(), BUILD_TIME_WINDOW);
        assert_eq!(m.build_times.first().copied(), Some(5.0));
        assert_eq!(m.average_build_time, 9.5);
        assert_eq!(m.success_rate_display(), "100.0");
    }

    #[test]
    fn failures_count_but_do_not_enter_window() {
        let mut m = PerformanceMetric::default();
        m.record(true, Some(120.0));
        m.record(false, Some(60.0));
        assert_eq!(m.total_builds, 2);
        assert_eq!(m.successful_builds, 1);
        assert_eq!(m.build_times, vec![120.0]);
        assert_eq!(m.success_rate_display(), "50.0");
    }

    #[test]
    fn legacy_string_rate_is_accepted() {
        let m: PerformanceMetric = serde_json::from_value(serde_json::json!({
            "totalBuilds": 2,
            "successfulBuilds": 1,
            "successRate": "50.0",
            "buildTimes": [120],
            "averageBuildTime": 120
        }))
        .expect("legacy metric");
        assert_eq!(m.success_rate, 50.0);
        assert_eq!(m.build_times, vec![120.0]);
    }

    #[test]
    fn error_examples_are_bounded() {
        let mut m = ErrorMetric::default();
        for i in 0..5 {
            m.record(ErrorExample {
                timestamp: Utc::now(),
                platform: Platform::Android,
                environment: Environment::Development,
                message: format!("err {i}"),
            });
        }
        assert_eq!(m.count, 5);
        assert_eq!(m.examples.len(), ERROR_EXAMPLE_WINDOW);
        assert_eq!(m.examples[0].message, "err 2");
    }
}
