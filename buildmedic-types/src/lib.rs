//! Shared DTOs (schemas-as-code) for the buildmedic workspace.
//!
//! # Design constraints
//! - These types are serialized to the state directory and read back on the next run.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.
//! - Field aliases accept the camelCase spelling used by legacy state files.

pub mod alert;
pub mod build;
pub mod env;
pub mod metrics;
pub mod report;
pub mod resolution;
pub mod signing;
pub mod wire;

/// Schema identifiers.
pub mod schema {
    pub const METRICS_V1: &str = "buildmedic.metrics.v1";
    pub const ALERTS_V1: &str = "buildmedic.alerts.v1";
    pub const RESOLUTION_HISTORY_V1: &str = "buildmedic.resolution_history.v1";
    pub const HEALTH_REPORT_V1: &str = "buildmedic.health_report.v1";
}

/// File names inside the state directory.
pub mod files {
    pub const METRICS: &str = "metrics.json";
    pub const ALERTS: &str = "alerts.json";
    pub const RESOLUTION_HISTORY: &str = "resolution-history.json";
    pub const HEALTH_REPORT: &str = "health-report.json";
    pub const HEALTH_REPORT_MD: &str = "health-report.md";
}
