//! Build health tracking.
//!
//! [`BuildHealthMonitor`] appends build records, keeps rolling per-target
//! metrics and per-category error counters, raises de-duplicated alerts, and
//! produces [`HealthReport`](buildmedic_types::report::HealthReport)s.

pub mod adapters;
mod classify;
mod monitor;
pub mod ports;
pub mod report;

pub use adapters::{FixedClock, SystemClock};
pub use classify::categorize;
pub use monitor::{
    BuildHealthMonitor, FAILURE_THRESHOLD, FAILURE_WINDOW, SLOW_BUILD_FACTOR,
    high_failure_rate_message, recurring_error_message, slow_build_message,
};
pub use ports::Clock;
