use crate::classify::categorize;
use crate::ports::Clock;
use crate::report::{self, RECURRING_THRESHOLD};
use buildmedic_store::StateStore;
use buildmedic_types::alert::{Alert, AlertKind, AlertSeverity};
use buildmedic_types::build::{BuildRecord, Environment, Platform};
use buildmedic_types::files;
use buildmedic_types::metrics::{ErrorCategory, ErrorExample};
use buildmedic_types::report::HealthReport;
use buildmedic_types::wire::MetricsV1;
use std::sync::Arc;
use tracing::{info, warn};

/// Number of most recent builds inspected by the failure-rate rule.
pub const FAILURE_WINDOW: usize = 5;

/// Failures within [`FAILURE_WINDOW`] that raise a high-severity alert.
pub const FAILURE_THRESHOLD: usize = 3;

/// A successful build slower than this multiple of its key's average is flagged.
pub const SLOW_BUILD_FACTOR: f64 = 1.5;

pub fn high_failure_rate_message() -> String {
    format!(
        "High failure rate detected: {FAILURE_THRESHOLD} or more of the last {FAILURE_WINDOW} builds failed"
    )
}

pub fn slow_build_message(key: &str) -> String {
    format!("Slow build detected for {key}: more than {SLOW_BUILD_FACTOR}x the average build time")
}

pub fn recurring_error_message(category: ErrorCategory) -> String {
    format!("Recurring {category} errors detected")
}

/// Tracks build outcomes and keeps metrics and alerts in the state store.
///
/// State is loaded once at construction and written through after every mutation.
pub struct BuildHealthMonitor {
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    metrics: MetricsV1,
    alerts: Vec<Alert>,
}

impl BuildHealthMonitor {
    pub fn new(store: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        let metrics = buildmedic_store::load_metrics(store.as_ref());
        let alerts = buildmedic_store::load_alerts(store.as_ref());
        Self {
            store,
            clock,
            metrics,
            alerts,
        }
    }

    pub fn metrics(&self) -> &MetricsV1 {
        &self.metrics
    }

    pub fn builds(&self) -> &[BuildRecord] {
        &self.metrics.builds
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn active_alerts(&self) -> Vec<&Alert> {
        self.alerts.iter().filter(|a| a.is_active()).collect()
    }

    pub fn record_build_success(
        &mut self,
        platform: Platform,
        environment: Environment,
        build_time: f64,
        artifact_size: Option<u64>,
    ) -> BuildRecord {
        let record = BuildRecord::success(
            self.clock.now(),
            platform,
            environment,
            Some(build_time),
            artifact_size,
        );
        self.record(record)
    }

    pub fn record_build_failure(
        &mut self,
        platform: Platform,
        environment: Environment,
        error: &str,
        build_time: Option<f64>,
    ) -> BuildRecord {
        let record = BuildRecord::failure(self.clock.now(), platform, environment, error, build_time);
        self.record(record)
    }

    fn record(&mut self, record: BuildRecord) -> BuildRecord {
        let key = record.key();
        let success = !record.is_failure();
        info!(%key, success, build_time = ?record.build_time, "recording build");

        self.metrics.builds.push(record.clone());
        self.metrics
            .performance
            .entry(key.clone())
            .or_default()
            .record(success, record.build_time);

        let category = record.error.as_deref().map(|text| {
            let category = categorize(text);
            self.metrics.errors.entry(category).or_default().record(ErrorExample {
                timestamp: record.timestamp,
                platform: record.platform,
                environment: record.environment,
                message: text.to_string(),
            });
            category
        });

        self.evaluate_rules(&record, &key, category);
        buildmedic_store::save_metrics(self.store.as_ref(), &self.metrics);
        buildmedic_store::save_alerts(self.store.as_ref(), &self.alerts);
        record
    }

    fn evaluate_rules(&mut self, record: &BuildRecord, key: &str, category: Option<ErrorCategory>) {
        let recent = &self.metrics.builds[self.metrics.builds.len().saturating_sub(FAILURE_WINDOW)..];
        if recent.iter().filter(|b| b.is_failure()).count() >= FAILURE_THRESHOLD {
            self.raise(AlertKind::HighFailureRate, AlertSeverity::High, high_failure_rate_message());
        }

        if !record.is_failure()
            && let Some(time) = record.build_time
        {
            let average = self
                .metrics
                .performance
                .get(key)
                .map_or(0.0, |m| m.average_build_time);
            if average > 0.0 && time > average * SLOW_BUILD_FACTOR {
                self.raise(AlertKind::SlowBuild, AlertSeverity::Medium, slow_build_message(key));
            }
        }

        if let Some(category) = category
            && self.metrics.errors.get(&category).is_some_and(|m| m.count >= RECURRING_THRESHOLD)
        {
            self.raise(
                AlertKind::RecurringError,
                AlertSeverity::Medium,
                recurring_error_message(category),
            );
        }
    }

    fn raise(&mut self, kind: AlertKind, severity: AlertSeverity, message: String) {
        if self.alerts.iter().any(|a| a.duplicates(kind, &message)) {
            return;
        }
        warn!(%kind, severity = severity.as_str(), %message, "alert raised");
        self.alerts.push(Alert::new(self.clock.now(), kind, severity, message));
    }

    /// Mark an alert resolved. Returns false for unknown or already-resolved ids.
    pub fn resolve_alert(&mut self, id: &str) -> bool {
        let now = self.clock.now();
        let Some(alert) = self.alerts.iter_mut().find(|a| a.id == id && a.is_active()) else {
            return false;
        };
        alert.resolve(now);
        info!(id, "alert resolved");
        buildmedic_store::save_alerts(self.store.as_ref(), &self.alerts);
        true
    }

    pub fn health_score(&self) -> f64 {
        report::health_score(&self.metrics.builds, &self.alerts)
    }

    /// Build the report and persist it as `health-report.json`.
    pub fn generate_report(&self) -> HealthReport {
        let report = report::generate(&self.metrics, &self.alerts, self.clock.now());
        if let Err(e) = buildmedic_store::save_json(self.store.as_ref(), files::HEALTH_REPORT, &report) {
            warn!(error = %format!("{e:#}"), "failed to persist health report");
        }
        info!(score = report.health_score, "health report generated");
        report
    }
}
