//! Health report generation from the monitor's aggregates.

use buildmedic_types::alert::{Alert, AlertSeverity};
use buildmedic_types::build::BuildRecord;
use buildmedic_types::metrics::mean;
use buildmedic_types::report::{
    AlertRollup, ErrorFrequency, Frequency, HealthReport, PerformanceSummary, Recommendation,
    RecommendationKind, ReportSummary, Trend,
};
use buildmedic_types::schema;
use buildmedic_types::wire::MetricsV1;
use chrono::{DateTime, Duration, Utc};

/// Average build time, in seconds, above which a key is flagged as slow.
pub const SLOW_AVERAGE_SECS: f64 = 300.0;

/// Overall success rate (percent) below which the project is flagged.
pub const LOW_SUCCESS_RATE: f64 = 80.0;

/// Occurrences at which an error category counts as recurring.
pub const RECURRING_THRESHOLD: u64 = 3;

const TREND_RECENT: usize = 3;
const TREND_TOLERANCE: f64 = 0.10;

/// Mean of the last three times against the mean of the rest of the window.
pub fn trend(window: &[f64]) -> Trend {
    if window.len() < TREND_RECENT {
        return Trend::InsufficientData;
    }
    let (older, recent) = window.split_at(window.len() - TREND_RECENT);
    let (Some(recent), Some(older)) = (mean(recent), mean(older)) else {
        return Trend::Stable;
    };
    if recent > older * (1.0 + TREND_TOLERANCE) {
        Trend::Increasing
    } else if recent < older * (1.0 - TREND_TOLERANCE) {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

/// Percentage of successful builds; `None` without builds.
pub fn overall_success_rate(builds: &[BuildRecord]) -> Option<f64> {
    if builds.is_empty() {
        return None;
    }
    let ok = builds.iter().filter(|b| !b.is_failure()).count();
    Some(ok as f64 / builds.len() as f64 * 100.0)
}

/// Success rate minus 5 per active alert and a further 10 per active high alert,
/// clamped to `[0, 100]`. A project without builds starts at 100.
pub fn health_score(builds: &[BuildRecord], alerts: &[Alert]) -> f64 {
    let base = overall_success_rate(builds).unwrap_or(100.0);
    let active = alerts.iter().filter(|a| a.is_active()).count() as f64;
    let high = alerts
        .iter()
        .filter(|a| a.is_active() && a.severity == AlertSeverity::High)
        .count() as f64;
    (base - 5.0 * active - 10.0 * high).clamp(0.0, 100.0)
}

pub fn rollup(alerts: &[Alert]) -> AlertRollup {
    let mut out = AlertRollup::default();
    for a in alerts {
        if !a.is_active() {
            out.resolved += 1;
            continue;
        }
        out.active += 1;
        match a.severity {
            AlertSeverity::High => out.high += 1,
            AlertSeverity::Medium => out.medium += 1,
        }
    }
    out
}

fn summary(builds: &[BuildRecord], now: DateTime<Utc>) -> ReportSummary {
    let day_ago = now - Duration::hours(24);
    let failed = builds.iter().filter(|b| b.is_failure()).count() as u64;
    ReportSummary {
        total_builds: builds.len() as u64,
        successful_builds: builds.len() as u64 - failed,
        failed_builds: failed,
        success_rate: overall_success_rate(builds).unwrap_or(0.0),
        builds_last_24h: builds.iter().filter(|b| b.timestamp > day_ago).count() as u64,
        last_build: builds.iter().map(|b| b.timestamp).max(),
    }
}

fn recommendations(metrics: &MetricsV1, success_rate: Option<f64>) -> Vec<Recommendation> {
    let mut out = Vec::new();
    for (key, perf) in &metrics.performance {
        if perf.average_build_time > SLOW_AVERAGE_SECS {
            out.push(Recommendation {
                kind: RecommendationKind::SlowBuilds,
                subject: Some(key.clone()),
                message: format!(
                    "{key} builds average {:.0}s; enable the Gradle build cache or reduce the number of architectures built",
                    perf.average_build_time
                ),
            });
        }
    }
    for (category, err) in &metrics.errors {
        if err.count >= RECURRING_THRESHOLD {
            out.push(Recommendation {
                kind: RecommendationKind::RecurringErrors,
                subject: Some(category.as_str().to_string()),
                message: format!(
                    "{category} has occurred {} times; review the resolution history and fix the root cause",
                    err.count
                ),
            });
        }
    }
    if let Some(rate) = success_rate
        && rate < LOW_SUCCESS_RATE
    {
        out.push(Recommendation {
            kind: RecommendationKind::LowSuccessRate,
            subject: None,
            message: format!(
                "Overall success rate is {rate:.1}%; run `buildmedic validate` and `buildmedic clean`"
            ),
        });
    }
    out
}

pub fn generate(metrics: &MetricsV1, alerts: &[Alert], now: DateTime<Utc>) -> HealthReport {
    let performance = metrics
        .performance
        .iter()
        .map(|(key, m)| {
            (
                key.clone(),
                PerformanceSummary {
                    total_builds: m.total_builds,
                    successful_builds: m.successful_builds,
                    success_rate: m.success_rate,
                    average_build_time: m.average_build_time,
                    trend: trend(&m.build_times),
                },
            )
        })
        .collect();

    let errors = metrics
        .errors
        .iter()
        .map(|(category, m)| {
            let frequency = match m.last_occurrence {
                Some(at) => Frequency::from_days((now - at).num_seconds() as f64 / 86_400.0),
                None => Frequency::Rare,
            };
            (
                category.as_str().to_string(),
                ErrorFrequency {
                    count: m.count,
                    last_occurrence: m.last_occurrence,
                    frequency,
                },
            )
        })
        .collect();

    HealthReport {
        schema: schema::HEALTH_REPORT_V1.to_string(),
        generated_at: now,
        summary: summary(&metrics.builds, now),
        performance,
        errors,
        alerts: rollup(alerts),
        recommendations: recommendations(metrics, overall_success_rate(&metrics.builds)),
        health_score: health_score(&metrics.builds, alerts),
    }
}
