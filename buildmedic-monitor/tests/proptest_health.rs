use buildmedic_monitor::report::health_score;
use buildmedic_monitor::{BuildHealthMonitor, FixedClock};
use buildmedic_store::InMemoryStateStore;
use buildmedic_types::alert::{Alert, AlertKind, AlertSeverity};
use buildmedic_types::build::{BuildRecord, Environment, Platform};
use buildmedic_types::metrics::BUILD_TIME_WINDOW;
use chrono::Utc;
use proptest::prelude::*;
use std::sync::Arc;

fn builds(outcomes: &[bool]) -> Vec<BuildRecord> {
    outcomes
        .iter()
        .map(|ok| {
            if *ok {
                BuildRecord::success(Utc::now(), Platform::Android, Environment::Development, Some(1.0), None)
            } else {
                BuildRecord::failure(Utc::now(), Platform::Android, Environment::Development, "x", None)
            }
        })
        .collect()
}

fn alert(high: bool) -> Alert {
    let severity = if high { AlertSeverity::High } else { AlertSeverity::Medium };
    Alert::new(Utc::now(), AlertKind::RecurringError, severity, "m")
}

proptest! {
    #[test]
    fn score_is_clamped_and_never_rises_with_more_alerts(
        outcomes in prop::collection::vec(any::<bool>(), 0..30),
        existing in prop::collection::vec(any::<bool>(), 0..6),
        extra_high in any::<bool>(),
    ) {
        let builds = builds(&outcomes);
        let mut alerts: Vec<Alert> = existing.iter().map(|h| alert(*h)).collect();

        let before = health_score(&builds, &alerts);
        prop_assert!((0.0..=100.0).contains(&before));

        alerts.push(alert(extra_high));
        let after = health_score(&builds, &alerts);
        prop_assert!((0.0..=100.0).contains(&after));
        prop_assert!(after <= before);

        // Resolved alerts carry no penalty.
        let last = alerts.len() - 1;
        alerts[last].resolve(Utc::now());
        prop_assert_eq!(health_score(&builds, &alerts), before);
    }

    #[test]
    fn build_time_window_is_bounded_and_averaged(
        runs in prop::collection::vec((any::<bool>(), 1u32..2_000), 1..40),
    ) {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let mut m = BuildHealthMonitor::new(Arc::new(InMemoryStateStore::new()), clock);
        for (ok, secs) in &runs {
            if *ok {
                m.record_build_success(Platform::Ios, Environment::Staging, f64::from(*secs), None);
            } else {
                m.record_build_failure(Platform::Ios, Environment::Staging, "boom", Some(f64::from(*secs)));
            }
            let perf = &m.metrics().performance["ios_staging"];
            prop_assert!(perf.build_times.len() <= BUILD_TIME_WINDOW);
            let expected = if perf.build_times.is_empty() {
                0.0
            } else {
                perf.build_times.iter().sum::<f64>() / perf.build_times.len() as f64
            };
            prop_assert!((perf.average_build_time - expected).abs() < 1e-9);
        }
        prop_assert_eq!(m.generate_report().summary.total_builds, runs.len() as u64);
    }
}
