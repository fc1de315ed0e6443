//! Persistence for the buildmedic state directory.
//!
//! Loads never fail: a missing blob yields empty state, and an unreadable,
//! malformed or unknown-schema blob is logged with `warn!` and also yields
//! empty state. Rejected blobs are first copied to `<name>.rejected` (then
//! `.rejected.1`, `.rejected.2`, ...) so the next save cannot destroy them.
//! Saves log and swallow I/O failures so callers keep working
//! on their in-memory copy.

pub mod adapters;
pub mod ports;

pub use adapters::{FsStateStore, InMemoryStateStore};
pub use ports::StateStore;

use buildmedic_types::alert::Alert;
use buildmedic_types::files;
use buildmedic_types::resolution::ResolutionRecord;
use buildmedic_types::wire::{AlertsV1, MetricsV1, ResolutionHistoryV1, WireError};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

/// Suffix for copies of state blobs that failed to load.
pub const REJECTED_SUFFIX: &str = ".rejected";

/// Copy a blob that failed to load out of the way of the next save. A blob
/// already preserved with identical contents is not copied again.
fn set_aside(store: &dyn StateStore, name: &str, text: &str) {
    let base = format!("{name}{REJECTED_SUFFIX}");
    let mut slot = base.clone();
    let mut n = 0u32;
    loop {
        match store.read(&slot) {
            Ok(Some(existing)) if existing == text => return,
            Ok(Some(_)) => {
                n += 1;
                slot = format!("{base}.{n}");
            }
            Ok(None) => break,
            Err(e) => {
                error!(file = name, error = %format!("{e:#}"), "could not preserve rejected state");
                return;
            }
        }
    }
    match store.write(&slot, text) {
        Ok(()) => warn!(file = name, backup = %slot, "rejected state preserved"),
        Err(e) => error!(file = name, error = %format!("{e:#}"), "could not preserve rejected state"),
    }
}

fn load_decoded<T>(
    store: &dyn StateStore,
    name: &str,
    decode: fn(Value) -> Result<T, WireError>,
) -> Option<T> {
    let text = match store.read(name) {
        Ok(Some(text)) => text,
        Ok(None) => return None,
        Err(e) => {
            warn!(file = name, error = %format!("{e:#}"), "state unreadable, starting empty");
            return None;
        }
    };
    let value: Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            warn!(file = name, error = %e, "state is not valid JSON, starting empty");
            set_aside(store, name, &text);
            return None;
        }
    };
    match decode(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(file = name, error = %e, "state rejected, starting empty");
            set_aside(store, name, &text);
            None
        }
    }
}

pub fn load_metrics(store: &dyn StateStore) -> MetricsV1 {
    load_decoded(store, files::METRICS, MetricsV1::decode).unwrap_or_default()
}

pub fn load_alerts(store: &dyn StateStore) -> Vec<Alert> {
    load_decoded(store, files::ALERTS, AlertsV1::decode)
        .map(|a| a.alerts)
        .unwrap_or_default()
}

pub fn load_history(store: &dyn StateStore) -> Vec<ResolutionRecord> {
    load_decoded(store, files::RESOLUTION_HISTORY, ResolutionHistoryV1::decode)
        .map(|h| h.records)
        .unwrap_or_default()
}

/// Serialize as pretty JSON and write; returns the error for callers that surface it.
pub fn save_json<T: Serialize>(store: &dyn StateStore, name: &str, value: &T) -> anyhow::Result<()> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    store.write(name, &text)
}

fn save_or_warn<T: Serialize>(store: &dyn StateStore, name: &str, value: &T) {
    if let Err(e) = save_json(store, name, value) {
        warn!(file = name, error = %format!("{e:#}"), "failed to persist state, continuing in memory");
    }
}

pub fn save_metrics(store: &dyn StateStore, metrics: &MetricsV1) {
    save_or_warn(store, files::METRICS, metrics);
}

pub fn save_alerts(store: &dyn StateStore, alerts: &[Alert]) {
    save_or_warn(store, files::ALERTS, &AlertsV1::new(alerts.to_vec()));
}

pub fn save_history(store: &dyn StateStore, records: &[ResolutionRecord]) {
    save_or_warn(
        store,
        files::RESOLUTION_HISTORY,
        &ResolutionHistoryV1::new(records.to_vec()),
    );
}
