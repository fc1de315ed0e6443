#![no_main]

//! Fuzz target for state directory decoding.
//!
//! Arbitrary JSON must either decode or be rejected; never panic. Anything that
//! decodes must survive a re-encode/decode cycle.

use buildmedic_types::wire::{AlertsV1, MetricsV1, ResolutionHistoryV1};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(s) else {
        return;
    };

    if let Ok(metrics) = MetricsV1::decode(value.clone()) {
        let again = serde_json::to_value(&metrics).expect("encode metrics");
        MetricsV1::decode(again).expect("re-decode metrics");
    }
    if let Ok(alerts) = AlertsV1::decode(value.clone()) {
        let again = serde_json::to_value(&alerts).expect("encode alerts");
        AlertsV1::decode(again).expect("re-decode alerts");
    }
    if let Ok(history) = ResolutionHistoryV1::decode(value) {
        let again = serde_json::to_value(&history).expect("encode history");
        ResolutionHistoryV1::decode(again).expect("re-decode history");
    }
});
