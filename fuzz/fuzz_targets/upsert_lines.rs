#![no_main]

//! Fuzz target for `key=value` upserts (gradle.properties, .env, xcconfig).

use buildmedic_edit::{Assignment, upsert_lines};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, arbitrary::Arbitrary)]
struct FuzzInput {
    contents: String,
    entries: Vec<(String, String)>,
    spaced: bool,
}

fn plain_key(k: &str) -> bool {
    !k.is_empty() && k.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
}

fuzz_target!(|input: FuzzInput| {
    let style = if input.spaced {
        Assignment::Spaced
    } else {
        Assignment::Compact
    };
    let entries: Vec<(String, String)> = input
        .entries
        .into_iter()
        .filter(|(k, v)| plain_key(k) && !v.contains(['\n', '\r']))
        .collect();

    let once = upsert_lines(&input.contents, &entries, style);
    let twice = upsert_lines(&once, &entries, style);
    assert_eq!(once, twice, "upsert is not idempotent");
    assert!(once.is_empty() || once.ends_with('\n'));
});
