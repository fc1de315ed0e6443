//! BDD harness (cucumber-rs).
//!
//! Scenarios drive the monitor and resolver through in-memory ports; see
//! `tests/cucumber.rs` and `features/`.
