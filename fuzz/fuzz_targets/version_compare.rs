#![no_main]

//! Fuzz target for dotted version comparison.

use buildmedic_env::compare_versions;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (String, String)| {
    let (a, b) = input;
    assert_eq!(compare_versions(&a, &b), compare_versions(&b, &a).reverse());
    assert!(compare_versions(&a, &a).is_eq());
});
