#![no_main]

//! Fuzz target for JSON pointer edits on manifests like app.json.

use buildmedic_edit::{Edit, edit_content};
use camino::Utf8Path;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, arbitrary::Arbitrary)]
struct FuzzInput {
    contents: String,
    pointer: String,
    flag: bool,
}

fuzz_target!(|input: FuzzInput| {
    let edit = Edit::set_json(input.pointer, serde_json::Value::Bool(input.flag));
    if let Ok(out) = edit_content(Utf8Path::new("app.json"), &input.contents, &edit) {
        serde_json::from_str::<serde_json::Value>(&out).expect("edit output is valid JSON");
    }
});
