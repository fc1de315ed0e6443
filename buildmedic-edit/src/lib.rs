//! Edit engine for project configuration files.
//!
//! Responsibilities:
//! - Idempotent upsert of `key=value` lines (`gradle.properties`, `.env`, `.xcconfig`).
//! - Pointer-addressed upserts into JSON manifests.
//! - sha256 before/after hashes and a unified diff for every edit.

pub mod error;
mod json;
mod kv;

pub use error::{EditError, EditResult};
pub use kv::{Assignment, lookup, upsert_lines};

use camino::{Utf8Path, Utf8PathBuf};
use diffy::PatchFormatter;
use fs_err as fs;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// One edit against one file.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    Upsert {
        entries: Vec<(String, String)>,
        style: Assignment,
    },
    SetJson {
        pointer: String,
        value: Value,
    },
}

impl Edit {
    pub fn upsert<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Edit::Upsert {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            style: Assignment::Compact,
        }
    }

    pub fn style(mut self, new_style: Assignment) -> Self {
        if let Edit::Upsert { style, .. } = &mut self {
            *style = new_style;
        }
        self
    }

    pub fn set_json(pointer: impl Into<String>, value: Value) -> Self {
        Edit::SetJson {
            pointer: pointer.into(),
            value,
        }
    }
}

/// What an edit did (or would do) to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub path: Utf8PathBuf,
    /// `None` when the file did not exist.
    pub before_sha256: Option<String>,
    pub after_sha256: String,
    pub changed: bool,
    /// Unified diff; empty when unchanged.
    pub patch: String,
}

/// Compute the edit without touching disk.
pub fn preview(path: &Utf8Path, edit: &Edit) -> EditResult<EditOutcome> {
    let before = read_optional(path)?;
    let after = edit_content(path, before.as_deref().unwrap_or(""), edit)?;
    Ok(outcome(path, before.as_deref(), &after))
}

/// Apply the edit, creating the file (and parent dirs) if absent.
/// Nothing is written when the content is already up to date.
pub fn apply(path: &Utf8Path, edit: &Edit) -> EditResult<EditOutcome> {
    let before = read_optional(path)?;
    let after = edit_content(path, before.as_deref().unwrap_or(""), edit)?;
    let out = outcome(path, before.as_deref(), &after);

    if out.changed {
        if let Some(parent) = path.parent()
            && !parent.as_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| EditError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, &after).map_err(|source| EditError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(%path, sha256 = %out.after_sha256, "updated");
    } else {
        debug!(%path, "already up to date");
    }
    Ok(out)
}

/// Value of `key` in a `key=value` file; `None` if the file or key is absent.
pub fn read_value(path: &Utf8Path, key: &str) -> EditResult<Option<String>> {
    Ok(read_optional(path)?.and_then(|text| lookup(&text, key)))
}

/// Apply an edit to in-memory content.
pub fn edit_content(path: &Utf8Path, contents: &str, edit: &Edit) -> EditResult<String> {
    match edit {
        Edit::Upsert { entries, style } => Ok(upsert_lines(contents, entries, *style)),
        Edit::SetJson { pointer, value } => {
            let mut doc: Value = if contents.trim().is_empty() {
                Value::Null
            } else {
                serde_json::from_str(contents).map_err(|e| EditError::Json {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?
            };
            json::set_pointer(&mut doc, pointer, value.clone()).map_err(|e| match e {
                json::PointerError::Malformed => EditError::BadPointer(pointer.clone()),
                json::PointerError::NotAnObject { segment } => EditError::NotAnObject {
                    path: path.to_path_buf(),
                    pointer: pointer.clone(),
                    segment,
                },
            })?;
            Ok(json::render(&doc))
        }
    }
}

fn read_optional(path: &Utf8Path) -> EditResult<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|source| EditError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn outcome(path: &Utf8Path, before: Option<&str>, after: &str) -> EditOutcome {
    let changed = before != Some(after);
    EditOutcome {
        path: path.to_path_buf(),
        before_sha256: before.map(|b| sha256_hex(b.as_bytes())),
        after_sha256: sha256_hex(after.as_bytes()),
        changed,
        patch: if changed {
            render_patch(path, before.unwrap_or(""), after)
        } else {
            String::new()
        },
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn render_patch(path: &Utf8Path, old: &str, new: &str) -> String {
    let formatter = PatchFormatter::new();
    let mut out = format!("--- a/{0}\n+++ b/{0}\n", path);
    let patch = diffy::create_patch(old, new);
    // diffy emits its own ---/+++ header; keep only the hunks.
    let body = formatter.fmt_patch(&patch).to_string();
    for line in body.lines().skip_while(|l| !l.starts_with("@@")) {
        out.push_str(line);
        out.push('\n');
    }
    out
}
