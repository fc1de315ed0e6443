use crate::runner::{CommandRunner, CommandSpec};
use camino::Utf8Path;
use fs_err as fs;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Ok,
    Failed { reason: String },
}

/// One step of a best-effort sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    pub name: String,

    /// Optional steps never count against the sequence's success.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,

    #[serde(flatten)]
    pub outcome: StepOutcome,
}

impl StepResult {
    pub fn ok(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
            outcome: StepOutcome::Ok,
        }
    }

    pub fn failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
            outcome: StepOutcome::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn is_ok(&self) -> bool {
        self.outcome == StepOutcome::Ok
    }

    pub fn reason(&self) -> Option<&str> {
        match &self.outcome {
            StepOutcome::Ok => None,
            StepOutcome::Failed { reason } => Some(reason),
        }
    }
}

/// Ordered outcomes of a best-effort sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub steps: Vec<StepResult>,
}

impl StepReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: StepResult) {
        if let Some(reason) = step.reason() {
            warn!(step = %step.name, optional = step.optional, %reason, "step failed, continuing");
        } else {
            debug!(step = %step.name, "step ok");
        }
        self.steps.push(step);
    }

    pub fn extend(&mut self, other: StepReport) {
        self.steps.extend(other.steps);
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Every step succeeded, optional ones included.
    pub fn all_ok(&self) -> bool {
        self.steps.iter().all(StepResult::is_ok)
    }

    /// Every non-optional step succeeded.
    pub fn required_ok(&self) -> bool {
        self.steps.iter().all(|s| s.optional || s.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|s| !s.is_ok())
    }

    /// `name: reason` for every failed step, joined by `; `.
    pub fn failure_summary(&self) -> Option<String> {
        let parts: Vec<String> = self
            .failed()
            .map(|s| format!("{}: {}", s.name, s.reason().unwrap_or_default()))
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }
}

/// Run a command as a step. Spawn errors and non-zero exits become `Failed`.
pub fn command_step(runner: &dyn CommandRunner, name: &str, spec: &CommandSpec) -> StepResult {
    match runner.run(spec) {
        Ok(out) if out.success() => StepResult::ok(name),
        Ok(out) => StepResult::failed(name, out.failure_reason()),
        Err(e) => StepResult::failed(name, e.to_string()),
    }
}

/// Remove a file or directory tree. A missing path counts as success.
pub fn remove_path_step(name: &str, path: &Utf8Path) -> StepResult {
    if !path.exists() {
        debug!(%path, "nothing to remove");
        return StepResult::ok(name);
    }
    let res = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match res {
        Ok(()) => StepResult::ok(name),
        Err(e) => StepResult::failed(name, e.to_string()),
    }
}

/// Remove every path matching a glob pattern. No matches counts as success.
pub fn remove_glob_step(name: &str, pattern: &str) -> StepResult {
    let entries = match glob::glob(pattern) {
        Ok(entries) => entries,
        Err(e) => return StepResult::failed(name, format!("bad pattern {pattern}: {e}")),
    };

    let mut failures = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(p) => p,
            Err(e) => {
                failures.push(e.to_string());
                continue;
            }
        };
        let Some(path) = Utf8Path::from_path(&path) else {
            failures.push(format!("non-utf8 path {}", path.display()));
            continue;
        };
        if let Some(reason) = remove_path_step(name, path).reason() {
            failures.push(reason.to_string());
        }
    }

    if failures.is_empty() {
        StepResult::ok(name)
    } else {
        StepResult::failed(name, failures.join("; "))
    }
}
