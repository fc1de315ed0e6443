use crate::pattern::{Action, ErrorPattern, PACKAGE, PatternInfo, Remedy, Step, builtin_patterns};
use crate::suggest::suggestions_for;
use buildmedic_edit::Edit;
use buildmedic_exec::{
    CommandRunner, CommandSpec, StepReport, StepResult, command_step, remove_glob_step,
    remove_path_step,
};
use buildmedic_store::StateStore;
use buildmedic_types::metrics::ErrorCategory;
use buildmedic_types::resolution::ResolutionRecord;
use buildmedic_monitor::{Clock, SystemClock};
use camino::Utf8PathBuf;
use regex::Captures;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of [`ErrorResolver::resolve_error`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    Automated {
        pattern_id: String,
        category: ErrorCategory,
        success: bool,
        report: StepReport,
    },
    Manual {
        pattern_id: String,
        category: ErrorCategory,
        steps: Vec<String>,
        suggested_commands: Vec<String>,
    },
    Unmatched {
        suggestions: Vec<String>,
    },
}

impl Resolution {
    /// True only for an automated remediation whose required steps all succeeded.
    pub fn succeeded(&self) -> bool {
        matches!(self, Resolution::Automated { success: true, .. })
    }

    pub fn pattern_id(&self) -> Option<&str> {
        match self {
            Resolution::Automated { pattern_id, .. } | Resolution::Manual { pattern_id, .. } => {
                Some(pattern_id)
            }
            Resolution::Unmatched { .. } => None,
        }
    }
}

/// Attempts and successes per pattern over the persisted history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatternStats {
    pub attempts: u64,
    pub successes: u64,
}

pub struct ErrorResolver {
    runner: Arc<dyn CommandRunner>,
    store: Arc<dyn StateStore>,
    project_root: Utf8PathBuf,
    package_name: String,
    patterns: Vec<ErrorPattern>,
    history: Vec<ResolutionRecord>,
    temp_dir: Option<Utf8PathBuf>,
    clock: Arc<dyn Clock>,
}

impl ErrorResolver {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        store: Arc<dyn StateStore>,
        project_root: impl Into<Utf8PathBuf>,
        package_name: impl Into<String>,
    ) -> Self {
        let history = buildmedic_store::load_history(store.as_ref());
        Self {
            runner,
            store,
            project_root: project_root.into(),
            package_name: package_name.into(),
            patterns: builtin_patterns(),
            history,
            temp_dir: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Where bundler caches live; defaults to the system temp dir.
    pub fn with_temp_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Source of resolution record timestamps; defaults to the wall clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn patterns(&self) -> &[ErrorPattern] {
        &self.patterns
    }

    pub fn pattern_infos(&self) -> Vec<PatternInfo> {
        self.patterns.iter().map(ErrorPattern::info).collect()
    }

    /// First pattern in table order whose expression matches `text`.
    pub fn classify(&self, text: &str) -> Option<&ErrorPattern> {
        self.patterns.iter().find(|p| p.matches(text))
    }

    pub fn history(&self) -> &[ResolutionRecord] {
        &self.history
    }

    pub fn stats(&self) -> BTreeMap<String, PatternStats> {
        let mut out: BTreeMap<String, PatternStats> = BTreeMap::new();
        for r in &self.history {
            let s = out.entry(r.pattern_id.clone()).or_default();
            s.attempts += 1;
            if r.success {
                s.successes += 1;
            }
        }
        out
    }

    pub fn resolve_error(&mut self, text: &str) -> Resolution {
        let Some(pattern) = self.classify(text) else {
            info!("no known pattern matched");
            return Resolution::Unmatched {
                suggestions: suggestions_for(text),
            };
        };
        let pattern_id = pattern.id.to_string();
        let category = pattern.category;

        match &pattern.remedy {
            Remedy::Manual {
                steps,
                suggested_commands,
            } => {
                info!(pattern = %pattern_id, "manual remediation required");
                let caps = pattern.regex.captures(text);
                let suggested_commands = suggested_commands
                    .iter()
                    .map(|cmd| match &caps {
                        Some(c) => fill_placeholders(cmd, c),
                        None => cmd.to_string(),
                    })
                    .collect();
                Resolution::Manual {
                    pattern_id,
                    category,
                    steps: steps.iter().map(|s| s.to_string()).collect(),
                    suggested_commands,
                }
            }
            Remedy::Automated {
                steps,
                config_changes,
            } => {
                info!(pattern = %pattern_id, "applying automated remediation");
                let mut report = StepReport::new();
                if !config_changes.is_empty() {
                    report.push(self.apply_config(config_changes));
                }
                for step in steps {
                    report.push(self.run_step(step));
                }

                let success = report.required_ok();
                self.record(ResolutionRecord {
                    timestamp: self.clock.now(),
                    pattern_id: pattern_id.clone(),
                    success,
                    error: report.failure_summary(),
                });
                Resolution::Automated {
                    pattern_id,
                    category,
                    success,
                    report,
                }
            }
        }
    }

    fn gradle_properties(&self) -> Utf8PathBuf {
        self.project_root.join("android").join("gradle.properties")
    }

    fn apply_config(&self, changes: &[(&str, &str)]) -> StepResult {
        let name = "update gradle.properties";
        let edit = Edit::upsert(changes.iter().copied());
        match buildmedic_edit::apply(&self.gradle_properties(), &edit) {
            Ok(_) => StepResult::ok(name),
            Err(e) => StepResult::failed(name, e.to_string()),
        }
    }

    fn cache_dir(&self) -> Option<Utf8PathBuf> {
        match &self.temp_dir {
            Some(dir) => Some(dir.clone()),
            None => Utf8PathBuf::from_path_buf(std::env::temp_dir()).ok(),
        }
    }

    fn run_step(&self, step: &Step) -> StepResult {
        let result = match &step.action {
            Action::Run {
                program,
                args,
                dir,
                timeout,
            } => {
                let mut spec = CommandSpec::new(*program)
                    .args(args.iter().map(|a| a.replace(PACKAGE, &self.package_name)))
                    .cwd(dir.map_or(self.project_root.clone(), |d| self.project_root.join(d)));
                if let Some(t) = timeout {
                    spec = spec.timeout(*t);
                }
                command_step(self.runner.as_ref(), step.name, &spec)
            }
            Action::RemovePath(rel) => remove_path_step(step.name, &self.project_root.join(rel)),
            Action::RemoveTempGlob(pattern) => match self.cache_dir() {
                Some(dir) => remove_glob_step(step.name, dir.join(pattern).as_str()),
                None => StepResult::failed(step.name, "temp dir is not valid UTF-8"),
            },
        };
        result.optional(step.optional)
    }

    fn record(&mut self, record: ResolutionRecord) {
        if !record.success {
            warn!(pattern = %record.pattern_id, error = ?record.error, "remediation incomplete");
        }
        self.history.push(record);
        buildmedic_store::save_history(self.store.as_ref(), &self.history);
    }
}

/// Replaces `{N}` with capture group `N` (empty when the group did not
/// participate). `$` is never interpreted.
fn fill_placeholders(cmd: &str, caps: &Captures<'_>) -> String {
    let mut out = cmd.to_string();
    for i in 1..caps.len() {
        let value = caps.get(i).map_or("", |m| m.as_str());
        out = out.replace(&format!("{{{i}}}"), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn placeholders_fill_from_captures_and_leave_dollars_alone() {
        let re = Regex::new(r"rev ([\d.]+)|tools;([\d.]+)").expect("valid regex");
        let caps = re.captures("rev 34.0.0").expect("match");
        assert_eq!(
            fill_placeholders("sdkmanager \"build-tools;{1}{2}\" # $HOME", &caps),
            "sdkmanager \"build-tools;34.0.0\" # $HOME"
        );
    }
}
