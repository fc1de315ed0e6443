//! The ordered table of known build failures.
//!
//! Order is significant: the first pattern whose expression matches wins.

use buildmedic_types::metrics::ErrorCategory;
use regex::Regex;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Placeholder replaced by the configured application id.
pub const PACKAGE: &str = "{package}";

/// One remediation action. Paths are relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Run {
        program: &'static str,
        args: &'static [&'static str],
        dir: Option<&'static str>,
        timeout: Option<Duration>,
    },
    RemovePath(&'static str),
    /// Glob under the system temp dir.
    RemoveTempGlob(&'static str),
}

impl Action {
    /// Human-readable form, with `{package}` left in place.
    pub fn describe(&self) -> String {
        match self {
            Action::Run {
                program, args, dir, ..
            } => {
                let cmd = std::iter::once(*program)
                    .chain(args.iter().copied())
                    .collect::<Vec<_>>()
                    .join(" ");
                match dir {
                    Some(d) => format!("(cd {d} && {cmd})"),
                    None => cmd,
                }
            }
            Action::RemovePath(p) => format!("rm -rf {p}"),
            Action::RemoveTempGlob(g) => format!("rm -rf $TMPDIR/{g}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: &'static str,
    pub action: Action,
    /// Failure does not count against the remediation.
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Remedy {
    /// Config upserts into `android/gradle.properties`, then steps in order.
    Automated {
        steps: Vec<Step>,
        config_changes: Vec<(&'static str, &'static str)>,
    },
    /// Nothing runs. `{1}`-style placeholders in commands expand to regex captures;
    /// everything else, shell variables included, is left as written.
    Manual {
        steps: Vec<&'static str>,
        suggested_commands: Vec<&'static str>,
    },
}

impl Remedy {
    pub fn is_automated(&self) -> bool {
        matches!(self, Remedy::Automated { .. })
    }
}

#[derive(Debug, Clone)]
pub struct ErrorPattern {
    pub id: &'static str,
    pub regex: Regex,
    pub category: ErrorCategory,
    pub severity: Severity,
    pub remedy: Remedy,
}

impl ErrorPattern {
    fn new(
        id: &'static str,
        expr: &str,
        category: ErrorCategory,
        severity: Severity,
        remedy: Remedy,
    ) -> Self {
        Self {
            id,
            regex: Regex::new(expr).expect("valid pattern regex"),
            category,
            severity,
            remedy,
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn info(&self) -> PatternInfo {
        let (automated, steps, commands) = match &self.remedy {
            Remedy::Automated {
                steps,
                config_changes,
            } => (
                true,
                config_changes
                    .iter()
                    .map(|(k, v)| format!("set {k}={v} in android/gradle.properties"))
                    .chain(steps.iter().map(|s| s.name.to_string()))
                    .collect(),
                steps.iter().map(|s| s.action.describe()).collect(),
            ),
            Remedy::Manual {
                steps,
                suggested_commands,
            } => (
                false,
                steps.iter().map(|s| s.to_string()).collect(),
                suggested_commands.iter().map(|s| s.to_string()).collect(),
            ),
        };
        PatternInfo {
            id: self.id,
            category: self.category,
            severity: self.severity,
            automated,
            pattern: self.regex.as_str().to_string(),
            steps,
            commands,
        }
    }
}

/// Serializable view of a pattern for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternInfo {
    pub id: &'static str,
    pub category: ErrorCategory,
    pub severity: Severity,
    pub automated: bool,
    pub pattern: String,
    pub steps: Vec<String>,
    pub commands: Vec<String>,
}

const GRADLE_HEAP: &str = "-Xmx4096m -XX:MaxMetaspaceSize=1024m -XX:+HeapDumpOnOutOfMemoryError";

fn gradle(name: &'static str, args: &'static [&'static str]) -> Step {
    Step {
        name,
        action: Action::Run {
            program: "./gradlew",
            args,
            dir: Some("android"),
            timeout: None,
        },
        optional: false,
    }
}

/// Known failures, most specific first.
pub fn builtin_patterns() -> Vec<ErrorPattern> {
    use ErrorCategory::*;

    vec![
        ErrorPattern::new(
            "signature_mismatch",
            r"(?i)INSTALL_FAILED_UPDATE_INCOMPATIBLE|signatures do not match|INCONSISTENT_CERTIFICATES",
            SignatureIssues,
            Severity::High,
            Remedy::Automated {
                steps: vec![Step {
                    name: "uninstall installed app",
                    action: Action::Run {
                        program: "adb",
                        args: &["uninstall", PACKAGE],
                        dir: None,
                        timeout: None,
                    },
                    optional: false,
                }],
                config_changes: vec![],
            },
        ),
        ErrorPattern::new(
            "native_compiler_warnings",
            r"(?i)warnings? (?:being )?treated as errors|-Werror|\[-W[a-z0-9-]+\]",
            BuildIssues,
            Severity::Low,
            Remedy::Automated {
                steps: vec![gradle("gradle clean", &["clean"])],
                config_changes: vec![("org.gradle.warning.mode", "none")],
            },
        ),
        ErrorPattern::new(
            "gradle_daemon_crash",
            r"(?i)Gradle build daemon disappeared|daemon .*(?:crashed|stopped unexpectedly)|Could not connect to the Gradle daemon",
            BuildIssues,
            Severity::High,
            Remedy::Automated {
                steps: vec![gradle("stop gradle daemons", &["--stop"])],
                config_changes: vec![
                    ("org.gradle.daemon", "true"),
                    ("org.gradle.jvmargs", GRADLE_HEAP),
                ],
            },
        ),
        ErrorPattern::new(
            "out_of_memory",
            r"(?i)OutOfMemoryError|Java heap space|GC overhead limit exceeded|Metaspace",
            MemoryIssues,
            Severity::High,
            Remedy::Automated {
                steps: vec![gradle("stop gradle daemons", &["--stop"])],
                config_changes: vec![
                    ("org.gradle.jvmargs", GRADLE_HEAP),
                    ("org.gradle.parallel", "false"),
                ],
            },
        ),
        ErrorPattern::new(
            "duplicate_class",
            r"(?i)Duplicate class|DuplicateClassesException|Program type already present",
            DependencyIssues,
            Severity::Medium,
            Remedy::Automated {
                steps: vec![gradle("gradle clean", &["clean"])],
                config_changes: vec![
                    ("android.useAndroidX", "true"),
                    ("android.enableJetifier", "true"),
                ],
            },
        ),
        ErrorPattern::new(
            "metro_cache",
            r"(?i)Unable to resolve module|haste module map|jest-haste-map|Metro.*cache",
            DependencyIssues,
            Severity::Medium,
            Remedy::Automated {
                steps: vec![
                    Step {
                        name: "reset watchman",
                        action: Action::Run {
                            program: "watchman",
                            args: &["watch-del-all"],
                            dir: None,
                            timeout: Some(Duration::from_secs(10)),
                        },
                        optional: true,
                    },
                    Step {
                        name: "remove metro cache",
                        action: Action::RemoveTempGlob("metro-*"),
                        optional: false,
                    },
                    Step {
                        name: "remove haste map",
                        action: Action::RemoveTempGlob("haste-map-*"),
                        optional: false,
                    },
                    Step {
                        name: "remove node_modules cache",
                        action: Action::RemovePath("node_modules/.cache"),
                        optional: false,
                    },
                ],
                config_changes: vec![],
            },
        ),
        ErrorPattern::new(
            "sdk_not_found",
            r"(?i)SDK location not found|ANDROID_(?:HOME|SDK_ROOT).*(?:not set|invalid)",
            EnvironmentIssues,
            Severity::High,
            Remedy::Manual {
                steps: vec![
                    "Install the Android SDK (Android Studio > SDK Manager)",
                    "Set ANDROID_HOME to the SDK location",
                    "Or write sdk.dir into android/local.properties",
                ],
                suggested_commands: vec![
                    "export ANDROID_HOME=$HOME/Library/Android/sdk",
                    "echo \"sdk.dir=$ANDROID_HOME\" > android/local.properties",
                ],
            },
        ),
        ErrorPattern::new(
            "native_linking",
            r"(?i)Undefined symbols? for architecture (\w+)|linker command failed|ld: library not found for -l(\S+)",
            BuildIssues,
            Severity::High,
            Remedy::Manual {
                steps: vec![
                    "Reinstall CocoaPods dependencies",
                    "Clean the Xcode build folder",
                    "Check that native modules are linked for every architecture",
                ],
                suggested_commands: vec![
                    "cd ios && pod install --repo-update",
                    "cd ios && xcodebuild clean",
                ],
            },
        ),
        ErrorPattern::new(
            "build_tools_missing",
            r"(?i)Failed to find Build Tools revision ([\d.]+)|build-tools;([\d.]+)",
            EnvironmentIssues,
            Severity::Medium,
            Remedy::Manual {
                steps: vec![
                    "Install the missing build-tools version with sdkmanager",
                    "Or lower buildToolsVersion in android/build.gradle",
                ],
                suggested_commands: vec!["sdkmanager \"build-tools;{1}{2}\""],
            },
        ),
    ]
}
