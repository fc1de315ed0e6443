use crate::profile::{AndroidProfile, IosProfile};
use crate::settings::WorkflowSettings;
use buildmedic_edit::{Assignment, Edit};
use buildmedic_exec::{
    CommandRunner, CommandSpec, StepReport, StepResult, command_step, remove_glob_step,
    remove_path_step,
};
use buildmedic_signing::{InstallOutcome, SignatureManager};
use buildmedic_types::build::{Environment, Platform};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Pointer of the development flag inside the manifest.
pub const DEVELOPMENT_FLAG_POINTER: &str = "/expo/extra/isDevelopment";

const WATCHMAN_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of [`WorkflowAutomation::build`]. A failed build is data, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildOutcome {
    pub platform: Platform,
    pub environment: Environment,
    pub success: bool,
    /// Seconds.
    pub build_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Utf8PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed: Option<InstallOutcome>,
    /// Raw failure text, fed to error resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BuildOutcome {
    fn new(platform: Platform, environment: Environment) -> Self {
        Self {
            platform,
            environment,
            success: false,
            build_time: 0.0,
            artifact: None,
            artifact_size: None,
            installed: None,
            error: None,
        }
    }
}

pub struct WorkflowAutomation {
    runner: Arc<dyn CommandRunner>,
    project_root: Utf8PathBuf,
    settings: WorkflowSettings,
    temp_dir: Option<Utf8PathBuf>,
}

impl WorkflowAutomation {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        project_root: impl Into<Utf8PathBuf>,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            runner,
            project_root: project_root.into(),
            settings,
            temp_dir: None,
        }
    }

    /// Where bundler caches live; defaults to the system temp dir.
    pub fn with_temp_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    fn path(&self, rel: impl AsRef<Utf8Path>) -> Utf8PathBuf {
        self.project_root.join(rel)
    }

    pub fn build(
        &self,
        platform: Platform,
        environment: Environment,
        signing: &SignatureManager,
    ) -> BuildOutcome {
        info!(%platform, %environment, "building");
        let started = Instant::now();
        let mut outcome = BuildOutcome::new(platform, environment);

        let result = match platform {
            Platform::Android => self.build_android(environment, signing, &mut outcome),
            Platform::Ios => self.build_ios(environment, &mut outcome),
        };
        outcome.build_time = started.elapsed().as_secs_f64();
        match result {
            Ok(()) => {
                outcome.success = true;
                info!(%platform, %environment, seconds = outcome.build_time, artifact = ?outcome.artifact, "build succeeded");
            }
            Err(text) => {
                warn!(%platform, %environment, "build failed");
                outcome.error = Some(text);
            }
        }
        outcome
    }

    fn build_android(
        &self,
        environment: Environment,
        signing: &SignatureManager,
        outcome: &mut BuildOutcome,
    ) -> Result<(), String> {
        let profile = AndroidProfile::for_environment(environment);
        self.upsert(
            &self.path("android/gradle.properties"),
            Edit::upsert(profile.properties(environment)),
        )?;

        let spec = CommandSpec::new("./gradlew")
            .arg(profile.assemble_task())
            .cwd(self.path("android"));
        self.run_build(&spec)?;

        let dir = self.path(format!("android/app/build/outputs/apk/{}", profile.variant));
        let artifact = self.locate_artifact(&dir, "apk")?;
        outcome.artifact_size = artifact_size(&artifact);
        outcome.artifact = Some(artifact.clone());

        if environment.is_development() {
            let installed = signing
                .install_with_signature_handling(&artifact)
                .map_err(|e| e.to_string())?;
            outcome.installed = Some(installed);
        }
        Ok(())
    }

    fn build_ios(&self, environment: Environment, outcome: &mut BuildOutcome) -> Result<(), String> {
        let profile = IosProfile::for_environment(environment);
        self.upsert(
            &self.path("ios/buildmedic.xcconfig"),
            Edit::upsert(profile.settings(environment)).style(Assignment::Spaced),
        )?;

        let workspace = self.path(&self.settings.ios_workspace);
        let spec = CommandSpec::new("xcodebuild")
            .args([
                "-workspace",
                workspace.as_str(),
                "-scheme",
                self.settings.ios_scheme.as_str(),
                "-configuration",
                profile.configuration,
                "-sdk",
                "iphoneos",
                "-derivedDataPath",
                "build",
                "-xcconfig",
                "buildmedic.xcconfig",
                "build",
            ])
            .cwd(self.path("ios"));
        self.run_build(&spec)?;

        let dir = self.path(format!(
            "ios/build/Build/Products/{}-iphoneos",
            profile.configuration
        ));
        let artifact = self.locate_artifact(&dir, "app")?;
        outcome.artifact_size = artifact_size(&artifact);
        outcome.artifact = Some(artifact);
        Ok(())
    }

    fn upsert(&self, path: &Utf8Path, edit: Edit) -> Result<(), String> {
        buildmedic_edit::apply(path, &edit)
            .map(|_| ())
            .map_err(|e| format!("failed to update {path}: {e}"))
    }

    fn run_build(&self, spec: &CommandSpec) -> Result<(), String> {
        match self.runner.run(spec) {
            Ok(out) if out.success() => Ok(()),
            Ok(out) => {
                let text = out.combined();
                Err(if text.trim().is_empty() {
                    out.failure_reason()
                } else {
                    text
                })
            }
            Err(e) => Err(e.to_string()),
        }
    }

    fn locate_artifact(&self, dir: &Utf8Path, extension: &str) -> Result<Utf8PathBuf, String> {
        let pattern = format!("{}/*.{extension}", glob::Pattern::escape(dir.as_str()));
        let mut found: Vec<Utf8PathBuf> = glob::glob(&pattern)
            .map_err(|e| format!("bad artifact pattern {pattern}: {e}"))?
            .filter_map(Result::ok)
            .filter_map(|p| Utf8PathBuf::from_path_buf(p).ok())
            .collect();
        found.sort();
        match found.into_iter().next() {
            Some(p) => {
                debug!(artifact = %p, "located artifact");
                Ok(p)
            }
            None => Err(format!("no .{extension} artifact found in {dir}")),
        }
    }

    /// Reset build outputs, dependencies and bundler caches. Never aborts early.
    pub fn clean_build(&self) -> StepReport {
        info!("cleaning build outputs and caches");
        let mut report = StepReport::new();
        report.push(command_step(
            self.runner.as_ref(),
            "gradle clean",
            &CommandSpec::new("./gradlew").arg("clean").cwd(self.path("android")),
        ));
        for rel in ["android/build", "android/app/build", "ios/build", "node_modules"] {
            report.push(remove_path_step(&format!("remove {rel}"), &self.path(rel)));
        }
        report.push(command_step(
            self.runner.as_ref(),
            "npm install",
            &CommandSpec::new("npm").arg("install").cwd(&self.project_root),
        ));
        report.push(
            command_step(
                self.runner.as_ref(),
                "reset watchman",
                &CommandSpec::new("watchman")
                    .arg("watch-del-all")
                    .timeout(WATCHMAN_TIMEOUT),
            )
            .optional(true),
        );
        report.extend(self.clear_bundler_caches());
        report
    }

    fn clear_bundler_caches(&self) -> StepReport {
        let mut report = StepReport::new();
        match self.cache_dir() {
            Some(tmp) => {
                report.push(remove_glob_step("remove metro cache", tmp.join("metro-*").as_str()));
                report.push(remove_glob_step(
                    "remove haste map",
                    tmp.join("haste-map-*").as_str(),
                ));
            }
            None => report.push(StepResult::failed(
                "remove metro cache",
                "temp dir is not valid UTF-8",
            )),
        }
        report
    }

    fn cache_dir(&self) -> Option<Utf8PathBuf> {
        match &self.temp_dir {
            Some(dir) => Some(dir.clone()),
            None => Utf8PathBuf::from_path_buf(std::env::temp_dir()).ok(),
        }
    }

    /// Point the manifest and `.env` at `target`, then drop stale build caches.
    pub fn switch_environment(&self, target: Environment) -> StepReport {
        info!(environment = %target, "switching environment");
        let mut report = StepReport::new();

        let manifest = self.path(&self.settings.manifest);
        report.push(edit_step(
            &format!("update {}", self.settings.manifest),
            &manifest,
            &Edit::set_json(DEVELOPMENT_FLAG_POINTER, Value::Bool(target.is_development())),
        ));

        let env_file = self.path(&self.settings.env_file);
        report.push(edit_step(
            &format!("update {}", self.settings.env_file),
            &env_file,
            &Edit::upsert([
                ("APP_ENV", target.as_str().to_string()),
                ("DEBUG_MODE", target.is_development().to_string()),
            ]),
        ));

        for rel in ["android/app/build", "ios/build", "node_modules/.cache"] {
            report.push(remove_path_step(&format!("remove {rel}"), &self.path(rel)));
        }
        report.extend(self.clear_bundler_caches());
        report
    }

    /// `APP_ENV` from the env file, if present and recognised.
    pub fn current_environment(&self) -> Option<Environment> {
        let path = self.path(&self.settings.env_file);
        match buildmedic_edit::read_value(&path, "APP_ENV") {
            Ok(Some(v)) => v.parse().ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(%path, error = %e, "cannot read env file");
                None
            }
        }
    }
}

fn edit_step(name: &str, path: &Utf8Path, edit: &Edit) -> StepResult {
    match buildmedic_edit::apply(path, edit) {
        Ok(_) => StepResult::ok(name),
        Err(e) => StepResult::failed(name, e.to_string()),
    }
}

fn artifact_size(path: &Utf8Path) -> Option<u64> {
    // `.app` bundles are directories; their size is not tracked.
    fs::metadata(path).ok().filter(|m| m.is_file()).map(|m| m.len())
}
