use crate::host::HostEnv;
use crate::requirements::EnvRequirements;
use crate::version::{compare_versions, parse_java_version, strip_range};
use anyhow::Context;
use buildmedic_exec::{CommandOutput, CommandRunner, CommandSpec};
use buildmedic_types::env::{EnvironmentCheck, ValidationSummary};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

type Check = fn(&EnvironmentValidator) -> anyhow::Result<EnvironmentCheck>;

/// Fixed order in which checks run and are reported.
const CHECKS: [(&str, Check); 9] = [
    ("node", EnvironmentValidator::check_node),
    ("npm", EnvironmentValidator::check_npm),
    ("java", EnvironmentValidator::check_java),
    ("android_sdk", EnvironmentValidator::check_android_sdk),
    ("build_tools", EnvironmentValidator::check_build_tools),
    ("framework_versions", EnvironmentValidator::check_framework_versions),
    ("adb", EnvironmentValidator::check_adb),
    ("environment_variables", EnvironmentValidator::check_env_vars),
    ("dependencies", EnvironmentValidator::check_dependencies),
];

pub struct EnvironmentValidator {
    runner: Arc<dyn CommandRunner>,
    host: Arc<dyn HostEnv>,
    project_root: Utf8PathBuf,
    requirements: EnvRequirements,
}

impl EnvironmentValidator {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        host: Arc<dyn HostEnv>,
        project_root: impl Into<Utf8PathBuf>,
        requirements: EnvRequirements,
    ) -> Self {
        Self {
            runner,
            host,
            project_root: project_root.into(),
            requirements,
        }
    }

    pub fn requirements(&self) -> &EnvRequirements {
        &self.requirements
    }

    /// Run every check in order. A check that errors becomes an `error` result.
    pub fn validate_all(&self) -> ValidationSummary {
        let checks: Vec<EnvironmentCheck> = CHECKS
            .iter()
            .map(|(name, check)| match check(self) {
                Ok(result) => result,
                Err(e) => EnvironmentCheck::error(*name, format!("check failed: {e:#}")),
            })
            .collect();

        let summary = ValidationSummary::from_checks(checks);
        info!(
            success = summary.success,
            warnings = summary.warnings.len(),
            errors = summary.errors.len(),
            "environment validated"
        );
        summary
    }

    /// `None` when the program could not be started at all.
    fn probe(&self, program: &str, args: &[&str]) -> Option<CommandOutput> {
        let spec = CommandSpec::new(program).args(args.iter().copied());
        match self.runner.run(&spec) {
            Ok(out) => Some(out),
            Err(e) => {
                debug!(%program, error = %e, "probe failed");
                None
            }
        }
    }

    fn versioned_tool(
        &self,
        name: &str,
        label: &str,
        minimum: &str,
        install_hint: &str,
    ) -> EnvironmentCheck {
        let out = match self.probe(name, &["--version"]) {
            Some(out) if out.success() => out,
            Some(out) => {
                return EnvironmentCheck::error(name, format!("{label} is not working: {}", out.failure_reason()))
                    .resolution(install_hint);
            }
            None => {
                return EnvironmentCheck::error(name, format!("{label} not found"))
                    .resolution(install_hint);
            }
        };

        let found = out.stdout.trim().trim_start_matches(['v', 'V']).to_string();
        if compare_versions(&found, minimum) == Ordering::Less {
            EnvironmentCheck::warning(
                name,
                format!("{label} {found} is older than the required {minimum}"),
            )
            .version(found)
            .resolution(format!("Upgrade {label} to {minimum} or newer"))
        } else {
            EnvironmentCheck::success(name, format!("{label} {found}")).version(found)
        }
    }

    fn check_node(&self) -> anyhow::Result<EnvironmentCheck> {
        let min = &self.requirements.node;
        Ok(self.versioned_tool(
            "node",
            "Node.js",
            min,
            &format!("Install Node.js {min} or newer"),
        ))
    }

    fn check_npm(&self) -> anyhow::Result<EnvironmentCheck> {
        let min = &self.requirements.npm;
        Ok(self.versioned_tool(
            "npm",
            "npm",
            min,
            &format!("Install npm {min} or newer (bundled with Node.js)"),
        ))
    }

    fn check_java(&self) -> anyhow::Result<EnvironmentCheck> {
        let min = self.requirements.java;
        let hint = format!("Install JDK {min} and point JAVA_HOME at it");
        let Some(out) = self.probe("java", &["-version"]) else {
            return Ok(EnvironmentCheck::error("java", "Java not found").resolution(hint));
        };

        // `java -version` writes to stderr.
        let text = if out.stderr.trim().is_empty() {
            &out.stdout
        } else {
            &out.stderr
        };
        let Some((raw, major)) = parse_java_version(text) else {
            return Ok(
                EnvironmentCheck::error("java", "could not determine Java version").resolution(hint),
            );
        };

        Ok(if major < min {
            EnvironmentCheck::warning("java", format!("JDK {major} is older than the required {min}"))
                .version(raw)
                .resolution(hint)
        } else {
            EnvironmentCheck::success("java", format!("JDK {major}")).version(raw)
        })
    }

    fn sdk_root(&self) -> Option<Utf8PathBuf> {
        self.host
            .var("ANDROID_HOME")
            .or_else(|| self.host.var("ANDROID_SDK_ROOT"))
            .map(Utf8PathBuf::from)
    }

    fn check_android_sdk(&self) -> anyhow::Result<EnvironmentCheck> {
        let hint = "Install the Android SDK and set ANDROID_HOME";
        let Some(sdk) = self.sdk_root() else {
            return Ok(EnvironmentCheck::error("android_sdk", "Android SDK not found").resolution(hint));
        };
        if !sdk.is_dir() {
            return Ok(EnvironmentCheck::error(
                "android_sdk",
                format!("Android SDK directory {sdk} does not exist"),
            )
            .resolution(hint));
        }

        let target = &self.requirements.android_platform;
        if sdk.join("platforms").join(target).is_dir() {
            Ok(EnvironmentCheck::success("android_sdk", format!("Android SDK at {sdk}")).version(target))
        } else {
            Ok(
                EnvironmentCheck::warning("android_sdk", format!("platform {target} is not installed"))
                    .resolution(format!("sdkmanager \"platforms;{target}\"")),
            )
        }
    }

    fn check_build_tools(&self) -> anyhow::Result<EnvironmentCheck> {
        let min = &self.requirements.build_tools;
        let hint = format!("sdkmanager \"build-tools;{min}\"");
        let Some(sdk) = self.sdk_root() else {
            return Ok(EnvironmentCheck::error("build_tools", "Android SDK not found").resolution(hint));
        };

        let dir = sdk.join("build-tools");
        let installed = installed_versions(&dir)?;
        let Some(highest) = installed
            .into_iter()
            .max_by(|a, b| compare_versions(a, b))
        else {
            return Ok(EnvironmentCheck::error("build_tools", "no build-tools installed").resolution(hint));
        };

        Ok(if compare_versions(&highest, min) == Ordering::Less {
            EnvironmentCheck::warning(
                "build_tools",
                format!("build-tools {highest} is older than the required {min}"),
            )
            .version(highest)
            .resolution(hint)
        } else {
            EnvironmentCheck::success("build_tools", format!("build-tools {highest}")).version(highest)
        })
    }

    fn manifest_path(&self) -> Utf8PathBuf {
        self.project_root.join("package.json")
    }

    fn check_framework_versions(&self) -> anyhow::Result<EnvironmentCheck> {
        let path = self.manifest_path();
        let Some(manifest) = read_manifest(&path)? else {
            return Ok(EnvironmentCheck::error("framework_versions", "package.json not found")
                .resolution("Run buildmedic from the project root"));
        };

        let wanted = [
            ("react-native", self.requirements.react_native.as_str()),
            ("react", self.requirements.react.as_str()),
        ];
        let mut found = Vec::new();
        let mut missing = Vec::new();
        let mut outdated = Vec::new();
        for (name, min) in wanted {
            match declared_version(&manifest, name) {
                None => missing.push(name),
                Some(v) => {
                    let v = strip_range(&v).to_string();
                    if compare_versions(&v, min) == Ordering::Less {
                        outdated.push(format!("{name} {v} < {min}"));
                    }
                    found.push(format!("{name} {v}"));
                }
            }
        }

        let version = found.join(", ");
        Ok(if !missing.is_empty() {
            EnvironmentCheck::error(
                "framework_versions",
                format!("not declared in package.json: {}", missing.join(", ")),
            )
            .resolution("Add the missing dependencies to package.json")
        } else if !outdated.is_empty() {
            EnvironmentCheck::warning("framework_versions", format!("outdated: {}", outdated.join(", ")))
                .version(version)
                .resolution("Upgrade the framework packages")
        } else {
            EnvironmentCheck::success("framework_versions", version.clone()).version(version)
        })
    }

    fn check_adb(&self) -> anyhow::Result<EnvironmentCheck> {
        let hint = "Install Android platform-tools and add them to PATH";
        let out = match self.probe("adb", &["devices"]) {
            Some(out) if out.success() => out,
            Some(out) => {
                return Ok(EnvironmentCheck::error("adb", format!("adb failed: {}", out.failure_reason()))
                    .resolution(hint));
            }
            None => return Ok(EnvironmentCheck::error("adb", "adb not found").resolution(hint)),
        };

        let devices = connected_devices(&out.stdout);
        Ok(if devices.is_empty() {
            EnvironmentCheck::warning("adb", "no devices connected")
                .resolution("Connect a device with USB debugging enabled or start an emulator")
        } else {
            EnvironmentCheck::success("adb", format!("{} device(s) connected", devices.len()))
        })
    }

    fn check_env_vars(&self) -> anyhow::Result<EnvironmentCheck> {
        let missing: Vec<&str> = self
            .requirements
            .required_vars
            .iter()
            .map(String::as_str)
            .filter(|name| self.host.var(name).is_none())
            .collect();

        Ok(if missing.is_empty() {
            EnvironmentCheck::success("environment_variables", "all required variables are set")
        } else {
            EnvironmentCheck::error(
                "environment_variables",
                format!("missing: {}", missing.join(", ")),
            )
            .resolution("Export the missing variables in your shell profile")
        })
    }

    fn check_dependencies(&self) -> anyhow::Result<EnvironmentCheck> {
        let modules = self.project_root.join("node_modules");
        if !modules.is_dir() {
            return Ok(EnvironmentCheck::error("dependencies", "node_modules not found")
                .resolution("npm install"));
        }

        let manifest = read_manifest(&self.manifest_path())?.unwrap_or(Value::Null);
        let missing: Vec<&str> = manifest
            .get("dependencies")
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|deps| deps.keys())
            .map(String::as_str)
            .filter(|name| !modules.join(name).is_dir())
            .collect();

        Ok(if missing.is_empty() {
            EnvironmentCheck::success("dependencies", "all dependencies installed")
        } else {
            EnvironmentCheck::warning(
                "dependencies",
                format!("{} missing: {}", missing.len(), missing.join(", ")),
            )
            .resolution("npm install")
        })
    }
}

/// Directory names directly under `dir`; empty when `dir` is absent.
fn installed_versions(dir: &Utf8Path) -> anyhow::Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read_dir {dir}"))? {
        let entry = entry?;
        if entry.file_type()?.is_dir()
            && let Some(name) = entry.file_name().to_str()
        {
            out.push(name.to_string());
        }
    }
    Ok(out)
}

fn read_manifest(path: &Utf8Path) -> anyhow::Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    let value = serde_json::from_str(&text).with_context(|| format!("parse {path}"))?;
    Ok(Some(value))
}

fn declared_version(manifest: &Value, name: &str) -> Option<String> {
    ["dependencies", "devDependencies"]
        .iter()
        .find_map(|section| manifest.get(section)?.get(name)?.as_str())
        .map(str::to_string)
}

/// Serials of devices in the `device` state from `adb devices` output.
pub fn connected_devices(output: &str) -> Vec<&str> {
    output
        .lines()
        .skip_while(|l| !l.starts_with("List of devices"))
        .skip(1)
        .filter_map(|l| {
            let mut cols = l.split_whitespace();
            let serial = cols.next()?;
            (cols.next()? == "device").then_some(serial)
        })
        .collect()
}
