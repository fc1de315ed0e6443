use crate::config::SigningConfig;
use crate::error::SigningError;
use buildmedic_exec::{CommandOutput, CommandRunner, CommandSpec};
use buildmedic_types::signing::SignatureReport;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

static SHA1_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*SHA-?1:\s*([0-9A-Fa-f]{2}(?::[0-9A-Fa-f]{2})+)").expect("valid regex")
});

static SIGNING_CONFIGS_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bsigningConfigs\s*\{").expect("valid regex"));

static DEBUG_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bdebug\s*\{").expect("valid regex"));

static STORE_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"storeFile\s*=?\s*file\(\s*['"]([^'"]+)['"]\s*\)"#).expect("valid regex")
});

/// Contents between the `{` at byte `open` and its matching `}`.
fn braced_body(text: &str, open: usize) -> Option<&str> {
    let mut depth = 0usize;
    for (i, b) in text.bytes().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[open + 1..i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// `storeFile` of the `debug` entry inside a gradle `signingConfigs` block,
/// wherever it sits among sibling configs.
fn debug_store_file(gradle: &str) -> Option<&str> {
    for block in SIGNING_CONFIGS_OPEN.find_iter(gradle) {
        let Some(configs) = braced_body(gradle, block.end() - 1) else {
            continue;
        };
        for entry in DEBUG_OPEN.find_iter(configs) {
            if let Some(body) = braced_body(configs, entry.end() - 1)
                && let Some(caps) = STORE_FILE.captures(body)
                && let Some(file) = caps.get(1)
            {
                return Some(file.as_str());
            }
        }
    }
    None
}

/// Install failure text that indicates a certificate conflict.
const SIGNATURE_MISMATCH_PHRASES: [&str; 4] = [
    "install_failed_update_incompatible",
    "signatures do not match",
    "install_parse_failed_inconsistent_certificates",
    "install_failed_shared_user_incompatible",
];

pub fn is_signature_mismatch(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    SIGNATURE_MISMATCH_PHRASES.iter().any(|p| lower.contains(p))
}

/// SHA-1 certificate fingerprint from keytool output: separators stripped, lower-cased.
pub fn parse_sha1_fingerprint(keytool_output: &str) -> Option<String> {
    let caps = SHA1_LINE.captures(keytool_output)?;
    Some(caps[1].replace(':', "").to_ascii_lowercase())
}

/// What [`SignatureManager::resolve_conflicts`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    NotInstalled,
    /// One of the fingerprints could not be read; nothing was changed.
    Unverifiable,
    Match,
    /// The installed app was signed differently and has been removed.
    Uninstalled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallOutcome {
    Installed,
    ReinstalledAfterUninstall,
}

pub struct SignatureManager {
    runner: Arc<dyn CommandRunner>,
    project_root: Utf8PathBuf,
    config: SigningConfig,
}

impl SignatureManager {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        project_root: impl Into<Utf8PathBuf>,
        config: SigningConfig,
    ) -> Self {
        Self {
            runner,
            project_root: project_root.into(),
            config,
        }
    }

    pub fn config(&self) -> &SigningConfig {
        &self.config
    }

    pub fn keystore_path(&self) -> Utf8PathBuf {
        self.project_root.join(&self.config.keystore)
    }

    /// Generate the debug keystore if absent. Returns true when one was created.
    pub fn ensure_debug_keystore(&self) -> Result<bool, SigningError> {
        let path = self.keystore_path();
        if path.exists() {
            debug!(%path, "debug keystore present");
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| SigningError::Io {
                context: format!("create {parent}"),
                source,
            })?;
        }

        let c = &self.config;
        let validity = c.validity_days.to_string();
        let spec = CommandSpec::new("keytool").args([
            "-genkeypair",
            "-v",
            "-keystore",
            path.as_str(),
            "-storepass",
            c.store_password.as_str(),
            "-alias",
            c.alias.as_str(),
            "-keypass",
            c.key_password.as_str(),
            "-keyalg",
            "RSA",
            "-keysize",
            "2048",
            "-validity",
            validity.as_str(),
            "-dname",
            c.dname.as_str(),
        ]);
        let out = self.runner.run(&spec)?;
        if !out.success() {
            return Err(SigningError::KeystoreGeneration {
                path,
                message: out.failure_reason(),
            });
        }
        info!(%path, "generated debug keystore");
        Ok(true)
    }

    pub fn debug_fingerprint(&self) -> Option<String> {
        let path = self.keystore_path();
        if !path.exists() {
            return None;
        }
        let c = &self.config;
        let spec = CommandSpec::new("keytool").args([
            "-list",
            "-v",
            "-keystore",
            path.as_str(),
            "-alias",
            c.alias.as_str(),
            "-storepass",
            c.store_password.as_str(),
        ]);
        self.fingerprint_from(&spec)
    }

    /// Fingerprint of the APK installed on the device, pulled to a temp dir.
    pub fn installed_fingerprint(&self) -> Option<String> {
        let remote = self.installed_apk_path()?;
        let temp = match tempfile::tempdir() {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "cannot create temp dir for installed apk");
                return None;
            }
        };
        let local = Utf8Path::from_path(temp.path())?.join("installed.apk");

        let pull = CommandSpec::new("adb").args(["pull", remote.as_str(), local.as_str()]);
        match self.runner.run(&pull) {
            Ok(out) if out.success() => {}
            Ok(out) => {
                warn!(reason = %out.failure_reason(), "adb pull failed");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "adb pull failed");
                return None;
            }
        }

        let spec = CommandSpec::new("keytool").args(["-printcert", "-jarfile", local.as_str()]);
        self.fingerprint_from(&spec)
    }

    fn installed_apk_path(&self) -> Option<String> {
        let spec = CommandSpec::new("adb").args([
            "shell",
            "pm",
            "path",
            self.config.package_name.as_str(),
        ]);
        let out = self.run_ok(&spec)?;
        out.stdout
            .lines()
            .find_map(|l| l.trim().strip_prefix("package:"))
            .map(str::to_string)
    }

    fn fingerprint_from(&self, spec: &CommandSpec) -> Option<String> {
        let out = self.run_ok(spec)?;
        let fp = parse_sha1_fingerprint(&out.combined());
        if fp.is_none() {
            debug!(command = %spec.command_line(), "no SHA1 fingerprint in output");
        }
        fp
    }

    fn run_ok(&self, spec: &CommandSpec) -> Option<CommandOutput> {
        match self.runner.run(spec) {
            Ok(out) if out.success() => Some(out),
            Ok(out) => {
                debug!(command = %spec.command_line(), reason = %out.failure_reason(), "command failed");
                None
            }
            Err(e) => {
                debug!(command = %spec.command_line(), error = %e, "command failed");
                None
            }
        }
    }

    pub fn is_app_installed(&self) -> bool {
        let pkg = &self.config.package_name;
        let spec = CommandSpec::new("adb").args(["shell", "pm", "list", "packages", pkg.as_str()]);
        // `pm list packages <filter>` is a substring filter.
        self.run_ok(&spec).is_some_and(|out| {
            out.stdout
                .lines()
                .any(|l| l.trim().strip_prefix("package:") == Some(pkg.as_str()))
        })
    }

    pub fn uninstall(&self) -> Result<(), SigningError> {
        let pkg = &self.config.package_name;
        let out = self
            .runner
            .run(&CommandSpec::new("adb").args(["uninstall", pkg.as_str()]))?;
        if out.success() && !out.combined().contains("Failure") {
            info!(package = %pkg, "uninstalled");
            Ok(())
        } else {
            Err(SigningError::Uninstall {
                package: pkg.clone(),
                message: out.failure_reason(),
            })
        }
    }

    /// Uninstall the device's copy when it is signed with a different key.
    pub fn resolve_conflicts(&self) -> Result<ConflictResolution, SigningError> {
        if !self.is_app_installed() {
            return Ok(ConflictResolution::NotInstalled);
        }
        let (Some(local), Some(installed)) = (self.debug_fingerprint(), self.installed_fingerprint())
        else {
            warn!("cannot verify installed signature, skipping");
            return Ok(ConflictResolution::Unverifiable);
        };
        if local == installed {
            debug!(fingerprint = %local, "signatures match");
            return Ok(ConflictResolution::Match);
        }
        info!(%local, %installed, "signature mismatch, uninstalling");
        self.uninstall()?;
        Ok(ConflictResolution::Uninstalled)
    }

    /// `adb install -r`; on a signature conflict uninstall and retry once.
    pub fn install_with_signature_handling(
        &self,
        artifact: &Utf8Path,
    ) -> Result<InstallOutcome, SigningError> {
        let first = match self.install(artifact)? {
            None => return Ok(InstallOutcome::Installed),
            Some(failure) => failure,
        };
        if !is_signature_mismatch(&first) {
            return Err(SigningError::InstallFailed { message: first });
        }

        warn!(%artifact, "signature conflict on install, uninstalling and retrying");
        self.uninstall()?;
        match self.install(artifact)? {
            None => Ok(InstallOutcome::ReinstalledAfterUninstall),
            Some(message) => Err(SigningError::RetryFailed {
                package: self.config.package_name.clone(),
                message,
            }),
        }
    }

    /// `Ok(None)` on success, `Ok(Some(text))` with the failure output otherwise.
    fn install(&self, artifact: &Utf8Path) -> Result<Option<String>, SigningError> {
        let out = self
            .runner
            .run(&CommandSpec::new("adb").args(["install", "-r", artifact.as_str()]))?;
        // Older adb versions report `Failure [...]` with exit code 0.
        let text = out.combined();
        if out.success() && !text.contains("Failure") {
            info!(%artifact, "installed");
            Ok(None)
        } else {
            Ok(Some(if text.trim().is_empty() {
                out.failure_reason()
            } else {
                text.trim().to_string()
            }))
        }
    }

    /// The gradle module declares a debug signing config using our keystore.
    pub fn validate_keystore_configuration(&self) -> bool {
        let path = self.project_root.join(&self.config.build_gradle);
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) => {
                debug!(%path, error = %e, "build.gradle unreadable");
                return false;
            }
        };
        let Some(keystore_name) = self.config.keystore.file_name() else {
            return false;
        };
        debug_store_file(&text).is_some_and(|f| Utf8Path::new(f).file_name() == Some(keystore_name))
    }

    pub fn report(&self) -> SignatureReport {
        let installed = self.is_app_installed();
        SignatureReport::new(
            self.keystore_path().exists(),
            installed,
            self.debug_fingerprint(),
            if installed {
                self.installed_fingerprint()
            } else {
                None
            },
            self.validate_keystore_configuration(),
        )
    }
}
