//! Configuration file loading for buildmedic.
//!
//! Discovers and loads `buildmedic.toml` from the project root.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use buildmedic_core::ManagerSettings;
use buildmedic_env::EnvRequirements;
use buildmedic_signing::SigningConfig;
use buildmedic_workflow::WorkflowSettings;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "buildmedic.toml";

/// Top-level configuration from buildmedic.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BuildmedicConfig {
    pub project: ProjectConfig,

    /// Minimum tool versions; missing keys keep their defaults.
    pub requirements: EnvRequirements,

    pub signing: SigningOverrides,

    pub state: StateConfig,
}

/// `[project]` section. Paths are relative to the project root.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Application id, e.g. `com.example.app`.
    pub package_name: Option<String>,
    pub ios_workspace: Option<Utf8PathBuf>,
    pub ios_scheme: Option<String>,
    /// JSON manifest holding the development flag (default `app.json`).
    pub manifest: Option<Utf8PathBuf>,
    pub env_file: Option<Utf8PathBuf>,
}

/// `[signing]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SigningOverrides {
    pub keystore: Option<Utf8PathBuf>,
    pub alias: Option<String>,
    pub store_password: Option<String>,
}

/// `[state]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// State directory; relative paths resolve against the project root.
    pub dir: Option<Utf8PathBuf>,
}

/// Discover the buildmedic.toml config file.
///
/// Returns `None` if no config file is found in the project root.
pub fn discover_config(project_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = project_root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

pub fn load_config(path: &Utf8Path) -> anyhow::Result<BuildmedicConfig> {
    let contents = fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<BuildmedicConfig> {
    let config: BuildmedicConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the project root, or return default if not found.
pub fn load_or_default(project_root: &Utf8Path) -> anyhow::Result<BuildmedicConfig> {
    match discover_config(project_root) {
        Some(path) => load_config(&path),
        None => Ok(BuildmedicConfig::default()),
    }
}

/// Builder for merging the config file with CLI arguments.
pub struct ConfigMerger {
    config: BuildmedicConfig,
}

impl ConfigMerger {
    pub fn new(config: BuildmedicConfig) -> Self {
        Self { config }
    }

    /// Resolve manager settings. `--state-dir` beats `[state] dir`.
    pub fn merge(self, project_root: &Utf8Path, cli_state_dir: Option<Utf8PathBuf>) -> ManagerSettings {
        let BuildmedicConfig {
            project,
            requirements,
            signing,
            state,
        } = self.config;

        let state_dir = cli_state_dir
            .or(state.dir)
            .map(|dir| if dir.is_absolute() { dir } else { project_root.join(dir) });

        let mut signing_config = SigningConfig::default();
        if let Some(pkg) = project.package_name {
            signing_config.package_name = pkg;
        }
        if let Some(keystore) = signing.keystore {
            signing_config.keystore = keystore;
        }
        if let Some(alias) = signing.alias {
            signing_config.alias = alias;
        }
        if let Some(password) = signing.store_password {
            signing_config.store_password = password;
        }

        let defaults = WorkflowSettings::default();
        let workflow = WorkflowSettings {
            ios_workspace: project.ios_workspace.unwrap_or(defaults.ios_workspace),
            ios_scheme: project.ios_scheme.unwrap_or(defaults.ios_scheme),
            manifest: project.manifest.unwrap_or(defaults.manifest),
            env_file: project.env_file.unwrap_or(defaults.env_file),
        };

        ManagerSettings {
            project_root: project_root.to_path_buf(),
            state_dir,
            requirements,
            signing: signing_config,
            workflow,
            temp_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_example_config() {
        let contents = r#"
[project]
package_name = "com.shop.app"
ios_scheme = "Shop"
env_file = ".env.local"

[requirements]
node = "20.0.0"
java = 21

[signing]
alias = "shopdebug"

[state]
dir = "build/health"
"#;

        let config = parse_config(contents).unwrap();
        assert_eq!(config.project.package_name.as_deref(), Some("com.shop.app"));
        assert_eq!(config.requirements.node, "20.0.0");
        assert_eq!(config.requirements.java, 21);
        // Unset requirement keys keep their defaults.
        assert_eq!(config.requirements.npm, EnvRequirements::default().npm);
        assert_eq!(config.signing.alias.as_deref(), Some("shopdebug"));

        let settings = ConfigMerger::new(config).merge(Utf8Path::new("/work/shop"), None);
        assert_eq!(settings.signing.package_name, "com.shop.app");
        assert_eq!(settings.signing.alias, "shopdebug");
        assert_eq!(settings.signing.store_password, "android");
        assert_eq!(settings.workflow.ios_scheme, "Shop");
        assert_eq!(settings.workflow.env_file, Utf8PathBuf::from(".env.local"));
        assert_eq!(settings.workflow.manifest, Utf8PathBuf::from("app.json"));
        assert_eq!(settings.state_dir(), Utf8PathBuf::from("/work/shop/build/health"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        let settings = ConfigMerger::new(config).merge(Utf8Path::new("app"), None);
        assert_eq!(settings.requirements, EnvRequirements::default());
        assert_eq!(settings.state_dir(), Utf8PathBuf::from("app/.buildmedic"));
    }

    #[test]
    fn test_cli_state_dir_wins() {
        let config = parse_config("[state]\ndir = \"from-config\"\n").unwrap();
        let settings = ConfigMerger::new(config)
            .merge(Utf8Path::new("/p"), Some(Utf8PathBuf::from("/tmp/state")));
        assert_eq!(settings.state_dir(), Utf8PathBuf::from("/tmp/state"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let err = parse_config("[project\n").expect_err("invalid");
        assert!(err.to_string().contains("invalid TOML"));
    }

    #[test]
    fn test_discover_config_some_and_none() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        assert!(discover_config(&root).is_none());

        std::fs::write(root.join(CONFIG_FILE_NAME), "").expect("write config");
        assert!(discover_config(&root).is_some());
        assert!(load_or_default(&root).is_ok());
    }
}
