//! Clap-free settings for the orchestrator.

use buildmedic_env::EnvRequirements;
use buildmedic_signing::SigningConfig;
use buildmedic_workflow::WorkflowSettings;
use camino::Utf8PathBuf;

/// Default state directory, relative to the project root.
pub const DEFAULT_STATE_DIR: &str = ".buildmedic";

#[derive(Debug, Clone, PartialEq)]
pub struct ManagerSettings {
    pub project_root: Utf8PathBuf,
    /// `None` means `<project_root>/.buildmedic`.
    pub state_dir: Option<Utf8PathBuf>,
    pub requirements: EnvRequirements,
    pub signing: SigningConfig,
    pub workflow: WorkflowSettings,
    /// Overrides the system temp dir when clearing bundler caches.
    pub temp_dir: Option<Utf8PathBuf>,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            project_root: Utf8PathBuf::from("."),
            state_dir: None,
            requirements: EnvRequirements::default(),
            signing: SigningConfig::default(),
            workflow: WorkflowSettings::default(),
            temp_dir: None,
        }
    }
}

impl ManagerSettings {
    pub fn state_dir(&self) -> Utf8PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| self.project_root.join(DEFAULT_STATE_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_dir_defaults_under_project_root() {
        let s = ManagerSettings {
            project_root: Utf8PathBuf::from("/work/app"),
            ..ManagerSettings::default()
        };
        assert_eq!(s.state_dir(), Utf8PathBuf::from("/work/app/.buildmedic"));

        let s = ManagerSettings {
            state_dir: Some(Utf8PathBuf::from("/var/state")),
            ..s
        };
        assert_eq!(s.state_dir(), Utf8PathBuf::from("/var/state"));
    }
}
