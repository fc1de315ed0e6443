use crate::error::ManagerError;
use crate::ports::Ports;
use crate::settings::ManagerSettings;
use anyhow::anyhow;
use buildmedic_env::EnvironmentValidator;
use buildmedic_exec::StepReport;
use buildmedic_monitor::BuildHealthMonitor;
use buildmedic_resolver::{ErrorResolver, PatternInfo, Resolution, suggestions_for};
use buildmedic_signing::{ConflictResolution, SignatureManager};
use buildmedic_types::build::{Environment, Platform};
use buildmedic_types::env::ValidationSummary;
use buildmedic_types::files;
use buildmedic_types::report::HealthReport;
use buildmedic_types::signing::SignatureReport;
use buildmedic_workflow::{BuildOutcome, WorkflowAutomation};
use serde::Serialize;
use tracing::{info, warn};

/// What `fix_signatures` found and changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignatureFix {
    pub keystore_created: bool,
    pub conflicts: ConflictResolution,
    pub report: SignatureReport,
}

/// Classification of an error text without running any remediation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<PatternInfo>,
    /// Keyword suggestions; only filled when no pattern matched.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// Owns the five services and sequences them.
pub struct BuildManager {
    validator: EnvironmentValidator,
    signing: SignatureManager,
    resolver: ErrorResolver,
    workflow: WorkflowAutomation,
    monitor: BuildHealthMonitor,
    ports: Ports,
}

impl BuildManager {
    pub fn new(settings: &ManagerSettings, ports: Ports) -> Result<Self, ManagerError> {
        let root = &settings.project_root;
        if !root.is_dir() {
            return Err(anyhow!("project root {root} is not a directory").into());
        }

        let validator = EnvironmentValidator::new(
            ports.runner.clone(),
            ports.host.clone(),
            root.clone(),
            settings.requirements.clone(),
        );
        let signing = SignatureManager::new(ports.runner.clone(), root.clone(), settings.signing.clone());
        let mut resolver = ErrorResolver::new(
            ports.runner.clone(),
            ports.store.clone(),
            root.clone(),
            settings.signing.package_name.clone(),
        )
        .with_clock(ports.clock.clone());
        let mut workflow =
            WorkflowAutomation::new(ports.runner.clone(), root.clone(), settings.workflow.clone());
        if let Some(tmp) = &settings.temp_dir {
            resolver = resolver.with_temp_dir(tmp.clone());
            workflow = workflow.with_temp_dir(tmp.clone());
        }
        let monitor = BuildHealthMonitor::new(ports.store.clone(), ports.clock.clone());

        Ok(Self {
            validator,
            signing,
            resolver,
            workflow,
            monitor,
            ports,
        })
    }

    pub fn monitor(&self) -> &BuildHealthMonitor {
        &self.monitor
    }

    pub fn resolver(&self) -> &ErrorResolver {
        &self.resolver
    }

    pub fn workflow(&self) -> &WorkflowAutomation {
        &self.workflow
    }

    pub fn validate(&self) -> ValidationSummary {
        self.validator.validate_all()
    }

    /// Make sure the debug keystore exists and the device copy is signed with it.
    pub fn fix_signatures(&self) -> Result<SignatureFix, ManagerError> {
        let keystore_created = self.signing.ensure_debug_keystore()?;
        let conflicts = self.signing.resolve_conflicts()?;
        Ok(SignatureFix {
            keystore_created,
            conflicts,
            report: self.signing.report(),
        })
    }

    pub fn clean(&self) -> StepReport {
        self.workflow.clean_build()
    }

    pub fn switch_environment(&self, target: Environment) -> StepReport {
        self.workflow.switch_environment(target)
    }

    pub fn patterns(&self) -> Vec<PatternInfo> {
        self.resolver.pattern_infos()
    }

    pub fn diagnose(&self, text: &str) -> Diagnosis {
        match self.resolver.classify(text) {
            Some(p) => Diagnosis {
                pattern: Some(p.info()),
                suggestions: Vec::new(),
            },
            None => Diagnosis {
                pattern: None,
                suggestions: suggestions_for(text),
            },
        }
    }

    pub fn resolve_alert(&mut self, id: &str) -> bool {
        self.monitor.resolve_alert(id)
    }

    /// Generate the health report; also writes `health-report.md` next to the JSON.
    pub fn report(&self) -> HealthReport {
        let report = self.monitor.generate_report();
        let md = buildmedic_render::render_health_report_md(&report);
        if let Err(e) = self.ports.store.write(files::HEALTH_REPORT_MD, &md) {
            warn!(error = %format!("{e:#}"), "failed to write markdown report");
        }
        report
    }

    /// Validate, reconcile signing, build, and on failure remediate and retry once.
    ///
    /// The final outcome is always recorded with the monitor before returning.
    pub fn build_and_deploy(
        &mut self,
        platform: Platform,
        environment: Environment,
    ) -> Result<BuildOutcome, ManagerError> {
        let summary = self.validate();
        if !summary.success {
            return Err(ManagerError::EnvironmentInvalid {
                errors: summary.errors,
            });
        }

        if platform == Platform::Android {
            self.prepare_signing();
        }

        let mut outcome = self.workflow.build(platform, environment, &self.signing);
        if !outcome.success {
            let text = outcome.error.clone().unwrap_or_default();
            let resolution = self.resolver.resolve_error(&text);
            if resolution.succeeded() {
                info!(pattern = ?resolution.pattern_id(), "remediation applied, retrying build");
                outcome = self.workflow.build(platform, environment, &self.signing);
            } else {
                log_unresolved(&resolution);
            }
        }

        if outcome.success {
            self.monitor.record_build_success(
                platform,
                environment,
                outcome.build_time,
                outcome.artifact_size,
            );
            Ok(outcome)
        } else {
            let message = outcome.error.clone().unwrap_or_else(|| "unknown error".to_string());
            self.monitor
                .record_build_failure(platform, environment, &message, Some(outcome.build_time));
            Err(ManagerError::BuildFailed {
                platform,
                environment,
                message,
            })
        }
    }

    fn prepare_signing(&self) {
        if let Err(e) = self.signing.ensure_debug_keystore() {
            warn!(error = %e, "could not ensure debug keystore");
        }
        match self.signing.resolve_conflicts() {
            Ok(r) => info!(resolution = ?r, "signature check done"),
            Err(e) => warn!(error = %e, "signature conflict resolution failed"),
        }
    }
}

fn log_unresolved(resolution: &Resolution) {
    match resolution {
        Resolution::Automated { pattern_id, report, .. } => {
            warn!(pattern = %pattern_id, failures = ?report.failure_summary(), "remediation failed, not retrying");
        }
        Resolution::Manual {
            pattern_id,
            suggested_commands,
            ..
        } => {
            warn!(pattern = %pattern_id, commands = ?suggested_commands, "manual remediation required");
        }
        Resolution::Unmatched { suggestions } => {
            warn!(?suggestions, "unrecognised build failure");
        }
    }
}
