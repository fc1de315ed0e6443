mod config;
mod output;

use anyhow::{Context, bail};
use buildmedic_core::{BuildManager, ManagerSettings, Ports};
use buildmedic_exec::StepReport;
use buildmedic_render::{
    render_health_report_md, render_signature_md, render_steps_md, render_validation_md,
};
use buildmedic_types::build::{Environment, Platform};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use config::ConfigMerger;
use serde::Serialize;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "buildmedic",
    version,
    about = "Build health for React Native projects: validate, build, repair, monitor."
)]
struct Cli {
    /// Project root (default: current directory).
    #[arg(long, global = true, default_value = ".")]
    project_root: Utf8PathBuf,

    /// State directory (default: <project_root>/.buildmedic).
    #[arg(long, global = true)]
    state_dir: Option<Utf8PathBuf>,

    /// Output format (text, json).
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check tools, SDKs, variables and dependency versions.
    Validate,
    /// Create the debug keystore and remove device installs signed with another key.
    FixSignatures,
    /// Remove build outputs and caches, then reinstall dependencies.
    Clean,
    /// Build, remediate known failures, retry once, and record the result.
    Build(BuildArgs),
    /// Generate the health report (also written to the state directory).
    Report,
    /// Point the app manifest and env file at another environment.
    SwitchEnv(SwitchEnvArgs),
    /// List the known build failure patterns in match order.
    Patterns,
    /// Classify an error text without running any remediation.
    Diagnose(DiagnoseArgs),
    /// Mark an active alert as resolved.
    ResolveAlert(ResolveAlertArgs),
}

#[derive(Debug, Parser)]
struct BuildArgs {
    /// Target platform (android, ios).
    platform: Platform,

    /// Target environment (development, staging, production).
    environment: Environment,
}

#[derive(Debug, Parser)]
struct SwitchEnvArgs {
    /// Target environment (development, staging, production).
    environment: Environment,
}

#[derive(Debug, Parser)]
struct DiagnoseArgs {
    /// Error output to classify.
    text: String,
}

#[derive(Debug, Parser)]
struct ResolveAlertArgs {
    /// Alert id, as shown in the health report.
    id: String,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not failures.
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::from(0)
            };
        }
    };
    if let Err(e) = real_main(cli) {
        error!("{:?}", e);
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main(cli: Cli) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let format = cli.format;
    let settings = load_settings(&cli)?;
    debug!(
        "project root {}, state dir {}",
        settings.project_root,
        settings.state_dir()
    );
    let ports = Ports::system(settings.state_dir());
    let mut manager = BuildManager::new(&settings, ports)?;

    match cli.cmd {
        Command::Validate => cmd_validate(&manager, format),
        Command::FixSignatures => cmd_fix_signatures(&manager, format),
        Command::Clean => {
            let report = manager.clean();
            finish_steps("Clean build", &report, format)
        }
        Command::Build(args) => cmd_build(&mut manager, args, format),
        Command::Report => cmd_report(&manager, &settings, format),
        Command::SwitchEnv(args) => {
            let report = manager.switch_environment(args.environment);
            finish_steps(
                &format!("Switch to {}", args.environment),
                &report,
                format,
            )
        }
        Command::Patterns => cmd_patterns(&manager, format),
        Command::Diagnose(args) => cmd_diagnose(&manager, args, format),
        Command::ResolveAlert(args) => cmd_resolve_alert(&mut manager, args, format),
    }
}

fn load_settings(cli: &Cli) -> anyhow::Result<ManagerSettings> {
    let file_config =
        config::load_or_default(&cli.project_root).context("load buildmedic.toml config")?;
    Ok(ConfigMerger::new(file_config).merge(&cli.project_root, cli.state_dir.clone()))
}

fn print_json<T: Serialize>(v: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(v).context("serialize json")?;
    println!("{s}");
    Ok(())
}

fn cmd_validate(manager: &BuildManager, format: OutputFormat) -> anyhow::Result<()> {
    let summary = manager.validate();
    match format {
        OutputFormat::Text => print!("{}", render_validation_md(&summary)),
        OutputFormat::Json => print_json(&summary)?,
    }
    if !summary.success {
        bail!("environment is not ready: {}", summary.errors.join("; "));
    }
    Ok(())
}

fn cmd_fix_signatures(manager: &BuildManager, format: OutputFormat) -> anyhow::Result<()> {
    let fix = manager.fix_signatures()?;
    match format {
        OutputFormat::Text => {
            if fix.keystore_created {
                println!("Created debug keystore.");
            }
            println!("Installed app: {:?}", fix.conflicts);
            println!();
            print!("{}", render_signature_md(&fix.report));
        }
        OutputFormat::Json => print_json(&fix)?,
    }
    Ok(())
}

fn finish_steps(title: &str, report: &StepReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print!("{}", render_steps_md(title, report)),
        OutputFormat::Json => print_json(report)?,
    }
    if !report.required_ok() {
        bail!(
            "{}: {}",
            title.to_lowercase(),
            report.failure_summary().unwrap_or_default()
        );
    }
    Ok(())
}

fn cmd_build(
    manager: &mut BuildManager,
    args: BuildArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let outcome = manager.build_and_deploy(args.platform, args.environment)?;
    match format {
        OutputFormat::Text => print!("{}", output::format_build(&outcome)),
        OutputFormat::Json => print_json(&outcome)?,
    }
    Ok(())
}

fn cmd_report(
    manager: &BuildManager,
    settings: &ManagerSettings,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let report = manager.report();
    match format {
        OutputFormat::Text => print!("{}", render_health_report_md(&report)),
        OutputFormat::Json => print_json(&report)?,
    }
    info!("wrote health report to {}", settings.state_dir());
    Ok(())
}

fn cmd_patterns(manager: &BuildManager, format: OutputFormat) -> anyhow::Result<()> {
    let patterns = manager.patterns();
    match format {
        OutputFormat::Text => print!("{}", output::format_pattern_list(&patterns)),
        OutputFormat::Json => print_json(&patterns)?,
    }
    Ok(())
}

fn cmd_diagnose(
    manager: &BuildManager,
    args: DiagnoseArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let diagnosis = manager.diagnose(&args.text);
    match format {
        OutputFormat::Text => print!("{}", output::format_diagnosis(&diagnosis)),
        OutputFormat::Json => print_json(&diagnosis)?,
    }
    Ok(())
}

fn cmd_resolve_alert(
    manager: &mut BuildManager,
    args: ResolveAlertArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if !manager.resolve_alert(&args.id) {
        bail!("no active alert with id '{}'", args.id);
    }
    match format {
        OutputFormat::Text => println!("Resolved alert {}", args.id),
        OutputFormat::Json => print_json(&serde_json::json!({ "resolved": args.id }))?,
    }
    Ok(())
}
