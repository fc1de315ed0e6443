use anyhow::Context;
use buildmedic_types::wire::{AlertsV1, MetricsV1, ResolutionHistoryV1};
use buildmedic_types::{files, schema};
use clap::{Parser, Subcommand};
use fs_err as fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "xtask", about = "Workspace helper tasks")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print schema identifiers used by buildmedic.
    PrintSchemas,
    /// Create an empty state directory (metrics, alerts, resolution history).
    InitState {
        #[arg(long, default_value = ".buildmedic")]
        dir: PathBuf,

        /// Overwrite existing state files.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Validate state directory files against the JSON schemas.
    Validate {
        #[arg(long, default_value = ".buildmedic")]
        dir: PathBuf,

        #[arg(long, default_value = "schemas")]
        schemas: PathBuf,
    },
}

/// State file name and the schema it must satisfy.
const STATE_FILES: [(&str, &str); 4] = [
    (files::METRICS, schema::METRICS_V1),
    (files::ALERTS, schema::ALERTS_V1),
    (files::RESOLUTION_HISTORY, schema::RESOLUTION_HISTORY_V1),
    (files::HEALTH_REPORT, schema::HEALTH_REPORT_V1),
];

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::PrintSchemas => {
            for (_, id) in STATE_FILES {
                println!("{id}");
            }
        }
        Command::InitState { dir, force } => {
            let written = init_state(&dir, force)?;
            println!("initialized {} ({} files written)", dir.display(), written);
        }
        Command::Validate { dir, schemas } => {
            let problems = validate_dir(&dir, &schemas)?;
            if !problems.is_empty() {
                for p in &problems {
                    eprintln!("{p}");
                }
                anyhow::bail!("{} schema violation(s) in {}", problems.len(), dir.display());
            }
            println!("{} is valid", dir.display());
        }
    }
    Ok(())
}

fn init_state(dir: &Path, force: bool) -> anyhow::Result<usize> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let blobs = [
        (files::METRICS, serde_json::to_value(MetricsV1::default())?),
        (files::ALERTS, serde_json::to_value(AlertsV1::new(Vec::new()))?),
        (
            files::RESOLUTION_HISTORY,
            serde_json::to_value(ResolutionHistoryV1::new(Vec::new()))?,
        ),
    ];

    let mut written = 0;
    for (name, value) in blobs {
        let path = dir.join(name);
        if path.exists() && !force {
            continue;
        }
        let s = serde_json::to_string_pretty(&value).context("serialize json")?;
        fs::write(&path, s)?;
        written += 1;
    }
    Ok(written)
}

/// Every violation found, as `file: message` lines. Missing files are skipped.
fn validate_dir(dir: &Path, schemas: &Path) -> anyhow::Result<Vec<String>> {
    let mut problems = Vec::new();
    for (name, id) in STATE_FILES {
        let path = dir.join(name);
        if !path.exists() {
            continue;
        }
        let schema_path = schemas.join(format!("{id}.json"));
        let schema_json = read_json(&schema_path)?;
        let validator = jsonschema::validator_for(&schema_json)
            .map_err(|e| anyhow::anyhow!("compile {}: {}", schema_path.display(), e))?;

        let instance = read_json(&path)?;
        for err in validator.iter_errors(&instance) {
            problems.push(format!("{name}: {err}"));
        }
    }
    Ok(problems)
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let s = fs::read_to_string(path)?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schemas_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("schemas")
    }

    #[test]
    fn fresh_state_is_valid() {
        let td = tempfile::tempdir().expect("tempdir");
        assert_eq!(init_state(td.path(), false).expect("init"), 3);
        assert_eq!(init_state(td.path(), false).expect("init again"), 0);

        let problems = validate_dir(td.path(), &schemas_dir()).expect("validate");
        assert!(problems.is_empty(), "{problems:?}");
    }

    #[test]
    fn bad_alert_is_reported() {
        let td = tempfile::tempdir().expect("tempdir");
        let alerts = serde_json::json!({
            "schema": schema::ALERTS_V1,
            "alerts": [{
                "id": "a1",
                "timestamp": "2026-01-01T00:00:00Z",
                "type": "disk_full",
                "message": "x",
                "severity": "high",
                "resolved": false
            }]
        });
        fs::write(td.path().join(files::ALERTS), alerts.to_string()).expect("write");

        let problems = validate_dir(td.path(), &schemas_dir()).expect("validate");
        assert_eq!(problems.len(), 1, "{problems:?}");
        assert!(problems[0].starts_with("alerts.json: "));
        assert!(problems[0].contains("disk_full"));
    }
}
