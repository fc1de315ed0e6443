//! Rendering helpers (markdown) for human-readable output.

use buildmedic_exec::{StepOutcome, StepReport};
use buildmedic_types::env::{CheckStatus, ValidationSummary};
use buildmedic_types::report::HealthReport;
use buildmedic_types::signing::SignatureReport;

pub fn render_health_report_md(report: &HealthReport) -> String {
    let s = &report.summary;
    let mut out = String::new();
    out.push_str("# buildmedic health report\n\n");
    out.push_str(&format!(
        "- Generated: {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("- Health score: {:.1}/100\n", report.health_score));
    out.push_str(&format!(
        "- Builds: {} ({} succeeded, {} failed, {:.1}% success)\n",
        s.total_builds, s.successful_builds, s.failed_builds, s.success_rate
    ));
    out.push_str(&format!("- Last 24h: {}\n", s.builds_last_24h));
    if let Some(last) = s.last_build {
        out.push_str(&format!("- Last build: {}\n", last.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    out.push('\n');

    out.push_str("## Performance\n\n");
    if report.performance.is_empty() {
        out.push_str("_No builds recorded._\n\n");
    } else {
        out.push_str("| Target | Builds | Success | Avg time | Trend |\n");
        out.push_str("|---|---:|---:|---:|---|\n");
        for (key, p) in &report.performance {
            out.push_str(&format!(
                "| `{}` | {} | {:.1}% | {:.1}s | {} |\n",
                key,
                p.total_builds,
                p.success_rate,
                p.average_build_time,
                p.trend.as_str()
            ));
        }
        out.push('\n');
    }

    out.push_str("## Errors\n\n");
    if report.errors.is_empty() {
        out.push_str("_No errors recorded._\n\n");
    } else {
        for (category, e) in &report.errors {
            out.push_str(&format!(
                "- `{}`: {} ({})\n",
                category,
                e.count,
                e.frequency.as_str()
            ));
        }
        out.push('\n');
    }

    let a = &report.alerts;
    out.push_str("## Alerts\n\n");
    out.push_str(&format!(
        "- Active: {} (high {}, medium {})\n- Resolved: {}\n\n",
        a.active, a.high, a.medium, a.resolved
    ));

    out.push_str("## Recommendations\n\n");
    if report.recommendations.is_empty() {
        out.push_str("_Nothing to recommend._\n");
    } else {
        for r in &report.recommendations {
            out.push_str(&format!("- {}\n", r.message));
        }
    }
    out
}

pub fn render_validation_md(summary: &ValidationSummary) -> String {
    let mut out = String::new();
    out.push_str("# Environment validation\n\n");
    out.push_str(&format!(
        "- Result: {}\n- Errors: {}\n- Warnings: {}\n\n",
        if summary.success { "ready" } else { "not ready" },
        summary.errors.len(),
        summary.warnings.len()
    ));

    for c in &summary.checks {
        out.push_str(&format!("- {} `{}`: {}", status_mark(c.status), c.name, c.message));
        if let Some(v) = &c.version {
            out.push_str(&format!(" ({v})"));
        }
        out.push('\n');
        if let Some(fix) = &c.resolution {
            out.push_str(&format!("  - Fix: {fix}\n"));
        }
    }
    out
}

pub fn render_steps_md(title: &str, report: &StepReport) -> String {
    let mut out = format!("# {title}\n\n");
    if report.is_empty() {
        out.push_str("_No steps run._\n");
        return out;
    }
    for (i, step) in report.steps.iter().enumerate() {
        match &step.outcome {
            StepOutcome::Ok => out.push_str(&format!("{}. `{}`: ok\n", i + 1, step.name)),
            StepOutcome::Failed { reason } => out.push_str(&format!(
                "{}. `{}`: failed{}: {}\n",
                i + 1,
                step.name,
                if step.optional { " (optional)" } else { "" },
                reason
            )),
        }
    }
    out
}

pub fn render_signature_md(report: &SignatureReport) -> String {
    let mut out = String::new();
    out.push_str("# Signing\n\n");
    out.push_str(&format!("- Debug keystore: {}\n", yes_no(report.keystore_exists)));
    out.push_str(&format!(
        "- Keystore configured in build.gradle: {}\n",
        yes_no(report.configuration_valid)
    ));
    out.push_str(&format!("- App installed: {}\n", yes_no(report.app_installed)));
    out.push_str(&format!(
        "- Debug fingerprint: {}\n",
        report.debug_fingerprint.as_deref().unwrap_or("-")
    ));
    out.push_str(&format!(
        "- Installed fingerprint: {}\n",
        report.installed_fingerprint.as_deref().unwrap_or("-")
    ));
    out.push_str(&format!("- Signatures match: {}\n", yes_no(report.signature_match)));
    out
}

fn status_mark(s: CheckStatus) -> &'static str {
    match s {
        CheckStatus::Success => "[ok]",
        CheckStatus::Warning => "[warn]",
        CheckStatus::Error => "[error]",
    }
}

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}
