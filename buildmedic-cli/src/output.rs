//! Plain-text formatting for `patterns`, `diagnose` and `build`.

use buildmedic_core::Diagnosis;
use buildmedic_resolver::{PatternInfo, Severity};
use buildmedic_workflow::BuildOutcome;

const RULE: &str =
    "================================================================================";

pub fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "low",
        Severity::Medium => "medium",
        Severity::High => "high",
    }
}

/// One line per pattern, in match order.
pub fn format_pattern_list(patterns: &[PatternInfo]) -> String {
    let mut out = String::new();
    out.push_str("Known build failures (first match wins):\n\n");
    out.push_str(&format!(
        "  {:<26} {:<20} {:<8} {}\n",
        "ID", "CATEGORY", "SEVERITY", "REMEDY"
    ));
    out.push_str(&format!("  {}\n", "-".repeat(66)));
    for p in patterns {
        out.push_str(&format!(
            "  {:<26} {:<20} {:<8} {}\n",
            p.id,
            p.category.as_str(),
            severity_label(p.severity),
            if p.automated { "automated" } else { "manual" }
        ));
    }
    out.push_str("\nUse `buildmedic diagnose <error text>` to classify a failure.\n");
    out
}

pub fn format_pattern(p: &PatternInfo) -> String {
    let mut out = String::new();
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&format!("PATTERN: {}\n", p.id));
    out.push_str(RULE);
    out.push_str("\n\n");
    out.push_str(&format!("Category:  {}\n", p.category.as_str()));
    out.push_str(&format!("Severity:  {}\n", severity_label(p.severity)));
    out.push_str(&format!(
        "Remedy:    {}\n",
        if p.automated {
            "automated (applied by `buildmedic build` on failure)"
        } else {
            "manual"
        }
    ));
    out.push_str(&format!("Matches:   {}\n", p.pattern));

    if !p.steps.is_empty() {
        out.push_str("\nSteps:\n");
        for (i, step) in p.steps.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, step));
        }
    }
    if !p.commands.is_empty() {
        out.push_str("\nCommands:\n");
        for cmd in &p.commands {
            out.push_str(&format!("  $ {cmd}\n"));
        }
    }
    out
}

pub fn format_diagnosis(d: &Diagnosis) -> String {
    match &d.pattern {
        Some(p) => format_pattern(p),
        None => {
            let mut out = String::from("No known pattern matched.\n\nSuggestions:\n");
            for s in &d.suggestions {
                out.push_str(&format!("  - {s}\n"));
            }
            out
        }
    }
}

pub fn format_build(outcome: &BuildOutcome) -> String {
    let mut out = format!(
        "{} {} build succeeded in {:.1}s\n",
        outcome.platform, outcome.environment, outcome.build_time
    );
    if let Some(artifact) = &outcome.artifact {
        out.push_str(&format!("Artifact: {artifact}"));
        if let Some(size) = outcome.artifact_size {
            out.push_str(&format!(" ({size} bytes)"));
        }
        out.push('\n');
    }
    if let Some(installed) = outcome.installed {
        out.push_str(&format!("Installed: {installed:?}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildmedic_types::build::{Environment, Platform};
    use buildmedic_types::metrics::ErrorCategory;

    fn sample() -> PatternInfo {
        PatternInfo {
            id: "out_of_memory",
            category: ErrorCategory::MemoryIssues,
            severity: Severity::High,
            automated: true,
            pattern: "OutOfMemoryError".to_string(),
            steps: vec!["stop gradle daemons".to_string()],
            commands: vec!["(cd android && ./gradlew --stop)".to_string()],
        }
    }

    #[test]
    fn pattern_detail_lists_steps_and_commands() {
        let text = format_pattern(&sample());
        assert!(text.contains("PATTERN: out_of_memory"));
        assert!(text.contains("Severity:  high"));
        assert!(text.contains("  1. stop gradle daemons"));
        assert!(text.contains("  $ (cd android && ./gradlew --stop)"));
    }

    #[test]
    fn unmatched_diagnosis_lists_suggestions() {
        let d = Diagnosis {
            pattern: None,
            suggestions: vec!["Search for the exact error message".to_string()],
        };
        assert_eq!(
            format_diagnosis(&d),
            "No known pattern matched.\n\nSuggestions:\n  - Search for the exact error message\n"
        );
    }

    #[test]
    fn build_summary_mentions_artifact_size() {
        let outcome = BuildOutcome {
            platform: Platform::Android,
            environment: Environment::Staging,
            success: true,
            build_time: 42.0,
            artifact: Some("android/app/build/outputs/apk/release/app-release.apk".into()),
            artifact_size: Some(1024),
            installed: None,
            error: None,
        };
        assert_eq!(
            format_build(&outcome),
            "android staging build succeeded in 42.0s\nArtifact: android/app/build/outputs/apk/release/app-release.apk (1024 bytes)\n"
        );
    }
}
