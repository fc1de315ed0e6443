use buildmedic_types::metrics::ErrorCategory;

/// Checked in order; the first category with a matching keyword wins.
const KEYWORDS: [(ErrorCategory, &[&str]); 5] = [
    (
        ErrorCategory::SignatureIssues,
        &["signature", "certificate", "keystore", "install_failed_update_incompatible"],
    ),
    (
        ErrorCategory::MemoryIssues,
        &["outofmemory", "heap space", "gc overhead", "metaspace", "memory"],
    ),
    (
        ErrorCategory::BuildIssues,
        &["compil", "gradle", "xcodebuild", "linker", "build failed"],
    ),
    (
        ErrorCategory::DependencyIssues,
        &["dependency", "dependencies", "module", "duplicate class", "npm", "pod install"],
    ),
    (
        ErrorCategory::EnvironmentIssues,
        &["sdk", "android_home", "java_home", "environment", "not found in path"],
    ),
];

/// Coarse category of a failure message, by case-insensitive keyword.
pub fn categorize(text: &str) -> ErrorCategory {
    let lower = text.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map_or(ErrorCategory::Other, |(category, _)| *category)
}
