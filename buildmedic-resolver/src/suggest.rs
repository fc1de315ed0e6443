//! Keyword-bucketed advice for errors no pattern recognises.

struct Bucket {
    keywords: &'static [&'static str],
    suggestions: &'static [&'static str],
}

const BUCKETS: [Bucket; 4] = [
    Bucket {
        keywords: &["build", "compile", "gradle", "xcode"],
        suggestions: &[
            "Run `buildmedic clean` and rebuild",
            "Look for the first error in the full build log",
        ],
    },
    Bucket {
        keywords: &["install", "adb", "device"],
        suggestions: &[
            "Check the device connection with `adb devices`",
            "Uninstall the app from the device and retry",
        ],
    },
    Bucket {
        keywords: &["dependency", "module", "package", "npm", "pod"],
        suggestions: &[
            "Reinstall JavaScript dependencies with `npm install`",
            "Reinstall native dependencies with `cd ios && pod install`",
        ],
    },
    Bucket {
        keywords: &["memory", "heap", "oom"],
        suggestions: &[
            "Raise org.gradle.jvmargs in android/gradle.properties",
            "Close other memory-heavy processes",
        ],
    },
];

const FALLBACK: [&str; 2] = [
    "Run `buildmedic validate` to check the environment",
    "Search for the exact error message",
];

/// Suggestions from every bucket with a keyword in `text`, in bucket order.
pub fn suggestions_for(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let out: Vec<String> = BUCKETS
        .iter()
        .filter(|b| b.keywords.iter().any(|k| lower.contains(k)))
        .flat_map(|b| b.suggestions.iter().map(|s| s.to_string()))
        .collect();
    if out.is_empty() {
        FALLBACK.iter().map(|s| s.to_string()).collect()
    } else {
        out
    }
}
