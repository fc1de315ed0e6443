use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

static JAVA_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"version\s+"([^"]+)""#).expect("valid regex"));

fn segments(v: &str) -> Vec<u64> {
    let v = v.trim();
    let v = v.strip_prefix(['v', 'V']).unwrap_or(v);
    v.split('.')
        .map(|seg| {
            let digits: String = seg.chars().take_while(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() {
                0
            } else {
                // Only overflow can fail here; saturate so it still sorts high.
                digits.parse().unwrap_or(u64::MAX)
            }
        })
        .collect()
}

/// Segment-wise numeric comparison: `1.2.0 < 1.10.0`, `18 == 18.0.0`.
///
/// A leading `v` is ignored and each segment contributes its leading digits,
/// so `34.0.0-rc1` compares as `34.0.0`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (a, b) = (segments(a), segments(b));
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Strip npm range operators: `^0.72.4` → `0.72.4`.
pub fn strip_range(spec: &str) -> &str {
    spec.trim()
        .trim_start_matches(['^', '~', '>', '<', '=', ' '])
}

/// Java version string and major from `java -version` output.
///
/// `1.8.0_392` is major 8; `17.0.9` is major 17.
pub fn parse_java_version(output: &str) -> Option<(String, u32)> {
    let raw = JAVA_VERSION.captures(output)?.get(1)?.as_str().to_string();
    let mut parts = raw.split(['.', '_', '-', '+']);
    let first: u32 = parts.next()?.parse().ok()?;
    let major = if first == 1 {
        parts.next()?.parse().ok()?
    } else {
        first
    };
    Some((raw, major))
}
