//! Line-oriented `key=value` files: `gradle.properties`, `.env`, `.xcconfig`.

/// How a rewritten line joins key and value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assignment {
    /// `key=value` (properties, dotenv).
    #[default]
    Compact,
    /// `KEY = value` (xcconfig).
    Spaced,
}

impl Assignment {
    fn format(self, key: &str, value: &str) -> String {
        match self {
            Assignment::Compact => format!("{key}={value}"),
            Assignment::Spaced => format!("{key} = {value}"),
        }
    }
}

/// Key declared on a line, ignoring blanks, comments and `export ` prefixes.
fn line_key(line: &str) -> Option<&str> {
    let t = line.trim_start();
    if t.is_empty() || t.starts_with('#') || t.starts_with('!') || t.starts_with("//") {
        return None;
    }
    let t = t.strip_prefix("export ").unwrap_or(t);
    let (key, _) = t.split_once('=')?;
    let key = key.trim();
    if key.is_empty() { None } else { Some(key) }
}

/// Replace every line declaring one of `entries`' keys, append the rest.
///
/// Re-running with the same entries yields the same text. Unrelated lines,
/// comments and ordering are preserved; output always ends with a newline.
pub fn upsert_lines(contents: &str, entries: &[(String, String)], style: Assignment) -> String {
    // Later duplicates win but keep the first key's position.
    let mut unique: Vec<(String, String)> = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        match unique.iter_mut().find(|(uk, _)| uk == k) {
            Some(slot) => slot.1 = v.clone(),
            None => unique.push((k.clone(), v.clone())),
        }
    }
    let entries = unique;

    let mut seen = vec![false; entries.len()];
    let mut out = String::with_capacity(contents.len() + 64);

    for line in contents.lines() {
        let hit = line_key(line).and_then(|k| entries.iter().position(|(ek, _)| ek == k));
        match hit {
            Some(i) => {
                seen[i] = true;
                let (k, v) = &entries[i];
                out.push_str(&style.format(k, v));
            }
            None => out.push_str(line),
        }
        out.push('\n');
    }

    for ((k, v), seen) in entries.iter().zip(seen) {
        if !seen {
            out.push_str(&style.format(k, v));
            out.push('\n');
        }
    }

    out
}

/// Value of the last line declaring `key`, unquoted.
pub fn lookup(contents: &str, key: &str) -> Option<String> {
    contents
        .lines()
        .filter(|l| line_key(l) == Some(key))
        .filter_map(|l| l.split_once('=').map(|(_, v)| v.trim()))
        .last()
        .map(|v| v.trim_matches(|c| c == '"' || c == '\'').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn replaces_in_place_and_appends_missing() {
        let before = "# gradle\norg.gradle.jvmargs=-Xmx2048m\nandroid.useAndroidX=true\n";
        let after = upsert_lines(
            before,
            &[e("org.gradle.jvmargs", "-Xmx4096m"), e("org.gradle.daemon", "true")],
            Assignment::Compact,
        );
        assert_eq!(
            after,
            "# gradle\norg.gradle.jvmargs=-Xmx4096m\nandroid.useAndroidX=true\norg.gradle.daemon=true\n"
        );
    }

    #[test]
    fn commented_keys_are_not_replaced() {
        let after = upsert_lines("#APP_ENV=production\n", &[e("APP_ENV", "staging")], Assignment::Compact);
        assert_eq!(after, "#APP_ENV=production\nAPP_ENV=staging\n");
    }

    #[test]
    fn spaced_style_and_export_prefix() {
        let after = upsert_lines(
            "CODE_SIGN_IDENTITY = iPhone Developer\n",
            &[e("CODE_SIGN_IDENTITY", "iPhone Distribution")],
            Assignment::Spaced,
        );
        assert_eq!(after, "CODE_SIGN_IDENTITY = iPhone Distribution\n");

        let after = upsert_lines("export DEBUG_MODE=true", &[e("DEBUG_MODE", "false")], Assignment::Compact);
        assert_eq!(after, "DEBUG_MODE=false\n");
    }

    #[test]
    fn lookup_reads_last_declaration_unquoted() {
        let text = "APP_ENV=development\n# APP_ENV=x\nAPP_ENV=\"staging\"\n";
        assert_eq!(lookup(text, "APP_ENV").as_deref(), Some("staging"));
        assert_eq!(lookup(text, "DEBUG_MODE"), None);
    }
}
