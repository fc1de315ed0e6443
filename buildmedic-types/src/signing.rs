use serde::{Deserialize, Serialize};

/// Snapshot of the debug signing state for the configured package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureReport {
    pub keystore_exists: bool,
    pub app_installed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_fingerprint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_fingerprint: Option<String>,

    pub configuration_valid: bool,

    /// `debug_fingerprint == installed_fingerprint`, both present.
    pub signature_match: bool,
}

impl SignatureReport {
    pub fn new(
        keystore_exists: bool,
        app_installed: bool,
        debug_fingerprint: Option<String>,
        installed_fingerprint: Option<String>,
        configuration_valid: bool,
    ) -> Self {
        let signature_match = matches!(
            (&debug_fingerprint, &installed_fingerprint),
            (Some(a), Some(b)) if a == b
        );
        Self {
            keystore_exists,
            app_installed,
            debug_fingerprint,
            installed_fingerprint,
            configuration_valid,
            signature_match,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_requires_both_fingerprints() {
        let r = SignatureReport::new(true, true, Some("ab".into()), Some("ab".into()), true);
        assert!(r.signature_match);
        let r = SignatureReport::new(true, false, Some("ab".into()), None, true);
        assert!(!r.signature_match);
        let r = SignatureReport::new(true, true, Some("ab".into()), Some("cd".into()), true);
        assert!(!r.signature_match);
    }
}
