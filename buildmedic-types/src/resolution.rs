use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one automated remediation attempt. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionRecord {
    pub timestamp: DateTime<Utc>,

    #[serde(alias = "patternId")]
    pub pattern_id: String,

    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
