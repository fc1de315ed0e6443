use crate::resolution::ResolutionRecord;
use crate::wire::{WireError, check_schema, from_value};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const CONTEXT: &str = "resolution history";

/// `resolution-history.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionHistoryV1 {
    pub schema: String,

    #[serde(default)]
    pub records: Vec<ResolutionRecord>,
}

impl ResolutionHistoryV1 {
    pub fn new(records: Vec<ResolutionRecord>) -> Self {
        Self {
            schema: crate::schema::RESOLUTION_HISTORY_V1.to_string(),
            records,
        }
    }

    /// Accepts the versioned object or a legacy bare `ResolutionRecord[]`.
    pub fn decode(value: Value) -> Result<Self, WireError> {
        match value {
            Value::Array(_) => Ok(Self::new(from_value(CONTEXT, value)?)),
            Value::Object(_) => {
                if !check_schema(CONTEXT, &value, crate::schema::RESOLUTION_HISTORY_V1)? {
                    return Err(WireError::UnexpectedShape { context: CONTEXT });
                }
                from_value(CONTEXT, value)
            }
            _ => Err(WireError::UnexpectedShape { context: CONTEXT }),
        }
    }
}
