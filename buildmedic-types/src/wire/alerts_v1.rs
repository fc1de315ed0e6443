use crate::alert::Alert;
use crate::wire::{WireError, check_schema, from_value};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const CONTEXT: &str = "alerts";

/// `alerts.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertsV1 {
    pub schema: String,

    #[serde(default)]
    pub alerts: Vec<Alert>,
}

impl AlertsV1 {
    pub fn new(alerts: Vec<Alert>) -> Self {
        Self {
            schema: crate::schema::ALERTS_V1.to_string(),
            alerts,
        }
    }

    /// Accepts the versioned object or a legacy bare `Alert[]`.
    pub fn decode(value: Value) -> Result<Self, WireError> {
        match value {
            Value::Array(_) => Ok(Self::new(from_value(CONTEXT, value)?)),
            Value::Object(_) => {
                if !check_schema(CONTEXT, &value, crate::schema::ALERTS_V1)? {
                    return Err(WireError::UnexpectedShape { context: CONTEXT });
                }
                from_value(CONTEXT, value)
            }
            _ => Err(WireError::UnexpectedShape { context: CONTEXT }),
        }
    }
}
