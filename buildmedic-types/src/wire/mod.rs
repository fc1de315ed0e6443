//! Versioned on-disk envelopes for the state directory.
//!
//! Each file carries a `schema` identifier. Files written before versioning
//! (bare arrays, or a metrics object without `schema`) are upgraded on decode;
//! any other schema identifier is rejected.

use serde_json::Value;

pub mod alerts_v1;
pub mod history_v1;
pub mod metrics_v1;

pub use alerts_v1::AlertsV1;
pub use history_v1::ResolutionHistoryV1;
pub use metrics_v1::MetricsV1;

/// Errors emitted while decoding persisted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    UnknownSchema {
        context: &'static str,
        found: String,
    },
    UnexpectedShape {
        context: &'static str,
    },
    Json {
        context: &'static str,
        message: String,
    },
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireError::UnknownSchema { context, found } => {
                write!(f, "unknown schema '{}' for {}", found, context)
            }
            WireError::UnexpectedShape { context } => {
                write!(f, "unexpected JSON shape for {}", context)
            }
            WireError::Json { context, message } => {
                write!(f, "invalid {}: {}", context, message)
            }
        }
    }
}

impl std::error::Error for WireError {}

/// Returns `Ok(true)` for a versioned object, `Ok(false)` for a legacy one.
pub(crate) fn check_schema(
    context: &'static str,
    value: &Value,
    expected: &str,
) -> Result<bool, WireError> {
    match value.get("schema") {
        None => Ok(false),
        Some(Value::String(s)) if s == expected => Ok(true),
        Some(Value::String(s)) => Err(WireError::UnknownSchema {
            context,
            found: s.clone(),
        }),
        Some(other) => Err(WireError::UnknownSchema {
            context,
            found: other.to_string(),
        }),
    }
}

pub(crate) fn from_value<T: serde::de::DeserializeOwned>(
    context: &'static str,
    value: Value,
) -> Result<T, WireError> {
    serde_json::from_value(value).map_err(|e| WireError::Json {
        context,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::WireError;

    #[test]
    fn wire_error_display_includes_context() {
        let err = WireError::UnknownSchema {
            context: "alerts",
            found: "x.v9".to_string(),
        };
        assert_eq!(err.to_string(), "unknown schema 'x.v9' for alerts");
    }
}
