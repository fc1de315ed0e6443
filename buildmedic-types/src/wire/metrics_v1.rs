use crate::build::BuildRecord;
use crate::metrics::{ErrorCategory, ErrorMetric, PerformanceMetric};
use crate::wire::{WireError, check_schema, from_value};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

const CONTEXT: &str = "metrics";

/// `metrics.json`: the build log plus the aggregates derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsV1 {
    #[serde(default = "schema_id")]
    pub schema: String,

    #[serde(default)]
    pub builds: Vec<BuildRecord>,

    #[serde(default)]
    pub performance: BTreeMap<String, PerformanceMetric>,

    #[serde(default)]
    pub errors: BTreeMap<ErrorCategory, ErrorMetric>,

    /// Reserved; always written empty.
    #[serde(default)]
    pub trends: BTreeMap<String, Value>,
}

fn schema_id() -> String {
    crate::schema::METRICS_V1.to_string()
}

impl Default for MetricsV1 {
    fn default() -> Self {
        Self {
            schema: schema_id(),
            builds: Vec::new(),
            performance: BTreeMap::new(),
            errors: BTreeMap::new(),
            trends: BTreeMap::new(),
        }
    }
}

impl MetricsV1 {
    pub fn decode(value: Value) -> Result<Self, WireError> {
        if !value.is_object() {
            return Err(WireError::UnexpectedShape { context: CONTEXT });
        }
        check_schema(CONTEXT, &value, crate::schema::METRICS_V1)?;
        let mut out: MetricsV1 = from_value(CONTEXT, value)?;
        out.schema = schema_id();
        Ok(out)
    }
}
