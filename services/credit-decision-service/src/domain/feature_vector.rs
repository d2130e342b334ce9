use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const FEATURE_SET_CORE_BEHAVIORAL: &str = "core_behavioral";
pub const FEATURE_VERSION_V1: &str = "v1";

/// The `core_behavioral / v1` feature schema. Required keys are explicit
/// fields rather than a map entry, since the schema is fixed and known at
/// compile time; auxiliary keys stay close to the original shape for
/// persistence and for the data-quality narrative attached to a computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    pub feature_set: String,
    pub feature_version: String,
    pub mobile_activity_score: f64,
    pub transaction_volume_30d: f64,
    pub activity_consistency: f64,
    pub event_count: i64,
    pub lookback_days: i64,
    pub has_phone: bool,
    pub data_quality_warnings: Vec<String>,
    pub data_quality_score: f64,
    pub computed_at: DateTime<Utc>,
}

impl FeatureVector {
    pub fn required_keys_present(&self, required: &[&str]) -> Result<(), Vec<String>> {
        let available = ["mobile_activity_score", "transaction_volume_30d", "activity_consistency"];
        let missing: Vec<String> = required
            .iter()
            .filter(|k| !available.contains(k))
            .map(|k| k.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "mobile_activity_score": self.mobile_activity_score,
            "transaction_volume_30d": self.transaction_volume_30d,
            "activity_consistency": self.activity_consistency,
            "event_count": self.event_count,
            "lookback_days": self.lookback_days,
            "has_phone": self.has_phone,
            "data_quality_warnings": self.data_quality_warnings,
            "data_quality_score": self.data_quality_score,
        })
    }
}
