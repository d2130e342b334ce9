use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted, versioned feature row. Immutable after insert; latest-wins
/// by `computed_at` descending for a given `(borrower_id, feature_set)`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeatureVectorRow {
    pub id: Uuid,
    pub borrower_id: Uuid,
    pub feature_set: String,
    pub feature_version: String,
    pub features: serde_json::Value,
    pub computed_at: DateTime<Utc>,
    pub source_event_count: i32,
}
