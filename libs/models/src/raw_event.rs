use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Raw behavioral event ingested for a borrower. Mutated at most twice after
/// insert: once to mark it processed (with notes) or once to mark it failed
/// (notes prefixed `FAILED:`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RawEvent {
    pub id: Uuid,
    pub borrower_id: Uuid,
    pub event_type: String,
    pub event_data: serde_json::Value,
    pub schema_version: String,
    pub processed: bool,
    pub processed_at: Option<DateTime<Utc>>,
    pub processing_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
