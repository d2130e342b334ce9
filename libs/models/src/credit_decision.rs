use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted exactly once per loan request on the happy path; never
/// rewritten except via a manual override record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CreditDecisionRow {
    pub id: Uuid,
    pub loan_request_id: Uuid,
    pub credit_score: f64,
    pub decision: String,
    pub explanation: String,
    pub model_version: String,
    pub created_at: DateTime<Utc>,
}
