use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One per decision, append-only; encodes enough to reconstruct which data,
/// models, and policy version produced the decision.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DecisionLineageRow {
    pub id: Uuid,
    pub decision_id: Uuid,
    pub borrower_id: Uuid,
    pub data_sources: serde_json::Value,
    pub models_used: serde_json::Value,
    pub policy_version: String,
    pub fraud_checks: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
