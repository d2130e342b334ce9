use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoanRequest {
    pub id: Uuid,
    pub borrower_id: Uuid,
    pub requested_amount: f64,
    pub purpose: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
