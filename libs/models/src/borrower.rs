use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A borrower profile. `gender` is recorded for fairness monitoring only —
/// no component in this crate may let it influence a model output.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Borrower {
    pub id: Uuid,
    pub user_id: String,
    pub full_name: String,
    pub gender: String,
    pub region: String,
    pub created_at: DateTime<Utc>,
}
