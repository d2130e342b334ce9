use async_trait::async_trait;
use chrono::Utc;
use credit_decision_common::{AppError, Result};
use credit_decision_models::{
    AuditLogRow, Borrower, CreditDecisionRow, DecisionLineageRow, FeatureVectorRow, LoanRequest,
    RawEvent,
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{error, warn};
use uuid::Uuid;

use crate::repository::{AuditOutcome, DecisionWithDemographics, Repository};

pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Production `Repository` implementation over Postgres via `sqlx`. The
/// teacher's `libs/database` shipped only a `Cargo.toml`, so the query
/// patterns here are grounded instead on the parameterized-bind,
/// `query_as::<_, T>()` style visible in the policy-service and
/// audit-service handlers.
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn create_borrower(
        &self,
        user_id: &str,
        full_name: &str,
        gender: &str,
        region: &str,
    ) -> Result<Borrower> {
        if user_id.trim().is_empty() {
            return Err(AppError::Validation("user_id cannot be empty".into()));
        }
        if full_name.trim().is_empty() {
            return Err(AppError::Validation("full_name cannot be empty".into()));
        }

        let row = sqlx::query_as::<_, Borrower>(
            r#"
            INSERT INTO borrowers (id, user_id, full_name, gender, region, created_at)
            VALUES (gen_random_uuid(), $1, $2, $3, $4, now())
            RETURNING id, user_id, full_name, gender, region, created_at
            "#,
        )
        .bind(user_id)
        .bind(full_name)
        .bind(gender)
        .bind(region)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| {
            AppError::DecisionNotPersisted(format!(
                "transaction returned no row creating borrower for user_id={user_id}"
            ))
        })
    }

    async fn get_borrower_by_user(&self, user_id: &str) -> Result<Option<Borrower>> {
        let row = sqlx::query_as::<_, Borrower>(
            r#"
            SELECT id, user_id, full_name, gender, region, created_at
            FROM borrowers
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_loan_request(
        &self,
        borrower_id: Uuid,
        requested_amount: f64,
        purpose: &str,
    ) -> Result<LoanRequest> {
        if requested_amount <= 0.0 {
            return Err(AppError::Validation(format!(
                "requested_amount must be positive, got {requested_amount}"
            )));
        }
        if purpose.trim().is_empty() {
            return Err(AppError::Validation("purpose cannot be empty".into()));
        }

        let row = sqlx::query_as::<_, LoanRequest>(
            r#"
            INSERT INTO loan_requests (id, borrower_id, requested_amount, purpose, status, created_at)
            VALUES (gen_random_uuid(), $1, $2, $3, 'pending', now())
            RETURNING id, borrower_id, requested_amount, purpose, status, created_at
            "#,
        )
        .bind(borrower_id)
        .bind(requested_amount)
        .bind(purpose)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| {
            AppError::DecisionNotPersisted(format!(
                "transaction returned no row creating loan request for borrower_id={borrower_id}"
            ))
        })
    }

    async fn save_credit_decision(
        &self,
        loan_request_id: Uuid,
        credit_score: f64,
        decision: &str,
        explanation: &str,
        model_version: &str,
    ) -> Result<CreditDecisionRow> {
        if !(0.0..=1000.0).contains(&credit_score) {
            return Err(AppError::Validation(format!(
                "credit_score must be between 0 and 1000, got {credit_score}"
            )));
        }
        let normalized = decision.to_lowercase();
        if !matches!(normalized.as_str(), "approved" | "rejected" | "review") {
            return Err(AppError::Validation(format!(
                "decision must be one of approved/rejected/review, got {decision}"
            )));
        }
        if model_version.trim().is_empty() {
            return Err(AppError::Validation("model_version cannot be empty".into()));
        }

        let row = sqlx::query_as::<_, CreditDecisionRow>(
            r#"
            INSERT INTO credit_decisions (id, loan_request_id, credit_score, decision, explanation, model_version, created_at)
            VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, now())
            RETURNING id, loan_request_id, credit_score, decision, explanation, model_version, created_at
            "#,
        )
        .bind(loan_request_id)
        .bind(credit_score)
        .bind(&normalized)
        .bind(explanation)
        .bind(model_version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DecisionNotPersisted(format!(
                "CRITICAL: database error saving credit decision for loan_request_id={loan_request_id}: {e}. decision was not persisted"
            ))
        })?;

        row.ok_or_else(|| {
            AppError::DecisionNotPersisted(format!(
                "CRITICAL: no row returned saving credit decision for loan_request_id={loan_request_id}; decision was not persisted"
            ))
        })
    }

    async fn save_decision_lineage(
        &self,
        decision_id: Uuid,
        borrower_id: Uuid,
        data_sources: Value,
        models_used: Value,
        policy_version: &str,
        fraud_checks: Value,
    ) -> Result<DecisionLineageRow> {
        if policy_version.trim().is_empty() {
            return Err(AppError::Validation("policy_version cannot be empty".into()));
        }

        let row = sqlx::query_as::<_, DecisionLineageRow>(
            r#"
            INSERT INTO decision_lineage (id, decision_id, borrower_id, data_sources, models_used, policy_version, fraud_checks, created_at)
            VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, now())
            RETURNING id, decision_id, borrower_id, data_sources, models_used, policy_version, fraud_checks, created_at
            "#,
        )
        .bind(decision_id)
        .bind(borrower_id)
        .bind(data_sources)
        .bind(models_used)
        .bind(policy_version)
        .bind(fraud_checks)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| {
            AppError::DecisionNotPersisted(format!(
                "CRITICAL: no row returned saving decision lineage for decision_id={decision_id}; audit trail was not persisted"
            ))
        })
    }

    async fn save_model_features(
        &self,
        borrower_id: Uuid,
        feature_set: &str,
        feature_version: &str,
        features: Value,
        source_event_count: i32,
    ) -> Result<FeatureVectorRow> {
        let row = sqlx::query_as::<_, FeatureVectorRow>(
            r#"
            INSERT INTO model_features (id, borrower_id, feature_set, feature_version, features, computed_at, source_event_count)
            VALUES (gen_random_uuid(), $1, $2, $3, $4, now(), $5)
            RETURNING id, borrower_id, feature_set, feature_version, features, computed_at, source_event_count
            "#,
        )
        .bind(borrower_id)
        .bind(feature_set)
        .bind(feature_version)
        .bind(features)
        .bind(source_event_count)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| {
            AppError::Internal(format!(
                "no row returned saving features for borrower_id={borrower_id}"
            ))
        })
    }

    async fn get_latest_features(
        &self,
        borrower_id: Uuid,
        feature_set: &str,
    ) -> Result<Option<FeatureVectorRow>> {
        let row = sqlx::query_as::<_, FeatureVectorRow>(
            r#"
            SELECT id, borrower_id, feature_set, feature_version, features, computed_at, source_event_count
            FROM model_features
            WHERE borrower_id = $1 AND feature_set = $2
            ORDER BY computed_at DESC
            LIMIT 1
            "#,
        )
        .bind(borrower_id)
        .bind(feature_set)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn log_audit_event(
        &self,
        action: &str,
        entity_type: &str,
        entity_id: Option<Uuid>,
        metadata: Value,
    ) -> AuditOutcome {
        if action.trim().is_empty() || entity_type.trim().is_empty() {
            warn!("[Repository] rejected audit event with empty action/entity_type");
            return AuditOutcome::Failed {
                error: "action and entity_type are required".into(),
            };
        }

        let result = sqlx::query_as::<_, AuditLogRow>(
            r#"
            INSERT INTO audit_logs (id, action, entity_type, entity_id, metadata, created_at)
            VALUES (gen_random_uuid(), $1, $2, $3, $4, now())
            RETURNING id, action, entity_type, entity_id, metadata, created_at
            "#,
        )
        .bind(action)
        .bind(entity_type)
        .bind(entity_id)
        .bind(metadata)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(row)) => AuditOutcome::Logged(row),
            Ok(None) => {
                error!("[Repository] audit insert returned no row: action={action}, entity_type={entity_type}");
                AuditOutcome::Failed {
                    error: "audit_log_failed".into(),
                }
            }
            Err(e) => {
                error!("[Repository] audit insert failed: {e}");
                AuditOutcome::Failed {
                    error: "audit_log_exception".into(),
                }
            }
        }
    }

    async fn get_raw_events(&self, borrower_id: Uuid, limit: i64) -> Result<Vec<RawEvent>> {
        let rows = sqlx::query_as::<_, RawEvent>(
            r#"
            SELECT id, borrower_id, event_type, event_data, schema_version, processed, processed_at, processing_notes, created_at
            FROM raw_events
            WHERE borrower_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(borrower_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_unprocessed_events(&self, borrower_id: Uuid, limit: i64) -> Result<Vec<RawEvent>> {
        let rows = sqlx::query_as::<_, RawEvent>(
            r#"
            SELECT id, borrower_id, event_type, event_data, schema_version, processed, processed_at, processing_notes, created_at
            FROM raw_events
            WHERE borrower_id = $1 AND processed = false
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(borrower_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn mark_event_processed(&self, event_id: Uuid, notes: Option<&str>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE raw_events
            SET processed = true, processed_at = $2, processing_notes = $3
            WHERE id = $1
            "#,
        )
        .bind(event_id)
        .bind(Utc::now())
        .bind(notes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_event_failed(&self, event_id: Uuid, error_msg: &str) -> Result<()> {
        let notes = format!("FAILED: {error_msg}");
        sqlx::query(
            r#"
            UPDATE raw_events
            SET processed = false, processed_at = $2, processing_notes = $3
            WHERE id = $1
            "#,
        )
        .bind(event_id)
        .bind(Utc::now())
        .bind(notes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_recent_decisions_with_demographics(
        &self,
        limit: i64,
    ) -> Result<Vec<DecisionWithDemographics>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            decision: CreditDecisionRow,
            gender: String,
            region: String,
        }

        let rows = sqlx::query_as::<_, Row>(
            r#"
            SELECT cd.id, cd.loan_request_id, cd.credit_score, cd.decision, cd.explanation,
                   cd.model_version, cd.created_at, b.gender, b.region
            FROM credit_decisions cd
            JOIN loan_requests lr ON lr.id = cd.loan_request_id
            JOIN borrowers b ON b.id = lr.borrower_id
            ORDER BY cd.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| DecisionWithDemographics {
                decision: r.decision,
                gender: r.gender,
                region: r.region,
            })
            .collect())
    }
}
