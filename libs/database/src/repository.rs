use async_trait::async_trait;
use credit_decision_common::Result;
use credit_decision_models::{
    AuditLogRow, Borrower, CreditDecisionRow, DecisionLineageRow, FeatureVectorRow, LoanRequest,
    RawEvent,
};
use serde_json::Value;
use uuid::Uuid;

/// Outcome of `Repository::log_audit_event`. Audit writes never raise; a
/// database failure degrades to `Failed` with a local error marker instead
/// of propagating, per the error handling design's audit-log exception.
#[derive(Debug, Clone)]
pub enum AuditOutcome {
    Logged(AuditLogRow),
    Failed { error: String },
}

/// A borrower's fairness-relevant demographic fields paired with one of
/// their recent decisions, used only by the best-effort fairness monitoring
/// step in the orchestrator.
#[derive(Debug, Clone)]
pub struct DecisionWithDemographics {
    pub decision: CreditDecisionRow,
    pub gender: String,
    pub region: String,
}

/// Typed, transaction-boundary-enforced persistence for the credit decision
/// domain. A trait object so the orchestrator and background runner can be
/// exercised against an in-memory fake in tests without a database.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn create_borrower(
        &self,
        user_id: &str,
        full_name: &str,
        gender: &str,
        region: &str,
    ) -> Result<Borrower>;

    async fn get_borrower_by_user(&self, user_id: &str) -> Result<Option<Borrower>>;

    async fn create_loan_request(
        &self,
        borrower_id: Uuid,
        requested_amount: f64,
        purpose: &str,
    ) -> Result<LoanRequest>;

    /// `credit_score` must be in `[0, 1000]`; `decision` is case-insensitive
    /// and normalized to lowercase before storage.
    async fn save_credit_decision(
        &self,
        loan_request_id: Uuid,
        credit_score: f64,
        decision: &str,
        explanation: &str,
        model_version: &str,
    ) -> Result<CreditDecisionRow>;

    async fn save_decision_lineage(
        &self,
        decision_id: Uuid,
        borrower_id: Uuid,
        data_sources: Value,
        models_used: Value,
        policy_version: &str,
        fraud_checks: Value,
    ) -> Result<DecisionLineageRow>;

    async fn save_model_features(
        &self,
        borrower_id: Uuid,
        feature_set: &str,
        feature_version: &str,
        features: Value,
        source_event_count: i32,
    ) -> Result<FeatureVectorRow>;

    /// Latest-wins by `computed_at` descending, top 1.
    async fn get_latest_features(
        &self,
        borrower_id: Uuid,
        feature_set: &str,
    ) -> Result<Option<FeatureVectorRow>>;

    /// Never raises. A database failure is logged and surfaced as
    /// `AuditOutcome::Failed`, not propagated to the caller.
    async fn log_audit_event(
        &self,
        action: &str,
        entity_type: &str,
        entity_id: Option<Uuid>,
        metadata: Value,
    ) -> AuditOutcome;

    /// All raw events for a borrower, most recent first, unfiltered by
    /// `processed` status. Used by the Feature Engine, which windows the
    /// result by lookback day count itself — not to be confused with
    /// `get_unprocessed_events`, which is scoped to the Background Runner's
    /// queue-draining pass and would make any event a background run has
    /// already marked processed permanently invisible here.
    async fn get_raw_events(&self, borrower_id: Uuid, limit: i64) -> Result<Vec<RawEvent>>;

    async fn get_unprocessed_events(&self, borrower_id: Uuid, limit: i64) -> Result<Vec<RawEvent>>;

    /// Sets `(processed=true, processed_at=now, processing_notes=notes)`.
    async fn mark_event_processed(&self, event_id: Uuid, notes: Option<&str>) -> Result<()>;

    /// Sets `(processed=false, processed_at=now, processing_notes="FAILED: <error>")`.
    async fn mark_event_failed(&self, event_id: Uuid, error: &str) -> Result<()>;

    async fn get_recent_decisions_with_demographics(
        &self,
        limit: i64,
    ) -> Result<Vec<DecisionWithDemographics>>;
}
