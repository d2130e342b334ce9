use std::sync::Arc;

use credit_decision_database::Repository;
use credit_decision_models::DecisionType;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::policy::CreditPolicy;
use super::rules::{RuleContext, APPROVAL_RULES, REJECTION_RULES, REVIEW_RULES};
use crate::domain::{DecisionResult, FraudResult};

/// Orchestrates policy rule application over AI signals and persists the
/// resulting decision's lineage. Holds no model logic of its own — every
/// number it reasons about was already produced by the Ensemble.
pub struct DecisionEngine {
    policy: CreditPolicy,
    policy_version: String,
    repository: Arc<dyn Repository>,
}

impl DecisionEngine {
    pub fn new(policy: CreditPolicy, policy_version: impl Into<String>, repository: Arc<dyn Repository>) -> Self {
        Self {
            policy,
            policy_version: policy_version.into(),
            repository,
        }
    }

    /// Applies safety overrides, then REJECT → REVIEW → APPROVE rules in
    /// order. `fraud_result.fraud_score` being absent is the only safety
    /// override expressible here: a missing or malformed credit/fraud result
    /// is ruled out entirely by the type system (`credit_score: f64` and
    /// `fraud_result: &FraudResult` are never optional or untyped), unlike
    /// the dict-shaped source this was distilled from.
    pub fn make_decision(
        &self,
        credit_score: f64,
        fraud_result: &FraudResult,
        fairness_flags: &[String],
        loan_amount: f64,
    ) -> DecisionResult {
        let Some(fraud_score) = fraud_result.fraud_score else {
            warn!("[DecisionEngine] fraud score unavailable, forcing REVIEW");
            return DecisionResult::new(
                DecisionType::Review,
                vec!["Fraud detection unavailable - requires manual review".to_string()],
                self.policy_version.clone(),
            );
        };

        let ctx = RuleContext {
            credit_score,
            fraud_score,
            fraud_flags: &fraud_result.flags,
            fairness_flags,
            loan_amount,
            policy: &self.policy,
        };

        let rejection_reasons: Vec<String> = REJECTION_RULES.iter().filter_map(|rule| rule(&ctx)).collect();
        if !rejection_reasons.is_empty() {
            info!("[DecisionEngine] REJECTED: {} rule(s) triggered", rejection_reasons.len());
            return DecisionResult::new(DecisionType::Rejected, rejection_reasons, self.policy_version.clone());
        }

        let review_reasons: Vec<String> = REVIEW_RULES.iter().filter_map(|rule| rule(&ctx)).collect();
        if !review_reasons.is_empty() {
            info!("[DecisionEngine] REVIEW: {} rule(s) triggered", review_reasons.len());
            return DecisionResult::new(DecisionType::Review, review_reasons, self.policy_version.clone());
        }

        let approval_reasons: Vec<String> = APPROVAL_RULES.iter().filter_map(|rule| rule(&ctx)).collect();
        if !approval_reasons.is_empty() {
            info!("[DecisionEngine] APPROVED: {} rule(s) triggered", approval_reasons.len());
            return DecisionResult::new(DecisionType::Approved, approval_reasons, self.policy_version.clone());
        }

        warn!("[DecisionEngine] no rule triggered, defaulting to REVIEW");
        DecisionResult::new(
            DecisionType::Review,
            vec!["No definitive policy rule triggered - requires manual review".to_string()],
            self.policy_version.clone(),
        )
    }

    /// Builds and persists the decision's lineage record. Never propagates a
    /// failure: the decision has already been persisted by the time this
    /// runs, so a lineage write failure is logged via audit instead.
    pub async fn save_lineage(
        &self,
        decision_id: Uuid,
        borrower_id: Uuid,
        credit_score: f64,
        fraud_result: &FraudResult,
        fairness_flags: &[String],
        trust_graph_used: bool,
    ) {
        let data_sources = json!({
            "borrower_profile": true,
            "loan_request": true,
            "trust_graph": trust_graph_used,
            "credit_bureau": false,
            "alternative_data": false,
        });

        let models_used = json!({
            "credit_scoring": {
                "model": "rule-based-v1.0",
                "version": "1.0.0",
                "score": credit_score,
            },
            "fraud_detection": {
                "model": "fraud-engine",
                "version": "2.0.0",
                "score": fraud_result.fraud_score,
                "detectors": fraud_result.detector_outputs,
            },
            "trust_graph": {
                "model": "trustgraph-v1.0",
                "version": "1.0.0",
                "used": trust_graph_used,
            },
            "fairness_monitor": {
                "model": "fairness-v1.0",
                "version": "1.0.0",
                "flags": fairness_flags,
            },
        });

        let fraud_checks = json!({
            "fraud_score": fraud_result.fraud_score.unwrap_or(0.0),
            "fraud_flags": fraud_result.flags,
            "fraud_explanation": fraud_result.explanation,
            "aggregation_strategy": fraud_result.aggregation_strategy,
            "detector_count": fraud_result.detector_outputs.len(),
        });

        match self
            .repository
            .save_decision_lineage(
                decision_id,
                borrower_id,
                data_sources,
                models_used,
                &self.policy_version,
                fraud_checks,
            )
            .await
        {
            Ok(_) => info!("[DecisionEngine] lineage saved for decision {decision_id}"),
            Err(e) => {
                error!("[DecisionEngine] failed to save lineage for decision {decision_id}: {e}");
                self.repository
                    .log_audit_event(
                        "lineage_save_failed",
                        "credit_decision",
                        Some(decision_id),
                        json!({ "error": e.to_string() }),
                    )
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AggregationStrategy;
    use async_trait::async_trait;
    use credit_decision_common::Result;
    use credit_decision_database::{AuditOutcome, DecisionWithDemographics};
    use credit_decision_models::{
        AuditLogRow, Borrower, CreditDecisionRow, FeatureVectorRow, LoanRequest, RawEvent,
    };
    use serde_json::Value;

    struct NullRepository;

    #[async_trait]
    impl Repository for NullRepository {
        async fn create_borrower(&self, _: &str, _: &str, _: &str, _: &str) -> Result<Borrower> {
            unimplemented!()
        }
        async fn get_borrower_by_user(&self, _: &str) -> Result<Option<Borrower>> {
            unimplemented!()
        }
        async fn create_loan_request(&self, _: Uuid, _: f64, _: &str) -> Result<LoanRequest> {
            unimplemented!()
        }
        async fn save_credit_decision(&self, _: Uuid, _: f64, _: &str, _: &str, _: &str) -> Result<CreditDecisionRow> {
            unimplemented!()
        }
        async fn save_decision_lineage(
            &self,
            decision_id: Uuid,
            borrower_id: Uuid,
            data_sources: Value,
            models_used: Value,
            policy_version: &str,
            fraud_checks: Value,
        ) -> Result<credit_decision_models::DecisionLineageRow> {
            Ok(credit_decision_models::DecisionLineageRow {
                id: Uuid::new_v4(),
                decision_id,
                borrower_id,
                data_sources,
                models_used,
                policy_version: policy_version.to_string(),
                fraud_checks,
                created_at: chrono::Utc::now(),
            })
        }
        async fn save_model_features(&self, _: Uuid, _: &str, _: &str, _: Value, _: i32) -> Result<FeatureVectorRow> {
            unimplemented!()
        }
        async fn get_latest_features(&self, _: Uuid, _: &str) -> Result<Option<FeatureVectorRow>> {
            unimplemented!()
        }
        async fn log_audit_event(&self, _: &str, _: &str, _: Option<Uuid>, _: Value) -> AuditOutcome {
            AuditOutcome::Failed { error: "null repository".to_string() }
        }
        async fn get_raw_events(&self, _: Uuid, _: i64) -> Result<Vec<RawEvent>> {
            unimplemented!()
        }
        async fn get_unprocessed_events(&self, _: Uuid, _: i64) -> Result<Vec<RawEvent>> {
            unimplemented!()
        }
        async fn mark_event_processed(&self, _: Uuid, _: Option<&str>) -> Result<()> {
            unimplemented!()
        }
        async fn mark_event_failed(&self, _: Uuid, _: &str) -> Result<()> {
            unimplemented!()
        }
        async fn get_recent_decisions_with_demographics(&self, _: i64) -> Result<Vec<DecisionWithDemographics>> {
            unimplemented!()
        }
    }

    fn engine() -> DecisionEngine {
        DecisionEngine::new(CreditPolicy::default(), "1.0.0", Arc::new(NullRepository))
    }

    fn clean_fraud_result() -> FraudResult {
        FraudResult {
            fraud_score: Some(0.1),
            flags: vec![],
            explanation: vec![],
            is_fraud: false,
            risk_level: "low".to_string(),
            confidence: 1.0,
            detector_outputs: vec![],
            aggregation_strategy: AggregationStrategy::Max,
        }
    }

    #[test]
    fn missing_fraud_score_forces_review() {
        let result = engine().make_decision(90.0, &FraudResult::unavailable(), &[], 1000.0);
        assert_eq!(result.decision, DecisionType::Review);
        assert_eq!(result.reasons.len(), 1);
    }

    #[test]
    fn high_score_clean_fraud_approves() {
        let result = engine().make_decision(85.0, &clean_fraud_result(), &[], 1000.0);
        assert_eq!(result.decision, DecisionType::Approved);
    }

    #[test]
    fn critical_fraud_rejects_even_with_high_credit_score() {
        let mut fraud = clean_fraud_result();
        fraud.fraud_score = Some(0.9);
        let result = engine().make_decision(95.0, &fraud, &[], 1000.0);
        assert_eq!(result.decision, DecisionType::Rejected);
    }

    #[test]
    fn excessive_loan_amount_rejects_regardless_of_score() {
        let result = engine().make_decision(95.0, &clean_fraud_result(), &[], 600_000.0);
        assert_eq!(result.decision, DecisionType::Rejected);
    }

    #[test]
    fn reasons_are_never_empty() {
        for result in [
            engine().make_decision(90.0, &clean_fraud_result(), &[], 1000.0),
            engine().make_decision(40.0, &clean_fraud_result(), &[], 1000.0),
            engine().make_decision(60.0, &clean_fraud_result(), &[], 1000.0),
        ] {
            assert!(!result.reasons.is_empty());
        }
    }

    #[tokio::test]
    async fn save_lineage_does_not_panic_on_success() {
        engine()
            .save_lineage(Uuid::new_v4(), Uuid::new_v4(), 85.0, &clean_fraud_result(), &[], false)
            .await;
    }
}
