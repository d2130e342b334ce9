use std::collections::HashMap;

use credit_decision_common::{AppError, Result};
use credit_decision_models::DecisionType;
use tracing::{error, warn};

use crate::ai::explain::StructuredExplainer;
use crate::ai::fraud_engine::FraudEngine;
use crate::ai::models::Model;
use crate::domain::{
    EnsembleInput, EnsembleExplanation, EnsembleMetadata, FraudInput, FraudResult, ModelOutputs,
    ModelResult, TrustGraphData, UnifiedEnsembleOutput,
};

pub struct Ensemble {
    models: Vec<Box<dyn Model>>,
    fraud_engine: FraudEngine,
    explainer: StructuredExplainer,
    weights: HashMap<String, f64>,
    version: String,
    min_approval_score: f64,
    min_review_score: f64,
}

impl Ensemble {
    pub fn new(
        models: Vec<Box<dyn Model>>,
        fraud_engine: FraudEngine,
        weights: HashMap<String, f64>,
        version: impl Into<String>,
        min_approval_score: f64,
        min_review_score: f64,
    ) -> Self {
        Self {
            models,
            fraud_engine,
            explainer: StructuredExplainer::new(),
            weights,
            version: version.into(),
            min_approval_score,
            min_review_score,
        }
    }

    pub fn predict(&self, input: &EnsembleInput) -> Result<UnifiedEnsembleOutput> {
        // Step 1: feature validation gate. The engineered feature vector is
        // structurally mandatory on `EnsembleInput` (not an `Option`), so the
        // "missing engineered_features" case from the source is enforced by
        // the type system rather than a runtime presence check; only
        // set/version/key mismatches remain runtime checks, below.
        if input.feature_set.is_empty() {
            return Err(AppError::FeatureValidation(
                "engineered features are required; call the feature-computing entry point first"
                    .to_string(),
            ));
        }

        // Step 3/4: validate + run every model.
        let mut model_outputs: ModelOutputs = HashMap::new();
        let mut failed_models = Vec::new();
        let mut succeeded: Vec<(&dyn Model, crate::domain::ModelOutcome)> = Vec::new();

        for model in &self.models {
            model.validate_features(input)?;

            match model.predict(input) {
                Ok(outcome) => succeeded.push((model.as_ref(), outcome)),
                Err(e) => {
                    warn!("[Ensemble] model {} failed: {e}", model.name());
                    failed_models.push(model.name().to_string());
                    model_outputs.insert(
                        model.name().to_string(),
                        ModelResult::Failed { error: e.to_string() },
                    );
                }
            }
        }

        let any_credit_model_succeeded = succeeded
            .iter()
            .any(|(model, _)| model.name().to_lowercase().contains("credit"));
        if !any_credit_model_succeeded {
            return Err(AppError::CriticalModelFailure(failed_models));
        }

        // Fill in explanations for succeeded models and populate model_outputs.
        let mut per_model_explanations = Vec::new();
        for (model, outcome) in &succeeded {
            let explanation = model.explain(input, outcome);
            model_outputs.insert(
                model.name().to_string(),
                ModelResult::Success {
                    outcome: outcome.clone(),
                    explanation: explanation.clone(),
                },
            );
            per_model_explanations.push((model.name().to_string(), explanation));
        }

        // Step 5: critical-flag override, highest priority.
        if let Some((model, outcome)) = succeeded.iter().find(|(_, o)| o.is_fraud_signal()) {
            let reason = match outcome {
                crate::domain::ModelOutcome::Trust(_) => "fraud ring detected",
                crate::domain::ModelOutcome::FraudRules(_) => "fraud rules threshold exceeded",
                crate::domain::ModelOutcome::Credit(_) => "unexpected credit-model fraud signal",
            };
            return Ok(UnifiedEnsembleOutput {
                final_credit_score: 0.0,
                fraud_flag: true,
                decision: DecisionType::Rejected,
                risk_level: "critical".to_string(),
                model_outputs,
                explanation: EnsembleExplanation { per_model: HashMap::new() },
                structured_explanation: Vec::new(),
                fraud_result: FraudResult::unavailable(),
                ensemble_metadata: self.metadata(&succeeded),
                override_reason: Some(reason.to_string()),
                override_source: Some(model.name().to_string()),
            });
        }

        // Step 6: weighted score aggregation over succeeded models.
        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        for (model, outcome) in &succeeded {
            let weight = *self.weights.get(weight_key_for(model.name())).unwrap_or(&0.0);
            weighted_sum += outcome.normalized_score() * weight;
            total_weight += weight;
        }
        let final_credit_score = if total_weight == 0.0 {
            50.0
        } else {
            ((weighted_sum / total_weight) * 100.0).round() / 100.0
        }
        .clamp(0.0, 100.0);

        // Step 7: secondary fraud signal, prior to the Fraud Engine running.
        let mut fraud_flag = succeeded.iter().any(|(_, o)| o.is_fraud_signal());

        // Step 8: invoke the Fraud Engine over the same feature payload.
        let trust_graph_data = build_trust_graph_data(input, &succeeded);
        let fraud_input = FraudInput {
            features: input.features.clone(),
            feature_set: input.feature_set.clone(),
            feature_version: input.feature_version.clone(),
            trust_graph_data,
        };
        let fraud_result = match self.fraud_engine.evaluate(&fraud_input) {
            Ok(result) => {
                if result.is_fraud {
                    fraud_flag = true;
                }
                result
            }
            Err(e) => {
                error!("[Ensemble] fraud engine unavailable: {e}");
                FraudResult::unavailable()
            }
        };

        // Step 9: structured explanation (non-fatal on failure).
        let structured_explanation = self.explainer.explain_ensemble(&per_model_explanations);

        // Step 10: decision shaping.
        let (decision, risk_level) = if fraud_flag {
            (DecisionType::Rejected, "critical".to_string())
        } else if final_credit_score >= self.min_approval_score {
            (DecisionType::Approved, "low".to_string())
        } else if final_credit_score >= self.min_review_score {
            (DecisionType::Review, "medium".to_string())
        } else {
            (DecisionType::Rejected, "high".to_string())
        };

        Ok(UnifiedEnsembleOutput {
            final_credit_score,
            fraud_flag,
            decision,
            risk_level,
            model_outputs,
            explanation: EnsembleExplanation {
                per_model: per_model_explanations.into_iter().collect(),
            },
            structured_explanation,
            fraud_result,
            ensemble_metadata: self.metadata(&succeeded),
            override_reason: None,
            override_source: None,
        })
    }

    fn metadata(&self, succeeded: &[(&dyn Model, crate::domain::ModelOutcome)]) -> EnsembleMetadata {
        EnsembleMetadata {
            version: self.version.clone(),
            models_used: succeeded.iter().map(|(m, _)| m.name().to_string()).collect(),
            weights: self.weights.clone(),
        }
    }
}

fn weight_key_for(model_name: &str) -> &'static str {
    let lower = model_name.to_lowercase();
    if lower.contains("credit") {
        "credit"
    } else if lower.contains("trust") {
        "trust"
    } else {
        "fraud"
    }
}

fn build_trust_graph_data(
    input: &EnsembleInput,
    succeeded: &[(&dyn Model, crate::domain::ModelOutcome)],
) -> Option<TrustGraphData> {
    let (_model, trust_outcome) = succeeded
        .iter()
        .find(|(model, _)| model.name().to_lowercase().contains("trust"))?;
    let crate::domain::ModelOutcome::Trust(trust) = trust_outcome else {
        return None;
    };

    let network_size = input.peers.len() as u32;
    let defaulted_count = input.peers.iter().filter(|p| p.defaulted).count() as u32;
    let default_rate = if network_size == 0 {
        0.0
    } else {
        defaulted_count as f64 / network_size as f64
    };

    Some(TrustGraphData {
        trust_score: trust.trust_score,
        flag_risk: trust.flag_risk,
        default_rate,
        network_size,
        defaulted_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::fraud::{RuleBasedFraudDetector, TrustGraphFraudDetector};
    use crate::ai::models::{FraudRulesModel, RuleBasedCreditModel, TrustGraphModel};
    use crate::domain::{
        AggregationStrategy, FeatureVector, Peer, FEATURE_SET_CORE_BEHAVIORAL, FEATURE_VERSION_V1,
    };
    use chrono::Utc;
    use credit_decision_models::{Borrower, LoanRequest};
    use uuid::Uuid;

    fn ensemble() -> Ensemble {
        let models: Vec<Box<dyn Model>> = vec![
            Box::new(RuleBasedCreditModel::new()),
            Box::new(TrustGraphModel::new()),
            Box::new(FraudRulesModel::new()),
        ];
        let fraud_engine = FraudEngine::new(
            vec![
                Box::new(RuleBasedFraudDetector::new()),
                Box::new(TrustGraphFraudDetector::new()),
            ],
            AggregationStrategy::Max,
        );
        let mut weights = HashMap::new();
        weights.insert("credit".to_string(), 0.6);
        weights.insert("trust".to_string(), 0.3);
        weights.insert("fraud".to_string(), 0.1);
        Ensemble::new(models, fraud_engine, weights, "v1", 70.0, 50.0)
    }

    fn input_with(mobile: f64, volume: f64, consistency: f64, requested_amount: f64) -> EnsembleInput {
        EnsembleInput {
            borrower: Borrower {
                id: Uuid::new_v4(),
                user_id: "u1".into(),
                full_name: "Jane Doe".into(),
                gender: "f".into(),
                region: "us".into(),
                created_at: Utc::now(),
            },
            loan_request: LoanRequest {
                id: Uuid::new_v4(),
                borrower_id: Uuid::new_v4(),
                requested_amount,
                purpose: "personal".into(),
                status: "pending".into(),
                created_at: Utc::now(),
            },
            features: FeatureVector {
                feature_set: FEATURE_SET_CORE_BEHAVIORAL.into(),
                feature_version: FEATURE_VERSION_V1.into(),
                mobile_activity_score: mobile,
                transaction_volume_30d: volume,
                activity_consistency: consistency,
                event_count: 10,
                lookback_days: 30,
                has_phone: true,
                data_quality_warnings: vec![],
                data_quality_score: 1.0,
                computed_at: Utc::now(),
            },
            feature_set: FEATURE_SET_CORE_BEHAVIORAL.into(),
            feature_version: FEATURE_VERSION_V1.into(),
            peers: Vec::<Peer>::new(),
            recent_applications: Vec::new(),
            ip_address: None,
        }
    }

    #[test]
    fn clean_applicant_is_approved_with_no_override() {
        let result = ensemble().predict(&input_with(85.0, 12000.0, 80.0, 15000.0)).unwrap();
        assert!(!result.fraud_flag);
        assert!(result.override_reason.is_none());
        assert_eq!(result.decision, DecisionType::Approved);
        assert!(result.final_credit_score > 0.0);
    }

    #[test]
    fn majority_defaulted_peers_triggers_critical_override() {
        let mut input = input_with(85.0, 12000.0, 80.0, 15000.0);
        input.peers = vec![
            Peer { interaction_count: 5, defaulted: true },
            Peer { interaction_count: 5, defaulted: true },
            Peer { interaction_count: 5, defaulted: false },
        ];
        let result = ensemble().predict(&input).unwrap();
        assert!(result.fraud_flag);
        assert_eq!(result.decision, DecisionType::Rejected);
        assert_eq!(result.risk_level, "critical");
        assert!(result.override_source.is_some());
        assert_eq!(result.final_credit_score, 0.0);
    }

    #[test]
    fn missing_feature_set_is_rejected_before_any_model_runs() {
        let mut input = input_with(85.0, 12000.0, 80.0, 15000.0);
        input.feature_set = String::new();
        let err = ensemble().predict(&input).unwrap_err();
        matches!(err, AppError::FeatureValidation(_));
    }
}
