use credit_decision_common::Result;

use super::Model;
use crate::domain::{
    EnsembleInput, Factor, FraudRulesOutput, ModelExplanation, ModelOutcome,
    FEATURE_SET_CORE_BEHAVIORAL, FEATURE_VERSION_V1,
};

const VELOCITY_WINDOW_MINUTES: i64 = 60;
const MAX_APPLICATIONS_PER_HOUR: usize = 3;
const SUSPICIOUS_AMOUNT_THRESHOLD: f64 = 100_000.0;
const RISK_THRESHOLD: f64 = 0.7;
const SUSPICIOUS_PURPOSE_WORDS: [&str; 4] = ["urgent", "emergency", "immediate", "asap"];

/// Deterministic rule-based fraud signal that rides along as a third
/// ensemble model rather than a registered `Detector`. Its `is_fraud` flag
/// is what lets the ensemble's critical-flag override fire from inside the
/// model loop, independent of the separate Fraud Engine invocation.
pub struct FraudRulesModel;

impl FraudRulesModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FraudRulesModel {
    fn default() -> Self {
        Self::new()
    }
}

fn risk_level_for(fraud_score: f64) -> &'static str {
    if fraud_score >= 0.7 {
        "critical"
    } else if fraud_score >= 0.4 {
        "high"
    } else if fraud_score >= 0.2 {
        "medium"
    } else {
        "low"
    }
}

impl Model for FraudRulesModel {
    fn name(&self) -> &'static str {
        "FraudRulesModel"
    }

    fn required_feature_set(&self) -> &'static str {
        FEATURE_SET_CORE_BEHAVIORAL
    }

    fn required_feature_version(&self) -> &'static str {
        FEATURE_VERSION_V1
    }

    fn required_feature_keys(&self) -> &'static [&'static str] {
        &[]
    }

    fn predict(&self, input: &EnsembleInput) -> Result<ModelOutcome> {
        let mut fraud_score = 0.0_f64;
        let mut flags = Vec::new();

        let window_start = input.loan_request.created_at
            - chrono::Duration::minutes(VELOCITY_WINDOW_MINUTES);
        let recent_count = input
            .recent_applications
            .iter()
            .filter(|a| a.created_at >= window_start)
            .count();
        if recent_count > MAX_APPLICATIONS_PER_HOUR {
            fraud_score += 0.5;
            flags.push("HIGH_VELOCITY".to_string());
        }

        if input.loan_request.requested_amount > SUSPICIOUS_AMOUNT_THRESHOLD {
            fraud_score += 0.3;
            flags.push("LARGE_AMOUNT".to_string());
        }

        let purpose_lower = input.loan_request.purpose.to_lowercase();
        if SUSPICIOUS_PURPOSE_WORDS.iter().any(|w| purpose_lower.contains(w)) {
            fraud_score += 0.2;
            flags.push("SUSPICIOUS_PURPOSE".to_string());
        }
        if input.ip_address.as_deref().is_some_and(|ip| ip.starts_with("10.")) {
            fraud_score += 0.1;
            flags.push("SUSPICIOUS_IP".to_string());
        }

        let fraud_score = fraud_score.clamp(0.0, 1.0);
        let is_fraud = fraud_score >= RISK_THRESHOLD;

        Ok(ModelOutcome::FraudRules(FraudRulesOutput {
            score: (1.0 - fraud_score) * 100.0,
            fraud_score,
            is_fraud,
            risk_level: risk_level_for(fraud_score).to_string(),
            flags,
        }))
    }

    fn explain(&self, _input: &EnsembleInput, outcome: &ModelOutcome) -> ModelExplanation {
        let ModelOutcome::FraudRules(f) = outcome else {
            return ModelExplanation {
                summary: "unexpected outcome shape".to_string(),
                factors: Vec::new(),
                features_used: Vec::new(),
            };
        };

        let factors = f
            .flags
            .iter()
            .map(|flag| Factor {
                factor: flag.clone(),
                impact: -(f.fraud_score * 100.0),
                explanation: format!("Fraud rule triggered: {flag}"),
            })
            .collect();

        ModelExplanation {
            summary: format!("Fraud score {:.2} ({})", f.fraud_score, f.risk_level),
            factors,
            features_used: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EnsembleInput, FeatureVector, PastApplication, Peer};
    use chrono::Utc;
    use credit_decision_models::{Borrower, LoanRequest};
    use uuid::Uuid;

    fn input_with(requested_amount: f64, purpose: &str, ip: Option<&str>) -> EnsembleInput {
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
                purpose: purpose.into(),
                status: "pending".into(),
                created_at: Utc::now(),
            },
            features: FeatureVector {
                feature_set: FEATURE_SET_CORE_BEHAVIORAL.into(),
                feature_version: FEATURE_VERSION_V1.into(),
                mobile_activity_score: 50.0,
                transaction_volume_30d: 0.0,
                activity_consistency: 50.0,
                event_count: 1,
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
            ip_address: ip.map(|s| s.to_string()),
        }
    }

    #[test]
    fn large_amount_and_suspicious_purpose_accumulate() {
        let model = FraudRulesModel::new();
        let input = input_with(150_000.0, "urgent cash needed", Some("10.0.0.5"));
        let outcome = model.predict(&input).unwrap();
        match outcome {
            ModelOutcome::FraudRules(f) => {
                assert!((f.fraud_score - 0.6).abs() < 1e-9);
                assert!(!f.is_fraud);
                assert_eq!(f.risk_level, "high");
                assert_eq!(f.flags.len(), 3);
            }
            _ => panic!("expected fraud rules outcome"),
        }
    }

    #[test]
    fn high_velocity_triggers_is_fraud_with_other_signals() {
        let model = FraudRulesModel::new();
        let mut input = input_with(150_000.0, "urgent", None);
        let now = input.loan_request.created_at;
        input.recent_applications = vec![
            PastApplication { created_at: now },
            PastApplication { created_at: now },
            PastApplication { created_at: now },
            PastApplication { created_at: now },
        ];
        let outcome = model.predict(&input).unwrap();
        match outcome {
            ModelOutcome::FraudRules(f) => assert!(f.is_fraud),
            _ => panic!("expected fraud rules outcome"),
        }
    }
}
