use credit_decision_common::Result;

use super::Model;
use crate::domain::{
    CreditModelOutput, EnsembleInput, Factor, ModelExplanation, ModelOutcome,
    FEATURE_SET_CORE_BEHAVIORAL, FEATURE_VERSION_V1,
};

const REQUIRED_KEYS: [&str; 3] = [
    "mobile_activity_score",
    "transaction_volume_30d",
    "activity_consistency",
];

/// Baseline rule-based credit scorer. Starts at 50 and applies additive
/// factors for mobile activity, transaction volume, activity consistency,
/// and an optional adjustment for the requested loan amount.
pub struct RuleBasedCreditModel;

impl RuleBasedCreditModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RuleBasedCreditModel {
    fn default() -> Self {
        Self::new()
    }
}

fn mobile_factor(mobile_activity_score: f64) -> f64 {
    if mobile_activity_score >= 75.0 {
        15.0
    } else if mobile_activity_score >= 50.0 {
        10.0
    } else if mobile_activity_score >= 25.0 {
        5.0
    } else {
        0.0
    }
}

fn volume_factor(transaction_volume_30d: f64) -> f64 {
    if transaction_volume_30d >= 10_000.0 {
        15.0
    } else if transaction_volume_30d >= 5_000.0 {
        10.0
    } else if transaction_volume_30d >= 1_000.0 {
        5.0
    } else {
        0.0
    }
}

fn consistency_factor(activity_consistency: f64) -> f64 {
    if activity_consistency >= 75.0 {
        10.0
    } else if activity_consistency >= 50.0 {
        5.0
    } else if activity_consistency >= 25.0 {
        0.0
    } else {
        -5.0
    }
}

fn loan_amount_factor(requested_amount: f64) -> f64 {
    if requested_amount < 10_000.0 {
        5.0
    } else if requested_amount < 25_000.0 {
        0.0
    } else if requested_amount < 50_000.0 {
        -5.0
    } else {
        -10.0
    }
}

fn risk_level_for(score: f64) -> &'static str {
    if score >= 70.0 {
        "low"
    } else if score >= 50.0 {
        "medium"
    } else {
        "high"
    }
}

impl Model for RuleBasedCreditModel {
    fn name(&self) -> &'static str {
        "RuleBasedCreditModel"
    }

    fn required_feature_set(&self) -> &'static str {
        FEATURE_SET_CORE_BEHAVIORAL
    }

    fn required_feature_version(&self) -> &'static str {
        FEATURE_VERSION_V1
    }

    fn required_feature_keys(&self) -> &'static [&'static str] {
        &REQUIRED_KEYS
    }

    fn predict(&self, input: &EnsembleInput) -> Result<ModelOutcome> {
        let f = &input.features;
        let mut score = 50.0;
        score += mobile_factor(f.mobile_activity_score);
        score += volume_factor(f.transaction_volume_30d);
        score += consistency_factor(f.activity_consistency);
        score += loan_amount_factor(input.loan_request.requested_amount);
        let score = score.clamp(0.0, 100.0);

        Ok(ModelOutcome::Credit(CreditModelOutput {
            score,
            risk_level: risk_level_for(score).to_string(),
        }))
    }

    fn explain(&self, input: &EnsembleInput, outcome: &ModelOutcome) -> ModelExplanation {
        let ModelOutcome::Credit(c) = outcome else {
            return ModelExplanation {
                summary: "unexpected outcome shape".to_string(),
                factors: Vec::new(),
                features_used: REQUIRED_KEYS.iter().map(|s| s.to_string()).collect(),
            };
        };
        let f = &input.features;

        let factors = vec![
            Factor {
                factor: "mobile_activity".to_string(),
                impact: mobile_factor(f.mobile_activity_score),
                explanation: format!("Mobile activity score {:.1}", f.mobile_activity_score),
            },
            Factor {
                factor: "transaction_volume".to_string(),
                impact: volume_factor(f.transaction_volume_30d),
                explanation: format!("30-day transaction volume {:.2}", f.transaction_volume_30d),
            },
            Factor {
                factor: "activity_consistency".to_string(),
                impact: consistency_factor(f.activity_consistency),
                explanation: format!("Activity consistency {:.1}", f.activity_consistency),
            },
            Factor {
                factor: "loan_amount".to_string(),
                impact: loan_amount_factor(input.loan_request.requested_amount),
                explanation: format!("Requested amount {:.2}", input.loan_request.requested_amount),
            },
        ];

        ModelExplanation {
            summary: format!("Credit score {:.1} ({})", c.score, c.risk_level),
            factors,
            features_used: REQUIRED_KEYS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EnsembleInput, FeatureVector, Peer};
    use chrono::Utc;
    use credit_decision_models::{Borrower, LoanRequest};
    use uuid::Uuid;

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
    fn clean_approval_scenario_scores_90() {
        let model = RuleBasedCreditModel::new();
        let input = input_with(85.0, 12000.0, 80.0, 15000.0);
        let outcome = model.predict(&input).unwrap();
        match outcome {
            ModelOutcome::Credit(c) => assert_eq!(c.score, 90.0),
            _ => panic!("expected credit outcome"),
        }
    }

    #[test]
    fn score_is_always_in_bounds() {
        let model = RuleBasedCreditModel::new();
        let input = input_with(0.0, 0.0, 0.0, 1_000_000.0);
        let outcome = model.predict(&input).unwrap();
        let score = outcome.normalized_score();
        assert!((0.0..=100.0).contains(&score));
    }
}
