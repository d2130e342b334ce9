use credit_decision_common::Result;

use super::Model;
use crate::domain::{
    EnsembleInput, Factor, ModelExplanation, ModelOutcome, TrustModelOutput,
    FEATURE_SET_CORE_BEHAVIORAL, FEATURE_VERSION_V1,
};

const BASE_TRUST: f64 = 0.5;
const FRAUD_RING_THRESHOLD: f64 = 0.5;

/// Proof-of-concept trust-network scorer. Consumes peer relationships from
/// the request context rather than the behavioral feature vector, so it
/// declares no required feature keys.
pub struct TrustGraphModel;

impl TrustGraphModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TrustGraphModel {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for TrustGraphModel {
    fn name(&self) -> &'static str {
        "TrustGraphModel"
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
        if input.peers.is_empty() {
            return Ok(ModelOutcome::Trust(TrustModelOutput {
                trust_score: BASE_TRUST,
                flag_risk: false,
            }));
        }

        let mut trust_score = BASE_TRUST;
        let mut defaulted_peers = 0u32;
        for peer in &input.peers {
            let weight = (1.0 + peer.interaction_count as f64).ln() / 10.0;
            if peer.defaulted {
                trust_score -= weight;
                defaulted_peers += 1;
            } else {
                trust_score += weight;
            }
        }
        let trust_score = (trust_score.clamp(0.0, 1.0) * 1000.0).round() / 1000.0;

        let defaulted_pct = defaulted_peers as f64 / input.peers.len() as f64;
        let flag_risk = defaulted_pct > FRAUD_RING_THRESHOLD;

        Ok(ModelOutcome::Trust(TrustModelOutput {
            trust_score,
            flag_risk,
        }))
    }

    fn explain(&self, input: &EnsembleInput, outcome: &ModelOutcome) -> ModelExplanation {
        let ModelOutcome::Trust(t) = outcome else {
            return ModelExplanation {
                summary: "unexpected outcome shape".to_string(),
                factors: Vec::new(),
                features_used: Vec::new(),
            };
        };

        let summary = if t.flag_risk {
            format!("FRAUD RING DETECTED: trust score {:.3} with fraud indicators", t.trust_score)
        } else {
            format!("Trust score: {:.3}/1.0 based on peer network analysis", t.trust_score)
        };

        let factors = vec![Factor {
            factor: "peer_network".to_string(),
            impact: (t.trust_score - BASE_TRUST) * 100.0,
            explanation: format!("{} peer relationships analyzed", input.peers.len()),
        }];

        ModelExplanation {
            summary,
            factors,
            features_used: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeatureVector, Peer};
    use chrono::Utc;
    use credit_decision_models::{Borrower, LoanRequest};
    use uuid::Uuid;

    fn base_input(peers: Vec<Peer>) -> EnsembleInput {
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
                requested_amount: 1000.0,
                purpose: "personal".into(),
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
            peers,
            recent_applications: Vec::new(),
            ip_address: None,
        }
    }

    #[test]
    fn empty_peer_list_returns_base_trust() {
        let model = TrustGraphModel::new();
        let outcome = model.predict(&base_input(vec![])).unwrap();
        match outcome {
            ModelOutcome::Trust(t) => {
                assert_eq!(t.trust_score, BASE_TRUST);
                assert!(!t.flag_risk);
            }
            _ => panic!("expected trust outcome"),
        }
    }

    #[test]
    fn majority_defaulted_peers_flags_fraud_ring() {
        let model = TrustGraphModel::new();
        let peers = vec![
            Peer { interaction_count: 10, defaulted: true },
            Peer { interaction_count: 10, defaulted: true },
            Peer { interaction_count: 10, defaulted: true },
            Peer { interaction_count: 10, defaulted: true },
            Peer { interaction_count: 10, defaulted: false },
        ];
        let outcome = model.predict(&base_input(peers)).unwrap();
        match outcome {
            ModelOutcome::Trust(t) => assert!(t.flag_risk),
            _ => panic!("expected trust outcome"),
        }
    }
}
