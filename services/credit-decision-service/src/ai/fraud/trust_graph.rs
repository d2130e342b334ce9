use credit_decision_common::Result;

use super::Detector;
use crate::domain::{DetectorOutcome, FraudInput, FEATURE_SET_CORE_BEHAVIORAL, FEATURE_VERSION_V1};

/// Adapts the ensemble's trust-graph model output into a fraud signal. No
/// required behavioral feature keys: it reads `trust_graph_data` from the
/// shared context the ensemble assembles from model outputs.
pub struct TrustGraphFraudDetector;

impl TrustGraphFraudDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TrustGraphFraudDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for TrustGraphFraudDetector {
    fn name(&self) -> &'static str {
        "TrustGraphFraudDetector"
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

    fn evaluate(&self, input: &FraudInput) -> Result<DetectorOutcome> {
        let Some(data) = &input.trust_graph_data else {
            return Ok(DetectorOutcome {
                fraud_score: 0.3,
                flags: vec!["no_trust_graph_data".to_string()],
                explanation: vec!["No trust graph data available".to_string()],
            });
        };

        let mut fraud_score = 1.0 - data.trust_score;
        let mut flags = Vec::new();
        let mut explanation = Vec::new();

        if data.flag_risk {
            flags.push("fraud_ring_detected".to_string());
            explanation.push("Trust model flagged a fraud ring".to_string());
        }

        // Mutually exclusive per source: network isolation is checked first
        // and the peer default-rate threshold is never evaluated once it
        // fires, even if default_rate also happens to exceed 0.3.
        if data.network_size == 0 {
            fraud_score = fraud_score.max(0.3);
            flags.push("network_isolation".to_string());
            explanation.push("Borrower has no peer network".to_string());
        } else if data.default_rate > 0.3 {
            flags.push("high_peer_default_rate".to_string());
            explanation.push(format!("Peer default rate {:.2} exceeds threshold", data.default_rate));
        }

        if data.trust_score < 0.3 {
            flags.push("very_low_trust_score".to_string());
            explanation.push(format!("Very low trust score ({:.2})", data.trust_score));
        } else if data.trust_score < 0.5 {
            flags.push("low_trust_score".to_string());
            explanation.push(format!("Low trust score ({:.2})", data.trust_score));
        }

        Ok(DetectorOutcome {
            fraud_score: fraud_score.clamp(0.0, 1.0),
            flags,
            explanation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeatureVector, TrustGraphData};
    use chrono::Utc;

    fn base_features() -> FeatureVector {
        FeatureVector {
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
        }
    }

    #[test]
    fn no_trust_graph_data_defaults_to_0_3() {
        let detector = TrustGraphFraudDetector::new();
        let input = FraudInput {
            features: base_features(),
            feature_set: FEATURE_SET_CORE_BEHAVIORAL.into(),
            feature_version: FEATURE_VERSION_V1.into(),
            trust_graph_data: None,
        };
        let outcome = detector.evaluate(&input).unwrap();
        assert_eq!(outcome.fraud_score, 0.3);
        assert_eq!(outcome.flags, vec!["no_trust_graph_data".to_string()]);
    }

    #[test]
    fn network_isolation_takes_priority_over_default_rate() {
        let detector = TrustGraphFraudDetector::new();
        let input = FraudInput {
            features: base_features(),
            feature_set: FEATURE_SET_CORE_BEHAVIORAL.into(),
            feature_version: FEATURE_VERSION_V1.into(),
            trust_graph_data: Some(TrustGraphData {
                trust_score: 0.6,
                flag_risk: false,
                default_rate: 0.9,
                network_size: 0,
                defaulted_count: 0,
            }),
        };
        let outcome = detector.evaluate(&input).unwrap();
        assert!(outcome.flags.contains(&"network_isolation".to_string()));
        assert!(!outcome.flags.contains(&"high_peer_default_rate".to_string()));
    }
}
