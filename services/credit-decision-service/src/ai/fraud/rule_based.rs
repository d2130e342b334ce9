use credit_decision_common::Result;

use super::Detector;
use crate::domain::{DetectorOutcome, FraudInput, FEATURE_SET_CORE_BEHAVIORAL, FEATURE_VERSION_V1};

const REQUIRED_KEYS: [&str; 2] = ["transaction_volume_30d", "activity_consistency"];

/// Thresholded rule-based fraud detector over the behavioral feature
/// vector. Each firing rule adds one human-readable explanation.
pub struct RuleBasedFraudDetector;

impl RuleBasedFraudDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RuleBasedFraudDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for RuleBasedFraudDetector {
    fn name(&self) -> &'static str {
        "RuleBasedFraudDetector"
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

    fn evaluate(&self, input: &FraudInput) -> Result<DetectorOutcome> {
        let mut fraud_score = 0.0_f64;
        let mut flags = Vec::new();
        let mut explanation = Vec::new();

        let volume = input.features.transaction_volume_30d;
        if volume < 500.0 {
            fraud_score += 0.4;
            flags.push("very_low_transaction_volume".to_string());
            explanation.push(format!("Very low 30-day transaction volume ({volume:.2})"));
        } else if volume < 1000.0 {
            fraud_score += 0.2;
            flags.push("low_transaction_volume".to_string());
            explanation.push(format!("Low 30-day transaction volume ({volume:.2})"));
        }

        let consistency = input.features.activity_consistency;
        if consistency < 15.0 {
            fraud_score += 0.4;
            flags.push("very_low_activity_consistency".to_string());
            explanation.push(format!("Very low activity consistency ({consistency:.1})"));
        } else if consistency < 30.0 {
            fraud_score += 0.2;
            flags.push("low_activity_consistency".to_string());
            explanation.push(format!("Low activity consistency ({consistency:.1})"));
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
    use crate::domain::FeatureVector;
    use chrono::Utc;

    fn input_with(volume: f64, consistency: f64) -> FraudInput {
        FraudInput {
            features: FeatureVector {
                feature_set: FEATURE_SET_CORE_BEHAVIORAL.into(),
                feature_version: FEATURE_VERSION_V1.into(),
                mobile_activity_score: 50.0,
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
            trust_graph_data: None,
        }
    }

    #[test]
    fn healthy_activity_yields_zero_fraud_score() {
        let detector = RuleBasedFraudDetector::new();
        let outcome = detector.evaluate(&input_with(12000.0, 80.0)).unwrap();
        assert_eq!(outcome.fraud_score, 0.0);
        assert!(outcome.flags.is_empty());
    }

    #[test]
    fn very_low_volume_and_consistency_stack() {
        let detector = RuleBasedFraudDetector::new();
        let outcome = detector.evaluate(&input_with(100.0, 5.0)).unwrap();
        assert!((outcome.fraud_score - 0.8).abs() < 1e-9);
        assert_eq!(outcome.flags.len(), 2);
    }
}
