use credit_decision_common::{AppError, Result};

use crate::ai::fraud::Detector;
use crate::domain::{AggregationStrategy, DetectorRunResult, FraudInput, FraudResult};

/// Validates feature compatibility across all registered detectors, runs
/// them, and aggregates their outputs into one combined fraud result.
pub struct FraudEngine {
    detectors: Vec<Box<dyn Detector>>,
    aggregation_strategy: AggregationStrategy,
}

impl FraudEngine {
    pub fn new(detectors: Vec<Box<dyn Detector>>, aggregation_strategy: AggregationStrategy) -> Self {
        Self {
            detectors,
            aggregation_strategy,
        }
    }

    pub fn evaluate(&self, input: &FraudInput) -> Result<FraudResult> {
        if input.feature_set.is_empty() || input.feature_version.is_empty() {
            return Err(AppError::FeatureValidation(
                "Fraud Engine requires engineered feature vectors, not raw data".to_string(),
            ));
        }

        for detector in &self.detectors {
            detector.validate_features(input)?;
        }

        let mut outputs = Vec::with_capacity(self.detectors.len());
        for detector in &self.detectors {
            let outcome = detector.evaluate(input)?;
            outputs.push(DetectorRunResult {
                name: detector.name().to_string(),
                fraud_score: outcome.fraud_score,
                flags: outcome.flags,
                explanation: outcome.explanation,
            });
        }

        let combined_fraud_score = aggregate(&outputs, self.aggregation_strategy);
        let (flags, explanation) = consolidate(&outputs);
        let is_fraud = combined_fraud_score >= 0.6;
        let risk_level = risk_level_for(combined_fraud_score);
        let confidence = if outputs.is_empty() { 0.0 } else { 1.0 };

        Ok(FraudResult {
            fraud_score: Some(combined_fraud_score),
            flags,
            explanation,
            is_fraud,
            risk_level: risk_level.to_string(),
            confidence,
            detector_outputs: outputs,
            aggregation_strategy: self.aggregation_strategy,
        })
    }
}

fn aggregate(outputs: &[DetectorRunResult], strategy: AggregationStrategy) -> f64 {
    if outputs.is_empty() {
        return 0.0;
    }
    match strategy {
        AggregationStrategy::Max => outputs.iter().map(|o| o.fraud_score).fold(0.0, f64::max),
        AggregationStrategy::Avg => {
            outputs.iter().map(|o| o.fraud_score).sum::<f64>() / outputs.len() as f64
        }
        AggregationStrategy::Weighted => {
            // Equal weights in the absence of per-detector confidence.
            outputs.iter().map(|o| o.fraud_score).sum::<f64>() / outputs.len() as f64
        }
    }
}

fn consolidate(outputs: &[DetectorRunResult]) -> (Vec<String>, Vec<String>) {
    let mut flags = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut explanation = Vec::new();

    for output in outputs {
        for flag in &output.flags {
            let prefixed = format!("{}:{}", output.name, flag);
            if seen.insert(prefixed.clone()) {
                flags.push(prefixed);
            }
        }
        for note in &output.explanation {
            explanation.push(format!("[{}] {}", output.name, note));
        }
    }

    (flags, explanation)
}

fn risk_level_for(score: f64) -> &'static str {
    if score >= 0.8 {
        "critical"
    } else if score >= 0.6 {
        "high"
    } else if score >= 0.3 {
        "medium"
    } else {
        "low"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::fraud::{RuleBasedFraudDetector, TrustGraphFraudDetector};
    use crate::domain::{FeatureVector, FEATURE_SET_CORE_BEHAVIORAL, FEATURE_VERSION_V1};
    use chrono::Utc;

    fn engine(strategy: AggregationStrategy) -> FraudEngine {
        FraudEngine::new(
            vec![
                Box::new(RuleBasedFraudDetector::new()),
                Box::new(TrustGraphFraudDetector::new()),
            ],
            strategy,
        )
    }

    fn input() -> FraudInput {
        FraudInput {
            features: FeatureVector {
                feature_set: FEATURE_SET_CORE_BEHAVIORAL.into(),
                feature_version: FEATURE_VERSION_V1.into(),
                mobile_activity_score: 85.0,
                transaction_volume_30d: 12000.0,
                activity_consistency: 80.0,
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
    fn clean_features_with_no_trust_graph_data_uses_max_strategy() {
        let result = engine(AggregationStrategy::Max).evaluate(&input()).unwrap();
        // RuleBasedFraudDetector -> 0.0, TrustGraphFraudDetector -> 0.3 (no data)
        assert_eq!(result.fraud_score, Some(0.3));
    }

    #[test]
    fn determinism_same_input_same_output() {
        let e = engine(AggregationStrategy::Max);
        let a = e.evaluate(&input()).unwrap();
        let b = e.evaluate(&input()).unwrap();
        assert_eq!(a.fraud_score, b.fraud_score);
        assert_eq!(a.flags, b.flags);
    }
}
