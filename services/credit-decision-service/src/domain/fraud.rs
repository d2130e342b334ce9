use serde::Serialize;

use super::feature_vector::FeatureVector;

/// Signals the ensemble gathers from any trust-graph model output and hands
/// to `TrustGraphFraudDetector`. Absent when no trust model ran.
#[derive(Debug, Clone)]
pub struct TrustGraphData {
    pub trust_score: f64,
    pub flag_risk: bool,
    pub default_rate: f64,
    pub network_size: u32,
    pub defaulted_count: u32,
}

/// The payload passed to every registered `Detector`. Mirrors
/// `EnsembleInput` but detectors only ever need the feature set plus the
/// optional trust-graph context the ensemble assembled from model outputs.
#[derive(Debug, Clone)]
pub struct FraudInput {
    pub features: FeatureVector,
    pub feature_set: String,
    pub feature_version: String,
    pub trust_graph_data: Option<TrustGraphData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectorOutcome {
    pub fraud_score: f64,
    pub flags: Vec<String>,
    pub explanation: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectorRunResult {
    pub name: String,
    pub fraud_score: f64,
    pub flags: Vec<String>,
    pub explanation: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationStrategy {
    Max,
    Avg,
    Weighted,
}

impl Default for AggregationStrategy {
    fn default() -> Self {
        AggregationStrategy::Max
    }
}

/// Output of `FraudEngine::evaluate`, and of the safe-default the ensemble
/// substitutes when the engine fails. `fraud_score: None` is the signal the
/// Decision Engine's safety override watches for.
#[derive(Debug, Clone, Serialize)]
pub struct FraudResult {
    pub fraud_score: Option<f64>,
    pub flags: Vec<String>,
    pub explanation: Vec<String>,
    pub is_fraud: bool,
    pub risk_level: String,
    pub confidence: f64,
    pub detector_outputs: Vec<DetectorRunResult>,
    pub aggregation_strategy: AggregationStrategy,
}

impl FraudResult {
    /// The safe default attached when the fraud engine itself fails to run.
    /// `fraud_score: None` forces the Decision Engine's safety override.
    pub fn unavailable() -> Self {
        Self {
            fraud_score: None,
            flags: vec!["fraud_engine_unavailable".to_string()],
            explanation: vec![
                "Fraud detection engine unavailable - defaulting to REVIEW".to_string(),
            ],
            is_fraud: false,
            risk_level: "unknown".to_string(),
            confidence: 0.0,
            detector_outputs: Vec::new(),
            aggregation_strategy: AggregationStrategy::Max,
        }
    }
}
