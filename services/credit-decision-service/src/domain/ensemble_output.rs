use std::collections::HashMap;

use serde::Serialize;

use super::fraud::FraudResult;
use super::model_output::{Factor, ModelExplanation, ModelOutputs};
use credit_decision_models::DecisionType;

#[derive(Debug, Clone, Serialize)]
pub struct EnsembleExplanation {
    pub per_model: HashMap<String, ModelExplanation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnsembleMetadata {
    pub version: String,
    pub models_used: Vec<String>,
    pub weights: HashMap<String, f64>,
}

/// The ensemble's final, fully-shaped output for one request. `decision`/
/// `risk_level` here are the ensemble's own heuristic read on its score —
/// an AI signal, not the persisted decision, which only the Decision Engine
/// produces after applying policy rules.
#[derive(Debug, Clone, Serialize)]
pub struct UnifiedEnsembleOutput {
    pub final_credit_score: f64,
    pub fraud_flag: bool,
    pub decision: DecisionType,
    pub risk_level: String,
    pub model_outputs: ModelOutputs,
    pub explanation: EnsembleExplanation,
    pub structured_explanation: Vec<Factor>,
    pub fraud_result: FraudResult,
    pub ensemble_metadata: EnsembleMetadata,
    pub override_reason: Option<String>,
    pub override_source: Option<String>,
}
