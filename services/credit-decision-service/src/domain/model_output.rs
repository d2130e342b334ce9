use std::collections::HashMap;

use serde::Serialize;

use super::feature_vector::FeatureVector;
use credit_decision_models::{Borrower, LoanRequest};

/// A peer relationship as seen by the trust-graph model: one prior
/// counterparty, how many times the borrower transacted with them, and
/// whether that counterparty ultimately defaulted.
#[derive(Debug, Clone, Serialize)]
pub struct Peer {
    pub interaction_count: u32,
    pub defaulted: bool,
}

/// A borrower's own past loan application, used by `FraudRulesModel`'s
/// velocity check. Only the timestamp matters.
#[derive(Debug, Clone)]
pub struct PastApplication {
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// The single immutable payload built once per request and handed to every
/// model, detector, and the fraud engine. Nothing downstream mutates it.
#[derive(Debug, Clone)]
pub struct EnsembleInput {
    pub borrower: Borrower,
    pub loan_request: LoanRequest,
    pub features: FeatureVector,
    pub feature_set: String,
    pub feature_version: String,
    pub peers: Vec<Peer>,
    pub recent_applications: Vec<PastApplication>,
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreditModelOutput {
    pub score: f64,
    pub risk_level: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrustModelOutput {
    pub trust_score: f64,
    pub flag_risk: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FraudRulesOutput {
    pub score: f64,
    pub fraud_score: f64,
    pub is_fraud: bool,
    pub risk_level: String,
    pub flags: Vec<String>,
}

/// Closed set of model output shapes. Each model family returns its own
/// natural shape; `normalized_score`/`is_fraud_signal` implement the generic
/// per-model normalization and override-detection rules the ensemble uses to
/// treat them uniformly without a dynamic dict lookup.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum ModelOutcome {
    Credit(CreditModelOutput),
    Trust(TrustModelOutput),
    FraudRules(FraudRulesOutput),
}

impl ModelOutcome {
    pub fn normalized_score(&self) -> f64 {
        let raw = match self {
            ModelOutcome::Credit(c) => c.score,
            ModelOutcome::Trust(t) => t.trust_score * 100.0,
            ModelOutcome::FraudRules(f) => f.score,
        };
        raw.clamp(0.0, 100.0)
    }

    pub fn is_fraud_signal(&self) -> bool {
        match self {
            ModelOutcome::Credit(_) => false,
            ModelOutcome::Trust(t) => t.flag_risk,
            ModelOutcome::FraudRules(f) => f.is_fraud,
        }
    }

    /// `true` for models that participate in the `successful_credit_models`
    /// check — i.e. their registered name contains "credit".
    pub fn trust_score(&self) -> Option<f64> {
        match self {
            ModelOutcome::Trust(t) => Some(t.trust_score),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Factor {
    pub factor: String,
    pub impact: f64,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelExplanation {
    pub summary: String,
    pub factors: Vec<Factor>,
    pub features_used: Vec<String>,
}

/// A single model's outcome for this request, success or failure. Stored in
/// `UnifiedEnsembleOutput::model_outputs` keyed by the model's own name.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ModelResult {
    Success {
        outcome: ModelOutcome,
        explanation: ModelExplanation,
    },
    Failed {
        error: String,
    },
}

pub type ModelOutputs = HashMap<String, ModelResult>;
