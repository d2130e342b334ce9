use serde::Serialize;

use credit_decision_models::DecisionType;

/// The final output of the Decision Engine. `reasons` is never empty — every
/// code path that produces a `DecisionResult` is required to push at least
/// one reason before returning.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionResult {
    pub decision: DecisionType,
    pub reasons: Vec<String>,
    pub policy_version: String,
}

impl DecisionResult {
    pub fn new(decision: DecisionType, reasons: Vec<String>, policy_version: impl Into<String>) -> Self {
        debug_assert!(!reasons.is_empty(), "DecisionResult must carry at least one reason");
        Self {
            decision,
            reasons,
            policy_version: policy_version.into(),
        }
    }
}
