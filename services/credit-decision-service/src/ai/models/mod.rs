mod fraud_rules;
mod rule_based_credit;
mod trust_graph;

pub use fraud_rules::FraudRulesModel;
pub use rule_based_credit::RuleBasedCreditModel;
pub use trust_graph::TrustGraphModel;

use credit_decision_common::{AppError, Result};

use crate::domain::{EnsembleInput, ModelExplanation, ModelOutcome};

/// A named, versioned scorer with a declared feature contract. Instances are
/// stateless and safe to invoke from any number of request-handling workers
/// concurrently; invocations are CPU-only and never suspend.
pub trait Model: Send + Sync {
    fn name(&self) -> &'static str;
    fn required_feature_set(&self) -> &'static str;
    fn required_feature_version(&self) -> &'static str;
    fn required_feature_keys(&self) -> &'static [&'static str];

    /// Fails with `AppError::FeatureValidation` naming this model and the
    /// specific mismatch: wrong feature set, wrong version, or the missing
    /// keys.
    fn validate_features(&self, input: &EnsembleInput) -> Result<()> {
        if input.feature_set != self.required_feature_set() {
            return Err(AppError::FeatureValidation(format!(
                "{}: expected feature_set '{}', got '{}'",
                self.name(),
                self.required_feature_set(),
                input.feature_set
            )));
        }
        if input.feature_version != self.required_feature_version() {
            return Err(AppError::FeatureValidation(format!(
                "{}: expected feature_version '{}', got '{}'",
                self.name(),
                self.required_feature_version(),
                input.feature_version
            )));
        }
        if let Err(missing) = input.features.required_keys_present(self.required_feature_keys()) {
            return Err(AppError::FeatureValidation(format!(
                "{}: missing required feature keys: {}",
                self.name(),
                missing.join(", ")
            )));
        }
        Ok(())
    }

    fn predict(&self, input: &EnsembleInput) -> Result<ModelOutcome>;
    fn explain(&self, input: &EnsembleInput, outcome: &ModelOutcome) -> ModelExplanation;
}
