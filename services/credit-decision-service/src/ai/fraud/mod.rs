mod rule_based;
mod trust_graph;

pub use rule_based::RuleBasedFraudDetector;
pub use trust_graph::TrustGraphFraudDetector;

use credit_decision_common::{AppError, Result};

use crate::domain::{DetectorOutcome, FraudInput};

/// A named, versioned fraud scorer with the same feature-contract
/// discipline as `Model`. Stateless; safe to invoke concurrently.
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;
    fn required_feature_set(&self) -> &'static str;
    fn required_feature_version(&self) -> &'static str;
    fn required_feature_keys(&self) -> &'static [&'static str];

    fn validate_features(&self, input: &FraudInput) -> Result<()> {
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

    fn evaluate(&self, input: &FraudInput) -> Result<DetectorOutcome>;
}
