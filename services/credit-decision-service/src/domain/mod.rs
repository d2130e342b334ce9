pub mod decision;
pub mod ensemble_output;
pub mod feature_vector;
pub mod fraud;
pub mod model_output;

pub use decision::DecisionResult;
pub use ensemble_output::{EnsembleExplanation, EnsembleMetadata, UnifiedEnsembleOutput};
pub use feature_vector::{FeatureVector, FEATURE_SET_CORE_BEHAVIORAL, FEATURE_VERSION_V1};
pub use fraud::{AggregationStrategy, DetectorOutcome, DetectorRunResult, FraudInput, FraudResult, TrustGraphData};
pub use model_output::{
    CreditModelOutput, EnsembleInput, Factor, FraudRulesOutput, ModelExplanation, ModelOutcome,
    ModelOutputs, ModelResult, Peer, PastApplication, TrustModelOutput,
};
