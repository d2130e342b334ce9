use crate::config::Config;

/// Thresholds and limits governing credit decisions. Built once from
/// `Config` at startup and shared by the Decision Engine and its rule
/// registries.
#[derive(Debug, Clone)]
pub struct CreditPolicy {
    pub min_approval_score: f64,
    pub min_review_score: f64,
    pub max_loan_amount: f64,
    pub require_manual_review_above: f64,
    pub critical_fraud_threshold: f64,
    pub elevated_fraud_threshold: f64,
    pub min_credit_score: f64,
}

impl CreditPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_approval_score: config.min_approval_score,
            min_review_score: config.min_review_score,
            max_loan_amount: config.max_loan_amount,
            require_manual_review_above: config.require_manual_review_above,
            critical_fraud_threshold: 0.8,
            elevated_fraud_threshold: 0.5,
            min_credit_score: 50.0,
        }
    }
}

impl Default for CreditPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
