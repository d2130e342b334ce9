use std::collections::HashMap;

use serde::Deserialize;

/// All tunables for the service, loaded once at startup via
/// `envy::prefixed("CREDIT_")` the same way every teacher service loads its
/// own `Config`. Domain defaults mirror the values named in the external
/// interface section; ambient fields (`host`, `port`, `database_url`, ...)
/// mirror the fields every teacher service carries.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub log_level: String,

    pub rate_limit_max_requests: u32,
    pub rate_limit_window_seconds: u64,

    pub idempotency_max_entries: usize,
    pub idempotency_ttl_seconds: i64,

    pub feature_lookback_days: i64,

    pub ensemble_version: String,
    pub credit_weight: f64,
    pub trust_weight: f64,
    pub fraud_weight: f64,

    pub fraud_aggregation_strategy: String,

    pub min_approval_score: f64,
    pub min_review_score: f64,
    pub max_loan_amount: f64,
    pub require_manual_review_above: f64,
    pub max_fraud_score: f64,
    pub critical_risk_threshold: f64,
    pub high_risk_threshold: f64,
    pub medium_risk_threshold: f64,

    pub policy_version: String,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("CREDIT_").from_env::<Self>()
    }

    pub fn ensemble_weights(&self) -> HashMap<String, f64> {
        let mut weights = HashMap::new();
        weights.insert("credit".to_string(), self.credit_weight);
        weights.insert("trust".to_string(), self.trust_weight);
        weights.insert("fraud".to_string(), self.fraud_weight);
        weights
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            database_url: String::new(),
            database_max_connections: 10,
            log_level: "info".to_string(),

            rate_limit_max_requests: 60,
            rate_limit_window_seconds: 60,

            idempotency_max_entries: 10_000,
            idempotency_ttl_seconds: 24 * 60 * 60,

            feature_lookback_days: 30,

            ensemble_version: "1.0.0".to_string(),
            credit_weight: 0.5,
            trust_weight: 0.3,
            fraud_weight: 0.2,

            fraud_aggregation_strategy: "max".to_string(),

            min_approval_score: 70.0,
            min_review_score: 50.0,
            max_loan_amount: 500_000.0,
            require_manual_review_above: 200_000.0,
            max_fraud_score: 0.6,
            critical_risk_threshold: 0.8,
            high_risk_threshold: 0.6,
            medium_risk_threshold: 0.3,

            policy_version: "1.0.0".to_string(),
        }
    }
}
