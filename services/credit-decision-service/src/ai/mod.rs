pub mod ensemble;
pub mod explain;
pub mod fraud;
pub mod fraud_engine;
pub mod models;

pub use ensemble::Ensemble;
pub use fraud_engine::FraudEngine;
