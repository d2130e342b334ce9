use std::collections::HashMap;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use tracing::{info, Level};

mod ai;
mod background;
mod config;
mod decision;
mod domain;
mod fairness;
mod features;
mod handlers;
mod middleware;

use ai::fraud::{RuleBasedFraudDetector, TrustGraphFraudDetector};
use ai::models::{FraudRulesModel, Model, RuleBasedCreditModel, TrustGraphModel};
use ai::{Ensemble, FraudEngine};
use background::BackgroundRunner;
use config::Config;
use credit_decision_database::PgRepository;
use decision::{CreditPolicy, DecisionEngine};
use domain::AggregationStrategy;
use features::FeatureEngine;
use handlers::loans::AppState;
use middleware::{IdempotencyCache, RateLimiter};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    dotenv::dotenv().ok();
    let config = Config::from_env().expect("failed to load configuration");

    info!("starting credit-decision-service on {}:{}", config.host, config.port);

    let pool = credit_decision_database::create_pool(&config.database_url, config.database_max_connections)
        .await
        .expect("failed to create database pool");

    let repository: Arc<dyn credit_decision_database::Repository> =
        Arc::new(PgRepository::new(pool.clone()));

    let feature_engine = Arc::new(FeatureEngine::new(repository.clone(), config.feature_lookback_days));

    let models: Vec<Box<dyn Model>> = vec![
        Box::new(RuleBasedCreditModel::new()),
        Box::new(TrustGraphModel::new()),
        Box::new(FraudRulesModel::new()),
    ];
    let aggregation_strategy = match config.fraud_aggregation_strategy.as_str() {
        "avg" => AggregationStrategy::Avg,
        "weighted" => AggregationStrategy::Weighted,
        _ => AggregationStrategy::Max,
    };
    let fraud_engine = FraudEngine::new(
        vec![
            Box::new(RuleBasedFraudDetector::new()),
            Box::new(TrustGraphFraudDetector::new()),
        ],
        aggregation_strategy,
    );
    let weights: HashMap<String, f64> = config.ensemble_weights();
    let ensemble = Arc::new(Ensemble::new(
        models,
        fraud_engine,
        weights,
        config.ensemble_version.clone(),
        config.min_approval_score,
        config.min_review_score,
    ));

    let policy = CreditPolicy::from_config(&config);
    let decision_engine = Arc::new(DecisionEngine::new(
        policy,
        config.policy_version.clone(),
        repository.clone(),
    ));

    let background_runner = Arc::new(BackgroundRunner::new(repository.clone(), feature_engine.clone()));

    let rate_limiter = RateLimiter::new(config.rate_limit_max_requests, config.rate_limit_window_seconds);
    let idempotency_cache =
        IdempotencyCache::new(config.idempotency_max_entries, config.idempotency_ttl_seconds);

    let app_state = web::Data::new(AppState {
        repository,
        feature_engine,
        ensemble,
        decision_engine,
        background_runner,
        rate_limiter,
        idempotency_cache,
    });

    let bind_host = config.host.clone();
    let bind_port = config.port;

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(app_state.clone())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind((bind_host.as_str(), bind_port))?
    .run()
    .await
}
