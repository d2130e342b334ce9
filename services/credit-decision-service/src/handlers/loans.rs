use std::sync::Arc;

use actix_web::{post, web, HttpRequest, HttpResponse, Responder};
use credit_decision_common::{AppError, Result};
use credit_decision_database::Repository;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ai::Ensemble;
use crate::background::BackgroundRunner;
use crate::decision::DecisionEngine;
use crate::domain::{EnsembleInput, Factor, ModelResult, Peer};
use crate::features::FeatureEngine;
use crate::middleware::idempotency::{CachedResponse, IdempotencyCache, Lookup};
use crate::middleware::RateLimiter;

pub struct AppState {
    pub repository: Arc<dyn Repository>,
    pub feature_engine: Arc<FeatureEngine>,
    pub ensemble: Arc<Ensemble>,
    pub decision_engine: Arc<DecisionEngine>,
    pub background_runner: Arc<BackgroundRunner>,
    pub rate_limiter: RateLimiter,
    pub idempotency_cache: IdempotencyCache,
}

#[derive(Debug, Deserialize)]
pub struct LoanRequestBody {
    pub requested_amount: f64,
    pub purpose: String,
}

#[derive(Debug, Serialize)]
struct AiSignals {
    base_credit_score: f64,
    trust_score: f64,
    trust_boost: f64,
    final_credit_score: f64,
    fraud_score: Option<f64>,
    fraud_flags: Vec<String>,
    risk_level: String,
    flag_risk: bool,
}

#[derive(Debug, Serialize)]
struct PolicyDecisionPayload {
    decision: String,
    reasons: Vec<String>,
    policy_version: String,
}

#[derive(Debug, Serialize)]
struct ExplanationPayload {
    combined: String,
    credit_factors: Vec<Factor>,
    trust_analysis: Vec<Factor>,
    fraud_analysis: Vec<String>,
    policy_reasons: Vec<String>,
    peer_network: Vec<Peer>,
}

#[derive(Debug, Serialize)]
struct CreditDecisionPayload {
    id: Uuid,
    ai_signals: AiSignals,
    policy_decision: PolicyDecisionPayload,
    explanation: ExplanationPayload,
    model_version: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
struct LoanResponse {
    loan_request: credit_decision_models::LoanRequest,
    credit_decision: CreditDecisionPayload,
    background_task_queued: bool,
}

fn extract_user_id(req: &HttpRequest) -> Result<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Validation("missing or malformed Authorization header".to_string()))
}

const FAIRNESS_SAMPLE_SIZE: i64 = 20;
const FAIRNESS_MIN_SAMPLE: usize = 3;

#[post("/loans/request")]
pub async fn request_loan(
    state: web::Data<AppState>,
    body: web::Bytes,
    req: HttpRequest,
) -> Result<impl Responder> {
    // Step 1a: rate limiting, keyed by the bearer identity when present.
    let rate_limit_key = extract_user_id(&req).unwrap_or_else(|_| "anonymous".to_string());
    if let Err(retry_after_secs) = state.rate_limiter.check(&rate_limit_key).await {
        return Err(AppError::RateLimited { retry_after_secs });
    }

    // Step 1b: idempotency lookup.
    let idempotency_key = req
        .headers()
        .get("Idempotency-Key")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());
    let body_hash = IdempotencyCache::hash_body(&body);

    if let Some(key) = &idempotency_key {
        match state.idempotency_cache.get(key, &body_hash).await {
            Lookup::Hit(cached) => {
                let mut builder = HttpResponse::build(
                    actix_web::http::StatusCode::from_u16(cached.status_code)
                        .unwrap_or(actix_web::http::StatusCode::OK),
                );
                for (name, value) in &cached.headers {
                    builder.insert_header((name.as_str(), value.as_str()));
                }
                return Ok(builder.body(cached.response_body));
            }
            Lookup::Conflict => return Err(AppError::IdempotencyConflict),
            Lookup::Miss => {}
        }
    }

    // Step 2: input validation.
    let loan_body: LoanRequestBody = serde_json::from_slice(&body).map_err(|e| {
        AppError::Validation(format!("malformed request body: {e}"))
    })?;
    if loan_body.requested_amount <= 0.0 {
        state
            .repository
            .log_audit_event(
                "invalid_loan_request",
                "loan_request",
                None,
                json!({ "reason": "requested_amount must be > 0" }),
            )
            .await;
        return Err(AppError::Validation("requested_amount must be > 0".to_string()));
    }
    if loan_body.purpose.trim().is_empty() {
        state
            .repository
            .log_audit_event(
                "invalid_loan_request",
                "loan_request",
                None,
                json!({ "reason": "purpose must be non-empty" }),
            )
            .await;
        return Err(AppError::Validation("purpose must be non-empty".to_string()));
    }

    // Step 3: resolve borrower.
    let user_id = extract_user_id(&req)?;
    let borrower = state
        .repository
        .get_borrower_by_user(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no borrower profile for user {user_id}")))?;

    // Step 4: create the loan request.
    let loan_request = state
        .repository
        .create_loan_request(borrower.id, loan_body.requested_amount, &loan_body.purpose)
        .await?;

    // Step 5: audit.
    state
        .repository
        .log_audit_event(
            "loan_requested",
            "loan_request",
            Some(loan_request.id),
            json!({
                "borrower_id": borrower.id,
                "user_id": user_id,
                "requested_amount": loan_body.requested_amount,
                "purpose": loan_body.purpose,
            }),
        )
        .await;

    // Step 6: feature computation. `has_phone` is always false here: the
    // persisted Borrower entity carries no phone column (see DESIGN.md).
    let has_phone = false;
    let features = state.feature_engine.compute_features(borrower.id, has_phone).await;

    // Step 7: run the ensemble.
    let ensemble_input = EnsembleInput {
        borrower: borrower.clone(),
        loan_request: loan_request.clone(),
        feature_set: features.feature_set.clone(),
        feature_version: features.feature_version.clone(),
        features,
        peers: Vec::new(),
        recent_applications: Vec::new(),
        ip_address: req.connection_info().realip_remote_addr().map(|s| s.to_string()),
    };
    let ensemble_output = state.ensemble.predict(&ensemble_input)?;

    // Step 8: policy decision.
    let fairness_flags: Vec<String> = Vec::new();
    let decision_result = state.decision_engine.make_decision(
        ensemble_output.final_credit_score,
        &ensemble_output.fraud_result,
        &fairness_flags,
        loan_body.requested_amount,
    );

    // Step 9: persist the decision.
    let decision_str = match decision_result.decision {
        credit_decision_models::DecisionType::Approved => "approved",
        credit_decision_models::DecisionType::Rejected => "rejected",
        credit_decision_models::DecisionType::Review => "review",
    };
    let combined_explanation = build_combined_explanation(&ensemble_output, &decision_result);
    let model_version = format!(
        "ensemble-{}+decision-v{}",
        ensemble_output.ensemble_metadata.version, decision_result.policy_version
    );
    let credit_decision_row = state
        .repository
        .save_credit_decision(
            loan_request.id,
            ensemble_output.final_credit_score,
            decision_str,
            &combined_explanation,
            &model_version,
        )
        .await?;

    // Step 10: lineage, non-blocking.
    let trust_graph_used = ensemble_output
        .model_outputs
        .keys()
        .any(|name| name.to_lowercase().contains("trust"));
    state
        .decision_engine
        .save_lineage(
            credit_decision_row.id,
            borrower.id,
            ensemble_output.final_credit_score,
            &ensemble_output.fraud_result,
            &fairness_flags,
            trust_graph_used,
        )
        .await;

    // Step 11: comprehensive audit event.
    state
        .repository
        .log_audit_event(
            "credit_decision_with_policy_engine",
            "credit_decision",
            Some(credit_decision_row.id),
            json!({
                "loan_request_id": loan_request.id,
                "borrower_id": borrower.id,
                "ai_signals": {
                    "final_credit_score": ensemble_output.final_credit_score,
                    "fraud_score": ensemble_output.fraud_result.fraud_score,
                    "fraud_flags": ensemble_output.fraud_result.flags,
                    "risk_level": ensemble_output.risk_level,
                },
                "policy_decision": {
                    "decision": decision_str,
                    "reasons": decision_result.reasons,
                    "policy_version": decision_result.policy_version,
                },
            }),
        )
        .await;

    // Step 12: best-effort fairness monitoring.
    run_fairness_check(&state, credit_decision_row.id).await;

    // Step 13: enqueue background feature recomputation.
    state
        .background_runner
        .trigger_feature_computation(borrower.id, has_phone);

    // Step 14: shape the response, cache it for idempotency replay.
    let (base_credit_score, risk_level_from_credit) = credit_model_score(&ensemble_output);
    let (trust_score, flag_risk) = trust_model_signals(&ensemble_output);
    let trust_boost = trust_score * 20.0;

    let response_body = LoanResponse {
        loan_request,
        credit_decision: CreditDecisionPayload {
            id: credit_decision_row.id,
            ai_signals: AiSignals {
                base_credit_score,
                trust_score,
                trust_boost,
                final_credit_score: ensemble_output.final_credit_score,
                fraud_score: ensemble_output.fraud_result.fraud_score,
                fraud_flags: ensemble_output.fraud_result.flags.clone(),
                risk_level: risk_level_from_credit.unwrap_or(ensemble_output.risk_level.clone()),
                flag_risk,
            },
            policy_decision: PolicyDecisionPayload {
                decision: decision_str.to_string(),
                reasons: decision_result.reasons.clone(),
                policy_version: decision_result.policy_version.clone(),
            },
            explanation: ExplanationPayload {
                combined: combined_explanation,
                credit_factors: ensemble_output.structured_explanation.clone(),
                trust_analysis: Vec::new(),
                fraud_analysis: ensemble_output.fraud_result.explanation.clone(),
                policy_reasons: decision_result.reasons.clone(),
                peer_network: Vec::new(),
            },
            model_version,
            created_at: credit_decision_row.created_at,
        },
        background_task_queued: true,
    };

    let response_json = serde_json::to_vec(&response_body)
        .map_err(|e| AppError::Internal(format!("response serialization failed: {e}")))?;

    if let Some(key) = idempotency_key {
        state
            .idempotency_cache
            .set(
                key,
                CachedResponse {
                    body_hash,
                    status_code: 200,
                    response_body: response_json.clone(),
                    headers: vec![("content-type".to_string(), "application/json".to_string())],
                    created_at: chrono::Utc::now(),
                },
            )
            .await;
    }

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(response_json))
}

fn credit_model_score(output: &crate::domain::UnifiedEnsembleOutput) -> (f64, Option<String>) {
    for result in output.model_outputs.values() {
        if let ModelResult::Success {
            outcome: crate::domain::ModelOutcome::Credit(credit),
            ..
        } = result
        {
            return (credit.score, Some(credit.risk_level.clone()));
        }
    }
    (0.0, None)
}

fn trust_model_signals(output: &crate::domain::UnifiedEnsembleOutput) -> (f64, bool) {
    for result in output.model_outputs.values() {
        if let ModelResult::Success {
            outcome: crate::domain::ModelOutcome::Trust(trust),
            ..
        } = result
        {
            return (trust.trust_score, trust.flag_risk);
        }
    }
    (0.0, false)
}

fn build_combined_explanation(
    output: &crate::domain::UnifiedEnsembleOutput,
    decision: &crate::domain::DecisionResult,
) -> String {
    let mut combined = String::new();
    for factor in &output.structured_explanation {
        combined.push_str(&format!("- {}: {}\n", factor.factor, factor.explanation));
    }
    combined.push_str("\n--- Fraud Detection ---\n");
    if let Some(score) = output.fraud_result.fraud_score {
        combined.push_str(&format!("Fraud Score: {score:.2}\n"));
    }
    for flag in &output.fraud_result.flags {
        combined.push_str(&format!("- {flag}\n"));
    }
    combined.push_str("\n--- Policy Decision ---\n");
    for reason in &decision.reasons {
        combined.push_str(&format!("- {reason}\n"));
    }
    combined
}

async fn run_fairness_check(state: &web::Data<AppState>, decision_id: Uuid) {
    let recent = match state
        .repository
        .get_recent_decisions_with_demographics(FAIRNESS_SAMPLE_SIZE)
        .await
    {
        Ok(decisions) => decisions,
        Err(e) => {
            warn!("[loans] fairness monitoring skipped, fetch failed: {e}");
            return;
        }
    };

    if recent.len() < FAIRNESS_MIN_SAMPLE {
        return;
    }

    let result = crate::fairness::evaluate_fairness(&recent);
    let mut metadata = json!({
        "sample_size": recent.len(),
        "disparate_impact": result.disparate_impact,
        "bias_detected": result.bias_detected,
    });
    if result.bias_detected {
        metadata["human_review_recommended"] = json!(true);
        metadata["compliance_alert"] =
            json!("Disparate impact detected - review decision criteria");
    }

    state
        .repository
        .log_audit_event("fairness_evaluation", "credit_decision", Some(decision_id), metadata)
        .await;
    info!("[loans] fairness evaluation recorded for decision {decision_id}");
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(request_loan);
}
