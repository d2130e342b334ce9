use chrono::{DateTime, Duration, Utc};
use credit_decision_common::Result;
use credit_decision_database::Repository;
use credit_decision_models::RawEvent;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::domain::{FeatureVector, FEATURE_SET_CORE_BEHAVIORAL, FEATURE_VERSION_V1};

const MOBILE_EVENT_TYPES: [&str; 4] = [
    "app_open",
    "location_update",
    "mobile_payment",
    "sms_verification",
];

/// Turns a borrower's raw event stream into one `FeatureVector` under the
/// fixed `core_behavioral / v1` schema. Never raises: every per-feature
/// computation failure degrades to a safe default plus a data-quality
/// warning, grounded on the original's broad `except` fallbacks.
pub struct FeatureEngine {
    repository: Arc<dyn Repository>,
    lookback_days: i64,
}

impl FeatureEngine {
    pub fn new(repository: Arc<dyn Repository>, lookback_days: i64) -> Self {
        Self {
            repository,
            lookback_days,
        }
    }

    /// `has_phone` is supplied by the caller since the persisted `Borrower`
    /// entity carries no phone field of its own (see DESIGN.md).
    pub async fn compute_features(&self, borrower_id: Uuid, has_phone: bool) -> FeatureVector {
        self.compute_features_at(borrower_id, has_phone, Utc::now()).await
    }

    /// Accepts an injected "now" so tests can be deterministic about the
    /// lookback cutoff.
    pub async fn compute_features_at(
        &self,
        borrower_id: Uuid,
        has_phone: bool,
        now: DateTime<Utc>,
    ) -> FeatureVector {
        let mut warnings = Vec::new();

        let events = match self.repository.get_raw_events(borrower_id, 1000).await {
            Ok(events) => events,
            Err(e) => {
                warn!("[FeatureEngine] raw event fetch failed for {borrower_id}: {e}");
                warnings.push("raw_events_fetch_failed".to_string());
                Vec::new()
            }
        };

        if events.is_empty() {
            warnings.push("no_raw_events".to_string());
        }
        if events.len() < 5 {
            warnings.push(format!("low_event_count_{}", events.len()));
        }

        let cutoff = now - Duration::days(self.lookback_days);
        let windowed = filter_events_by_window(&events, cutoff, now);

        let mobile_activity_score = compute_mobile_activity_score(&windowed, has_phone, &mut warnings);
        let transaction_volume_30d = compute_transaction_volume(&windowed, &mut warnings);
        let activity_consistency = compute_activity_consistency(&windowed, &mut warnings);

        let data_quality_score = compute_data_quality_score(&warnings);

        FeatureVector {
            feature_set: FEATURE_SET_CORE_BEHAVIORAL.to_string(),
            feature_version: FEATURE_VERSION_V1.to_string(),
            mobile_activity_score,
            transaction_volume_30d,
            activity_consistency,
            event_count: windowed.len() as i64,
            lookback_days: self.lookback_days,
            has_phone,
            data_quality_warnings: warnings,
            data_quality_score,
            computed_at: now,
        }
    }

    /// Persists the vector and writes a `features_computed` audit row.
    pub async fn save_features(&self, borrower_id: Uuid, vector: &FeatureVector) -> Result<()> {
        self.repository
            .save_model_features(
                borrower_id,
                &vector.feature_set,
                &vector.feature_version,
                vector.to_json(),
                vector.event_count as i32,
            )
            .await?;

        let feature_names: Vec<&str> = vec![
            "mobile_activity_score",
            "transaction_volume_30d",
            "activity_consistency",
        ];
        self.repository
            .log_audit_event(
                "features_computed",
                "feature_vector",
                Some(borrower_id),
                json!({ "feature_names": feature_names, "feature_set": vector.feature_set }),
            )
            .await;

        Ok(())
    }

    pub async fn compute_and_save(&self, borrower_id: Uuid, has_phone: bool) -> Result<FeatureVector> {
        let vector = self.compute_features(borrower_id, has_phone).await;
        self.save_features(borrower_id, &vector).await?;
        Ok(vector)
    }
}

fn filter_events_by_window(
    events: &[RawEvent],
    cutoff: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<&RawEvent> {
    events
        .iter()
        .filter(|e| e.created_at >= cutoff && e.created_at <= now)
        .collect()
}

fn compute_mobile_activity_score(
    events: &[&RawEvent],
    has_phone: bool,
    warnings: &mut Vec<String>,
) -> f64 {
    let phone_points = if has_phone { 20.0 } else { 0.0 };
    let event_points = (events.len() as f64).min(50.0);
    let mobile_event_count = events
        .iter()
        .filter(|e| MOBILE_EVENT_TYPES.contains(&e.event_type.as_str()))
        .count();
    let mobile_points = (3.0 * mobile_event_count as f64).min(30.0);
    let raw = phone_points + event_points + mobile_points;

    if !(0.0..=100.0).contains(&raw) {
        warnings.push("mobile_activity_score_out_of_range".to_string());
    }
    raw.clamp(0.0, 100.0)
}

fn compute_transaction_volume(events: &[&RawEvent], warnings: &mut Vec<String>) -> f64 {
    let total: f64 = events
        .iter()
        .filter(|e| e.event_type == "transaction")
        .filter_map(|e| e.event_data.get("amount"))
        .filter_map(|v| v.as_f64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
        .sum();

    if total < 0.0 {
        warnings.push("negative_transaction_volume".to_string());
        return 0.0;
    }
    total
}

fn compute_activity_consistency(events: &[&RawEvent], warnings: &mut Vec<String>) -> f64 {
    if events.is_empty() {
        return 0.0;
    }

    let mut daily_counts: std::collections::HashMap<chrono::NaiveDate, u32> =
        std::collections::HashMap::new();
    for e in events {
        *daily_counts.entry(e.created_at.date_naive()).or_insert(0) += 1;
    }

    if daily_counts.len() <= 1 {
        return 50.0;
    }

    let counts: Vec<f64> = daily_counts.values().map(|c| *c as f64).collect();
    let mean = counts.iter().sum::<f64>() / counts.len() as f64;
    if mean == 0.0 {
        return 0.0;
    }

    let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / counts.len() as f64;
    let stdev = variance.sqrt();
    let cv = stdev / mean;
    let score = 100.0 - 50.0 * cv;

    if !(0.0..=100.0).contains(&score) {
        warnings.push("activity_consistency_out_of_range".to_string());
    }
    score.clamp(0.0, 100.0)
}

fn compute_data_quality_score(warnings: &[String]) -> f64 {
    const CRITICAL: [&str; 2] = ["raw_events_fetch_failed", "no_raw_events"];
    const MAJOR_SUFFIXES: [&str; 1] = ["_computation_failed"];

    let mut score = 1.0_f64;
    for w in warnings {
        if CRITICAL.contains(&w.as_str()) {
            score -= 0.3;
        } else if MAJOR_SUFFIXES.iter().any(|s| w.ends_with(s)) || w == "negative_transaction_volume" {
            score -= 0.2;
        } else {
            score -= 0.1;
        }
    }
    score.clamp(0.0, 1.0)
}
