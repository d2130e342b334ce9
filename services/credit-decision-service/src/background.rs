use std::sync::Arc;

use chrono::{DateTime, Utc};
use credit_decision_database::Repository;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{error, info};
use uuid::Uuid;

use crate::features::FeatureEngine;

/// One completed background task's observability record.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub borrower_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub execution_time_ms: i64,
    pub status: &'static str,
}

/// In-process, one-shot task executor for feature recomputation. No
/// cross-process queue, no retries, no cancellation: a task either runs to
/// completion or to a caught error, and either way the result lands in
/// `monitor` for observability rather than propagating to whoever queued it.
pub struct BackgroundRunner {
    repository: Arc<dyn Repository>,
    feature_engine: Arc<FeatureEngine>,
    monitor: RwLock<Vec<TaskRecord>>,
}

impl BackgroundRunner {
    pub fn new(repository: Arc<dyn Repository>, feature_engine: Arc<FeatureEngine>) -> Self {
        Self {
            repository,
            feature_engine,
            monitor: RwLock::new(Vec::new()),
        }
    }

    /// Enqueues a single feature-recomputation task for `borrower_id` and
    /// returns immediately. `has_phone` is the same caller-supplied signal
    /// the Feature Engine needs at request time (see DESIGN.md).
    pub fn trigger_feature_computation(self: &Arc<Self>, borrower_id: Uuid, has_phone: bool) {
        let runner = Arc::clone(self);
        tokio::spawn(async move {
            runner.run_feature_computation(borrower_id, has_phone).await;
        });
    }

    async fn run_feature_computation(&self, borrower_id: Uuid, has_phone: bool) {
        let started_at = Utc::now();
        let outcome = self.compute_and_mark(borrower_id, has_phone).await;
        let completed_at = Utc::now();
        let status = if outcome.is_ok() { "success" } else { "error" };

        self.monitor.write().await.push(TaskRecord {
            borrower_id,
            started_at,
            completed_at,
            execution_time_ms: (completed_at - started_at).num_milliseconds(),
            status,
        });

        if let Err(error) = outcome {
            error!("[BackgroundRunner] feature recomputation failed for {borrower_id}: {error}");
            self.repository
                .log_audit_event(
                    "feature_computation_failed",
                    "borrower",
                    Some(borrower_id),
                    json!({ "error": error, "computed_at": completed_at }),
                )
                .await;
        } else {
            info!("[BackgroundRunner] feature recomputation succeeded for {borrower_id}");
        }
    }

    /// Every stage is guarded: a failure marks the fetched events FAILED and
    /// returns a `String` error description rather than propagating an
    /// `AppError` — this runs with nobody left to answer to.
    async fn compute_and_mark(&self, borrower_id: Uuid, has_phone: bool) -> Result<(), String> {
        let events = self
            .repository
            .get_unprocessed_events(borrower_id, 1000)
            .await
            .map_err(|e| format!("event fetch failed: {e}"))?;

        let vector = self.feature_engine.compute_features(borrower_id, has_phone).await;

        if let Err(e) = self.feature_engine.save_features(borrower_id, &vector).await {
            let error = format!("feature save failed: {e}");
            for event in &events {
                let _ = self.repository.mark_event_failed(event.id, &error).await;
            }
            return Err(error);
        }

        for event in &events {
            let _ = self
                .repository
                .mark_event_processed(event.id, Some("feature_recomputation"))
                .await;
        }

        Ok(())
    }

    /// Snapshot of completed tasks, most recent last.
    pub async fn task_history(&self) -> Vec<TaskRecord> {
        self.monitor.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use credit_decision_common::Result;
    use credit_decision_database::{AuditOutcome, DecisionWithDemographics};
    use credit_decision_models::{
        Borrower, CreditDecisionRow, DecisionLineageRow, FeatureVectorRow, LoanRequest, RawEvent,
    };
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    struct FakeRepository {
        events: Vec<RawEvent>,
        marked_processed: Mutex<Vec<Uuid>>,
        save_failures: AtomicUsize,
    }

    #[async_trait]
    impl Repository for FakeRepository {
        async fn create_borrower(&self, _: &str, _: &str, _: &str, _: &str) -> Result<Borrower> {
            unimplemented!()
        }
        async fn get_borrower_by_user(&self, _: &str) -> Result<Option<Borrower>> {
            unimplemented!()
        }
        async fn create_loan_request(&self, _: Uuid, _: f64, _: &str) -> Result<LoanRequest> {
            unimplemented!()
        }
        async fn save_credit_decision(&self, _: Uuid, _: f64, _: &str, _: &str, _: &str) -> Result<CreditDecisionRow> {
            unimplemented!()
        }
        async fn save_decision_lineage(
            &self,
            _: Uuid,
            _: Uuid,
            _: Value,
            _: Value,
            _: &str,
            _: Value,
        ) -> Result<DecisionLineageRow> {
            unimplemented!()
        }
        async fn save_model_features(&self, _: Uuid, _: &str, _: &str, _: Value, _: i32) -> Result<FeatureVectorRow> {
            if self.save_failures.load(Ordering::SeqCst) > 0 {
                return Err(credit_decision_common::AppError::Internal("boom".to_string()));
            }
            Ok(FeatureVectorRow {
                id: Uuid::new_v4(),
                borrower_id: Uuid::new_v4(),
                feature_set: "core_behavioral".to_string(),
                feature_version: "v1".to_string(),
                features: json!({}),
                source_event_count: 0,
                computed_at: Utc::now(),
            })
        }
        async fn get_latest_features(&self, _: Uuid, _: &str) -> Result<Option<FeatureVectorRow>> {
            unimplemented!()
        }
        async fn log_audit_event(&self, _: &str, _: &str, _: Option<Uuid>, _: Value) -> AuditOutcome {
            AuditOutcome::Logged(credit_decision_models::AuditLogRow {
                id: Uuid::new_v4(),
                action: "x".to_string(),
                entity_type: "x".to_string(),
                entity_id: None,
                metadata: json!({}),
                created_at: Utc::now(),
            })
        }
        async fn get_raw_events(&self, _: Uuid, _: i64) -> Result<Vec<RawEvent>> {
            Ok(self.events.clone())
        }
        async fn get_unprocessed_events(&self, _: Uuid, _: i64) -> Result<Vec<RawEvent>> {
            Ok(self.events.clone())
        }
        async fn mark_event_processed(&self, event_id: Uuid, _: Option<&str>) -> Result<()> {
            self.marked_processed.lock().await.push(event_id);
            Ok(())
        }
        async fn mark_event_failed(&self, _: Uuid, _: &str) -> Result<()> {
            Ok(())
        }
        async fn get_recent_decisions_with_demographics(&self, _: i64) -> Result<Vec<DecisionWithDemographics>> {
            unimplemented!()
        }
    }

    fn event(borrower_id: Uuid) -> RawEvent {
        RawEvent {
            id: Uuid::new_v4(),
            borrower_id,
            event_type: "app_open".to_string(),
            event_data: json!({}),
            schema_version: "v1".to_string(),
            processed: false,
            processed_at: None,
            processing_notes: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn successful_run_marks_all_events_processed_and_records_success() {
        let borrower_id = Uuid::new_v4();
        let repo = Arc::new(FakeRepository {
            events: vec![event(borrower_id), event(borrower_id)],
            marked_processed: Mutex::new(Vec::new()),
            save_failures: AtomicUsize::new(0),
        });
        let feature_engine = Arc::new(FeatureEngine::new(repo.clone(), 30));
        let runner = Arc::new(BackgroundRunner::new(repo.clone(), feature_engine));

        runner.run_feature_computation(borrower_id, true).await;

        assert_eq!(repo.marked_processed.lock().await.len(), 2);
        let history = runner.task_history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, "success");
    }

    #[tokio::test]
    async fn save_failure_records_error_status() {
        let borrower_id = Uuid::new_v4();
        let repo = Arc::new(FakeRepository {
            events: vec![event(borrower_id)],
            marked_processed: Mutex::new(Vec::new()),
            save_failures: AtomicUsize::new(1),
        });
        let feature_engine = Arc::new(FeatureEngine::new(repo.clone(), 30));
        let runner = Arc::new(BackgroundRunner::new(repo.clone(), feature_engine));

        runner.run_feature_computation(borrower_id, true).await;

        assert!(repo.marked_processed.lock().await.is_empty());
        let history = runner.task_history().await;
        assert_eq!(history[0].status, "error");
    }
}
