use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::cache::QueryCache;
use crate::config::CacheConfig;
use crate::intake::domain::{
    IntakeForm, IntakeFormInsert, IntakeId, IntakeScore, IntakeStatus, IntakeSubmission,
    ScoreAssessment,
};
use crate::intake::notify::{Notification, Notifier, NotifyError, RecordingNotifier};
use crate::intake::query::IntakeQuery;
use crate::intake::repository::{IntakeStore, MemoryIntakeStore, RepositoryError};
use crate::intake::scoring::{ScoringClient, ScoringError, ScoringRequest};
use crate::intake::service::IntakeService;

pub(super) const DESCRIPTION: &str =
    "We need a customer portal that lets clients track orders and invoices in real time.";

pub(super) fn submission() -> IntakeSubmission {
    IntakeSubmission {
        user_id: None,
        contact_name: "Ada Lovelace".to_string(),
        contact_email: "Ada@Example.com ".to_string(),
        contact_phone: Some("+44 20 7946 0000".to_string()),
        company_name: Some("Analytical Engines Ltd".to_string()),
        project_name: "Client Portal".to_string(),
        project_type: "web-app".to_string(),
        project_description: DESCRIPTION.to_string(),
        key_requirements: "Order tracking, invoices, SSO login".to_string(),
        tech_stack_preferences: vec!["Rust".to_string(), "React".to_string()],
        timeline: "1-3-months".to_string(),
        budget_range: "25k-50k".to_string(),
        budget_flexibility: Some("somewhat-flexible".to_string()),
        timezone: None,
    }
}

pub(super) fn assessment(overall: u8) -> ScoreAssessment {
    ScoreAssessment {
        budget_score: 70,
        timeline_score: 65,
        technical_complexity_score: 55,
        business_impact_score: 80,
        market_potential_score: 60,
        overall_score: overall,
        confidence_level: 75,
        risk_factors: vec!["Tight integration timeline".to_string()],
        opportunity_factors: vec!["Recurring maintenance".to_string()],
        recommended_approach: Some("Discovery sprint first".to_string()),
        estimated_project_duration: Some("10 weeks".to_string()),
        suggested_team_size: Some(3),
        next_steps: vec!["Schedule discovery call".to_string()],
        insights: BTreeMap::from([(
            "summary".to_string(),
            Value::String("Solid fit".to_string()),
        )]),
        recommendation: Some("Proceed".to_string()),
    }
}

/// Scorer answering with a queue of canned results, repeating the last one.
#[derive(Clone)]
pub(super) struct StubScoringClient {
    responses: Arc<Mutex<Vec<Result<ScoreAssessment, String>>>>,
    pub(super) calls: Arc<AtomicUsize>,
}

impl StubScoringClient {
    pub(super) fn scoring(overall: u8) -> Self {
        Self::sequence(vec![Ok(assessment(overall))])
    }

    pub(super) fn failing(message: &str) -> Self {
        Self::sequence(vec![Err(message.to_string())])
    }

    pub(super) fn sequence(responses: Vec<Result<ScoreAssessment, String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl ScoringClient for StubScoringClient {
    async fn score(&self, _request: &ScoringRequest) -> Result<ScoreAssessment, ScoringError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().expect("stub lock");
        let next = if responses.len() > 1 {
            responses.remove(0)
        } else {
            responses.first().cloned().expect("stub has a response")
        };
        next.map_err(ScoringError::Transport)
    }
}

/// Scorer that lets a reviewer qualify the form while the score is being computed.
pub(super) struct ReviewerRacingScorer {
    pub(super) store: MemoryIntakeStore,
    pub(super) overall: u8,
}

#[async_trait]
impl ScoringClient for ReviewerRacingScorer {
    async fn score(&self, request: &ScoringRequest) -> Result<ScoreAssessment, ScoringError> {
        let mut form = self
            .store
            .fetch_form(&request.intake_form_id)
            .await
            .expect("store readable")
            .expect("form stored before scoring");
        if form.status == IntakeStatus::UnderReview {
            form.status = IntakeStatus::Qualified;
            self.store.update_form(form).await.expect("reviewer write");
        }
        Ok(assessment(self.overall))
    }
}

/// Store whose writes succeed while every single-form read fails.
pub(super) struct UnreadableStore {
    pub(super) inner: MemoryIntakeStore,
}

#[async_trait]
impl IntakeStore for UnreadableStore {
    async fn insert_form(&self, insert: IntakeFormInsert) -> Result<IntakeForm, RepositoryError> {
        self.inner.insert_form(insert).await
    }

    async fn update_form(&self, form: IntakeForm) -> Result<IntakeForm, RepositoryError> {
        self.inner.update_form(form).await
    }

    async fn fetch_form(&self, _id: &IntakeId) -> Result<Option<IntakeForm>, RepositoryError> {
        Err(RepositoryError::Unavailable("read replica lagging".to_string()))
    }

    async fn list_forms(&self, query: &IntakeQuery) -> Result<Vec<IntakeForm>, RepositoryError> {
        self.inner.list_forms(query).await
    }

    async fn delete_form(&self, id: &IntakeId) -> Result<(), RepositoryError> {
        self.inner.delete_form(id).await
    }

    async fn upsert_score(
        &self,
        form_id: &IntakeId,
        assessment: ScoreAssessment,
    ) -> Result<IntakeScore, RepositoryError> {
        self.inner.upsert_score(form_id, assessment).await
    }

    async fn fetch_score(
        &self,
        form_id: &IntakeId,
    ) -> Result<Option<IntakeScore>, RepositoryError> {
        self.inner.fetch_score(form_id).await
    }
}

pub(super) struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn publish(&self, _notification: Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("toast channel closed".to_string()))
    }
}

pub(super) struct UnavailableStore;

#[async_trait]
impl IntakeStore for UnavailableStore {
    async fn insert_form(&self, _insert: IntakeFormInsert) -> Result<IntakeForm, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    async fn update_form(&self, _form: IntakeForm) -> Result<IntakeForm, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    async fn fetch_form(&self, _id: &IntakeId) -> Result<Option<IntakeForm>, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    async fn list_forms(&self, _query: &IntakeQuery) -> Result<Vec<IntakeForm>, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    async fn delete_form(&self, _id: &IntakeId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    async fn upsert_score(
        &self,
        _form_id: &IntakeId,
        _assessment: ScoreAssessment,
    ) -> Result<IntakeScore, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    async fn fetch_score(
        &self,
        _form_id: &IntakeId,
    ) -> Result<Option<IntakeScore>, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }
}

pub(super) fn cache() -> Arc<QueryCache> {
    Arc::new(QueryCache::new(CacheConfig {
        fresh_for: Duration::from_secs(300),
        read_retries: 1,
        max_entries: 64,
    }))
}

pub(super) type TestService = IntakeService<MemoryIntakeStore, StubScoringClient, RecordingNotifier>;

pub(super) fn build_service(
    scorer: StubScoringClient,
) -> (TestService, MemoryIntakeStore, RecordingNotifier) {
    let store = MemoryIntakeStore::default();
    let notifier = RecordingNotifier::default();
    let service = IntakeService::new(
        Arc::new(store.clone()),
        Arc::new(scorer),
        Arc::new(notifier.clone()),
        cache(),
    );
    (service, store, notifier)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
