use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::domain::{IntakeFormPatch, IntakeId, IntakeScore, IntakeStatus, IntakeSubmission};
use super::notify::Notifier;
use super::query::IntakeQuery;
use super::repository::{IntakeStore, RepositoryError};
use super::scoring::{ScoreInterpretation, ScoringClient};
use super::service::{IntakeService, IntakeServiceError};

type SharedService<S, C, N> = Arc<IntakeService<S, C, N>>;

/// Router builder exposing HTTP endpoints for intake submission and review.
pub fn intake_router<S, C, N>(service: SharedService<S, C, N>) -> Router
where
    S: IntakeStore + 'static,
    C: ScoringClient + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/intake",
            post(submit_handler::<S, C, N>).get(list_handler::<S, C, N>),
        )
        .route("/api/v1/intake/export", get(export_handler::<S, C, N>))
        .route(
            "/api/v1/intake/:intake_id",
            get(get_handler::<S, C, N>)
                .patch(update_handler::<S, C, N>)
                .delete(delete_handler::<S, C, N>),
        )
        .route(
            "/api/v1/intake/:intake_id/status",
            post(transition_handler::<S, C, N>),
        )
        .route(
            "/api/v1/intake/:intake_id/rescore",
            post(rescore_handler::<S, C, N>),
        )
        .route(
            "/api/v1/intake/:intake_id/score",
            get(score_handler::<S, C, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: IntakeStatus,
}

/// Score plus the labels dashboards render next to it.
#[derive(Debug, Serialize)]
pub struct ScoreView {
    pub score: IntakeScore,
    pub interpretation: ScoreInterpretation,
}

pub(crate) fn error_response(err: IntakeServiceError) -> Response {
    let (status, payload) = match err {
        IntakeServiceError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "error": errors.to_string(),
                "violations": errors.violations,
            }),
        ),
        IntakeServiceError::Transition(err) => (
            StatusCode::CONFLICT,
            json!({
                "error": err.to_string(),
                "from": err.from,
                "to": err.to,
            }),
        ),
        IntakeServiceError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            json!({ "error": format!("intake {id} not found") }),
        ),
        IntakeServiceError::Repository(RepositoryError::NotFound) => (
            StatusCode::NOT_FOUND,
            json!({ "error": "intake not found" }),
        ),
        IntakeServiceError::Repository(RepositoryError::Conflict) => (
            StatusCode::CONFLICT,
            json!({ "error": "intake already exists" }),
        ),
        IntakeServiceError::Repository(other) => {
            error!(error = %other, "intake store call failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "intake storage is unavailable, please retry" }),
            )
        }
        IntakeServiceError::Scoring(other) => {
            error!(error = %other, "intake scoring call failed");
            (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "scoring is unavailable, please retry" }),
            )
        }
        IntakeServiceError::Export(other) => {
            error!(error = %other, "intake export failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "export failed, please retry" }),
            )
        }
    };
    (status, Json(payload)).into_response()
}

pub(crate) async fn submit_handler<S, C, N>(
    State(service): State<SharedService<S, C, N>>,
    Json(submission): Json<IntakeSubmission>,
) -> Response
where
    S: IntakeStore + 'static,
    C: ScoringClient + 'static,
    N: Notifier + 'static,
{
    match service.submit(submission).await {
        Ok(receipt) => (StatusCode::ACCEPTED, Json(receipt)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<S, C, N>(
    State(service): State<SharedService<S, C, N>>,
    Query(query): Query<IntakeQuery>,
) -> Response
where
    S: IntakeStore + 'static,
    C: ScoringClient + 'static,
    N: Notifier + 'static,
{
    match service.list(&query).await {
        Ok(forms) => (StatusCode::OK, Json(forms)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn export_handler<S, C, N>(
    State(service): State<SharedService<S, C, N>>,
    Query(query): Query<IntakeQuery>,
) -> Response
where
    S: IntakeStore + 'static,
    C: ScoringClient + 'static,
    N: Notifier + 'static,
{
    match service.export_csv(&query).await {
        Ok(csv) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            csv,
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<S, C, N>(
    State(service): State<SharedService<S, C, N>>,
    Path(intake_id): Path<String>,
) -> Response
where
    S: IntakeStore + 'static,
    C: ScoringClient + 'static,
    N: Notifier + 'static,
{
    match service.get(&IntakeId(intake_id)).await {
        Ok(form) => (StatusCode::OK, Json(form)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<S, C, N>(
    State(service): State<SharedService<S, C, N>>,
    Path(intake_id): Path<String>,
    Json(patch): Json<IntakeFormPatch>,
) -> Response
where
    S: IntakeStore + 'static,
    C: ScoringClient + 'static,
    N: Notifier + 'static,
{
    match service.update(&IntakeId(intake_id), patch).await {
        Ok(form) => (StatusCode::OK, Json(form)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<S, C, N>(
    State(service): State<SharedService<S, C, N>>,
    Path(intake_id): Path<String>,
) -> Response
where
    S: IntakeStore + 'static,
    C: ScoringClient + 'static,
    N: Notifier + 'static,
{
    match service.delete(&IntakeId(intake_id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn transition_handler<S, C, N>(
    State(service): State<SharedService<S, C, N>>,
    Path(intake_id): Path<String>,
    Json(request): Json<TransitionRequest>,
) -> Response
where
    S: IntakeStore + 'static,
    C: ScoringClient + 'static,
    N: Notifier + 'static,
{
    match service
        .transition(&IntakeId(intake_id), request.status)
        .await
    {
        Ok(form) => (StatusCode::OK, Json(form)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn rescore_handler<S, C, N>(
    State(service): State<SharedService<S, C, N>>,
    Path(intake_id): Path<String>,
) -> Response
where
    S: IntakeStore + 'static,
    C: ScoringClient + 'static,
    N: Notifier + 'static,
{
    match service.rescore(&IntakeId(intake_id)).await {
        Ok((form, score)) => {
            let interpretation = ScoreInterpretation::of(score.assessment.overall_score);
            (
                StatusCode::OK,
                Json(json!({
                    "form": form,
                    "score": score,
                    "interpretation": interpretation,
                })),
            )
                .into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn score_handler<S, C, N>(
    State(service): State<SharedService<S, C, N>>,
    Path(intake_id): Path<String>,
) -> Response
where
    S: IntakeStore + 'static,
    C: ScoringClient + 'static,
    N: Notifier + 'static,
{
    match service.score(&IntakeId(intake_id)).await {
        Ok(score) => {
            let interpretation = ScoreInterpretation::of(score.assessment.overall_score);
            (
                StatusCode::OK,
                Json(ScoreView {
                    score,
                    interpretation,
                }),
            )
                .into_response()
        }
        Err(err) => error_response(err),
    }
}
