use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::super::domain::ScoreAssessment;
use super::request::ScoringRequest;

/// External AI process that turns a scoring request into an assessment.
#[async_trait]
pub trait ScoringClient: Send + Sync {
    async fn score(&self, request: &ScoringRequest) -> Result<ScoreAssessment, ScoringError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("scoring transport failed: {0}")]
    Transport(String),
    #[error("scoring service answered {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("scoring response field {field} out of range: {value}")]
    OutOfRange { field: &'static str, value: u8 },
    #[error("scoring response could not be decoded: {0}")]
    Decode(String),
}

pub const MAX_SCORE: u8 = 100;

/// Reject assessments carrying any score above 100.
pub fn check_assessment(assessment: &ScoreAssessment) -> Result<(), ScoringError> {
    for (field, value) in assessment.numeric_fields() {
        if value > MAX_SCORE {
            return Err(ScoringError::OutOfRange { field, value });
        }
    }
    Ok(())
}

/// Posts scoring requests as JSON to a webhook and reads the assessment back.
#[derive(Debug, Clone)]
pub struct HttpScoringClient {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpScoringClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ScoringError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ScoringError::Transport(err.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ScoringClient for HttpScoringClient {
    async fn score(&self, request: &ScoringRequest) -> Result<ScoreAssessment, ScoringError> {
        debug!(intake_id = %request.intake_form_id, endpoint = %self.endpoint, "requesting intake score");

        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|err| ScoringError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScoringError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| ScoringError::Transport(err.to_string()))?;
        let assessment: ScoreAssessment =
            serde_json::from_slice(&body).map_err(|err| ScoringError::Decode(err.to_string()))?;
        check_assessment(&assessment)?;
        Ok(assessment)
    }
}
