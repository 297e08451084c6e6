use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::cache::{QueryCache, QueryKey};

use super::domain::{
    IntakeForm, IntakeFormPatch, IntakeId, IntakePriority, IntakeScore, IntakeStatus,
    IntakeSubmission,
};
use super::export::{forms_to_csv, ExportError};
use super::lifecycle::{validate_manual_transition, validate_transition, TransitionError};
use super::notify::{Notification, NotificationKind, Notifier};
use super::query::IntakeQuery;
use super::repository::{IntakeStore, RepositoryError};
use super::scoring::{
    check_assessment, priority_for, ScoringClient, ScoringError, ScoringRequest,
    SubmissionOutcome,
};
use super::validation::{IntakeValidator, ValidationErrors};

/// Service composing validation, the store, the scoring collaborator, toasts, and the
/// query cache.
pub struct IntakeService<S, C, N> {
    validator: IntakeValidator,
    store: Arc<S>,
    scorer: Arc<C>,
    notifier: Arc<N>,
    cache: Arc<QueryCache>,
}

/// Result of a submission. The form is always stored; scoring may have failed.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub form: IntakeForm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<IntakeScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SubmissionOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring_error: Option<String>,
}

/// Error raised by the intake service.
#[derive(Debug, thiserror::Error)]
pub enum IntakeServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("intake {0} not found")]
    NotFound(IntakeId),
}

impl<S, C, N> IntakeService<S, C, N>
where
    S: IntakeStore + 'static,
    C: ScoringClient + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, scorer: Arc<C>, notifier: Arc<N>, cache: Arc<QueryCache>) -> Self {
        Self {
            validator: IntakeValidator,
            store,
            scorer,
            notifier,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Validate and store a submission, then score it and move it to review.
    pub async fn submit(
        &self,
        submission: IntakeSubmission,
    ) -> Result<SubmissionReceipt, IntakeServiceError> {
        let insert = self.validator.validate(submission)?;
        let form = self.store.insert_form(insert).await?;
        self.cache.invalidate_form(&form.id);
        info!(intake_id = %form.id, project = %form.project_name, "intake submitted");

        match self.score_form(&form).await {
            Ok((form, score)) => {
                let overall = score.assessment.overall_score;
                let outcome = SubmissionOutcome::from_score(overall);
                info!(intake_id = %form.id, overall, outcome = outcome.label(), "intake scored");
                self.notify(Notification {
                    kind: match outcome {
                        SubmissionOutcome::Qualified => NotificationKind::Success,
                        SubmissionOutcome::NeedsReview => NotificationKind::Info,
                    },
                    title: "Intake submitted".to_string(),
                    description: outcome.toast_message(overall),
                    intake_id: Some(form.id.clone()),
                });
                Ok(SubmissionReceipt {
                    form,
                    score: Some(score),
                    outcome: Some(outcome),
                    scoring_error: None,
                })
            }
            Err(err) => {
                error!(intake_id = %form.id, error = %err, "intake scoring failed");
                self.notify(Notification {
                    kind: NotificationKind::Error,
                    title: "Intake submitted".to_string(),
                    description:
                        "Your request was saved, but we could not score it yet. Please try again later."
                            .to_string(),
                    intake_id: Some(form.id.clone()),
                });
                let form = self
                    .store
                    .fetch_form(&form.id)
                    .await
                    .ok()
                    .flatten()
                    .unwrap_or(form);
                Ok(SubmissionReceipt {
                    form,
                    score: None,
                    outcome: None,
                    scoring_error: Some(err.to_string()),
                })
            }
        }
    }

    /// Ask the scoring collaborator again and replace the stored score in place.
    pub async fn rescore(
        &self,
        id: &IntakeId,
    ) -> Result<(IntakeForm, IntakeScore), IntakeServiceError> {
        let form = self.require(id).await?;
        let (form, score) = self.score_form(&form).await?;
        info!(intake_id = %id, overall = score.assessment.overall_score, "intake re-scored");
        self.notify(Notification {
            kind: NotificationKind::Success,
            title: "Intake re-scored".to_string(),
            description: format!(
                "New qualification score: {}/100",
                score.assessment.overall_score
            ),
            intake_id: Some(id.clone()),
        });
        Ok((form, score))
    }

    pub async fn get(&self, id: &IntakeId) -> Result<IntakeForm, IntakeServiceError> {
        let store = &self.store;
        let form: Option<IntakeForm> = self
            .cache
            .fetch(QueryKey::IntakeForm(id.clone()), || store.fetch_form(id))
            .await?;
        form.ok_or_else(|| IntakeServiceError::NotFound(id.clone()))
    }

    pub async fn list(&self, query: &IntakeQuery) -> Result<Vec<IntakeForm>, IntakeServiceError> {
        let store = &self.store;
        let forms = self
            .cache
            .fetch(QueryKey::IntakeForms(query.clone()), || store.list_forms(query))
            .await?;
        Ok(forms)
    }

    pub async fn score(&self, form_id: &IntakeId) -> Result<IntakeScore, IntakeServiceError> {
        let store = &self.store;
        let score: Option<IntakeScore> = self
            .cache
            .fetch(QueryKey::IntakeScore(form_id.clone()), || {
                store.fetch_score(form_id)
            })
            .await?;
        score.ok_or_else(|| IntakeServiceError::NotFound(form_id.clone()))
    }

    /// Edit contact, project, and planning fields. The merged form is validated as a whole.
    pub async fn update(
        &self,
        id: &IntakeId,
        patch: IntakeFormPatch,
    ) -> Result<IntakeForm, IntakeServiceError> {
        let mut form = self.require(id).await?;

        let mut submission = form.to_submission();
        patch.apply_to(&mut submission);
        let insert = self.validator.validate(submission)?;
        form.apply_insert(insert);
        if let Some(priority) = patch.priority {
            form.priority = priority;
        }

        let form = self.store.update_form(form).await?;
        self.cache.invalidate_form(id);
        info!(intake_id = %id, "intake updated");
        self.notify(Notification {
            kind: NotificationKind::Success,
            title: "Intake updated".to_string(),
            description: format!("{} was saved", form.project_name),
            intake_id: Some(id.clone()),
        });
        Ok(form)
    }

    /// Move a form along its lifecycle by hand. Disallowed moves, including entering review
    /// without a score, leave the record untouched.
    pub async fn transition(
        &self,
        id: &IntakeId,
        target: IntakeStatus,
    ) -> Result<IntakeForm, IntakeServiceError> {
        let mut form = self.require(id).await?;
        let from = form.status;
        validate_manual_transition(from, target)?;

        form.status = target;
        let form = self.store.update_form(form).await?;
        self.cache.invalidate_form(id);
        info!(intake_id = %id, from = from.label(), to = target.label(), "intake status changed");
        self.notify(Notification {
            kind: NotificationKind::Success,
            title: "Status updated".to_string(),
            description: format!("{} is now {}", form.project_name, target.label()),
            intake_id: Some(id.clone()),
        });
        Ok(form)
    }

    /// Remove a form and its score.
    pub async fn delete(&self, id: &IntakeId) -> Result<(), IntakeServiceError> {
        match self.store.delete_form(id).await {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => return Err(IntakeServiceError::NotFound(id.clone())),
            Err(other) => return Err(other.into()),
        }
        self.cache.invalidate_score(id);
        info!(intake_id = %id, "intake deleted");
        self.notify(Notification {
            kind: NotificationKind::Success,
            title: "Intake deleted".to_string(),
            description: "The intake request was removed".to_string(),
            intake_id: Some(id.clone()),
        });
        Ok(())
    }

    pub async fn export_csv(&self, query: &IntakeQuery) -> Result<String, IntakeServiceError> {
        let forms = self.list(query).await?;
        Ok(forms_to_csv(&forms)?)
    }

    /// Current stored version of a form, bypassing the cache so writes start from the
    /// store's view.
    async fn require(&self, id: &IntakeId) -> Result<IntakeForm, IntakeServiceError> {
        self.store
            .fetch_form(id)
            .await?
            .ok_or_else(|| IntakeServiceError::NotFound(id.clone()))
    }

    async fn score_form(
        &self,
        form: &IntakeForm,
    ) -> Result<(IntakeForm, IntakeScore), IntakeServiceError> {
        let request = ScoringRequest::from_form(form);
        let assessment = self.scorer.score(&request).await?;
        check_assessment(&assessment)?;

        let score = self.store.upsert_score(&form.id, assessment).await?;
        self.cache.invalidate_score(&form.id);

        // reviewers may have moved the form while the scorer was running
        let mut updated = self.require(&form.id).await?;
        updated.absorb_assessment(&score.assessment);
        if updated.priority != IntakePriority::Urgent {
            updated.priority = priority_for(score.assessment.overall_score);
        }
        if updated.status == IntakeStatus::Submitted {
            validate_transition(updated.status, IntakeStatus::UnderReview)?;
            updated.status = IntakeStatus::UnderReview;
        }

        let updated = self.store.update_form(updated).await?;
        self.cache.invalidate_form(&form.id);
        Ok((updated, score))
    }

    fn notify(&self, notification: Notification) {
        if let Err(err) = self.notifier.publish(notification) {
            warn!(error = %err, "dropping intake notification");
        }
    }
}
