use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::domain::{IntakeForm, IntakeFormInsert, IntakeId, IntakeScore, ScoreAssessment, ScoreId};
use super::query::IntakeQuery;

/// Table-level access to intake forms and their scores. Ids and timestamps are assigned
/// by the store.
#[async_trait]
pub trait IntakeStore: Send + Sync {
    async fn insert_form(&self, insert: IntakeFormInsert) -> Result<IntakeForm, RepositoryError>;
    /// Replace a stored form. `created_at` is kept and `updated_at` is refreshed.
    async fn update_form(&self, form: IntakeForm) -> Result<IntakeForm, RepositoryError>;
    async fn fetch_form(&self, id: &IntakeId) -> Result<Option<IntakeForm>, RepositoryError>;
    async fn list_forms(&self, query: &IntakeQuery) -> Result<Vec<IntakeForm>, RepositoryError>;
    /// Delete a form together with its score.
    async fn delete_form(&self, id: &IntakeId) -> Result<(), RepositoryError>;
    /// Create the score for a form, or replace its assessment in place.
    async fn upsert_score(
        &self,
        form_id: &IntakeId,
        assessment: ScoreAssessment,
    ) -> Result<IntakeScore, RepositoryError>;
    async fn fetch_score(&self, form_id: &IntakeId) -> Result<Option<IntakeScore>, RepositoryError>;
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Default)]
struct Tables {
    forms: HashMap<IntakeId, IntakeForm>,
    scores: HashMap<IntakeId, IntakeScore>,
}

/// Process-local store used by the API binary and tests.
#[derive(Default, Clone)]
pub struct MemoryIntakeStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryIntakeStore {
    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("intake tables poisoned".to_string()))
    }

    pub fn form_count(&self) -> usize {
        self.lock().map(|tables| tables.forms.len()).unwrap_or(0)
    }

    pub fn score_count(&self) -> usize {
        self.lock().map(|tables| tables.scores.len()).unwrap_or(0)
    }
}

/// Server clock that never runs backwards relative to `previous`.
fn monotonic_now(previous: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(previous)
}

#[async_trait]
impl IntakeStore for MemoryIntakeStore {
    async fn insert_form(&self, insert: IntakeFormInsert) -> Result<IntakeForm, RepositoryError> {
        let id = IntakeId(Uuid::new_v4().to_string());
        let form = IntakeForm::from_insert(id, insert, Utc::now());
        let mut tables = self.lock()?;
        if tables.forms.contains_key(&form.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.forms.insert(form.id.clone(), form.clone());
        Ok(form)
    }

    async fn update_form(&self, mut form: IntakeForm) -> Result<IntakeForm, RepositoryError> {
        let mut tables = self.lock()?;
        let stored = tables
            .forms
            .get_mut(&form.id)
            .ok_or(RepositoryError::NotFound)?;
        form.created_at = stored.created_at;
        form.updated_at = monotonic_now(stored.updated_at);
        *stored = form.clone();
        Ok(form)
    }

    async fn fetch_form(&self, id: &IntakeId) -> Result<Option<IntakeForm>, RepositoryError> {
        Ok(self.lock()?.forms.get(id).cloned())
    }

    async fn list_forms(&self, query: &IntakeQuery) -> Result<Vec<IntakeForm>, RepositoryError> {
        let tables = self.lock()?;
        Ok(query.apply(tables.forms.values()))
    }

    async fn delete_form(&self, id: &IntakeId) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        tables.forms.remove(id).ok_or(RepositoryError::NotFound)?;
        tables.scores.remove(id);
        Ok(())
    }

    async fn upsert_score(
        &self,
        form_id: &IntakeId,
        assessment: ScoreAssessment,
    ) -> Result<IntakeScore, RepositoryError> {
        let mut tables = self.lock()?;
        if !tables.forms.contains_key(form_id) {
            return Err(RepositoryError::NotFound);
        }

        let score = match tables.scores.get(form_id) {
            Some(existing) => IntakeScore {
                id: existing.id.clone(),
                intake_form_id: form_id.clone(),
                assessment,
                created_at: existing.created_at,
                updated_at: monotonic_now(existing.updated_at),
            },
            None => {
                let now = Utc::now();
                IntakeScore {
                    id: ScoreId(Uuid::new_v4().to_string()),
                    intake_form_id: form_id.clone(),
                    assessment,
                    created_at: now,
                    updated_at: now,
                }
            }
        };
        tables.scores.insert(form_id.clone(), score.clone());
        Ok(score)
    }

    async fn fetch_score(&self, form_id: &IntakeId) -> Result<Option<IntakeScore>, RepositoryError> {
        Ok(self.lock()?.scores.get(form_id).cloned())
    }
}
