use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::domain::{IntakeForm, IntakePriority, IntakeStatus, ProjectType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeOrder {
    #[default]
    CreatedAt,
    UpdatedAt,
    QualificationScore,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Filter, ordering, and pagination over the intake form table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeQuery {
    pub status: Option<IntakeStatus>,
    pub priority: Option<IntakePriority>,
    pub project_type: Option<ProjectType>,
    pub min_score: Option<u8>,
    pub max_score: Option<u8>,
    pub order_by: IntakeOrder,
    pub direction: SortDirection,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl IntakeQuery {
    pub fn with_status(status: IntakeStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, form: &IntakeForm) -> bool {
        if self.status.is_some_and(|status| status != form.status) {
            return false;
        }
        if self.priority.is_some_and(|priority| priority != form.priority) {
            return false;
        }
        if self
            .project_type
            .is_some_and(|project_type| project_type != form.project_type)
        {
            return false;
        }
        if self.min_score.is_some() || self.max_score.is_some() {
            let Some(score) = form.qualification_score else {
                return false;
            };
            if self.min_score.is_some_and(|min| score < min)
                || self.max_score.is_some_and(|max| score > max)
            {
                return false;
            }
        }
        true
    }

    fn compare(&self, left: &IntakeForm, right: &IntakeForm) -> Ordering {
        let ordering = match self.order_by {
            IntakeOrder::CreatedAt => left.created_at.cmp(&right.created_at),
            IntakeOrder::UpdatedAt => left.updated_at.cmp(&right.updated_at),
            IntakeOrder::QualificationScore => {
                match (left.qualification_score, right.qualification_score) {
                    (Some(a), Some(b)) => a.cmp(&b),
                    // unscored rows sort last in both directions
                    (Some(_), None) => return Ordering::Less,
                    (None, Some(_)) => return Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }
        };
        let ordering = match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        ordering.then_with(|| left.id.cmp(&right.id))
    }

    /// Filter, sort, and page an in-memory snapshot of the table.
    pub fn apply<'a, I>(&self, forms: I) -> Vec<IntakeForm>
    where
        I: IntoIterator<Item = &'a IntakeForm>,
    {
        let mut selected: Vec<&IntakeForm> =
            forms.into_iter().filter(|form| self.matches(form)).collect();
        selected.sort_by(|left, right| self.compare(left, right));

        let page = selected.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => page.take(limit).cloned().collect(),
            None => page.cloned().collect(),
        }
    }
}
