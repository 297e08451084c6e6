use serde::{Deserialize, Serialize};

use super::super::domain::{
    BudgetFlexibility, BudgetRange, IntakeForm, IntakeId, ProjectType, Timeline, DEFAULT_TIMEZONE,
};

/// Payload posted to the AI scoring collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRequest {
    pub intake_form_id: IntakeId,
    pub contact: ScoringContact,
    pub project: ScoringProject,
    pub timeline: Timeline,
    pub budget_range: BudgetRange,
    pub budget_flexibility: Option<BudgetFlexibility>,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringContact {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringProject {
    pub name: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub description: String,
    pub requirements: String,
    pub tech_stack: Vec<String>,
}

impl ScoringRequest {
    pub fn from_form(form: &IntakeForm) -> Self {
        let timezone = match form.timezone.trim() {
            "" => DEFAULT_TIMEZONE.to_string(),
            zone => zone.to_string(),
        };

        Self {
            intake_form_id: form.id.clone(),
            contact: ScoringContact {
                name: form.contact_name.clone(),
                email: form.contact_email.clone(),
                company: form.company_name.clone(),
            },
            project: ScoringProject {
                name: form.project_name.clone(),
                project_type: form.project_type,
                description: form.project_description.clone(),
                requirements: form.key_requirements.clone(),
                tech_stack: form.tech_stack_preferences.clone(),
            },
            timeline: form.timeline,
            budget_range: form.budget_range,
            budget_flexibility: form.budget_flexibility,
            timezone,
        }
    }
}
