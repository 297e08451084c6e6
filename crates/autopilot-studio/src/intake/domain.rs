use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for intake forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntakeId(pub String);

impl fmt::Display for IntakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for derived score records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreId(pub String);

pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Generates the closed enumerations used by intake planning fields. Each variant carries
/// its wire value so validation can parse raw strings and report the accepted set.
macro_rules! closed_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:tt),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }

            pub fn parse(raw: &str) -> Option<Self> {
                let raw = raw.trim();
                Self::ALL.iter().copied().find(|value| value.as_str() == raw)
            }

            pub fn accepted() -> String {
                Self::ALL
                    .iter()
                    .map(|value| value.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_enum! {
    /// Kind of engagement the prospect is asking for.
    ProjectType {
        WebApp => "web-app",
        MobileApp => "mobile-app",
        ECommerce => "e-commerce",
        AiIntegration => "ai-integration",
        DataAnalytics => "data-analytics",
        ApiDevelopment => "api-development",
        CustomSoftware => "custom-software",
        Other => "other",
    }
}

closed_enum! {
    /// Requested delivery window.
    Timeline {
        Asap => "asap",
        OneMonth => "1-month",
        OneToThreeMonths => "1-3-months",
        ThreeToSixMonths => "3-6-months",
        SixMonthsPlus => "6-months-plus",
        Flexible => "flexible",
    }
}

closed_enum! {
    /// Budget bucket declared on the intake form.
    BudgetRange {
        Under10k => "under-10k",
        From10kTo25k => "10k-25k",
        From25kTo50k => "25k-50k",
        From50kTo100k => "50k-100k",
        Over100k => "100k-plus",
        NotSure => "not-sure",
    }
}

closed_enum! {
    BudgetFlexibility {
        Fixed => "fixed",
        SomewhatFlexible => "somewhat-flexible",
        VeryFlexible => "very-flexible",
    }
}

/// Workflow stage of an intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStatus {
    Submitted,
    UnderReview,
    Qualified,
    Disqualified,
    Scheduled,
    Completed,
    Archived,
}

impl IntakeStatus {
    pub const fn label(self) -> &'static str {
        match self {
            IntakeStatus::Submitted => "submitted",
            IntakeStatus::UnderReview => "under_review",
            IntakeStatus::Qualified => "qualified",
            IntakeStatus::Disqualified => "disqualified",
            IntakeStatus::Scheduled => "scheduled",
            IntakeStatus::Completed => "completed",
            IntakeStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for IntakeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakePriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl IntakePriority {
    pub const fn label(self) -> &'static str {
        match self {
            IntakePriority::Low => "low",
            IntakePriority::Medium => "medium",
            IntakePriority::High => "high",
            IntakePriority::Urgent => "urgent",
        }
    }
}

/// Raw intake payload as received from the form. Enumerations are still strings so every
/// field can be checked and reported in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeSubmission {
    pub user_id: Option<String>,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub company_name: Option<String>,
    pub project_name: String,
    pub project_type: String,
    pub project_description: String,
    pub key_requirements: String,
    pub tech_stack_preferences: Vec<String>,
    pub timeline: String,
    pub budget_range: String,
    pub budget_flexibility: Option<String>,
    pub timezone: Option<String>,
}

/// Normalized, validated form ready to be inserted into the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeFormInsert {
    pub user_id: Option<String>,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub company_name: Option<String>,
    pub project_name: String,
    pub project_type: ProjectType,
    pub project_description: String,
    pub key_requirements: String,
    pub tech_stack_preferences: Vec<String>,
    pub timeline: Timeline,
    pub budget_range: BudgetRange,
    pub budget_flexibility: Option<BudgetFlexibility>,
    pub timezone: String,
}

/// Stored intake form, the aggregate root of the qualification pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeForm {
    pub id: IntakeId,
    pub user_id: Option<String>,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub company_name: Option<String>,
    pub project_name: String,
    pub project_type: ProjectType,
    pub project_description: String,
    pub key_requirements: String,
    pub tech_stack_preferences: Vec<String>,
    pub timeline: Timeline,
    pub budget_range: BudgetRange,
    pub budget_flexibility: Option<BudgetFlexibility>,
    pub timezone: String,
    pub qualification_score: Option<u8>,
    pub confidence_score: Option<u8>,
    pub ai_insights: BTreeMap<String, serde_json::Value>,
    pub ai_recommendation: Option<String>,
    pub status: IntakeStatus,
    pub priority: IntakePriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IntakeForm {
    /// Materialize a new record from a validated insert. Timestamps are provisional until
    /// the store assigns its own.
    pub fn from_insert(id: IntakeId, insert: IntakeFormInsert, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: insert.user_id,
            contact_name: insert.contact_name,
            contact_email: insert.contact_email,
            contact_phone: insert.contact_phone,
            company_name: insert.company_name,
            project_name: insert.project_name,
            project_type: insert.project_type,
            project_description: insert.project_description,
            key_requirements: insert.key_requirements,
            tech_stack_preferences: insert.tech_stack_preferences,
            timeline: insert.timeline,
            budget_range: insert.budget_range,
            budget_flexibility: insert.budget_flexibility,
            timezone: insert.timezone,
            qualification_score: None,
            confidence_score: None,
            ai_insights: BTreeMap::new(),
            ai_recommendation: None,
            status: IntakeStatus::Submitted,
            priority: IntakePriority::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Project the editable fields back into a submission so edits can be re-validated.
    pub fn to_submission(&self) -> IntakeSubmission {
        IntakeSubmission {
            user_id: self.user_id.clone(),
            contact_name: self.contact_name.clone(),
            contact_email: self.contact_email.clone(),
            contact_phone: self.contact_phone.clone(),
            company_name: self.company_name.clone(),
            project_name: self.project_name.clone(),
            project_type: self.project_type.as_str().to_string(),
            project_description: self.project_description.clone(),
            key_requirements: self.key_requirements.clone(),
            tech_stack_preferences: self.tech_stack_preferences.clone(),
            timeline: self.timeline.as_str().to_string(),
            budget_range: self.budget_range.as_str().to_string(),
            budget_flexibility: self
                .budget_flexibility
                .map(|value| value.as_str().to_string()),
            timezone: Some(self.timezone.clone()),
        }
    }

    /// Overwrite the editable fields with a validated insert, leaving workflow and AI
    /// fields untouched.
    pub fn apply_insert(&mut self, insert: IntakeFormInsert) {
        self.user_id = insert.user_id;
        self.contact_name = insert.contact_name;
        self.contact_email = insert.contact_email;
        self.contact_phone = insert.contact_phone;
        self.company_name = insert.company_name;
        self.project_name = insert.project_name;
        self.project_type = insert.project_type;
        self.project_description = insert.project_description;
        self.key_requirements = insert.key_requirements;
        self.tech_stack_preferences = insert.tech_stack_preferences;
        self.timeline = insert.timeline;
        self.budget_range = insert.budget_range;
        self.budget_flexibility = insert.budget_flexibility;
        self.timezone = insert.timezone;
    }

    /// Copy the AI output of a score onto the form.
    pub fn absorb_assessment(&mut self, assessment: &ScoreAssessment) {
        self.qualification_score = Some(assessment.overall_score);
        self.confidence_score = Some(assessment.confidence_level);
        self.ai_insights = assessment.insights.clone();
        self.ai_recommendation = assessment.recommendation.clone();
    }
}

/// Partial edit of an intake form. Absent fields keep their stored value; optional contact
/// fields can be cleared by sending an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeFormPatch {
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub company_name: Option<String>,
    pub project_name: Option<String>,
    pub project_type: Option<String>,
    pub project_description: Option<String>,
    pub key_requirements: Option<String>,
    pub tech_stack_preferences: Option<Vec<String>>,
    pub timeline: Option<String>,
    pub budget_range: Option<String>,
    pub budget_flexibility: Option<String>,
    pub timezone: Option<String>,
    pub priority: Option<IntakePriority>,
}

impl IntakeFormPatch {
    pub fn apply_to(&self, submission: &mut IntakeSubmission) {
        fn set(target: &mut String, value: &Option<String>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }
        fn set_optional(target: &mut Option<String>, value: &Option<String>) {
            if let Some(value) = value {
                *target = Some(value.clone());
            }
        }

        set(&mut submission.contact_name, &self.contact_name);
        set(&mut submission.contact_email, &self.contact_email);
        set_optional(&mut submission.contact_phone, &self.contact_phone);
        set_optional(&mut submission.company_name, &self.company_name);
        set(&mut submission.project_name, &self.project_name);
        set(&mut submission.project_type, &self.project_type);
        set(&mut submission.project_description, &self.project_description);
        set(&mut submission.key_requirements, &self.key_requirements);
        if let Some(tags) = &self.tech_stack_preferences {
            submission.tech_stack_preferences = tags.clone();
        }
        set(&mut submission.timeline, &self.timeline);
        set(&mut submission.budget_range, &self.budget_range);
        set_optional(&mut submission.budget_flexibility, &self.budget_flexibility);
        set_optional(&mut submission.timezone, &self.timezone);
    }
}

/// AI output returned by the scoring collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreAssessment {
    pub budget_score: u8,
    pub timeline_score: u8,
    pub technical_complexity_score: u8,
    pub business_impact_score: u8,
    pub market_potential_score: u8,
    pub overall_score: u8,
    pub confidence_level: u8,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub opportunity_factors: Vec<String>,
    #[serde(default)]
    pub recommended_approach: Option<String>,
    #[serde(default)]
    pub estimated_project_duration: Option<String>,
    #[serde(default)]
    pub suggested_team_size: Option<u8>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub insights: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub recommendation: Option<String>,
}

impl ScoreAssessment {
    /// Every numeric field paired with its name, for range checks.
    pub fn numeric_fields(&self) -> [(&'static str, u8); 7] {
        [
            ("budget_score", self.budget_score),
            ("timeline_score", self.timeline_score),
            ("technical_complexity_score", self.technical_complexity_score),
            ("business_impact_score", self.business_impact_score),
            ("market_potential_score", self.market_potential_score),
            ("overall_score", self.overall_score),
            ("confidence_level", self.confidence_level),
        ]
    }
}

/// Score record owned by exactly one intake form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeScore {
    pub id: ScoreId,
    pub intake_form_id: IntakeId,
    #[serde(flatten)]
    pub assessment: ScoreAssessment,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
