use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::domain::{
    BudgetFlexibility, BudgetRange, IntakeFormInsert, IntakeSubmission, ProjectType, Timeline,
    DEFAULT_TIMEZONE,
};

/// Inclusive character-length bounds for a text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthRule {
    pub min: usize,
    pub max: usize,
}

pub const CONTACT_NAME: LengthRule = LengthRule { min: 2, max: 100 };
pub const PROJECT_NAME: LengthRule = LengthRule { min: 3, max: 200 };
pub const PROJECT_DESCRIPTION: LengthRule = LengthRule { min: 50, max: 2000 };
pub const KEY_REQUIREMENTS: LengthRule = LengthRule { min: 20, max: 1000 };

/// One violated field and a message suitable for inline rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

/// Every violation found in a submission, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub violations: Vec<FieldViolation>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self
            .violations
            .iter()
            .map(|violation| violation.field)
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "{} field(s) failed validation: {fields}",
            self.violations.len()
        )
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn fields(&self) -> Vec<&'static str> {
        self.violations
            .iter()
            .map(|violation| violation.field)
            .collect()
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.violations
            .iter()
            .find(|violation| violation.field == field)
            .map(|violation| violation.message.as_str())
    }
}

static EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$",
    )
    .ok()
});

/// `local@domain.tld` with an alphabetic top-level label of two or more letters.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(value))
}

/// Collects violations while a submission is being normalized.
#[derive(Default)]
struct Report {
    violations: Vec<FieldViolation>,
}

impl Report {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            field,
            message: message.into(),
        });
    }

    fn text(&mut self, field: &'static str, label: &str, raw: &str, rule: LengthRule) -> String {
        let value = raw.trim();
        let length = value.chars().count();
        if length < rule.min {
            self.push(
                field,
                format!("{label} must be at least {} characters", rule.min),
            );
        } else if length > rule.max {
            self.push(
                field,
                format!("{label} must be at most {} characters", rule.max),
            );
        }
        value.to_string()
    }

    fn choice<T>(
        &mut self,
        field: &'static str,
        raw: &str,
        parse: fn(&str) -> Option<T>,
        accepted: fn() -> String,
    ) -> Option<T> {
        let parsed = parse(raw);
        if parsed.is_none() {
            self.push(
                field,
                format!("'{}' is not one of: {}", raw.trim(), accepted()),
            );
        }
        parsed
    }
}

fn optional_text(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || normalized.iter().any(|existing| existing == tag) {
            continue;
        }
        normalized.push(tag.to_string());
    }
    normalized
}

/// Checks a raw intake submission and produces the normalized insert payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntakeValidator;

impl IntakeValidator {
    /// Validate every field and report all violations together.
    pub fn validate(
        &self,
        submission: IntakeSubmission,
    ) -> Result<IntakeFormInsert, ValidationErrors> {
        let mut report = Report::default();

        let contact_name = report.text(
            "contact_name",
            "Contact name",
            &submission.contact_name,
            CONTACT_NAME,
        );

        let contact_email = submission.contact_email.trim().to_ascii_lowercase();
        if !is_valid_email(&contact_email) {
            report.push("contact_email", "Please enter a valid email address");
        }

        let project_name = report.text(
            "project_name",
            "Project name",
            &submission.project_name,
            PROJECT_NAME,
        );
        let project_type = report.choice(
            "project_type",
            &submission.project_type,
            ProjectType::parse,
            ProjectType::accepted,
        );
        let project_description = report.text(
            "project_description",
            "Project description",
            &submission.project_description,
            PROJECT_DESCRIPTION,
        );
        let key_requirements = report.text(
            "key_requirements",
            "Key requirements",
            &submission.key_requirements,
            KEY_REQUIREMENTS,
        );
        let timeline = report.choice(
            "timeline",
            &submission.timeline,
            Timeline::parse,
            Timeline::accepted,
        );
        let budget_range = report.choice(
            "budget_range",
            &submission.budget_range,
            BudgetRange::parse,
            BudgetRange::accepted,
        );
        let budget_flexibility = match optional_text(submission.budget_flexibility) {
            Some(raw) => report.choice(
                "budget_flexibility",
                &raw,
                BudgetFlexibility::parse,
                BudgetFlexibility::accepted,
            ),
            None => None,
        };

        let (Some(project_type), Some(timeline), Some(budget_range)) =
            (project_type, timeline, budget_range)
        else {
            return Err(ValidationErrors {
                violations: report.violations,
            });
        };
        if !report.violations.is_empty() {
            return Err(ValidationErrors {
                violations: report.violations,
            });
        }

        Ok(IntakeFormInsert {
            user_id: optional_text(submission.user_id),
            contact_name,
            contact_email,
            contact_phone: optional_text(submission.contact_phone),
            company_name: optional_text(submission.company_name),
            project_name,
            project_type,
            project_description,
            key_requirements,
            tech_stack_preferences: normalize_tags(submission.tech_stack_preferences),
            timeline,
            budget_range,
            budget_flexibility,
            timezone: optional_text(submission.timezone)
                .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
        })
    }
}
