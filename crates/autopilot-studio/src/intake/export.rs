use std::borrow::Cow;

use serde::Serialize;

use super::domain::IntakeForm;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("could not write intake export: {0}")]
    Csv(#[from] csv::Error),
    #[error("intake export buffer unavailable: {0}")]
    Buffer(String),
}

#[derive(Serialize)]
struct ExportRow<'a> {
    id: &'a str,
    created_at: String,
    status: &'static str,
    priority: &'static str,
    contact_name: Cow<'a, str>,
    contact_email: Cow<'a, str>,
    company_name: Cow<'a, str>,
    project_name: Cow<'a, str>,
    project_type: &'static str,
    timeline: &'static str,
    budget_range: &'static str,
    qualification_score: Option<u8>,
    confidence_score: Option<u8>,
}

impl<'a> From<&'a IntakeForm> for ExportRow<'a> {
    fn from(form: &'a IntakeForm) -> Self {
        Self {
            id: &form.id.0,
            created_at: form.created_at.to_rfc3339(),
            status: form.status.label(),
            priority: form.priority.label(),
            contact_name: spreadsheet_safe(&form.contact_name),
            contact_email: spreadsheet_safe(&form.contact_email),
            company_name: spreadsheet_safe(form.company_name.as_deref().unwrap_or_default()),
            project_name: spreadsheet_safe(&form.project_name),
            project_type: form.project_type.as_str(),
            timeline: form.timeline.as_str(),
            budget_range: form.budget_range.as_str(),
            qualification_score: form.qualification_score,
            confidence_score: form.confidence_score,
        }
    }
}

/// Prefix client-entered text that a spreadsheet would evaluate as a formula.
fn spreadsheet_safe(value: &str) -> Cow<'_, str> {
    match value.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => Cow::Owned(format!("'{value}")),
        _ => Cow::Borrowed(value),
    }
}

/// Render forms as CSV with a header row, in the order given.
pub fn forms_to_csv(forms: &[IntakeForm]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if forms.is_empty() {
        writer.write_record([
            "id",
            "created_at",
            "status",
            "priority",
            "contact_name",
            "contact_email",
            "company_name",
            "project_name",
            "project_type",
            "timeline",
            "budget_range",
            "qualification_score",
            "confidence_score",
        ])?;
    }
    for form in forms {
        writer.serialize(ExportRow::from(form))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Buffer(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| ExportError::Buffer(err.to_string()))
}
