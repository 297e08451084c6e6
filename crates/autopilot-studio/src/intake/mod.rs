//! Intake qualification: validation, scoring, lifecycle, storage, and HTTP routes.

pub mod domain;
pub mod export;
pub mod lifecycle;
pub mod notify;
pub mod query;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    BudgetFlexibility, BudgetRange, IntakeForm, IntakeFormInsert, IntakeFormPatch, IntakeId,
    IntakePriority, IntakeScore, IntakeStatus, IntakeSubmission, ProjectType, ScoreAssessment,
    ScoreId, Timeline,
};
pub use lifecycle::{
    allowed_transitions, manual_transitions, validate_manual_transition, validate_transition,
    TransitionError,
};
pub use notify::{Notification, NotificationKind, Notifier, NotifyError, RecordingNotifier};
pub use query::{IntakeOrder, IntakeQuery, SortDirection};
pub use repository::{IntakeStore, MemoryIntakeStore, RepositoryError};
pub use router::intake_router;
pub use service::{IntakeService, IntakeServiceError, SubmissionReceipt};
pub use validation::{FieldViolation, IntakeValidator, ValidationErrors};
