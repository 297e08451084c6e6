//! Intake qualification pipeline behind the Autopilot Studio client dashboard.
//!
//! Prospective clients submit an intake form, the form is validated and scored by an
//! external AI collaborator, and the score drives qualification status and priority.

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod intake;
pub mod outcome;
pub mod telemetry;
