//! Scoring request construction, the AI collaborator seam, and score interpretation.

mod client;
mod interpret;
mod request;

pub use client::{check_assessment, HttpScoringClient, ScoringClient, ScoringError, MAX_SCORE};
pub use interpret::{
    priority_for, ScoreBand, ScoreInterpretation, ScoreLabel, SubmissionOutcome,
    QUALIFIED_THRESHOLD,
};
pub use request::{ScoringContact, ScoringProject, ScoringRequest};
