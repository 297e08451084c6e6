use serde::{Deserialize, Serialize};

use super::super::domain::IntakePriority;

/// Qualitative label for an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreLabel {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl ScoreLabel {
    pub const fn from_score(score: u8) -> Self {
        match score {
            90.. => Self::Excellent,
            80..=89 => Self::VeryGood,
            70..=79 => Self::Good,
            60..=69 => Self::Fair,
            40..=59 => Self::Poor,
            _ => Self::VeryPoor,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::VeryGood => "Very Good",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
        }
    }
}

/// Colour coding used by dashboards. Bands are 80/60/40, not the 90/80/70/60/40 of
/// [`ScoreLabel`]; the two tables are kept apart on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Green,
    Yellow,
    Orange,
    Red,
}

impl ScoreBand {
    pub const fn from_score(score: u8) -> Self {
        match score {
            80.. => Self::Green,
            60..=79 => Self::Yellow,
            40..=59 => Self::Orange,
            _ => Self::Red,
        }
    }
}

pub const QUALIFIED_THRESHOLD: u8 = 70;

/// Binary outcome announced right after a submission is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Qualified,
    NeedsReview,
}

impl SubmissionOutcome {
    pub const fn from_score(score: u8) -> Self {
        if score >= QUALIFIED_THRESHOLD {
            Self::Qualified
        } else {
            Self::NeedsReview
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Qualified => "qualified",
            Self::NeedsReview => "needs review",
        }
    }

    pub fn toast_message(self, score: u8) -> String {
        match self {
            Self::Qualified => format!(
                "Great news! Your project scored {score}/100 and looks like a strong fit. We'll be in touch to schedule a discovery call."
            ),
            Self::NeedsReview => format!(
                "Thanks! Your project scored {score}/100. Our team will review the details and follow up shortly."
            ),
        }
    }
}

/// Priority assigned when a score lands. `Urgent` is reserved for manual escalation.
pub const fn priority_for(score: u8) -> IntakePriority {
    match score {
        85.. => IntakePriority::High,
        60..=84 => IntakePriority::Medium,
        _ => IntakePriority::Low,
    }
}

/// Everything the dashboard derives from one overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreInterpretation {
    pub score: u8,
    pub label: ScoreLabel,
    pub band: ScoreBand,
    pub outcome: SubmissionOutcome,
    pub priority: IntakePriority,
}

impl ScoreInterpretation {
    pub const fn of(score: u8) -> Self {
        Self {
            score,
            label: ScoreLabel::from_score(score),
            band: ScoreBand::from_score(score),
            outcome: SubmissionOutcome::from_score(score),
            priority: priority_for(score),
        }
    }
}
