use super::domain::IntakeStatus;

/// Rejected status change. The record keeps its current status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot move intake from {from} to {to} (allowed: {})", format_allowed(.from))]
pub struct TransitionError {
    pub from: IntakeStatus,
    pub to: IntakeStatus,
}

fn format_allowed(from: &IntakeStatus) -> String {
    let allowed = manual_transitions(*from);
    if allowed.is_empty() {
        "none".to_string()
    } else {
        allowed
            .iter()
            .map(|status| status.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Statuses reachable from `from` in one step.
pub fn allowed_transitions(from: IntakeStatus) -> &'static [IntakeStatus] {
    use IntakeStatus::*;
    match from {
        Submitted => &[UnderReview, Archived],
        UnderReview => &[Qualified, Disqualified, Archived],
        Qualified => &[Scheduled, Archived],
        Scheduled => &[Completed, Archived],
        Disqualified | Completed => &[Archived],
        Archived => &[],
    }
}

pub fn validate_transition(from: IntakeStatus, to: IntakeStatus) -> Result<(), TransitionError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(TransitionError { from, to })
    }
}

/// Statuses a reviewer may pick by hand. `under_review` is only entered once scoring
/// completes.
pub fn manual_transitions(from: IntakeStatus) -> Vec<IntakeStatus> {
    allowed_transitions(from)
        .iter()
        .copied()
        .filter(|status| *status != IntakeStatus::UnderReview)
        .collect()
}

pub fn validate_manual_transition(
    from: IntakeStatus,
    to: IntakeStatus,
) -> Result<(), TransitionError> {
    if manual_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(TransitionError { from, to })
    }
}

/// Statuses with no onward transition other than archiving.
pub fn is_terminal(status: IntakeStatus) -> bool {
    allowed_transitions(status)
        .iter()
        .all(|next| *next == IntakeStatus::Archived)
}
