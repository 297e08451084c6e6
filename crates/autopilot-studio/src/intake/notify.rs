use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::domain::IntakeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Info,
    Error,
}

/// Toast payload shown to whoever triggered the mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intake_id: Option<IntakeId>,
}

/// Outbound toast hook. Delivery is best effort: callers log failures and move on.
pub trait Notifier: Send + Sync {
    fn publish(&self, notification: Notification) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Keeps every published notification, newest last.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn publish(&self, notification: Notification) -> Result<(), NotifyError> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| NotifyError::Transport("notification log poisoned".to_string()))?;
        events.push(notification);
        Ok(())
    }
}
