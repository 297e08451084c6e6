use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::warn;

use super::session::User;

/// Events raised by the session provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(User),
    SignedOut,
    TokenRefreshed,
    UserUpdated(User),
    PasswordRecovery,
}

impl AuthEvent {
    /// Only sign-in and sign-out reach subscribers.
    pub fn is_session_change(&self) -> bool {
        matches!(self, AuthEvent::SignedIn(_) | AuthEvent::SignedOut)
    }
}

const EVENT_BUFFER: usize = 32;

/// Fan-out of auth events to registered callbacks.
#[derive(Debug, Clone)]
pub struct AuthEventBus {
    sender: broadcast::Sender<AuthEvent>,
}

impl Default for AuthEventBus {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUFFER);
        Self { sender }
    }
}

impl AuthEventBus {
    pub fn emit(&self, event: AuthEvent) {
        // no listeners is not an error
        let _ = self.sender.send(event);
    }

    /// Run `callback` for every sign-in and sign-out until the returned handle is dropped.
    /// Must be called from within a Tokio runtime.
    pub fn subscribe<F>(&self, callback: F) -> AuthSubscription
    where
        F: Fn(AuthEvent) + Send + 'static,
    {
        let mut receiver = self.sender.subscribe();
        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) if event.is_session_change() => callback(event),
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "auth listener fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        AuthSubscription { task }
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Cancellation handle for an auth subscription.
#[derive(Debug)]
pub struct AuthSubscription {
    task: JoinHandle<()>,
}

impl AuthSubscription {
    pub fn unsubscribe(self) {
        drop(self);
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
