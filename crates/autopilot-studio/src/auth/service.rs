use std::sync::Arc;

use tracing::{info, warn};

use super::errors::{AuthErrorKind, ProviderError};
use super::events::{AuthEvent, AuthEventBus, AuthSubscription};
use super::provider::AuthProvider;
use super::session::{OAuthProvider, Session, SignUpRequest, User};
use crate::outcome::ActionResult;

/// Facade over an [`AuthProvider`] that reports every call as an [`ActionResult`].
#[derive(Debug)]
pub struct AuthService<P> {
    provider: Arc<P>,
    events: AuthEventBus,
}

impl<P> Clone for AuthService<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            events: self.events.clone(),
        }
    }
}

impl<P: AuthProvider> AuthService<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            events: AuthEventBus::default(),
        }
    }

    pub fn events(&self) -> &AuthEventBus {
        &self.events
    }

    /// Register a callback for sign-in and sign-out. Dropping the handle cancels it.
    pub fn on_auth_state_change<F>(&self, callback: F) -> AuthSubscription
    where
        F: Fn(AuthEvent) + Send + 'static,
    {
        self.events.subscribe(callback)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> ActionResult<Session> {
        match self.provider.sign_in(email, password).await {
            Ok(session) => {
                info!(user_id = %session.user.id, "signed in");
                self.events.emit(AuthEvent::SignedIn(session.user.clone()));
                ActionResult::ok(session)
            }
            Err(err) => failure("sign_in", err),
        }
    }

    pub async fn sign_up(&self, request: SignUpRequest) -> ActionResult<User> {
        match self.provider.sign_up(request).await {
            Ok(user) => {
                info!(user_id = %user.id, "account created");
                ActionResult::ok(user)
            }
            Err(err) => failure("sign_up", err),
        }
    }

    pub async fn sign_out(&self) -> ActionResult<()> {
        match self.provider.sign_out().await {
            Ok(()) => {
                self.events.emit(AuthEvent::SignedOut);
                ActionResult::ok(())
            }
            Err(err) => failure("sign_out", err),
        }
    }

    pub async fn current_user(&self) -> ActionResult<Option<User>> {
        self.provider
            .current_user()
            .await
            .map_or_else(|err| failure("current_user", err), ActionResult::ok)
    }

    pub async fn current_session(&self) -> ActionResult<Option<Session>> {
        self.provider
            .current_session()
            .await
            .map_or_else(|err| failure("current_session", err), ActionResult::ok)
    }

    pub async fn refresh_session(&self) -> ActionResult<Session> {
        match self.provider.refresh_session().await {
            Ok(session) => {
                self.events.emit(AuthEvent::TokenRefreshed);
                ActionResult::ok(session)
            }
            Err(err) => failure("refresh_session", err),
        }
    }

    pub async fn request_password_reset(&self, email: &str) -> ActionResult<()> {
        self.provider
            .request_password_reset(email)
            .await
            .map_or_else(|err| failure("request_password_reset", err), ActionResult::ok)
    }

    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> ActionResult<()> {
        match self.provider.confirm_password_reset(token, new_password).await {
            Ok(()) => {
                self.events.emit(AuthEvent::PasswordRecovery);
                ActionResult::ok(())
            }
            Err(err) => failure("confirm_password_reset", err),
        }
    }

    pub async fn verify_email(&self, token: &str) -> ActionResult<User> {
        match self.provider.verify_email(token).await {
            Ok(user) => {
                self.events.emit(AuthEvent::UserUpdated(user.clone()));
                ActionResult::ok(user)
            }
            Err(err) => failure("verify_email", err),
        }
    }

    pub async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: Option<&str>,
    ) -> ActionResult<String> {
        self.provider
            .oauth_url(provider, redirect_to)
            .await
            .map_or_else(|err| failure("sign_in_with_oauth", err), ActionResult::ok)
    }
}

fn failure<T>(operation: &'static str, err: ProviderError) -> ActionResult<T> {
    let kind = AuthErrorKind::from(&err);
    warn!(operation, status = ?err.status, error = %err, "auth provider call failed");
    ActionResult::failed(kind.user_message())
}
