use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use super::errors::ProviderError;
use super::session::{OAuthProvider, Session, SignUpRequest, User, UserRole};

/// Hosted session provider seam.
#[async_trait]
pub trait AuthProvider: Send + Sync + 'static {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ProviderError>;

    async fn sign_up(&self, request: SignUpRequest) -> Result<User, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;

    async fn current_user(&self) -> Result<Option<User>, ProviderError>;

    async fn current_session(&self) -> Result<Option<Session>, ProviderError>;

    async fn refresh_session(&self) -> Result<Session, ProviderError>;

    async fn request_password_reset(&self, email: &str) -> Result<(), ProviderError>;

    async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), ProviderError>;

    async fn verify_email(&self, token: &str) -> Result<User, ProviderError>;

    async fn oauth_url(
        &self,
        provider: OAuthProvider,
        redirect_to: Option<&str>,
    ) -> Result<String, ProviderError>;
}

const MIN_PASSWORD_LEN: usize = 6;
const SESSION_LIFETIME_MINUTES: i64 = 60;

#[derive(Debug)]
struct Account {
    user: User,
    password: String,
}

#[derive(Debug, Default)]
struct AuthState {
    accounts: HashMap<String, Account>,
    session: Option<Session>,
    reset_tokens: HashMap<String, String>,
    verification_tokens: HashMap<String, String>,
}

/// Process-local provider used by tests and local runs.
#[derive(Debug, Clone)]
pub struct MemoryAuthProvider {
    state: Arc<Mutex<AuthState>>,
    site_url: String,
    require_verification: bool,
}

impl Default for MemoryAuthProvider {
    fn default() -> Self {
        Self::new("http://localhost:3000")
    }
}

impl MemoryAuthProvider {
    pub fn new(site_url: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(AuthState::default())),
            site_url: site_url.into(),
            require_verification: true,
        }
    }

    /// Let unverified accounts sign in.
    pub fn without_verification(mut self) -> Self {
        self.require_verification = false;
        self
    }

    /// Token that would have been mailed after sign-up.
    pub fn verification_token_for(&self, email: &str) -> Option<String> {
        let state = self.lock().ok()?;
        find_token(&state.verification_tokens, email)
    }

    /// Token that would have been mailed after a reset request.
    pub fn reset_token_for(&self, email: &str) -> Option<String> {
        let state = self.lock().ok()?;
        find_token(&state.reset_tokens, email)
    }

    pub fn set_role(&self, email: &str, role: UserRole) -> Result<(), ProviderError> {
        let mut state = self.lock()?;
        let account = state
            .accounts
            .get_mut(&normalize(email))
            .ok_or_else(|| ProviderError::new("User not found", Some(404)))?;
        account.user.role = role;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, AuthState>, ProviderError> {
        self.state
            .lock()
            .map_err(|_| ProviderError::new("auth state lock poisoned", Some(500)))
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn find_token(tokens: &HashMap<String, String>, email: &str) -> Option<String> {
    let email = normalize(email);
    tokens
        .iter()
        .find(|(_, owner)| **owner == email)
        .map(|(token, _)| token.clone())
}

fn issue_session(user: User) -> Session {
    Session {
        access_token: Uuid::new_v4().simple().to_string(),
        refresh_token: Uuid::new_v4().simple().to_string(),
        expires_at: Utc::now() + Duration::minutes(SESSION_LIFETIME_MINUTES),
        token_type: "bearer".to_string(),
        user,
    }
}

fn invalid_credentials() -> ProviderError {
    ProviderError::new("Invalid login credentials", Some(400))
}

fn invalid_token() -> ProviderError {
    ProviderError::new("Token has expired or is invalid", Some(403))
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ProviderError> {
        let mut state = self.lock()?;
        let account = state
            .accounts
            .get(&normalize(email))
            .ok_or_else(invalid_credentials)?;
        if account.password != password {
            return Err(invalid_credentials());
        }
        if self.require_verification && !account.user.email_verified {
            return Err(ProviderError::new("Email not confirmed", Some(400)));
        }
        let session = issue_session(account.user.clone());
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_up(&self, request: SignUpRequest) -> Result<User, ProviderError> {
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ProviderError::new(
                "Password should be at least 6 characters",
                Some(422),
            ));
        }
        let email = normalize(&request.email);
        let mut state = self.lock()?;
        if state.accounts.contains_key(&email) {
            return Err(ProviderError::new("User already registered", Some(422)));
        }
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.clone(),
            name: request.name.filter(|name| !name.trim().is_empty()),
            avatar_url: None,
            email_verified: false,
            role: UserRole::default(),
        };
        state
            .verification_tokens
            .insert(Uuid::new_v4().simple().to_string(), email.clone());
        state.accounts.insert(
            email,
            Account {
                user: user.clone(),
                password: request.password,
            },
        );
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.lock()?.session = None;
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>, ProviderError> {
        Ok(self.current_session().await?.map(|session| session.user))
    }

    async fn current_session(&self) -> Result<Option<Session>, ProviderError> {
        let mut state = self.lock()?;
        if state
            .session
            .as_ref()
            .is_some_and(|session| session.is_expired(Utc::now()))
        {
            state.session = None;
        }
        Ok(state.session.clone())
    }

    async fn refresh_session(&self) -> Result<Session, ProviderError> {
        let mut state = self.lock()?;
        let user = state
            .session
            .as_ref()
            .map(|session| session.user.clone())
            .ok_or_else(|| ProviderError::new("Auth session missing!", Some(401)))?;
        let session = issue_session(user);
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        let email = normalize(email);
        let mut state = self.lock()?;
        // unknown addresses succeed silently so account existence does not leak
        if state.accounts.contains_key(&email) {
            state
                .reset_tokens
                .insert(Uuid::new_v4().simple().to_string(), email);
        }
        Ok(())
    }

    async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), ProviderError> {
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ProviderError::new(
                "Password should be at least 6 characters",
                Some(422),
            ));
        }
        let mut state = self.lock()?;
        let email = state.reset_tokens.remove(token).ok_or_else(invalid_token)?;
        let account = state.accounts.get_mut(&email).ok_or_else(invalid_token)?;
        account.password = new_password.to_string();
        Ok(())
    }

    async fn verify_email(&self, token: &str) -> Result<User, ProviderError> {
        let mut state = self.lock()?;
        let email = state
            .verification_tokens
            .remove(token)
            .ok_or_else(invalid_token)?;
        let account = state.accounts.get_mut(&email).ok_or_else(invalid_token)?;
        account.user.email_verified = true;
        Ok(account.user.clone())
    }

    async fn oauth_url(
        &self,
        provider: OAuthProvider,
        redirect_to: Option<&str>,
    ) -> Result<String, ProviderError> {
        let redirect = redirect_to
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}/auth/callback", self.site_url));
        Ok(format!(
            "{}/auth/v1/authorize?provider={}&redirect_to={}",
            self.site_url,
            urlencoding::encode(provider.as_str()),
            urlencoding::encode(&redirect)
        ))
    }
}

