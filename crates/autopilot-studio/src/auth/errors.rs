use serde::{Deserialize, Serialize};

/// Raw failure reported by the session provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
    pub status: Option<u16>,
}

impl ProviderError {
    pub fn new(message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }
}

/// Known provider failures. Anything unrecognized keeps its original text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthErrorKind {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("email not confirmed")]
    EmailNotConfirmed,
    #[error("user already registered")]
    UserAlreadyRegistered,
    #[error("password too weak")]
    WeakPassword,
    #[error("rate limited")]
    RateLimited,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("session missing")]
    SessionMissing,
    #[error("{0}")]
    Unknown(String),
}

const MESSAGE_TABLE: &[(&str, AuthErrorKind)] = &[
    ("Invalid login credentials", AuthErrorKind::InvalidCredentials),
    ("Email not confirmed", AuthErrorKind::EmailNotConfirmed),
    ("User already registered", AuthErrorKind::UserAlreadyRegistered),
    (
        "Password should be at least 6 characters",
        AuthErrorKind::WeakPassword,
    ),
    ("Email rate limit exceeded", AuthErrorKind::RateLimited),
    ("Token has expired or is invalid", AuthErrorKind::InvalidToken),
    ("Auth session missing!", AuthErrorKind::SessionMissing),
];

impl AuthErrorKind {
    pub fn from_message(message: &str) -> Self {
        let trimmed = message.trim();
        MESSAGE_TABLE
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(trimmed))
            .map(|(_, kind)| kind.clone())
            .unwrap_or_else(|| Self::Unknown(message.to_string()))
    }

    /// Text shown to the person signing in.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials => {
                "Invalid email or password. Please check your credentials and try again."
                    .to_string()
            }
            Self::EmailNotConfirmed => {
                "Please verify your email address before signing in.".to_string()
            }
            Self::UserAlreadyRegistered => {
                "An account with this email already exists. Try signing in instead.".to_string()
            }
            Self::WeakPassword => "Password must be at least 6 characters long.".to_string(),
            Self::RateLimited => {
                "Too many attempts. Please wait a moment and try again.".to_string()
            }
            Self::InvalidToken => {
                "This link has expired or is invalid. Please request a new one.".to_string()
            }
            Self::SessionMissing => "Your session has expired. Please sign in again.".to_string(),
            Self::Unknown(message) => message.clone(),
        }
    }
}

impl From<&ProviderError> for AuthErrorKind {
    fn from(err: &ProviderError) -> Self {
        Self::from_message(&err.message)
    }
}
