//! Session provider facade: sign-in flows, error translation, and auth events.

pub mod errors;
pub mod events;
pub mod provider;
pub mod service;
pub mod session;


pub use errors::{AuthErrorKind, ProviderError};
pub use events::{AuthEvent, AuthEventBus, AuthSubscription};
pub use provider::{AuthProvider, MemoryAuthProvider};
pub use service::AuthService;
pub use session::{OAuthProvider, Session, SignUpRequest, User, UserRole};
