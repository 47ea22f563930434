//! Authentication contract.
//!
//! The [`AuthClient`] trait decouples the session from how credentials are
//! obtained. The HTTP implementation lives behind the `transport` feature; the
//! simulation harness provides an in-memory one.

use std::{fmt, future::Future};

use parley_core::Credential;
use thiserror::Error;

/// Which auth operation to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    /// Existing account.
    Login,
    /// New account.
    Signup,
}

impl fmt::Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => f.write_str("login"),
            Self::Signup => f.write_str("signup"),
        }
    }
}

/// Login or signup request.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthRequest {
    /// Operation.
    pub kind: AuthKind,
    /// Account name.
    pub username: String,
    /// Account password. Never logged.
    pub password: String,
}

impl AuthRequest {
    /// Login request.
    pub fn login(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { kind: AuthKind::Login, username: username.into(), password: password.into() }
    }

    /// Signup request.
    pub fn signup(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { kind: AuthKind::Signup, username: username.into(), password: password.into() }
    }
}

impl fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthRequest")
            .field("kind", &self.kind)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Why authentication failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Username/password rejected.
    InvalidCredentials,
    /// Signup for a username that is taken.
    AlreadyExists,
    /// Service could not be reached.
    TransportFailure,
    /// Service answered with an unexpected error.
    ServerError,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::InvalidCredentials => "invalid username or password",
            Self::AlreadyExists => "username already exists",
            Self::TransportFailure => "auth service unreachable",
            Self::ServerError => "auth service error",
        };
        f.write_str(text)
    }
}

/// Authentication error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}{}", detail_suffix(.detail.as_deref()))]
pub struct AuthError {
    /// Failure category.
    pub reason: AuthFailure,
    /// Detail from the service or transport, if any.
    pub detail: Option<String>,
}

impl AuthError {
    /// Error without detail.
    pub fn new(reason: AuthFailure) -> Self {
        Self { reason, detail: None }
    }

    /// Error with a detail message.
    pub fn with_detail(reason: AuthFailure, detail: impl Into<String>) -> Self {
        Self { reason, detail: Some(detail.into()) }
    }

    /// True if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self.reason, AuthFailure::TransportFailure)
    }
}

fn detail_suffix(detail: Option<&str>) -> String {
    detail.map(|d| format!(": {d}")).unwrap_or_default()
}

/// Client for the authentication service.
///
/// # Implementations
///
/// - [`crate::http::HttpAuthClient`]: HTTP service (`transport` feature)
/// - `SimAuthService` in the harness: in-memory accounts
pub trait AuthClient: Send + Sync {
    /// Exchange a username and password for a credential.
    ///
    /// # Errors
    ///
    /// - `AuthFailure::InvalidCredentials` if the service rejects the pair
    /// - `AuthFailure::TransportFailure` / `ServerError` on service problems
    fn login(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<Credential, AuthError>> + Send;

    /// Create an account and return its credential.
    ///
    /// # Errors
    ///
    /// - `AuthFailure::AlreadyExists` if the username is taken
    /// - `AuthFailure::TransportFailure` / `ServerError` on service problems
    fn signup(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<Credential, AuthError>> + Send;

    /// Dispatch `request` to [`Self::login`] or [`Self::signup`].
    fn authenticate(
        &self,
        request: &AuthRequest,
    ) -> impl Future<Output = Result<Credential, AuthError>> + Send {
        async move {
            match request.kind {
                AuthKind::Login => self.login(&request.username, &request.password).await,
                AuthKind::Signup => self.signup(&request.username, &request.password).await,
            }
        }
    }
}
