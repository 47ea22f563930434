//! In-memory auth service.
//!
//! Behaves like the HTTP auth service: signup rejects taken usernames, login
//! rejects wrong passwords, and every success issues a fresh token (`T1`,
//! `T2`, ...). Clones share state, so the relay can validate tokens the
//! service issued.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use parley_client::{AuthClient, AuthError, AuthFailure, AuthKind, AuthRequest};
use parley_core::Credential;

#[derive(Default)]
struct AuthState {
    /// username → password
    users: HashMap<String, String>,
    /// token → username
    tokens: HashMap<String, String>,
    issued: u64,
    /// Failure returned by the next request instead of processing it.
    fail_next: Option<AuthError>,
    requests: Vec<AuthRequest>,
}

/// Shared in-memory auth service.
#[derive(Clone, Default)]
pub struct SimAuthService {
    state: Arc<Mutex<AuthState>>,
}

impl SimAuthService {
    /// Service with no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account.
    #[must_use]
    pub fn with_user(self, username: &str, password: &str) -> Self {
        self.lock().users.insert(username.to_string(), password.to_string());
        self
    }

    /// Make the next request fail with `error`.
    pub fn fail_next(&self, error: AuthError) {
        self.lock().fail_next = Some(error);
    }

    /// Username a token was issued for.
    pub fn token_owner(&self, token: &str) -> Option<String> {
        self.lock().tokens.get(token).cloned()
    }

    /// Revoke every token issued for `username`.
    pub fn revoke(&self, username: &str) {
        self.lock().tokens.retain(|_, owner| owner != username);
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<AuthRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn process(&self, request: AuthRequest) -> Result<Credential, AuthError> {
        let mut state = self.lock();
        state.requests.push(request.clone());

        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }

        let AuthRequest { kind, username, password } = request;
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::with_detail(
                AuthFailure::InvalidCredentials,
                "username & password required",
            ));
        }

        match kind {
            AuthKind::Signup => {
                if state.users.contains_key(&username) {
                    return Err(AuthError::with_detail(
                        AuthFailure::AlreadyExists,
                        "username already exists",
                    ));
                }
                state.users.insert(username.clone(), password);
            },
            AuthKind::Login => {
                if state.users.get(&username) != Some(&password) {
                    return Err(AuthError::with_detail(
                        AuthFailure::InvalidCredentials,
                        "Incorrect username or password",
                    ));
                }
            },
        }

        state.issued += 1;
        let token = format!("T{}", state.issued);
        state.tokens.insert(token.clone(), username.clone());
        tracing::debug!(%kind, %username, "sim auth issued token");

        Ok(Credential::new(token, username))
    }
}

impl AuthClient for SimAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<Credential, AuthError> {
        self.process(AuthRequest::login(username, password))
    }

    async fn signup(&self, username: &str, password: &str) -> Result<Credential, AuthError> {
        self.process(AuthRequest::signup(username, password))
    }
}
