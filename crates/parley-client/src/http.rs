//! Auth service over HTTP.
//!
//! Signup posts a JSON body to `{base}/signup`; login posts an
//! `application/x-www-form-urlencoded` body to `{base}/login`. Both answer
//! `{"access_token": ..., "token_type": "bearer"}` on success and
//! `{"detail": ...}` on failure.

use std::time::Duration;

use parley_core::Credential;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthClient, AuthError, AuthFailure, AuthKind};

#[derive(Serialize)]
struct SignupBody<'a> {
    username: &'a str,
    password: &'a str,
}

/// Default bound on one auth request, from connect to the last body byte.
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    token_type: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// [`AuthClient`] backed by the HTTP auth service.
#[derive(Debug, Clone)]
pub struct HttpAuthClient {
    base: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpAuthClient {
    /// Client for the service at `base`, e.g. `https://chat.example.com`.
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_client(base, reqwest::Client::new())
    }

    /// Client using a preconfigured [`reqwest::Client`].
    pub fn with_client(base: impl Into<String>, client: reqwest::Client) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self { base, client, timeout: DEFAULT_AUTH_TIMEOUT }
    }

    /// Replace the per-request timeout. An expired request fails with
    /// [`AuthFailure::TransportFailure`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Service base address.
    pub fn base(&self) -> &str {
        &self.base
    }

    async fn finish(
        kind: AuthKind,
        username: &str,
        response: reqwest::Response,
    ) -> Result<Credential, AuthError> {
        let status = response.status();

        if status.is_success() {
            let token: TokenResponse = response.json().await.map_err(|e| {
                AuthError::with_detail(AuthFailure::ServerError, format!("malformed response: {e}"))
            })?;

            if token.access_token.is_empty() {
                return Err(AuthError::with_detail(AuthFailure::ServerError, "empty access token"));
            }

            tracing::debug!(%kind, username, "authenticated");
            return Ok(Credential::new(token.access_token, username));
        }

        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail)
            .map(|detail| match detail {
                serde_json::Value::String(text) => text,
                other => other.to_string(),
            });

        let reason = classify(kind, status, detail.as_deref());
        tracing::debug!(%kind, username, %status, ?reason, "auth rejected");

        Err(AuthError { reason, detail: Some(detail.unwrap_or_else(|| format!("HTTP {status}"))) })
    }
}

/// Map a failed response onto the failure taxonomy.
///
/// Only statuses that judge the submitted username and password count as a
/// credential problem. Anything else (a wrong path, a wrong method, rate
/// limiting) is the service's fault.
fn classify(kind: AuthKind, status: StatusCode, detail: Option<&str>) -> AuthFailure {
    let taken = detail.is_some_and(|d| d.to_ascii_lowercase().contains("already exists"));

    match status {
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT if kind == AuthKind::Signup && taken => {
            AuthFailure::AlreadyExists
        },
        StatusCode::BAD_REQUEST
        | StatusCode::UNAUTHORIZED
        | StatusCode::FORBIDDEN
        | StatusCode::CONFLICT
        | StatusCode::UNPROCESSABLE_ENTITY => AuthFailure::InvalidCredentials,
        _ => AuthFailure::ServerError,
    }
}

fn transport_error(err: &reqwest::Error) -> AuthError {
    AuthError::with_detail(AuthFailure::TransportFailure, err.to_string())
}

impl AuthClient for HttpAuthClient {
    async fn login(&self, username: &str, password: &str) -> Result<Credential, AuthError> {
        let response = self
            .client
            .post(format!("{}/login", self.base))
            .form(&[("username", username), ("password", password)])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        Self::finish(AuthKind::Login, username, response).await
    }

    async fn signup(&self, username: &str, password: &str) -> Result<Credential, AuthError> {
        let response = self
            .client
            .post(format!("{}/signup", self.base))
            .json(&SignupBody { username, password })
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        Self::finish(AuthKind::Signup, username, response).await
    }
}
