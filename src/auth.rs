use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::error::ClientError;
use crate::gateway::ApiGateway;

/// Process-wide bearer credential, passed explicitly to every consumer instead
/// of living in a mutable global. `AuthService` is the single writer; the
/// gateway and anything else only read it.
#[derive(Clone, Default)]
pub struct AuthToken {
    inner: Arc<ArcSwapOption<String>>,
}

impl AuthToken {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            inner: Arc::new(ArcSwapOption::from(initial.map(Arc::new))),
        }
    }

    pub fn set(&self, token: String) {
        self.inner.store(Some(Arc::new(token)));
    }

    pub fn clear(&self) {
        self.inner.store(None);
    }

    pub fn get(&self) -> Option<Arc<String>> {
        self.inner.load_full()
    }

    pub fn is_set(&self) -> bool {
        self.inner.load().is_some()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the credential itself.
        f.debug_struct("AuthToken")
            .field("set", &self.is_set())
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<AuthUser>,
}

/// Login, register, logout and session lookup. Holds the only writing handle
/// to the shared [`AuthToken`].
pub struct AuthService {
    gateway: ApiGateway,
    token: AuthToken,
}

impl AuthService {
    pub fn new(gateway: ApiGateway, token: AuthToken) -> Self {
        Self { gateway, token }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthUser, ClientError> {
        let response: LoginResponse = self
            .gateway
            .send(
                Method::POST,
                "/api/auth/login",
                Some(json!({ "email": email, "password": password })),
            )
            .await?;

        match (response.token, response.user) {
            (Some(token), Some(user)) => {
                self.token.set(token);
                tracing::info!(user_id = %user.id, "logged in");
                Ok(user)
            }
            _ => {
                self.token.clear();
                Err(ClientError::Decode(
                    "login response missing token or user".to_string(),
                ))
            }
        }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<AuthUser, ClientError> {
        self.gateway
            .send::<serde_json::Value>(
                Method::POST,
                "/api/auth/register",
                Some(json!({ "email": email, "password": password })),
            )
            .await?;

        self.login(email, password).await
    }

    /// Best-effort: the remote call may fail (expired session, network); the
    /// local credential is cleared regardless.
    pub async fn logout(&self) {
        if self.token.is_set() {
            if let Err(err) = self
                .gateway
                .send::<serde_json::Value>(Method::POST, "/api/auth/logout", None)
                .await
            {
                tracing::debug!(error = %err, "logout call failed, clearing local session anyway");
            }
        }

        self.token.clear();
    }

    pub async fn me(&self) -> Result<AuthUser, ClientError> {
        if !self.token.is_set() {
            return Err(ClientError::AuthRequired);
        }

        self.gateway.fetch("/api/auth/me").await
    }
}
