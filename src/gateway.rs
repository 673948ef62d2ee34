use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::AuthToken;
use crate::error::ClientError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// What a successful call produced: a 204 is reported as-is, never parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    NoContent,
    Json(Value),
}

impl Payload {
    fn into_value(self) -> Value {
        match self {
            Payload::NoContent => Value::Null,
            Payload::Json(value) => value,
        }
    }
}

/// Single chokepoint for all backend traffic: attaches the bearer credential,
/// speaks JSON both ways, unwraps the `{success, data}` envelope and normalizes
/// failures into [`ClientError`]. Stateless between calls except for the shared
/// credential handle.
#[derive(Clone)]
pub struct ApiGateway {
    http: Client,
    base_url: String,
    auth: AuthToken,
}

impl ApiGateway {
    pub fn new(base_url: impl Into<String>, auth: AuthToken) -> Self {
        Self::with_timeout(base_url, auth, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, auth: AuthToken, timeout: Duration) -> Self {
        // Building with a static configuration can only fail on a broken TLS
        // backend; that is a programming error, not a runtime condition.
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .expect("http client with static configuration");

        Self {
            http,
            base_url: base_url.into(),
            auth,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Read-only view of the shared credential.
    pub fn auth(&self) -> &AuthToken {
        &self.auth
    }

    /// Performs a call and unwraps the response envelope when one is present.
    /// `success: true` yields the `data` field; anything else (no envelope,
    /// `success: false`) is returned as parsed — propagating an explicit
    /// `success: false` is the caller's responsibility.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Payload, ClientError> {
        let payload = self.request(method, path, body).await?;
        Ok(match payload {
            Payload::Json(value) => Payload::Json(unwrap_envelope(value)),
            other => other,
        })
    }

    /// Like [`call`](Self::call) but leaves the envelope intact, for endpoints
    /// that carry metadata (e.g. pagination) next to `data`.
    pub async fn call_raw(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Payload, ClientError> {
        self.request(method, path, body).await
    }

    /// GET with envelope unwrapping and a typed decode.
    pub async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(Method::GET, path, None).await
    }

    /// GET without envelope unwrapping, with a typed decode.
    pub async fn fetch_raw<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        decode(self.call_raw(Method::GET, path, None).await?)
    }

    /// Call plus a typed decode of the unwrapped payload. Malformed backend
    /// responses fail here with [`ClientError::Decode`] instead of leaking
    /// loosely-typed values further up.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ClientError> {
        decode(self.call(method, path, body).await?)
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Payload, ClientError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(ACCEPT, "application/json");
        if let Some(token) = self.auth.get() {
            request = request.bearer_auth(token.as_str());
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = error_message(status, &text);
            tracing::debug!(%method, path, status = status.as_u16(), "request failed: {message}");
            return Err(ClientError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Payload::NoContent);
        }

        let text = response.text().await?;
        // A 2xx body that is not valid JSON is treated as an absent value.
        let value = serde_json::from_str(&text).unwrap_or(Value::Null);
        Ok(Payload::Json(value))
    }
}

fn decode<T: DeserializeOwned>(payload: Payload) -> Result<T, ClientError> {
    serde_json::from_value(payload.into_value()).map_err(|err| ClientError::Decode(err.to_string()))
}

fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(map) if map.get("success").map_or(false, Value::is_boolean) => {
            if map.get("success").and_then(Value::as_bool) == Some(true) {
                map.get("data").cloned().unwrap_or(Value::Null)
            } else {
                Value::Object(map)
            }
        }
        other => other,
    }
}

/// Pulls a human-readable message out of an error body: a non-empty string
/// `message` or `error` field, then the raw text, then the status line.
fn error_message(status: StatusCode, body: &str) -> String {
    if !body.is_empty() {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
            for key in ["message", "error"] {
                if let Some(candidate) = map.get(key).and_then(Value::as_str) {
                    if !candidate.trim().is_empty() {
                        return candidate.to_string();
                    }
                }
            }
        }
        return body.to_string();
    }

    format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("request failed")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthToken;
    use serde_json::json;

    #[test]
    fn constructs_with_a_custom_timeout() {
        let gateway = ApiGateway::with_timeout(
            "http://localhost:0/",
            AuthToken::default(),
            Duration::from_secs(5),
        );
        assert_eq!(gateway.base_url(), "http://localhost:0/");
    }

    #[test]
    fn unwraps_successful_envelope() {
        let value = json!({"success": true, "data": {"id": "abc"}});
        assert_eq!(unwrap_envelope(value), json!({"id": "abc"}));
    }

    #[test]
    fn successful_envelope_without_data_yields_null() {
        assert_eq!(unwrap_envelope(json!({"success": true})), Value::Null);
    }

    #[test]
    fn failed_envelope_is_returned_as_is() {
        let value = json!({"success": false, "message": "nope"});
        assert_eq!(unwrap_envelope(value.clone()), value);
    }

    #[test]
    fn non_envelope_values_pass_through() {
        assert_eq!(unwrap_envelope(json!([1, 2])), json!([1, 2]));
        assert_eq!(unwrap_envelope(json!({"id": 1})), json!({"id": 1}));
        // "success" that is not a boolean is not an envelope
        assert_eq!(
            unwrap_envelope(json!({"success": "yes"})),
            json!({"success": "yes"})
        );
    }

    #[test]
    fn error_message_prefers_message_field() {
        let status = StatusCode::BAD_REQUEST;
        assert_eq!(
            error_message(status, r#"{"message": "invalid product"}"#),
            "invalid product"
        );
        assert_eq!(
            error_message(status, r#"{"error": "broken"}"#),
            "broken"
        );
    }

    #[test]
    fn error_message_falls_back_to_raw_text() {
        let status = StatusCode::BAD_GATEWAY;
        assert_eq!(error_message(status, "upstream exploded"), "upstream exploded");
        assert_eq!(error_message(status, r#"{"message": "  "}"#), r#"{"message": "  "}"#);
    }

    #[test]
    fn error_message_falls_back_to_status_line() {
        assert_eq!(error_message(StatusCode::NOT_FOUND, ""), "404 Not Found");
    }
}
