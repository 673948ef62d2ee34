use serde_json::json;

use storefront_core::auth::{AuthService, AuthToken};
use storefront_core::error::ClientError;
use storefront_core::gateway::ApiGateway;

const USER_ID: &str = "aaaaaaaaaaaaaaaaaaaaaaaa";

fn service(server: &mockito::Server, initial_token: Option<&str>) -> (AuthService, AuthToken) {
    let token = AuthToken::new(initial_token.map(str::to_string));
    let gateway = ApiGateway::new(server.url(), token.clone());
    (AuthService::new(gateway, token.clone()), token)
}

fn login_body() -> String {
    json!({
        "success": true,
        "data": {
            "token": "fresh-session-token",
            "user": {"id": USER_ID, "email": "shopper@example.com", "role": "user"}
        }
    })
    .to_string()
}

#[tokio::test]
async fn login_stores_the_shared_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/auth/login")
        .match_body(mockito::Matcher::Json(
            json!({"email": "shopper@example.com", "password": "hunter2"}),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(login_body())
        .create_async()
        .await;

    let (auth, token) = service(&server, None);
    let user = auth
        .login("shopper@example.com", "hunter2")
        .await
        .expect("login");

    assert_eq!(user.email, "shopper@example.com");
    assert_eq!(
        token.get().as_deref().map(String::as_str),
        Some("fresh-session-token")
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn incomplete_login_response_clears_the_token_and_fails() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/auth/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": {"user": {"id": "x", "email": "shopper@example.com"}}}"#)
        .create_async()
        .await;

    // A stale credential must not survive a broken login.
    let (auth, token) = service(&server, Some("stale-token"));
    let err = auth
        .login("shopper@example.com", "hunter2")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Decode(_)));
    assert!(!token.is_set());
}

#[tokio::test]
async fn register_logs_in_afterwards() {
    let mut server = mockito::Server::new_async().await;
    let register = server
        .mock("POST", "/api/auth/register")
        .match_body(mockito::Matcher::Json(
            json!({"email": "shopper@example.com", "password": "hunter2"}),
        ))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": null}"#)
        .expect(1)
        .create_async()
        .await;
    let login = server
        .mock("POST", "/api/auth/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(login_body())
        .expect(1)
        .create_async()
        .await;

    let (auth, token) = service(&server, None);
    let user = auth
        .register("shopper@example.com", "hunter2")
        .await
        .expect("register");

    assert_eq!(user.id, USER_ID);
    assert!(token.is_set());
    register.assert_async().await;
    login.assert_async().await;
}

// Logout is best effort: a server failure is swallowed and the local
// credential is cleared regardless.
#[tokio::test]
async fn logout_clears_the_token_even_when_the_server_fails() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/auth/logout")
        .with_status(500)
        .with_body("session store unavailable")
        .expect(1)
        .create_async()
        .await;

    let (auth, token) = service(&server, Some("live-token"));
    auth.logout().await;

    assert!(!token.is_set());
    mock.assert_async().await;
}

#[tokio::test]
async fn logout_without_a_session_skips_the_network() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/auth/logout")
        .expect(0)
        .create_async()
        .await;

    let (auth, token) = service(&server, None);
    auth.logout().await;

    assert!(!token.is_set());
    mock.assert_async().await;
}

#[tokio::test]
async fn me_requires_a_session() {
    let server = mockito::Server::new_async().await;
    let (auth, _token) = service(&server, None);

    assert!(matches!(auth.me().await, Err(ClientError::AuthRequired)));
}
