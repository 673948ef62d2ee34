use reqwest::Method;
use serde_json::{json, Value};

use storefront_core::auth::AuthToken;
use storefront_core::domain::cart::CartState;
use storefront_core::domain::product::ProductPage;
use storefront_core::error::ClientError;
use storefront_core::gateway::{ApiGateway, Payload};

fn gateway(server: &mockito::Server, token: Option<&str>) -> ApiGateway {
    ApiGateway::new(server.url(), AuthToken::new(token.map(str::to_string)))
}

#[tokio::test]
async fn attaches_bearer_credential_when_set() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/cart")
        .match_header("authorization", "Bearer secret-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": {"items": [], "totalAmount": 0}}"#)
        .create_async()
        .await;

    let cart: CartState = gateway(&server, Some("secret-token"))
        .fetch("/api/cart")
        .await
        .expect("cart");

    assert!(cart.items.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn omits_authorization_header_without_credential() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/products/abc")
        .match_header("authorization", mockito::Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "abc", "name": "Shirt", "price": 10}"#)
        .create_async()
        .await;

    let value: Value = gateway(&server, None)
        .fetch("/api/products/abc")
        .await
        .expect("product");

    assert_eq!(value["name"], "Shirt");
    mock.assert_async().await;
}

#[tokio::test]
async fn unwraps_success_envelope() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/thing")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": {"id": 7}}"#)
        .create_async()
        .await;

    let payload = gateway(&server, None)
        .call(Method::GET, "/api/thing", None)
        .await
        .expect("payload");

    assert_eq!(payload, Payload::Json(json!({"id": 7})));
}

#[tokio::test]
async fn failed_envelope_is_not_an_error_at_this_layer() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/thing")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": false, "message": "not today"}"#)
        .create_async()
        .await;

    // The caller owns propagation of an explicit `success: false`.
    let payload = gateway(&server, None)
        .call(Method::GET, "/api/thing", None)
        .await
        .expect("payload");

    assert_eq!(
        payload,
        Payload::Json(json!({"success": false, "message": "not today"}))
    );
}

#[tokio::test]
async fn no_content_is_a_sentinel_not_a_parse() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("DELETE", "/api/cart")
        .with_status(204)
        .create_async()
        .await;

    let payload = gateway(&server, Some("t"))
        .call(Method::DELETE, "/api/cart", None)
        .await
        .expect("payload");

    assert_eq!(payload, Payload::NoContent);
}

#[tokio::test]
async fn extracts_message_field_from_error_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/cart/items")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": "invalid product"}"#)
        .create_async()
        .await;

    let err = gateway(&server, Some("t"))
        .call(Method::POST, "/api/cart/items", Some(json!({"productId": "x"})))
        .await
        .unwrap_err();

    match err {
        ClientError::Remote { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "invalid product");
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn falls_back_to_raw_text_for_non_json_errors() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/cart")
        .with_status(502)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let err = gateway(&server, Some("t"))
        .call(Method::GET, "/api/cart", None)
        .await
        .unwrap_err();

    match err {
        ClientError::Remote { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn typed_decode_fails_fast_on_malformed_responses() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/cart")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": {"items": "not-a-list"}}"#)
        .create_async()
        .await;

    let result: Result<CartState, _> = gateway(&server, Some("t")).fetch("/api/cart").await;
    assert!(matches!(result, Err(ClientError::Decode(_))));
}

#[tokio::test]
async fn raw_fetch_keeps_pagination_metadata() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/products?page=2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "success": true,
                "data": [{"id": "aaaaaaaaaaaaaaaaaaaaaaaa", "name": "Shirt", "price": 10}],
                "meta": {"total": 41, "page": 2, "limit": 12, "totalPages": 4}
            }"#,
        )
        .create_async()
        .await;

    let page: ProductPage = gateway(&server, None)
        .fetch_raw("/api/products?page=2")
        .await
        .expect("page");

    assert_eq!(page.data.len(), 1);
    assert_eq!(page.meta.and_then(|m| m.total), Some(41));
}
