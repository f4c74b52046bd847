//! Integration tests for the outbound relay call, with mockito standing in
//! for the expense-tracking backend.

use expense_connector::backend::{BackendClient, BackendError};
use expense_connector::config::Settings;
use mockito::Matcher;
use serde_json::json;

fn settings_for(url: &str) -> Settings {
    Settings {
        telegram_bot_token: "12345:TEST-TOKEN".to_string(),
        bot_service_url: url.to_string(),
    }
}

#[tokio::test]
async fn relay_posts_exactly_one_request_and_extracts_category() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::Json(json!({
            "telegram_id": "123",
            "message": "Spent 50 on groceries"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"ok","message":"Expense added","data":{"category":"groceries"}}"#)
        .expect(1)
        .create_async()
        .await;

    let client = BackendClient::new(&settings_for(&server.url()));
    let response = client
        .relay("123".to_string(), "Spent 50 on groceries".to_string())
        .await
        .expect("relay should succeed");

    assert_eq!(response.category(), Some("groceries"));
    mock.assert_async().await;
}

#[tokio::test]
async fn relay_success_without_category_yields_none() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"ok","message":"Not an expense"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = BackendClient::new(&settings_for(&server.url()));
    let response = client
        .relay("123".to_string(), "hello there".to_string())
        .await
        .expect("relay should succeed");

    assert_eq!(response.category(), None);
    mock.assert_async().await;
}

#[tokio::test]
async fn relay_non_success_status_is_a_transport_error_with_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(500)
        .with_body("backend exploded")
        .expect(1)
        .create_async()
        .await;

    let client = BackendClient::new(&settings_for(&server.url()));
    let err = client
        .relay("123".to_string(), "Taxi 15".to_string())
        .await
        .expect_err("500 must be an error");

    assert!(err.is_transport());
    assert_eq!(err.response_body(), Some("backend exploded"));
    match err {
        BackendError::Api { status, .. } => assert_eq!(status.as_u16(), 500),
        other => panic!("expected Api error, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn relay_unreachable_backend_is_a_network_error() {
    // Port 1 is reserved and nothing listens there
    let client = BackendClient::new(&settings_for("http://127.0.0.1:1"));
    let err = client
        .relay("123".to_string(), "Taxi 15".to_string())
        .await
        .expect_err("connection must fail");

    assert!(err.is_transport());
    assert!(matches!(err, BackendError::Network(_)));
    assert_eq!(err.response_body(), None);
}

#[tokio::test]
async fn relay_malformed_body_is_a_runtime_error_not_transport() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_body("<html>definitely not json</html>")
        .expect(1)
        .create_async()
        .await;

    let client = BackendClient::new(&settings_for(&server.url()));
    let err = client
        .relay("123".to_string(), "Taxi 15".to_string())
        .await
        .expect_err("non-JSON body must be an error");

    assert!(!err.is_transport());
    assert!(matches!(err, BackendError::Json(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn relay_coerces_missing_sender_to_zero_sentinel() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::Json(json!({
            "telegram_id": "0",
            "message": "Spent 20 on food"
        })))
        .with_status(200)
        .with_body(r#"{"status":"ok"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = BackendClient::new(&settings_for(&server.url()));
    client
        .relay(0u64.to_string(), "Spent 20 on food".to_string())
        .await
        .expect("relay should succeed");

    mock.assert_async().await;
}
