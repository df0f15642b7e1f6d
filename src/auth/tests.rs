//! Tests for the auth module

use super::*;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_for(server: &MockServer) -> (HttpClient, Session) {
    let client = HttpClient::new(HttpClientConfig::default()).unwrap();
    let session = Session::new(
        Credentials::new("agent@example.com", "hunter2"),
        format!("{}/v1/api/auth/login", server.uri()),
    );
    (client, session)
}

#[test]
fn test_extract_token_priority() {
    assert_eq!(
        extract_token(&json!({"jwt": "a", "token": "b"})).as_deref(),
        Some("a")
    );
    assert_eq!(
        extract_token(&json!({"jwt_token": "x", "jwt": "a"})).as_deref(),
        Some("x")
    );
    assert_eq!(
        extract_token(&json!({"accessToken": "z", "user": {}})).as_deref(),
        Some("z")
    );
}

#[test]
fn test_extract_token_single_key_fallback() {
    assert_eq!(
        extract_token(&json!({"sessionKey": "only"})).as_deref(),
        Some("only")
    );
    assert!(extract_token(&json!({"a": "1", "b": "2"})).is_none());
    assert!(extract_token(&json!(["token"])).is_none());
    assert!(extract_token(&json!({"token": ""})).is_none());
}

#[test]
fn test_credentials_debug_hides_password() {
    let creds = Credentials::new("u", "hunter2");
    let debug = format!("{creds:?}");
    assert!(!debug.contains("hunter2"));
}

#[tokio::test]
async fn test_login_on_first_token_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/api/auth/login"))
        .and(body_json(json!({"username": "agent@example.com", "password": "hunter2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jwt": "tok-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, mut session) = session_for(&server);
    assert!(!session.is_authenticated());

    assert_eq!(session.token(&client).await.unwrap(), "tok-1");
    // Cached: no second login
    assert_eq!(session.token(&client).await.unwrap(), "tok-1");
    assert_eq!(session.login_count(), 1);
}

#[tokio::test]
async fn test_refresh_replaces_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "old"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "new"})))
        .mount(&server)
        .await;

    let (client, mut session) = session_for(&server);
    assert_eq!(session.token(&client).await.unwrap(), "old");
    assert_eq!(session.refresh(&client).await.unwrap(), "new");
    assert_eq!(session.token(&client).await.unwrap(), "new");
    assert_eq!(session.login_count(), 2);
}

#[tokio::test]
async fn test_login_unauthorized_is_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let (client, mut session) = session_for(&server);
    let err = session.token(&client).await.unwrap_err();

    assert!(matches!(err, Error::Auth { .. }));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_login_without_token_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "user": 5})))
        .mount(&server)
        .await;

    let (client, mut session) = session_for(&server);
    let err = session.token(&client).await.unwrap_err();

    assert!(err.to_string().contains("No token field"));
}

#[tokio::test]
async fn test_login_server_error_is_http_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/api/auth/login"))
        .respond_with(ResponseTemplate::new(500).set_body_string("down"))
        .mount(&server)
        .await;

    let (client, mut session) = session_for(&server);
    let err = session.token(&client).await.unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
}
