//! Tests for the AgencyZoom client

use super::*;
use crate::auth::Credentials;
use crate::config::{AgencyZoomConfig, Config};
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig, RecordingSleeper};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> AgencyZoomClient {
    let http = HttpClient::new(HttpClientConfig::builder().base_url(server.uri()).build())
        .unwrap()
        .with_sleeper(Arc::new(RecordingSleeper::new()));
    AgencyZoomClient::new(http, server.uri())
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .and(body_partial_json(json!({"username": "agent", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jwt_token": "tok"})))
        .mount(server)
        .await;
}

fn az_config(pairs: &[(&str, &str)]) -> AgencyZoomConfig {
    let vars: HashMap<&str, &str> = pairs.iter().copied().collect();
    Config::from_lookup(|key| vars.get(key).map(|v| (*v).to_string()))
        .unwrap()
        .agencyzoom
}

#[test]
fn test_thread_query_from_config() {
    let config = az_config(&[
        ("AZ_THREADS_PAGE_SIZE", "20"),
        ("LIMIT_THREADS", "7"),
        ("TEXT_FILTER_MODE", "mine"),
        ("AGENCY_ZOOM_USER_ID", "42"),
        ("FORCE_BACKFILL_MINUTES", "90"),
    ]);
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    let query = ThreadQuery::from_config(&config, now);

    assert_eq!(query.page_size, 20);
    assert_eq!(query.limit, Some(7));
    assert_eq!(query.agent.as_deref(), Some("42"));
    assert_eq!(
        query.active_since,
        Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap())
    );
}

#[test]
fn test_login_url() {
    let http = HttpClient::new(HttpClientConfig::default()).unwrap();
    let client = AgencyZoomClient::new(http, "https://az.example.com/");
    assert_eq!(
        client.login_url(),
        "https://az.example.com/v1/api/auth/login"
    );
}

#[tokio::test]
async fn test_list_threads_sends_sort_and_filters() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path(THREAD_LIST_PATH))
        .and(header("authorization", "Bearer tok"))
        .and(body_partial_json(json!({
            "sort": "lastMessageDate",
            "order": "desc",
            "agentSelect": "42",
            "page": 1,
            "pageSize": 2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "threadInfo": [
                {"id": 1, "contactName": "Dana Smith", "phoneNumber": "5550100"},
                {"contactName": "no id"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(THREAD_LIST_PATH))
        .and(body_partial_json(json!({"page": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"threadInfo": []})))
        .mount(&server)
        .await;

    let client = client(&server);
    let mut session = client.session(Credentials::new("agent", "pw"));
    let query = ThreadQuery {
        page_size: 2,
        agent: Some("42".to_string()),
        ..ThreadQuery::default()
    };

    let threads = client.list_threads(&mut session, &query).await.unwrap();

    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].id, "1");
    assert_eq!(threads[0].contact_name, "Dana Smith");
    assert_eq!(session.login_count(), 1);
}

#[tokio::test]
async fn test_thread_messages_posts_thread_id() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path(THREAD_DETAIL_PATH))
        .and(body_partial_json(json!({"threadId": "t9", "page": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messageInfo": [
                {"id": "m1", "body": "hello", "messageDate": "2024-01-01T10:00:00Z"},
                {"id": "m2", "body": "again"},
                {"id": "m3", "body": "over the limit"}
            ]
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let mut session = client.session(Credentials::new("agent", "pw"));

    let messages = client
        .thread_messages(&mut session, "t9", 5, Some(2))
        .await
        .unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].thread_id, "t9");
    assert_eq!(messages[0].body, "hello");
    assert!(messages[0].sent_at.is_some());
}

#[tokio::test]
async fn test_max_pages_applies_to_listings() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path(THREAD_LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [{"id": "x"}]})))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server).with_max_pages(Some(2));
    let mut session = client.session(Credentials::new("agent", "pw"));
    let query = ThreadQuery {
        page_size: 1,
        ..ThreadQuery::default()
    };

    let threads = client.list_threads(&mut session, &query).await.unwrap();
    assert_eq!(threads.len(), 2);
}

#[tokio::test]
async fn test_rejected_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client(&server);
    let mut session = client.session(Credentials::new("agent", "wrong"));

    let err = client.login(&mut session).await.unwrap_err();
    assert!(matches!(err, Error::Auth { .. }));
}

#[tokio::test]
async fn test_producer_sends_agent_and_returns_body() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path(PRODUCER_PATH))
        .and(header("authorization", "Bearer tok"))
        .and(body_partial_json(json!({"page": 1, "pageSize": 25, "agentSelect": "42"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"producers": [{"id": 42}]})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut session = client.session(Credentials::new("agent", "pw"));

    let body = client.producer(&mut session, 25, Some("42")).await.unwrap();
    assert_eq!(body, json!({"producers": [{"id": 42}]}));
}

#[tokio::test]
async fn test_unread_threads_reports_http_errors() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path(UNREAD_THREAD_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such endpoint"))
        .mount(&server)
        .await;

    let client = client(&server);
    let mut session = client.session(Credentials::new("agent", "pw"));

    let err = client.unread_threads(&mut session, 50).await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
}
