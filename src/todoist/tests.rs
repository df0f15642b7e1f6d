//! Tests for the Todoist client

use super::*;
use crate::config::TodoistConfig;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig, RecordingSleeper, RetryPolicy};
use crate::types::{Message, Thread};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn client(server: &MockServer) -> (TodoistClient, RecordingSleeper) {
    let sleeper = RecordingSleeper::new();
    let http = HttpClient::new(
        HttpClientConfig::builder()
            .base_url(server.uri())
            .retry(RetryPolicy::todoist())
            .build(),
    )
    .unwrap()
    .with_sleeper(Arc::new(sleeper.clone()));
    (TodoistClient::new(http, "todo-token"), sleeper)
}

/// Answers a sync request with "ok" for every command, mapping temp ids to `task-<n>`
struct SyncOk;

impl Respond for SyncOk {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        let commands = body["commands"].as_array().cloned().unwrap_or_default();

        let mut status = serde_json::Map::new();
        let mut mapping = serde_json::Map::new();
        for (i, command) in commands.iter().enumerate() {
            let uuid = command["uuid"].as_str().unwrap().to_string();
            let temp_id = command["temp_id"].as_str().unwrap().to_string();
            if command["args"]["content"] == "bad" {
                status.insert(uuid, json!({"error_code": 15, "error": "Invalid content"}));
            } else {
                status.insert(uuid, json!("ok"));
                mapping.insert(temp_id, json!(format!("task-{i}")));
            }
        }
        ResponseTemplate::new(200)
            .set_body_json(json!({"sync_status": status, "temp_id_mapping": mapping}))
    }
}

// ============================================================================
// Content
// ============================================================================

#[test]
fn test_task_content_format() {
    let thread = Thread::from_value(&json!({"id": "t1", "contactName": "Dana Smith"})).unwrap();
    let message = Message::from_value(
        "t1",
        &json!({"id": "m1", "body": "Need a quote", "senderName": "Dana", "messageDate": "2024-01-01T10:00:00Z"}),
    )
    .unwrap();

    assert_eq!(
        task_content(&message, &thread),
        "SMS on 2024-01-01T10:00:00Z from Dana (Dana Smith): Need a quote"
    );
}

#[test]
fn test_task_content_unknown_date_and_truncation() {
    let thread = Thread::from_value(&json!({"id": "t1"})).unwrap();
    let body = "é".repeat(2000);
    let message = Message::from_value("t1", &json!({"id": "m1", "body": body})).unwrap();

    let content = task_content(&message, &thread);
    assert!(content.starts_with("SMS on unknown date from Unknown (Unknown): "));
    assert_eq!(content.chars().count(), MAX_CONTENT_CHARS);
}

#[test]
fn test_new_task_serialization_skips_missing_ids() {
    let task = NewTask::new("hi").in_project(Some("p1".to_string()));
    assert_eq!(
        serde_json::to_value(&task).unwrap(),
        json!({"content": "hi", "project_id": "p1"})
    );
}

#[test]
fn test_from_config_requires_token() {
    let config = TodoistConfig {
        token: None,
        project_id: None,
        section_id: None,
        base_url: "https://api.todoist.com".to_string(),
        batch: false,
    };
    let err = TodoistClient::from_config(&config, Duration::from_secs(5)).unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { .. }));
}

// ============================================================================
// REST
// ============================================================================

#[tokio::test]
async fn test_create_task() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TASKS_PATH))
        .and(header("authorization", "Bearer todo-token"))
        .and(body_partial_json(json!({"content": "hi", "section_id": "s1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "123"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    let task = NewTask::new("hi").in_section(Some("s1".to_string()));

    assert_eq!(client.create_task(&task).await.unwrap().as_deref(), Some("123"));
}

#[tokio::test]
async fn test_create_task_tolerates_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TASKS_PATH))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    assert_eq!(client.create_task(&NewTask::new("hi")).await.unwrap(), None);
}

#[tokio::test]
async fn test_create_task_retries_server_error_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TASKS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TASKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9})))
        .mount(&server)
        .await;

    let (client, sleeper) = client(&server);
    assert_eq!(
        client.create_task(&NewTask::new("hi")).await.unwrap().as_deref(),
        Some("9")
    );
    assert_eq!(sleeper.waits(), vec![Duration::from_secs(2)]);
}

#[tokio::test]
async fn test_create_task_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TASKS_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad project"))
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    let err = client.create_task(&NewTask::new("hi")).await.unwrap_err();
    assert!(matches!(err, Error::Todoist { ref message } if message.contains("bad project")));
}

#[tokio::test]
async fn test_list_sections() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SECTIONS_PATH))
        .and(query_param("project_id", "p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "s1", "name": "Inbound", "order": 1},
            {"id": 22, "name": "Done"}
        ])))
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    let sections = client.list_sections("p1").await.unwrap();

    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0].name, "Inbound");
    assert_eq!(sections[1].id, "22");
    assert_eq!(sections[1].order, None);
}

// ============================================================================
// Sync
// ============================================================================

#[tokio::test]
async fn test_batch_reports_each_command() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SYNC_PATH))
        .respond_with(SyncOk)
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    let tasks = vec![NewTask::new("one"), NewTask::new("bad"), NewTask::new("three")];

    let outcomes = client.create_tasks_batch(&tasks).await.unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].ok);
    assert_eq!(outcomes[0].task_id.as_deref(), Some("task-0"));
    assert!(!outcomes[1].ok);
    assert_eq!(outcomes[1].error.as_deref(), Some("Invalid content"));
    assert!(outcomes[2].ok);
    assert_ne!(outcomes[0].uuid, outcomes[2].uuid);
}

#[tokio::test]
async fn test_batch_is_chunked() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SYNC_PATH))
        .respond_with(SyncOk)
        .expect(3)
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    let tasks: Vec<NewTask> = (0..250).map(|i| NewTask::new(format!("task {i}"))).collect();

    let outcomes = client.create_tasks_batch(&tasks).await.unwrap();
    assert_eq!(outcomes.len(), 250);
    assert!(outcomes.iter().all(|o| o.ok));
}

#[tokio::test]
async fn test_batch_empty_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(SyncOk)
        .expect(0)
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    assert!(client.create_tasks_batch(&[]).await.unwrap().is_empty());
}
