//! Todoist REST and sync client

use super::types::{CommandOutcome, NewTask, Section, SyncResponse};
use crate::config::TodoistConfig;
use crate::error::{snippet, Error, Result};
use crate::http::{ApiResponse, HttpClient, HttpClientConfig, RequestConfig, RetryPolicy};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const TASKS_PATH: &str = "/rest/v2/tasks";
pub const SECTIONS_PATH: &str = "/rest/v2/sections";
pub const SYNC_PATH: &str = "/sync/v9/sync";

/// Commands per sync request
pub const SYNC_BATCH_SIZE: usize = 100;

/// Todoist API client
#[derive(Debug)]
pub struct TodoistClient {
    client: HttpClient,
    token: String,
}

impl TodoistClient {
    /// Wrap an HTTP client pointed at the Todoist host
    pub fn new(client: HttpClient, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
        }
    }

    /// Build a client from configuration; fails when no token is set
    pub fn from_config(config: &TodoistConfig, timeout: Duration) -> Result<Self> {
        let token = config.token()?;
        let client = HttpClient::new(
            HttpClientConfig::builder()
                .base_url(&config.base_url)
                .timeout(timeout)
                .retry(RetryPolicy::todoist())
                .build(),
        )?;
        Ok(Self::new(client, token))
    }

    /// Create one task; returns its id when the response carries one
    pub async fn create_task(&self, task: &NewTask) -> Result<Option<String>> {
        let body = serde_json::to_value(task)?;
        let response = self
            .client
            .post(TASKS_PATH, RequestConfig::new().bearer(&self.token).json(body))
            .await?;
        let response = check(response, "create task")?;

        let data = response.json_or_null("Todoist create task")?;
        let id = match data.get("id") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        match id {
            Some(ref id) => debug!("Todoist task created: {id}"),
            None => debug!("Todoist task created, no id in response"),
        }
        Ok(id)
    }

    /// Create many tasks through the sync endpoint, in chunks of [`SYNC_BATCH_SIZE`].
    ///
    /// Outcomes are returned in the order of `tasks`. A failed request
    /// discards the outcomes of earlier chunks; callers that must record
    /// partial progress drive [`TodoistClient::sync_chunk`] themselves.
    pub async fn create_tasks_batch(&self, tasks: &[NewTask]) -> Result<Vec<CommandOutcome>> {
        let mut outcomes = Vec::with_capacity(tasks.len());
        for (index, chunk) in tasks.chunks(SYNC_BATCH_SIZE).enumerate() {
            outcomes.extend(self.sync_chunk(index + 1, chunk).await?);
        }
        Ok(outcomes)
    }

    /// Send one sync request adding `chunk`; outcomes follow the order of `chunk`.
    ///
    /// `number` only labels the log lines.
    pub async fn sync_chunk(&self, number: usize, chunk: &[NewTask]) -> Result<Vec<CommandOutcome>> {
        let ids: Vec<(String, String)> = chunk
            .iter()
            .map(|_| (Uuid::new_v4().to_string(), Uuid::new_v4().to_string()))
            .collect();

        let commands: Vec<Value> = chunk
            .iter()
            .zip(&ids)
            .map(|(task, (uuid, temp_id))| {
                json!({
                    "type": "item_add",
                    "uuid": uuid,
                    "temp_id": temp_id,
                    "args": task,
                })
            })
            .collect();

        let response = self
            .client
            .post(
                SYNC_PATH,
                RequestConfig::new()
                    .bearer(&self.token)
                    .json(json!({ "commands": commands })),
            )
            .await?;
        let response = check(response, "sync")?;

        let sync: SyncResponse = serde_json::from_value(response.json("Todoist sync")?)
            .map_err(|e| Error::parse("Todoist sync", &e.to_string()))?;

        let outcomes: Vec<CommandOutcome> = ids
            .iter()
            .map(|(uuid, temp_id)| sync.outcome(uuid, temp_id))
            .collect();
        let failed = outcomes.iter().filter(|o| !o.ok).count();
        if failed > 0 {
            warn!("Todoist sync batch {number}: {failed} commands failed");
        }
        info!("Todoist sync batch {number}: {} tasks", outcomes.len() - failed);
        Ok(outcomes)
    }

    /// Sections of a project
    pub async fn list_sections(&self, project_id: &str) -> Result<Vec<Section>> {
        let response = self
            .client
            .get(
                SECTIONS_PATH,
                RequestConfig::new()
                    .bearer(&self.token)
                    .query("project_id", project_id),
            )
            .await?;
        let response = check(response, "list sections")?;

        serde_json::from_value(response.json("Todoist sections")?)
            .map_err(|e| Error::parse("Todoist sections", &e.to_string()))
    }
}

fn check(response: ApiResponse, action: &str) -> Result<ApiResponse> {
    if response.is_success() {
        return Ok(response);
    }
    Err(Error::todoist(format!(
        "{action} failed with HTTP {}: {}",
        response.status.as_u16(),
        snippet(&response.body)
    )))
}
