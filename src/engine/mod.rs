//! Execution engine module
//!
//! Main fetch loop and command orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `Pipeline` - Fetches, classifies and filters messages, then hands them
//!   to Todoist and the local exports
//! - `RunStats` - Counters reported at the end of a run

mod types;


pub use types::{Collected, RunStats};

use crate::agencyzoom::{AgencyZoomClient, ThreadQuery};
use crate::auth::Session;
use crate::classify::{DirectionClassifier, HeuristicClassifier};
use crate::config::{Config, FilterMode};
use crate::error::{Error, Result};
use crate::output::{self, DumpRecord, DumpSummary, ProbeReport, ProbeSummary};
use crate::state::SeenCache;
use crate::todoist::{NewTask, TodoistClient, SYNC_BATCH_SIZE};
use crate::types::{Conversation, Direction, Message};
use serde_json::Value;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Runs the commands against AgencyZoom
pub struct Pipeline {
    agencyzoom: AgencyZoomClient,
    classifier: Box<dyn DirectionClassifier>,
    config: Config,
}

impl Pipeline {
    /// Create a pipeline classifying with the configured heuristics
    pub fn new(config: Config, agencyzoom: AgencyZoomClient) -> Self {
        let classifier = Box::new(HeuristicClassifier::new(config.classifier.clone()));
        Self {
            agencyzoom,
            classifier,
            config,
        }
    }

    /// Replace the direction classifier
    #[must_use]
    pub fn with_classifier(mut self, classifier: Box<dyn DirectionClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A new AgencyZoom session for the configured credentials
    pub fn session(&self) -> Result<Session> {
        Ok(self
            .agencyzoom
            .session(self.config.agencyzoom.credentials()?))
    }

    /// Fetch threads and messages, classify them, and apply the filters:
    /// seen cache, then `since`, then inbound-only.
    pub async fn collect(&self, session: &mut Session, seen: Option<&SeenCache>) -> Result<Collected> {
        let (threads, _) = self.fetch_conversations(session).await?;
        let filters = &self.config.filters;

        if filters.inbound_only {
            info!("Inbound messages only, skipping outbound");
        }

        let mut collected = Collected {
            threads: threads.len(),
            ..Collected::default()
        };

        for mut conversation in threads {
            let before = conversation.messages.len();
            conversation.messages.retain(|message| {
                if seen.is_some_and(|cache| cache.contains(&message.id)) {
                    return false;
                }
                if let (Some(since), Some(at)) = (filters.since, message.sent_at) {
                    if at < since {
                        return false;
                    }
                }
                if filters.inbound_only && message.direction == Direction::Outbound {
                    debug!("Skipping outbound message {}", message.id);
                    return false;
                }
                true
            });
            collected.skipped += before - conversation.messages.len();

            if !conversation.messages.is_empty() {
                collected.conversations.push(conversation);
            }
        }

        info!(
            "Collected {} new messages from {} threads ({} skipped)",
            collected.message_count(),
            collected.threads,
            collected.skipped
        );
        Ok(collected)
    }

    /// Turn every new message into a Todoist task and record it as seen.
    ///
    /// The cache is saved before a task-creation error is returned, so
    /// messages relayed earlier in the run are not repeated.
    pub async fn relay(
        &self,
        session: &mut Session,
        cache: &mut SeenCache,
        todoist: Option<&TodoistClient>,
    ) -> Result<RunStats> {
        let collected = self.collect(session, Some(&*cache)).await?;
        let mut stats = RunStats {
            threads: collected.threads,
            skipped: collected.skipped,
            ..RunStats::default()
        };

        let pending: Vec<(&Message, NewTask)> = collected
            .conversations
            .iter()
            .flat_map(|c| c.messages.iter().map(move |m| (m, self.new_task(m, c))))
            .collect();

        let outcome = if self.config.dry_run {
            for (message, task) in &pending {
                info!("[dry-run] {}", task.content);
                cache.insert(message.id.clone());
            }
            Ok(())
        } else {
            let todoist = todoist.ok_or_else(|| Error::missing_field("TODOIST_API_TOKEN"))?;
            if self.config.todoist.batch {
                relay_batch(todoist, &pending, cache, &mut stats).await
            } else {
                relay_each(todoist, &pending, cache, &mut stats).await
            }
        };

        cache.save_or_warn().await;
        stats.cached = cache.len();
        outcome?;

        stats.exported = self.write_exports(&collected.conversations).await;
        info!("Relay done: {stats}");
        Ok(stats)
    }

    /// Write the text and JSON exports without touching Todoist or the cache
    pub async fn export(&self, session: &mut Session) -> Result<RunStats> {
        let collected = self.collect(session, None).await?;
        let outputs = &self.config.outputs;
        let our_number = self.config.classifier.our_number.as_deref();

        output::write_text_export(&outputs.text_file, &collected.conversations).await?;
        let exported =
            output::write_json_export(&outputs.json_file, &collected.conversations, our_number)
                .await?;

        let stats = RunStats {
            threads: collected.threads,
            skipped: collected.skipped,
            exported,
            ..RunStats::default()
        };
        info!("Export done: {stats}");
        Ok(stats)
    }

    /// Write the raw debug dump under `dir`; returns the files written
    pub async fn dump(&self, session: &mut Session, dir: &Path) -> Result<Vec<PathBuf>> {
        let (conversations, query) = self.fetch_conversations(session).await?;

        let records: Vec<DumpRecord> = conversations
            .iter()
            .flat_map(|c| c.messages.iter().map(|m| DumpRecord::new(&c.thread, m)))
            .collect();
        let records = output::trim_newest(records, self.config.filters.total_limit);
        let threads: Vec<_> = conversations.into_iter().map(|c| c.thread).collect();

        let az = &self.config.agencyzoom;
        let summary = DumpSummary {
            mode: match az.filter_mode {
                FilterMode::All => "all".to_string(),
                FilterMode::Mine => "mine".to_string(),
            },
            last_date_utc: query.active_since.map(|at| at.to_rfc3339()),
            total_limit: self.config.filters.total_limit,
            thread_limit: az.thread_limit,
            messages_per_thread_limit: az.messages_per_thread_limit,
        };

        output::write_dump(dir, &threads, &records, &summary).await
    }

    /// Call every text-thread endpoint once and write the raw responses under `dir`.
    ///
    /// Messages are fetched for the first `sample` threads. The producer and
    /// unread-thread endpoints are not available on every tenant, so their
    /// failures are recorded in the report instead of ending the run.
    pub async fn probe(&self, session: &mut Session, dir: &Path, sample: usize) -> Result<ProbeSummary> {
        let az = &self.config.agencyzoom;
        let query = ThreadQuery::from_config(az, Utc::now());

        self.agencyzoom.login(session).await?;
        let threads = self.agencyzoom.list_threads(session, &query).await?;
        info!("Threads fetched: {}", threads.len());

        let mut sampled: Vec<String> = Vec::new();
        for thread in &threads {
            if sampled.len() >= sample {
                break;
            }
            if !sampled.contains(&thread.id) {
                sampled.push(thread.id.clone());
            }
        }

        let mut report = ProbeReport::default();
        for (index, thread_id) in sampled.iter().enumerate() {
            let messages = self
                .agencyzoom
                .thread_messages(
                    session,
                    thread_id,
                    az.messages_page_size,
                    az.messages_per_thread_limit,
                )
                .await?;
            info!("Detail {}/{}: {thread_id} -> {} messages", index + 1, sampled.len(), messages.len());
            report
                .details
                .insert(thread_id.clone(), messages.into_iter().map(|m| m.raw).collect());
        }

        report.producer = optional(
            "producer",
            self.agencyzoom
                .producer(session, az.threads_page_size, az.user_id.as_deref())
                .await,
        );
        report.unread = optional(
            "unread-thread",
            self.agencyzoom
                .unread_threads(session, az.threads_page_size)
                .await,
        );

        report.summary = ProbeSummary {
            base: az.base_url.clone(),
            threads_found: threads.len(),
            thread_ids_sampled: sampled,
            details_sampled: report.details.len(),
            has_producer_data: output::has_data(&report.producer),
            has_unread_data: output::has_data(&report.unread),
        };
        report.threads = threads.into_iter().map(|t| t.raw).collect();

        output::write_probe(dir, &report).await?;
        Ok(report.summary)
    }

    /// List threads and fetch every thread's messages, classified
    async fn fetch_conversations(
        &self,
        session: &mut Session,
    ) -> Result<(Vec<Conversation>, ThreadQuery)> {
        let az = &self.config.agencyzoom;
        let query = ThreadQuery::from_config(az, Utc::now());
        if let Some(since) = query.active_since {
            info!("Backfill window: threads active since {}", since.to_rfc3339());
        }

        self.agencyzoom.login(session).await?;
        let threads = self.agencyzoom.list_threads(session, &query).await?;
        info!("Threads fetched: {}", threads.len());

        let mut conversations = Vec::with_capacity(threads.len());
        for thread in threads {
            let mut messages = self
                .agencyzoom
                .thread_messages(
                    session,
                    &thread.id,
                    az.messages_page_size,
                    az.messages_per_thread_limit,
                )
                .await?;
            for message in &mut messages {
                message.direction = self.classifier.classify(message, &thread);
            }
            debug!("Thread {}: {} messages", thread.id, messages.len());
            conversations.push(Conversation { thread, messages });
        }
        Ok((conversations, query))
    }

    fn new_task(&self, message: &Message, conversation: &Conversation) -> NewTask {
        NewTask::for_message(message, &conversation.thread)
            .in_project(self.config.todoist.project_id.clone())
            .in_section(self.config.todoist.section_id.clone())
    }

    /// Best-effort exports; returns the number of messages exported
    async fn write_exports(&self, conversations: &[Conversation]) -> usize {
        let outputs = &self.config.outputs;
        let our_number = self.config.classifier.our_number.as_deref();

        let exported = match output::write_text_export(&outputs.text_file, conversations).await {
            Ok(count) => count,
            Err(e) => {
                warn!("{e}");
                0
            }
        };
        if let Err(e) = output::write_json_export(&outputs.json_file, conversations, our_number).await
        {
            warn!("{e}");
        }
        exported
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("agencyzoom", &self.agencyzoom)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Response of an endpoint the run can do without
fn optional(endpoint: &str, result: Result<Value>) -> Value {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("{endpoint} call failed (non-fatal): {e}");
            output::endpoint_failure(&e)
        }
    }
}

async fn relay_each(
    todoist: &TodoistClient,
    pending: &[(&Message, NewTask)],
    cache: &mut SeenCache,
    stats: &mut RunStats,
) -> Result<()> {
    for (message, task) in pending {
        debug!("Creating task: {}", task.content);
        todoist.create_task(task).await?;
        cache.insert(message.id.clone());
        stats.created += 1;
    }
    Ok(())
}

async fn relay_batch(
    todoist: &TodoistClient,
    pending: &[(&Message, NewTask)],
    cache: &mut SeenCache,
    stats: &mut RunStats,
) -> Result<()> {
    // Ids are recorded per chunk so a failing request keeps earlier progress
    for (index, chunk) in pending.chunks(SYNC_BATCH_SIZE).enumerate() {
        let tasks: Vec<NewTask> = chunk.iter().map(|(_, task)| task.clone()).collect();
        let outcomes = todoist.sync_chunk(index + 1, &tasks).await?;

        for ((message, _), outcome) in chunk.iter().zip(outcomes) {
            if outcome.ok {
                cache.insert(message.id.clone());
                stats.created += 1;
            } else {
                stats.failed += 1;
                warn!(
                    "Todoist rejected task for message {}: {}",
                    message.id,
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }
    Ok(())
}
