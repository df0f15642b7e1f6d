//! Runtime configuration
//!
//! Everything the run needs is read from the environment once, validated,
//! and collected into [`Config`]. A local `.env` file is loaded by the binary
//! before this happens; variables already set in the environment win.

use crate::auth::Credentials;
use crate::classify::ClassifierConfig;
use crate::error::{Error, Result};
use crate::types::parse_timestamp;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Default AgencyZoom host
pub const DEFAULT_AZ_BASE: &str = "https://api.agencyzoom.com";

/// Default Todoist host
pub const DEFAULT_TODOIST_BASE: &str = "https://api.todoist.com";

// ============================================================================
// Config sections
// ============================================================================

/// Which threads the list endpoint returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Every agent's threads
    #[default]
    All,
    /// Only threads assigned to `AGENCY_ZOOM_USER_ID`
    Mine,
}

/// AgencyZoom connection and paging settings
#[derive(Debug, Clone)]
pub struct AgencyZoomConfig {
    /// Host, without the `/v1/api` suffix
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub user_id: Option<String>,
    pub filter_mode: FilterMode,
    pub threads_page_size: u32,
    pub messages_page_size: u32,
    pub thread_limit: Option<usize>,
    pub messages_per_thread_limit: Option<usize>,
    pub max_pages: Option<u32>,
    pub start_page: u32,
    /// Only list threads active within this many minutes
    pub backfill_minutes: Option<i64>,
    pub request_timeout: Duration,
    pub max_requests_per_second: Option<u32>,
}

impl AgencyZoomConfig {
    /// `https://host/v1/api`
    pub fn api_base(&self) -> String {
        format!("{}/v1/api", self.base_url)
    }

    /// Username/password pair, if both are set
    pub fn credentials(&self) -> Result<Credentials> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Ok(Credentials::new(user, pass)),
            (None, _) => Err(Error::missing_field("AGENCY_ZOOM_USERNAME")),
            (_, None) => Err(Error::missing_field("AGENCY_ZOOM_PASSWORD")),
        }
    }

    /// `agentSelect` value for the thread list, if filtering to one agent
    pub fn agent_filter(&self) -> Option<&str> {
        match self.filter_mode {
            FilterMode::Mine => self.user_id.as_deref(),
            FilterMode::All => None,
        }
    }
}

/// Todoist settings
#[derive(Debug, Clone)]
pub struct TodoistConfig {
    pub token: Option<String>,
    pub project_id: Option<String>,
    pub section_id: Option<String>,
    pub base_url: String,
    /// Use the batch sync endpoint instead of one request per task
    pub batch: bool,
}

impl TodoistConfig {
    /// API token, if set
    pub fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| Error::missing_field("TODOIST_API_TOKEN"))
    }
}

/// Message selection
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    /// Skip messages older than this
    pub since: Option<DateTime<Utc>>,
    /// Skip outbound messages
    pub inbound_only: bool,
    /// Keep only the newest N messages in the debug dump
    pub total_limit: Option<usize>,
}

/// Local files
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub text_file: PathBuf,
    pub json_file: PathBuf,
    pub cache_file: PathBuf,
    pub dump_dir: PathBuf,
    /// Save every raw API page under `dump_dir/raw_api`
    pub save_raw_pages: bool,
}

impl OutputConfig {
    /// Directory for raw page dumps, when enabled
    pub fn raw_dir(&self) -> Option<PathBuf> {
        self.save_raw_pages.then(|| self.dump_dir.join("raw_api"))
    }
}

/// What a command needs configured
#[derive(Debug, Clone, Copy, Default)]
pub struct Needs {
    pub agencyzoom: bool,
    pub todoist: bool,
}

/// Complete runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub agencyzoom: AgencyZoomConfig,
    pub todoist: TodoistConfig,
    pub filters: FilterConfig,
    pub outputs: OutputConfig,
    pub classifier: ClassifierConfig,
    pub dry_run: bool,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };

        let user_id = env.string("AGENCY_ZOOM_USER_ID");
        let filter_mode = match env.string("TEXT_FILTER_MODE").as_deref() {
            None | Some("all") => FilterMode::All,
            Some("mine") if user_id.is_some() => FilterMode::Mine,
            Some("mine") => {
                warn!("TEXT_FILTER_MODE=mine but AGENCY_ZOOM_USER_ID is not set, using 'all'");
                FilterMode::All
            }
            Some(other) => {
                return Err(Error::invalid_value(
                    "TEXT_FILTER_MODE",
                    format!("expected 'all' or 'mine', got '{other}'"),
                ))
            }
        };

        let agencyzoom = AgencyZoomConfig {
            base_url: validate_base_url("AZ_BASE", env.string("AZ_BASE"), DEFAULT_AZ_BASE)?,
            username: env.string("AGENCY_ZOOM_USERNAME"),
            password: env.string("AGENCY_ZOOM_PASSWORD"),
            user_id,
            filter_mode,
            threads_page_size: env.number("AZ_THREADS_PAGE_SIZE", 5)?,
            messages_page_size: env.number("AZ_MSGS_PAGE_SIZE", 5)?,
            thread_limit: env.limit("LIMIT_THREADS")?,
            messages_per_thread_limit: env.limit("LIMIT_MSGS_PER_THREAD")?,
            max_pages: env.limit("AZ_MAX_PAGES")?.map(|n| n as u32),
            start_page: env.number("AZ_START_PAGE", 1)?,
            backfill_minutes: env.limit("FORCE_BACKFILL_MINUTES")?.map(|n| n as i64),
            request_timeout: Duration::from_secs(env.number("REQUEST_TIMEOUT_SECONDS", 30)?),
            max_requests_per_second: env.limit("AZ_MAX_REQUESTS_PER_SECOND")?.map(|n| n as u32),
        };

        let todoist = TodoistConfig {
            token: env.string("TODOIST_API_TOKEN"),
            project_id: env.string("TODOIST_PROJECT_ID"),
            section_id: env.string("TODOIST_SECTION_ID"),
            base_url: validate_base_url(
                "TODOIST_BASE",
                env.string("TODOIST_BASE"),
                DEFAULT_TODOIST_BASE,
            )?,
            batch: env.flag("TODOIST_BATCH"),
        };

        let since = match env.string("AZ_SINCE_ISO") {
            Some(raw) => Some(parse_timestamp(&raw).ok_or_else(|| {
                Error::invalid_value("AZ_SINCE_ISO", format!("'{raw}' is not an ISO-8601 time"))
            })?),
            None => None,
        };

        let filters = FilterConfig {
            since,
            inbound_only: env.flag("AZ_INBOUND_ONLY"),
            total_limit: env.limit("TOTAL_LIMIT")?,
        };

        let outputs = OutputConfig {
            text_file: env.path("SMS_OUTPUT_FILE", "sms_messages.txt"),
            json_file: env.path("SMS_JSON_FILE", "sms_messages.json"),
            cache_file: env.path("SMS_CACHE_FILE", ".sms_to_todoist_cache.json"),
            dump_dir: env.path("OUTPUT_DIR", "debug_out"),
            save_raw_pages: env.flag("SAVE_RAW_PER_PAGE"),
        };

        let classifier = match env.string("AZ_CLASSIFIER_FILE") {
            Some(path) => ClassifierConfig::load(path)?,
            None => ClassifierConfig::default(),
        }
        .with_our_number(env.string("AZ_OUR_NUMBER"));

        Ok(Self {
            agencyzoom,
            todoist,
            filters,
            outputs,
            classifier,
            dry_run: env.flag("DRY_RUN"),
        })
    }

    /// Fail with every missing variable a command needs, named in one message
    pub fn validate(&self, needs: Needs) -> Result<()> {
        let mut missing = Vec::new();
        if needs.agencyzoom {
            if self.agencyzoom.username.is_none() {
                missing.push("AGENCY_ZOOM_USERNAME");
            }
            if self.agencyzoom.password.is_none() {
                missing.push("AGENCY_ZOOM_PASSWORD");
            }
        }
        if needs.todoist && self.todoist.token.is_none() {
            missing.push("TODOIST_API_TOKEN");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::config(format!(
                "Missing required configuration: {}. Set environment variables or add them to .env",
                missing.join(", ")
            )))
        }
    }
}

// ============================================================================
// Environment parsing
// ============================================================================

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed, non-empty value
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn flag(&self, key: &str) -> bool {
        self.string(key).is_some_and(|v| is_truthy(&v))
    }

    fn number<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr,
    {
        match self.string(key) {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::invalid_value(key, format!("'{raw}' is not a valid number"))),
            None => Ok(default),
        }
    }

    /// Unset or 0 means no limit
    fn limit(&self, key: &str) -> Result<Option<usize>> {
        Ok(Some(self.number::<usize>(key, 0)?).filter(|n| *n > 0))
    }

    fn path(&self, key: &str, default: &str) -> PathBuf {
        PathBuf::from(self.string(key).unwrap_or_else(|| default.to_string()))
    }
}

/// Load a dotenv file into the process environment; variables already set win.
///
/// Reads `.env` from the working directory when `path` is `None`. Returns
/// whether a file was loaded; a missing file is not an error, a malformed one is.
pub fn load_env_file(path: Option<&Path>) -> Result<bool> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };
    match loaded {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(Error::config(format!("failed to parse env file: {e}"))),
    }
}

/// `1`, `true`, `yes`, `y` or `on`, in any case
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

fn validate_base_url(field: &str, raw: Option<String>, default: &str) -> Result<String> {
    let raw = raw.unwrap_or_else(|| default.to_string());
    let url = url::Url::parse(&raw)
        .map_err(|e| Error::invalid_value(field, format!("'{raw}' is not a URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::invalid_value(
            field,
            format!("'{raw}' must be an http(s) URL"),
        ));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.agencyzoom.base_url, DEFAULT_AZ_BASE);
        assert_eq!(
            config.agencyzoom.api_base(),
            "https://api.agencyzoom.com/v1/api"
        );
        assert_eq!(config.agencyzoom.threads_page_size, 5);
        assert_eq!(config.agencyzoom.messages_page_size, 5);
        assert_eq!(config.agencyzoom.start_page, 1);
        assert_eq!(config.agencyzoom.request_timeout, Duration::from_secs(30));
        assert!(config.agencyzoom.thread_limit.is_none());
        assert_eq!(config.agencyzoom.filter_mode, FilterMode::All);
        assert_eq!(config.todoist.base_url, DEFAULT_TODOIST_BASE);
        assert!(!config.todoist.batch);
        assert!(!config.dry_run);
        assert!(!config.filters.inbound_only);
        assert_eq!(
            config.outputs.cache_file,
            PathBuf::from(".sms_to_todoist_cache.json")
        );
        assert!(config.outputs.raw_dir().is_none());
    }

    #[test]
    fn test_values_are_read() {
        let config = config_from(&[
            ("AZ_BASE", "http://localhost:9000/"),
            ("AGENCY_ZOOM_USERNAME", " agent "),
            ("AGENCY_ZOOM_PASSWORD", "pw"),
            ("AZ_THREADS_PAGE_SIZE", "50"),
            ("LIMIT_THREADS", "0"),
            ("LIMIT_MSGS_PER_THREAD", "20"),
            ("DRY_RUN", "yes"),
            ("AZ_INBOUND_ONLY", "TRUE"),
            ("TODOIST_BATCH", "on"),
            ("SAVE_RAW_PER_PAGE", "1"),
            ("OUTPUT_DIR", "out"),
            ("AZ_SINCE_ISO", "2024-05-01T00:00:00Z"),
            ("AZ_OUR_NUMBER", "555-010-0000"),
        ])
        .unwrap();

        assert_eq!(config.agencyzoom.base_url, "http://localhost:9000");
        assert_eq!(config.agencyzoom.username.as_deref(), Some("agent"));
        assert_eq!(config.agencyzoom.threads_page_size, 50);
        assert!(config.agencyzoom.thread_limit.is_none());
        assert_eq!(config.agencyzoom.messages_per_thread_limit, Some(20));
        assert!(config.dry_run);
        assert!(config.filters.inbound_only);
        assert!(config.todoist.batch);
        assert_eq!(
            config.outputs.raw_dir(),
            Some(PathBuf::from("out").join("raw_api"))
        );
        assert!(config.filters.since.is_some());
        assert_eq!(config.classifier.our_number.as_deref(), Some("555-010-0000"));
        assert!(config.agencyzoom.credentials().is_ok());
    }

    #[test]
    fn test_is_truthy() {
        for value in ["1", "true", "YES", "y", " On "] {
            assert!(is_truthy(value), "{value}");
        }
        for value in ["0", "false", "no", "", "enabled"] {
            assert!(!is_truthy(value), "{value}");
        }
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = config_from(&[("AZ_MSGS_PAGE_SIZE", "lots")]).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "AZ_MSGS_PAGE_SIZE"));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(config_from(&[("AZ_BASE", "api.agencyzoom.com")]).is_err());
        assert!(config_from(&[("TODOIST_BASE", "ftp://example.com")]).is_err());
    }

    #[test]
    fn test_invalid_since_is_rejected() {
        assert!(config_from(&[("AZ_SINCE_ISO", "last tuesday")]).is_err());
    }

    #[test]
    fn test_filter_mode() {
        let config = config_from(&[("TEXT_FILTER_MODE", "mine")]).unwrap();
        assert_eq!(config.agencyzoom.filter_mode, FilterMode::All);
        assert!(config.agencyzoom.agent_filter().is_none());

        let config = config_from(&[
            ("TEXT_FILTER_MODE", "mine"),
            ("AGENCY_ZOOM_USER_ID", "77"),
        ])
        .unwrap();
        assert_eq!(config.agencyzoom.filter_mode, FilterMode::Mine);
        assert_eq!(config.agencyzoom.agent_filter(), Some("77"));

        assert!(config_from(&[("TEXT_FILTER_MODE", "theirs")]).is_err());
    }

    #[test]
    fn test_validate_lists_all_missing() {
        let config = config_from(&[]).unwrap();
        let err = config
            .validate(Needs {
                agencyzoom: true,
                todoist: true,
            })
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("AGENCY_ZOOM_USERNAME"));
        assert!(message.contains("AGENCY_ZOOM_PASSWORD"));
        assert!(message.contains("TODOIST_API_TOKEN"));

        assert!(config.validate(Needs::default()).is_ok());
    }

    #[test]
    fn test_missing_credentials() {
        let config = config_from(&[("AGENCY_ZOOM_USERNAME", "u")]).unwrap();
        assert!(matches!(
            config.agencyzoom.credentials(),
            Err(Error::MissingConfigField { .. })
        ));
        assert!(config.todoist.token().is_err());
    }

    #[test]
    fn test_classifier_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classifier.yaml");
        std::fs::write(&path, "agent_signatures: ['- jane']\nour_number: '111'\n").unwrap();

        let config = config_from(&[
            ("AZ_CLASSIFIER_FILE", path.to_str().unwrap()),
            ("AZ_OUR_NUMBER", "222"),
        ])
        .unwrap();

        assert_eq!(config.classifier.agent_signatures, vec!["- jane"]);
        assert_eq!(config.classifier.our_number.as_deref(), Some("222"));
    }

    #[test]
    fn test_load_env_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!load_env_file(Some(dir.path().join("missing.env").as_path())).unwrap());

        let good = dir.path().join("good.env");
        std::fs::write(&good, "AZ_SMS_BRIDGE_ENV_FILE_TEST=loaded\n").unwrap();
        assert!(load_env_file(Some(good.as_path())).unwrap());
        assert_eq!(
            std::env::var("AZ_SMS_BRIDGE_ENV_FILE_TEST").as_deref(),
            Ok("loaded")
        );

        let bad = dir.path().join("bad.env");
        std::fs::write(&bad, "THIS IS NOT VALID\n").unwrap();
        let err = load_env_file(Some(bad.as_path())).unwrap_err();
        assert!(err.to_string().contains("failed to parse env file"));
    }
}
