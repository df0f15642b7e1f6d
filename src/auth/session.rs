//! Login session handling

use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use serde_json::{json, Value};
use tracing::info;

/// Keys that may carry the token in a login response, in priority order
const TOKEN_KEYS: [&str; 4] = ["jwt_token", "jwt", "token", "accessToken"];

/// Username/password pair
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Create a credential pair
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Bearer-token session for one run
#[derive(Debug)]
pub struct Session {
    credentials: Credentials,
    login_url: String,
    token: Option<String>,
    logins: u32,
}

impl Session {
    /// Create a session that logs in lazily at `login_url`
    pub fn new(credentials: Credentials, login_url: impl Into<String>) -> Self {
        Self {
            credentials,
            login_url: login_url.into(),
            token: None,
            logins: 0,
        }
    }

    /// Current token, logging in first if there is none
    pub async fn token(&mut self, client: &HttpClient) -> Result<String> {
        match &self.token {
            Some(token) => Ok(token.clone()),
            None => self.refresh(client).await,
        }
    }

    /// Log in again and replace the token
    pub async fn refresh(&mut self, client: &HttpClient) -> Result<String> {
        let token = self.login(client).await?;
        self.token = Some(token.clone());
        Ok(token)
    }

    /// Whether a token is held
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Number of successful logins performed by this session
    pub fn login_count(&self) -> u32 {
        self.logins
    }

    async fn login(&mut self, client: &HttpClient) -> Result<String> {
        info!("Logging in to AgencyZoom as {}", self.credentials.username);
        let body = json!({
            "username": self.credentials.username,
            "password": self.credentials.password,
        });
        let response = client
            .post(&self.login_url, RequestConfig::new().json(body).redact("password"))
            .await?;

        if response.is_auth_failure() {
            return Err(Error::auth(
                "AgencyZoom rejected the login; check username/password",
            ));
        }
        let response = response.error_for_status()?;
        let data = response.json("AgencyZoom login")?;
        let token = extract_token(&data)
            .ok_or_else(|| Error::auth("No token field found in AgencyZoom login response"))?;

        self.logins += 1;
        Ok(token)
    }
}

/// Pull the bearer token out of a login response.
///
/// Known keys are tried first; a single-key object is taken to hold the token.
pub fn extract_token(data: &Value) -> Option<String> {
    let map = data.as_object()?;
    let value = TOKEN_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|v| !v.is_null() && v.as_str() != Some(""))
        .or_else(|| {
            if map.len() == 1 {
                map.values().next()
            } else {
                None
            }
        })?;

    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
