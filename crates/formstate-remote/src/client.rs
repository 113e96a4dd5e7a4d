//! HTTP client for the user service.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::error::{RemoteError, Result};

/// Default service base URL.
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the user service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Base URL, without a trailing slash.
    pub base_url: String,
    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RemoteConfig {
    /// Creates a config for `base_url` with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Client for the user service. Cheap to clone.
#[derive(Debug, Clone)]
pub struct UserClient {
    http: reqwest::Client,
    base_url: String,
}

impl UserClient {
    /// Creates a client.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches one user record: `GET {base}/users/{id}`.
    pub async fn user(&self, id: u32) -> Result<serde_json::Map<String, Value>> {
        let url = format!("{}/users/{id}", self.base_url);
        debug!(%url, "fetching user");

        let body: Value = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        match body {
            Value::Object(user) => Ok(user),
            other => Err(RemoteError::UnexpectedPayload(format!(
                "expected a user object, got {other}"
            ))),
        }
    }

    /// Lists users registered with `email`: `GET {base}/users?email={email}`.
    pub async fn users_with_email(&self, email: &str) -> Result<Vec<Value>> {
        let url = format!("{}/users", self.base_url);
        debug!(%url, email, "looking up email");

        let body: Value = self
            .http
            .get(&url)
            .query(&[("email", email)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        match body {
            Value::Array(users) => Ok(users),
            other => Err(RemoteError::UnexpectedPayload(format!(
                "expected a user list, got {other}"
            ))),
        }
    }
}
