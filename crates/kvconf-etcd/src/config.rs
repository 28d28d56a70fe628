//! etcd connection configuration
//!
//! Decoded from the plugin's configuration section and handed to a
//! [`crate::StoreConnector`]. Field names follow the etcd client settings.

use kvconf_core::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Connection parameters for an etcd cluster
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Cluster members, as `host:port` or `http(s)://host:port`
    pub endpoints: Vec<String>,
    /// Timeout for establishing the connection
    pub dial_timeout_ms: Option<u64>,
    /// Timeout applied to every request
    pub request_timeout_ms: Option<u64>,
    /// Interval between keep-alive pings
    pub keep_alive_time_ms: Option<u64>,
    /// Time to wait for a keep-alive ack before closing the connection
    pub keep_alive_timeout_ms: Option<u64>,
    /// Send keep-alive pings even without active streams
    pub permit_without_stream: bool,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl ConnectionConfig {
    /// Config for the given endpoints with every other setting left unset
    pub fn new<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            endpoints: endpoints.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn dial_timeout(&self) -> Option<Duration> {
        self.dial_timeout_ms.map(Duration::from_millis)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Username and password, when both are configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }

    /// Keep-alive interval and timeout, when both are configured
    pub fn keep_alive(&self) -> Option<(Duration, Duration)> {
        match (self.keep_alive_time_ms, self.keep_alive_timeout_ms) {
            (Some(time), Some(timeout)) => {
                Some((Duration::from_millis(time), Duration::from_millis(timeout)))
            }
            _ => None,
        }
    }

    /// Check the configuration and return the parsed endpoints.
    ///
    /// Every failure is a [`ConfigError::Connection`]: a client built from
    /// this configuration could not connect.
    pub fn validate(&self) -> ConfigResult<Vec<Url>> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::connection("no etcd endpoints configured"));
        }

        if self.username.is_some() != self.password.is_some() {
            return Err(ConfigError::connection(
                "username and password must be configured together",
            ));
        }

        if self.keep_alive_time_ms.is_some() != self.keep_alive_timeout_ms.is_some() {
            return Err(ConfigError::connection(
                "keep_alive_time_ms and keep_alive_timeout_ms must be configured together",
            ));
        }

        self.endpoints.iter().map(|e| parse_endpoint(e)).collect()
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("endpoints", &self.endpoints)
            .field("dial_timeout_ms", &self.dial_timeout_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("keep_alive_time_ms", &self.keep_alive_time_ms)
            .field("keep_alive_timeout_ms", &self.keep_alive_timeout_ms)
            .field("permit_without_stream", &self.permit_without_stream)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn parse_endpoint(endpoint: &str) -> ConfigResult<Url> {
    let endpoint = endpoint.trim();
    let url = if endpoint.contains("://") {
        Url::parse(endpoint)
    } else {
        Url::parse(&format!("http://{}", endpoint))
    }
    .map_err(|e| ConfigError::connection(format!("invalid endpoint {:?}: {}", endpoint, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::connection(format!(
            "unsupported scheme in endpoint {:?}",
            endpoint
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::connection(format!("endpoint {:?} has no host", endpoint)));
    }
    if url.port().is_none() {
        return Err(ConfigError::connection(format!("endpoint {:?} has no port", endpoint)));
    }
    if !matches!(url.path(), "" | "/") || url.query().is_some() {
        return Err(ConfigError::connection(format!(
            "endpoint {:?} must not carry a path or query",
            endpoint
        )));
    }

    Ok(url)
}
