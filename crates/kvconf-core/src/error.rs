//! Error types shared by every configuration provider

use thiserror::Error;

/// Boxed error produced by a store client or a decoder backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by configuration providers and plugin setup
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The store client could not be constructed or dialed
    #[error("connection error: {0}")]
    Connection(#[source] BoxError),

    /// The plugin configuration section could not be decoded
    #[error("decode error: {0}")]
    Decode(#[source] BoxError),

    /// The underlying store failed; the store's error is kept verbatim
    #[error(transparent)]
    Store(BoxError),

    /// Writes and multi-value reads are not supported
    #[error("not implemented")]
    NotImplemented,

    #[error("context cancelled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("plugin not found: type={plugin_type}, name={name}")]
    PluginNotFound { plugin_type: String, name: String },
}

impl ConfigError {
    /// Build a [`ConfigError::Connection`] from anything error-like
    pub fn connection(err: impl Into<BoxError>) -> Self {
        Self::Connection(err.into())
    }

    /// Build a [`ConfigError::Decode`] from anything error-like
    pub fn decode(err: impl Into<BoxError>) -> Self {
        Self::Decode(err.into())
    }

    /// Build a [`ConfigError::Store`] from anything error-like
    pub fn store(err: impl Into<BoxError>) -> Self {
        Self::Store(err.into())
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented)
    }
}

/// Result type for provider operations
pub type ConfigResult<T> = Result<T, ConfigError>;
