//! Plugin factories and configuration decoders
//!
//! Hosts register a [`Factory`] per plugin name in a [`PluginRegistry`].
//! At startup each configured plugin is set up with a [`Decoder`] holding its
//! configuration section, and installs whatever it builds into a
//! [`ConfigRegistry`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::{ConfigError, ConfigResult};
use crate::registry::ConfigRegistry;

/// Plugin type tag for configuration providers
pub const CONFIG_PLUGIN_TYPE: &str = "config";

/// Source of a plugin's configuration section
pub trait Decoder: Send + Sync {
    /// The raw configuration section as a JSON value
    fn decode_value(&self) -> ConfigResult<serde_json::Value>;
}

impl dyn Decoder + '_ {
    /// Deserialize the configuration section into `T`
    pub fn decode<T: DeserializeOwned>(&self) -> ConfigResult<T> {
        let value = self.decode_value()?;
        serde_json::from_value(value).map_err(ConfigError::decode)
    }
}

/// Decoder over an already parsed JSON value
#[derive(Debug, Clone)]
pub struct JsonDecoder(pub serde_json::Value);

impl Decoder for JsonDecoder {
    fn decode_value(&self) -> ConfigResult<serde_json::Value> {
        Ok(self.0.clone())
    }
}

/// Decoder over a TOML document or table
#[derive(Debug, Clone)]
pub struct TomlDecoder {
    value: toml::Value,
}

impl TomlDecoder {
    pub fn new(value: toml::Value) -> Self {
        Self { value }
    }

    /// Parse a TOML document
    pub fn parse(text: &str) -> ConfigResult<Self> {
        let table = text.parse::<toml::Table>().map_err(ConfigError::decode)?;
        Ok(Self::new(toml::Value::Table(table)))
    }
}

impl Decoder for TomlDecoder {
    fn decode_value(&self) -> ConfigResult<serde_json::Value> {
        serde_json::to_value(&self.value).map_err(ConfigError::decode)
    }
}

/// Builds a plugin from its configuration section
#[async_trait]
pub trait Factory: Send + Sync {
    /// Plugin type tag, e.g. [`CONFIG_PLUGIN_TYPE`]
    fn plugin_type(&self) -> &str;

    /// Decode the plugin configuration and install the plugin into `registry`
    async fn setup(
        &self,
        name: &str,
        decoder: &dyn Decoder,
        registry: &ConfigRegistry,
    ) -> ConfigResult<()>;
}

/// Factories keyed by plugin type and name
#[derive(Default)]
pub struct PluginRegistry {
    factories: HashMap<(String, String), Arc<dyn Factory>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name` and the factory's own type tag.
    pub fn register(&mut self, name: impl Into<String>, factory: Arc<dyn Factory>) {
        let key = (factory.plugin_type().to_string(), name.into());
        debug!(plugin_type = %key.0, name = %key.1, "Plugin factory registered");
        self.factories.insert(key, factory);
    }

    pub fn get(&self, plugin_type: &str, name: &str) -> Option<Arc<dyn Factory>> {
        self.factories
            .get(&(plugin_type.to_string(), name.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Look up a factory and run its setup
    #[instrument(skip(self, decoder, registry))]
    pub async fn setup(
        &self,
        plugin_type: &str,
        name: &str,
        decoder: &dyn Decoder,
        registry: &ConfigRegistry,
    ) -> ConfigResult<()> {
        let factory = self
            .get(plugin_type, name)
            .ok_or_else(|| ConfigError::PluginNotFound {
                plugin_type: plugin_type.to_string(),
                name: name.to_string(),
            })?;
        factory.setup(name, decoder, registry).await
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
