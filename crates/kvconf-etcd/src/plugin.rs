//! Plugin factory for the etcd configuration provider
//!
//! Setup decodes a [`ConnectionConfig`], connects, and installs the adapter
//! both as the registry's default key-value provider and under its name.

use async_trait::async_trait;
use kvconf_core::{
    ConfigRegistry, ConfigResult, Decoder, Factory, PluginRegistry, CONFIG_PLUGIN_TYPE,
};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::adapter::EtcdConfig;
use crate::config::ConnectionConfig;
use crate::store::StoreConnector;

/// Name the plugin factory is registered under
pub const PLUGIN_NAME: &str = "etcd";

/// Factory building [`EtcdConfig`] providers
pub struct EtcdPlugin {
    connector: Arc<dyn StoreConnector>,
}

impl EtcdPlugin {
    /// Plugin that dials real etcd clusters
    #[cfg(feature = "etcd")]
    pub fn new() -> Self {
        Self::with_connector(Arc::new(crate::client::EtcdConnector))
    }

    /// Plugin that obtains its store through `connector`
    pub fn with_connector(connector: Arc<dyn StoreConnector>) -> Self {
        Self { connector }
    }
}

#[cfg(feature = "etcd")]
impl Default for EtcdPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EtcdPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtcdPlugin").finish_non_exhaustive()
    }
}

#[async_trait]
impl Factory for EtcdPlugin {
    fn plugin_type(&self) -> &str {
        CONFIG_PLUGIN_TYPE
    }

    #[instrument(skip(self, decoder, registry))]
    async fn setup(
        &self,
        name: &str,
        decoder: &dyn Decoder,
        registry: &ConfigRegistry,
    ) -> ConfigResult<()> {
        let config: ConnectionConfig = decoder.decode()?;
        let adapter = Arc::new(EtcdConfig::connect_with(self.connector.as_ref(), &config).await?);

        registry.set_global_kv(adapter.clone()).await;
        registry.register(adapter).await;

        info!(endpoints = ?config.endpoints, "etcd config provider installed");
        Ok(())
    }
}

/// Register the etcd plugin with `plugins`
#[cfg(feature = "etcd")]
pub fn register(plugins: &mut PluginRegistry) {
    plugins.register(PLUGIN_NAME, Arc::new(EtcdPlugin::new()));
}

/// Register the etcd plugin with `plugins`, obtaining stores through `connector`
pub fn register_with(plugins: &mut PluginRegistry, connector: Arc<dyn StoreConnector>) {
    plugins.register(PLUGIN_NAME, Arc::new(EtcdPlugin::with_connector(connector)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryConnector;
    use crate::store::KvStore;
    use kvconf_core::{ConfigError, Context, JsonDecoder};

    struct RefusingConnector;

    #[async_trait]
    impl StoreConnector for RefusingConnector {
        async fn connect(&self, _config: &ConnectionConfig) -> ConfigResult<Arc<dyn KvStore>> {
            Err(ConfigError::connection("new client fail"))
        }
    }

    fn valid_section() -> JsonDecoder {
        JsonDecoder(serde_json::json!({ "endpoints": ["127.0.0.1:2379"] }))
    }

    #[test]
    fn test_plugin_type() {
        let plugin = EtcdPlugin::with_connector(Arc::new(MemoryConnector::default()));
        assert_eq!(plugin.plugin_type(), "config");
    }

    #[tokio::test]
    async fn test_setup_installs_provider() {
        let connector = MemoryConnector::default();
        connector.store().put("test_key", "test_val").await;

        let plugin = EtcdPlugin::with_connector(Arc::new(connector));
        let registry = ConfigRegistry::new();
        plugin.setup("a", &valid_section(), &registry).await.unwrap();

        let ctx = Context::background();
        let kv = registry.global_kv().await.unwrap();
        assert_eq!(kv.get(&ctx, "test_key").await.unwrap().value(), "test_val");

        let provider = registry.get(PLUGIN_NAME).await.unwrap();
        assert_eq!(provider.name(), "etcd");
    }

    #[tokio::test]
    async fn test_setup_decode_failure() {
        let plugin = EtcdPlugin::with_connector(Arc::new(MemoryConnector::default()));
        let registry = ConfigRegistry::new();
        let decoder = JsonDecoder(serde_json::json!({ "endpoints": 2379 }));

        let err = plugin.setup("a", &decoder, &registry).await.unwrap_err();
        assert!(matches!(err, ConfigError::Decode(_)));
        assert!(registry.global_kv().await.is_none());
    }

    #[tokio::test]
    async fn test_setup_connect_failure() {
        let plugin = EtcdPlugin::with_connector(Arc::new(RefusingConnector));
        let registry = ConfigRegistry::new();

        let err = plugin.setup("a", &valid_section(), &registry).await.unwrap_err();
        assert!(matches!(err, ConfigError::Connection(_)));
        assert!(registry.names().await.is_empty());
    }

    #[tokio::test]
    async fn test_register_with() {
        let mut plugins = PluginRegistry::new();
        register_with(&mut plugins, Arc::new(MemoryConnector::default()));
        assert!(plugins.get(CONFIG_PLUGIN_TYPE, PLUGIN_NAME).is_some());
    }
}
