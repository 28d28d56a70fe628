//! Configuration provider registry
//!
//! Replaces process-wide mutable state with an explicit object that hosts
//! create at startup and hand to plugin setup.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::provider::{Kv, KvConfig};

/// Default key-value slot plus a table of named providers
#[derive(Default)]
pub struct ConfigRegistry {
    /// Provider used when callers do not name one
    global_kv: RwLock<Option<Arc<dyn Kv>>>,
    /// Providers keyed by their name
    providers: RwLock<HashMap<String, Arc<dyn KvConfig>>>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `kv` as the default key-value provider, replacing any previous one.
    pub async fn set_global_kv(&self, kv: Arc<dyn Kv>) {
        let mut slot = self.global_kv.write().await;
        *slot = Some(kv);
        debug!("Default key-value provider installed");
    }

    pub async fn global_kv(&self) -> Option<Arc<dyn Kv>> {
        self.global_kv.read().await.clone()
    }

    /// Register `provider` under its own name.
    #[instrument(skip(self, provider), fields(provider = %provider.name()))]
    pub async fn register(&self, provider: Arc<dyn KvConfig>) {
        let name = provider.name().to_string();
        let mut providers = self.providers.write().await;
        if providers.insert(name, provider).is_some() {
            debug!("Replaced previously registered provider");
        }
    }

    pub async fn get(&self, name: &str) -> Option<Arc<dyn KvConfig>> {
        self.providers.read().await.get(name).cloned()
    }

    /// Names of all registered providers, sorted
    pub async fn names(&self) -> Vec<String> {
        let providers = self.providers.read().await;
        let mut names: Vec<String> = providers.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigRegistry").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::error::{ConfigError, ConfigResult};
    use crate::provider::{WatchStream, Watcher};
    use crate::response::Response;
    use async_trait::async_trait;

    struct StaticProvider {
        name: &'static str,
        value: &'static str,
    }

    #[async_trait]
    impl Kv for StaticProvider {
        async fn get(&self, _ctx: &Context, _key: &str) -> ConfigResult<Response> {
            Ok(Response::from_get(self.value))
        }

        async fn put(&self, _ctx: &Context, _key: &str, _value: &str) -> ConfigResult<()> {
            Err(ConfigError::NotImplemented)
        }

        async fn del(&self, _ctx: &Context, _key: &str) -> ConfigResult<()> {
            Err(ConfigError::NotImplemented)
        }
    }

    #[async_trait]
    impl Watcher for StaticProvider {
        async fn watch(&self, _ctx: &Context, _key: &str) -> ConfigResult<WatchStream> {
            let (_tx, stream) = WatchStream::channel(1);
            Ok(stream)
        }
    }

    impl KvConfig for StaticProvider {
        fn name(&self) -> &str {
            self.name
        }
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let registry = ConfigRegistry::new();
        assert!(registry.global_kv().await.is_none());
        assert!(registry.get("etcd").await.is_none());
        assert!(registry.names().await.is_empty());
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = ConfigRegistry::new();
        let provider = Arc::new(StaticProvider { name: "static", value: "v1" });

        registry.set_global_kv(provider.clone()).await;
        registry.register(provider).await;

        let ctx = Context::background();
        let kv = registry.global_kv().await.unwrap();
        assert_eq!(kv.get(&ctx, "any").await.unwrap().value(), "v1");

        let named = registry.get("static").await.unwrap();
        assert_eq!(named.name(), "static");
        assert_eq!(registry.names().await, vec!["static".to_string()]);
    }

    #[tokio::test]
    async fn test_register_same_name_replaces() {
        let registry = ConfigRegistry::new();
        registry
            .register(Arc::new(StaticProvider { name: "static", value: "old" }))
            .await;
        registry
            .register(Arc::new(StaticProvider { name: "static", value: "new" }))
            .await;

        let ctx = Context::background();
        let provider = registry.get("static").await.unwrap();
        assert_eq!(provider.get(&ctx, "k").await.unwrap().value(), "new");
        assert_eq!(registry.names().await.len(), 1);
    }
}
