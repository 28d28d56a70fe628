//! Shared fixtures for the kvconf integration tests

use async_trait::async_trait;
use futures::StreamExt;
use kvconf_core::{ConfigError, ConfigResult, Context};
use kvconf_etcd::{
    ChangeStream, ConnectionConfig, GetResponse, KvStore, StoreConnector, StoreResult, WatchBatch,
};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Install a test-friendly subscriber; `RUST_LOG` overrides the default `warn` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Store answering reads from a fixed response and replaying scripted watch batches
#[derive(Default)]
pub struct ScriptedStore {
    get: Mutex<GetResponse>,
    batches: Mutex<Vec<WatchBatch>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_get(self, rsp: GetResponse) -> Self {
        *self.get.lock().expect("scripted store poisoned") = rsp;
        self
    }

    /// Batches handed to the next watch subscription, in order
    pub fn with_batches(self, batches: Vec<WatchBatch>) -> Self {
        *self.batches.lock().expect("scripted store poisoned") = batches;
        self
    }
}

#[async_trait]
impl KvStore for ScriptedStore {
    async fn get(&self, _key: &str) -> StoreResult<GetResponse> {
        Ok(self.get.lock().expect("scripted store poisoned").clone())
    }

    async fn watch(&self, _ctx: &Context, _key: &str) -> StoreResult<ChangeStream> {
        let batches = std::mem::take(&mut *self.batches.lock().expect("scripted store poisoned"));
        Ok(futures::stream::iter(batches.into_iter().map(Ok)).boxed())
    }
}

/// Connector that always fails, as if the client rejected the configuration
#[derive(Debug, Clone, Default)]
pub struct RefusingConnector {
    pub reason: String,
}

#[async_trait]
impl StoreConnector for RefusingConnector {
    async fn connect(&self, _config: &ConnectionConfig) -> ConfigResult<Arc<dyn KvStore>> {
        Err(ConfigError::connection(self.reason.clone()))
    }
}
