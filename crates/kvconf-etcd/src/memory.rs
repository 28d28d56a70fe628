//! In-process store
//!
//! Holds keys in memory and notifies watchers on every change. Useful for
//! local development and for exercising the adapter without a cluster.

use async_trait::async_trait;
use futures::StreamExt;
use kvconf_core::{BoxError, ConfigResult, Context};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, instrument};

use crate::config::ConnectionConfig;
use crate::store::{
    ChangeEvent, ChangeStream, GetResponse, KeyValue, KvStore, StoreConnector, StoreResult,
    WatchBatch,
};

#[derive(Default)]
struct Inner {
    data: BTreeMap<String, Vec<u8>>,
    watchers: HashMap<String, Vec<mpsc::UnboundedSender<WatchBatch>>>,
}

impl Inner {
    fn notify(&mut self, key: &str, event: ChangeEvent) {
        if let Some(senders) = self.watchers.get_mut(key) {
            let batch = WatchBatch::new(vec![event]);
            senders.retain(|tx| tx.send(batch.clone()).is_ok());
            if senders.is_empty() {
                self.watchers.remove(key);
            }
        }
    }
}

/// Key-value store kept in process memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or update `key` and notify its watchers
    #[instrument(skip(self, value))]
    pub async fn put(&self, key: &str, value: impl Into<Vec<u8>>) {
        let value = value.into();
        let mut inner = self.inner.write().await;
        inner.data.insert(key.to_string(), value.clone());
        inner.notify(key, ChangeEvent::put(key, value));
        debug!("Key stored");
    }

    /// Remove `key`; returns whether it existed
    #[instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.write().await;
        let existed = inner.data.remove(key).is_some();
        if existed {
            inner.notify(key, ChangeEvent::delete(key, Vec::<u8>::new()));
            debug!("Key deleted");
        }
        existed
    }

    /// Number of live watch subscriptions on `key`
    pub async fn watcher_count(&self, key: &str) -> usize {
        let inner = self.inner.read().await;
        inner
            .watchers
            .get(key)
            .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<GetResponse> {
        let inner = self.inner.read().await;
        let kvs = inner
            .data
            .get(key)
            .map(|value| vec![KeyValue::new(key, value.clone())])
            .unwrap_or_default();
        Ok(GetResponse::from_kvs(kvs))
    }

    async fn watch(&self, ctx: &Context, key: &str) -> StoreResult<ChangeStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut inner = self.inner.write().await;
            let senders = inner.watchers.entry(key.to_string()).or_default();
            senders.retain(|tx| !tx.is_closed());
            senders.push(tx);
        }

        let ctx = ctx.clone();
        let batches = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|batch| (Ok::<_, BoxError>(batch), rx))
        })
        .take_until(async move { ctx.done().await });

        Ok(batches.boxed())
    }
}

/// Connector that hands out a shared [`MemoryStore`] after validating the config
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    store: MemoryStore,
}

impl MemoryConnector {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    async fn connect(&self, config: &ConnectionConfig) -> ConfigResult<Arc<dyn KvStore>> {
        config.validate()?;
        Ok(Arc::new(self.store.clone()))
    }
}
