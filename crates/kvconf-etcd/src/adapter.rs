//! etcd configuration adapter
//!
//! Thin adapter exposing an etcd store as a configuration provider. Reads
//! return a single key's value; watches forward change events for one key in
//! store order. Writes and multi-value reads are not supported.

use async_trait::async_trait;
use futures::StreamExt;
use kvconf_core::{
    ConfigError, ConfigResult, Context, EventType, Kv, KvConfig, Response, WatchStream, Watcher,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn, Instrument};

use crate::config::ConnectionConfig;
use crate::store::{ChangeEvent, ChangeStream, KvStore, StoreConnector};

/// Name the adapter is registered under
pub const PROVIDER_NAME: &str = "etcd";

/// Slots in a watch stream's output buffer. A slow consumer blocks the
/// forwarding task rather than letting events pile up.
const WATCH_BUFFER: usize = 1;

/// etcd-backed configuration provider
#[derive(Clone)]
pub struct EtcdConfig {
    store: Arc<dyn KvStore>,
}

impl EtcdConfig {
    /// Bind the adapter to an existing store handle
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Connect to the etcd cluster described by `config`
    #[cfg(feature = "etcd")]
    pub async fn connect(config: &ConnectionConfig) -> ConfigResult<Self> {
        Self::connect_with(&crate::client::EtcdConnector, config).await
    }

    /// Validate `config` and connect through `connector`
    #[instrument(skip(connector))]
    pub async fn connect_with(
        connector: &dyn StoreConnector,
        config: &ConnectionConfig,
    ) -> ConfigResult<Self> {
        config.validate()?;
        let store = connector.connect(config).await?;
        debug!("Store connection established");
        Ok(Self::new(store))
    }
}

impl std::fmt::Debug for EtcdConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtcdConfig").finish_non_exhaustive()
    }
}

#[async_trait]
impl Kv for EtcdConfig {
    #[instrument(skip(self, ctx))]
    async fn get(&self, ctx: &Context, key: &str) -> ConfigResult<Response> {
        let result = tokio::select! {
            biased;
            err = ctx.done() => return Err(err),
            result = self.store.get(key) => result.map_err(ConfigError::Store)?,
        };

        if result.count > 1 || result.kvs.len() > 1 {
            debug!(count = result.count, "Multi-value read rejected");
            return Err(ConfigError::NotImplemented);
        }

        let value = result
            .kvs
            .last()
            .map(|kv| kv.value_str().into_owned())
            .unwrap_or_default();
        Ok(Response::from_get(value))
    }

    async fn put(&self, _ctx: &Context, _key: &str, _value: &str) -> ConfigResult<()> {
        Err(ConfigError::NotImplemented)
    }

    async fn del(&self, _ctx: &Context, _key: &str) -> ConfigResult<()> {
        Err(ConfigError::NotImplemented)
    }
}

#[async_trait]
impl Watcher for EtcdConfig {
    #[instrument(skip(self, ctx))]
    async fn watch(&self, ctx: &Context, key: &str) -> ConfigResult<WatchStream> {
        let changes = self.store.watch(ctx, key).await.map_err(ConfigError::Store)?;
        let (tx, stream) = WatchStream::channel(WATCH_BUFFER);

        let span = tracing::debug_span!("etcd_watch", key = %key);
        tokio::spawn(forward_changes(ctx.clone(), changes, tx).instrument(span));

        Ok(stream)
    }
}

impl KvConfig for EtcdConfig {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

/// Translate store events into responses until the context is done, the
/// store closes the subscription, or the consumer goes away.
async fn forward_changes(ctx: Context, mut changes: ChangeStream, tx: mpsc::Sender<Response>) {
    loop {
        let batch = tokio::select! {
            biased;
            _ = ctx.done() => {
                debug!("Watch context done");
                return;
            }
            next = changes.next() => match next {
                Some(Ok(batch)) => batch,
                Some(Err(err)) => {
                    warn!(error = %err, "Watch subscription failed, closing stream");
                    return;
                }
                None => {
                    debug!("Watch subscription closed by store");
                    return;
                }
            },
        };

        for event in batch.events {
            let rsp = to_response(event);
            tokio::select! {
                biased;
                _ = ctx.done() => return,
                sent = tx.send(rsp) => {
                    if sent.is_err() {
                        debug!("Watch consumer dropped");
                        return;
                    }
                }
            }
        }
    }
}

fn to_response(event: ChangeEvent) -> Response {
    let event_type = EventType::from(event.kind);
    Response::from_event(event.kv.value_str(), event_type)
}
