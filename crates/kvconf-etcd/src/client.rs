//! etcd store backed by `etcd-client`

use async_trait::async_trait;
use etcd_client::{Client, ConnectOptions, EventType as EtcdEventType};
use futures::StreamExt;
use kvconf_core::{BoxError, ConfigError, ConfigResult, Context};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::ConnectionConfig;
use crate::store::{
    ChangeEvent, ChangeKind, ChangeStream, GetResponse, KeyValue, KvStore, StoreConnector,
    StoreResult, WatchBatch,
};

/// Store handle over an etcd cluster connection.
///
/// The underlying client multiplexes requests over one channel and is cheap
/// to clone, so every call works on its own clone.
#[derive(Clone)]
pub struct EtcdStore {
    client: Client,
}

impl EtcdStore {
    /// Dial the cluster described by `config`
    #[instrument]
    pub async fn connect(config: &ConnectionConfig) -> ConfigResult<Self> {
        let endpoints: Vec<String> = config
            .validate()?
            .iter()
            .map(|url| url.as_str().trim_end_matches('/').to_string())
            .collect();

        let client = Client::connect(endpoints, Some(connect_options(config)))
            .await
            .map_err(ConfigError::connection)?;
        debug!("Connected to etcd");

        Ok(Self { client })
    }
}

impl std::fmt::Debug for EtcdStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtcdStore").finish_non_exhaustive()
    }
}

fn connect_options(config: &ConnectionConfig) -> ConnectOptions {
    let mut options = ConnectOptions::new().with_keep_alive_while_idle(config.permit_without_stream);

    if let Some((user, password)) = config.credentials() {
        options = options.with_user(user, password);
    }
    if let Some(timeout) = config.dial_timeout() {
        options = options.with_connect_timeout(timeout);
    }
    if let Some(timeout) = config.request_timeout() {
        options = options.with_timeout(timeout);
    }
    if let Some((interval, timeout)) = config.keep_alive() {
        options = options.with_keep_alive(interval, timeout);
    }

    options
}

fn key_value(kv: &etcd_client::KeyValue) -> KeyValue {
    KeyValue::new(kv.key(), kv.value())
}

fn change_event(event: &etcd_client::Event) -> ChangeEvent {
    let kind = match event.event_type() {
        EtcdEventType::Put => ChangeKind::Put,
        EtcdEventType::Delete => ChangeKind::Delete,
    };
    ChangeEvent {
        kind,
        kv: event.kv().map(key_value).unwrap_or_default(),
    }
}

#[async_trait]
impl KvStore for EtcdStore {
    async fn get(&self, key: &str) -> StoreResult<GetResponse> {
        let mut kv = self.client.kv_client();
        let rsp = kv.get(key, None).await?;
        Ok(GetResponse {
            kvs: rsp.kvs().iter().map(key_value).collect(),
            count: rsp.count(),
        })
    }

    async fn watch(&self, ctx: &Context, key: &str) -> StoreResult<ChangeStream> {
        let mut watch_client = self.client.watch_client();
        let (watcher, stream) = watch_client.watch(key, None).await?;

        // The watcher travels with the stream; dropping it ends the subscription.
        let batches = futures::stream::unfold((watcher, stream), |(watcher, mut stream)| async move {
            match stream.message().await {
                Ok(Some(rsp)) if rsp.canceled() => None,
                Ok(Some(rsp)) => {
                    let batch = WatchBatch::new(rsp.events().iter().map(change_event).collect());
                    Some((Ok(batch), (watcher, stream)))
                }
                Ok(None) => None,
                Err(err) => Some((Err(BoxError::from(err)), (watcher, stream))),
            }
        });

        let ctx = ctx.clone();
        Ok(batches.take_until(async move { ctx.done().await }).boxed())
    }
}

/// Connector dialing a real etcd cluster
#[derive(Debug, Clone, Copy, Default)]
pub struct EtcdConnector;

#[async_trait]
impl StoreConnector for EtcdConnector {
    async fn connect(&self, config: &ConnectionConfig) -> ConfigResult<Arc<dyn KvStore>> {
        let store = EtcdStore::connect(config).await?;
        Ok(Arc::new(store))
    }
}
