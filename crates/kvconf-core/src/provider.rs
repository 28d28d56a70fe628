//! Provider capability traits
//!
//! A configuration provider is anything implementing [`KvConfig`]: point
//! reads and writes through [`Kv`], live change streams through [`Watcher`],
//! and a stable name used by the [`crate::ConfigRegistry`].

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use tokio::sync::mpsc;

use crate::context::Context;
use crate::error::ConfigResult;
use crate::response::Response;

/// Key-value access to configuration content
#[async_trait]
pub trait Kv: Send + Sync {
    /// Fetch the configuration value stored under `key`
    async fn get(&self, ctx: &Context, key: &str) -> ConfigResult<Response>;

    /// Create or update the value stored under `key`
    async fn put(&self, ctx: &Context, key: &str, value: &str) -> ConfigResult<()>;

    /// Delete the value stored under `key`
    async fn del(&self, ctx: &Context, key: &str) -> ConfigResult<()>;
}

/// Live change notification for configuration keys
#[async_trait]
pub trait Watcher: Send + Sync {
    /// Subscribe to changes of `key` until `ctx` is done
    async fn watch(&self, ctx: &Context, key: &str) -> ConfigResult<WatchStream>;
}

/// A named provider offering both [`Kv`] and [`Watcher`]
pub trait KvConfig: Kv + Watcher {
    /// Name the provider is registered under
    fn name(&self) -> &str;
}

/// Receiving half of a watch subscription.
///
/// Yields [`Response`]s in the order the store delivered them and ends
/// silently once the producing task stops.
#[derive(Debug)]
pub struct WatchStream {
    rx: mpsc::Receiver<Response>,
}

impl WatchStream {
    /// Create a bounded channel and return its sender with the stream.
    pub fn channel(capacity: usize) -> (mpsc::Sender<Response>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }

    /// Wait for the next response; `None` once the stream has closed.
    pub async fn recv(&mut self) -> Option<Response> {
        self.rx.recv().await
    }

    /// Stop receiving; the producing task exits on its next send.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

impl Stream for WatchStream {
    type Item = Response;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
