//! etcd configuration provider
//!
//! Adapts an etcd store into a [`kvconf_core::KvConfig`] provider:
//! - [`EtcdConfig`]: point reads of one key and live watches of one key
//! - [`EtcdPlugin`]: `config` plugin factory that connects and registers the adapter
//! - [`KvStore`] / [`StoreConnector`]: the store capability the adapter consumes
//! - [`MemoryStore`]: in-process store for development and tests
//! - `EtcdStore` (feature `etcd`): store backed by `etcd-client`
//!
//! Writes and multi-value reads fail with [`kvconf_core::ConfigError::NotImplemented`].
//!
//! # Example
//!
//! ```rust
//! use kvconf_core::{Context, Kv, Watcher};
//! use kvconf_etcd::{EtcdConfig, MemoryStore};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! store.put("app/log_level", "debug").await;
//!
//! let config = EtcdConfig::new(Arc::new(store.clone()));
//! let ctx = Context::background();
//! assert_eq!(config.get(&ctx, "app/log_level").await?.value(), "debug");
//!
//! let mut changes = config.watch(&ctx, "app/log_level").await?;
//! store.put("app/log_level", "info").await;
//! assert_eq!(changes.recv().await.unwrap().value(), "info");
//! # Ok(())
//! # }
//! ```

pub mod adapter;
#[cfg(feature = "etcd")]
pub mod client;
pub mod config;
pub mod memory;
pub mod plugin;
pub mod store;

pub use adapter::{EtcdConfig, PROVIDER_NAME};
#[cfg(feature = "etcd")]
pub use client::{EtcdConnector, EtcdStore};
pub use config::ConnectionConfig;
pub use memory::{MemoryConnector, MemoryStore};
#[cfg(feature = "etcd")]
pub use plugin::register;
pub use plugin::{register_with, EtcdPlugin, PLUGIN_NAME};
pub use store::{
    ChangeEvent, ChangeKind, ChangeStream, GetResponse, KeyValue, KvStore, StoreConnector,
    StoreResult, WatchBatch,
};
