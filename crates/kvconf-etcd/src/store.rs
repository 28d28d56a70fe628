//! Store capability consumed by the adapter
//!
//! The adapter never talks to etcd directly. It reads and watches through
//! [`KvStore`], which the etcd client, the in-memory store, and test doubles
//! all implement.

use async_trait::async_trait;
use futures::stream::BoxStream;
use kvconf_core::{BoxError, ConfigResult, Context, EventType};
use std::borrow::Cow;
use std::sync::Arc;

use crate::config::ConnectionConfig;

/// Result type for store operations; errors are passed on verbatim
pub type StoreResult<T> = Result<T, BoxError>;

/// Stream of change notifications for one watched key
pub type ChangeStream = BoxStream<'static, StoreResult<WatchBatch>>;

/// A stored key and its value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValue {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl KeyValue {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Value as text; invalid UTF-8 is replaced
    pub fn value_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.value)
    }
}

/// Result of a point read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetResponse {
    /// Entries returned by the store
    pub kvs: Vec<KeyValue>,
    /// Number of entries the store matched, which may exceed `kvs.len()`
    pub count: i64,
}

impl GetResponse {
    pub fn from_kvs(kvs: Vec<KeyValue>) -> Self {
        let count = kvs.len() as i64;
        Self { kvs, count }
    }
}

/// Kind of a store change event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Key created or updated
    Put,
    /// Key removed
    Delete,
    /// Event kind this crate does not know, carrying the raw tag
    Other(i32),
}

impl From<ChangeKind> for EventType {
    fn from(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Put => EventType::Put,
            ChangeKind::Delete => EventType::Delete,
            ChangeKind::Other(_) => EventType::Null,
        }
    }
}

/// A single change to a watched key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// The key's new state; deletes carry an empty value
    pub kv: KeyValue,
}

impl ChangeEvent {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: ChangeKind::Put,
            kv: KeyValue::new(key, value),
        }
    }

    pub fn delete(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: ChangeKind::Delete,
            kv: KeyValue::new(key, value),
        }
    }
}

/// One notification from the store; may carry several events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchBatch {
    pub events: Vec<ChangeEvent>,
}

impl WatchBatch {
    pub fn new(events: Vec<ChangeEvent>) -> Self {
        Self { events }
    }
}

/// Read and watch access to a key-value store.
///
/// Implementations must be safe to share between concurrent gets and
/// watches without extra locking by the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Point lookup of `key`
    async fn get(&self, key: &str) -> StoreResult<GetResponse>;

    /// Subscribe to changes of `key`.
    ///
    /// The returned stream ends once `ctx` is done or the store closes the
    /// subscription.
    async fn watch(&self, ctx: &Context, key: &str) -> StoreResult<ChangeStream>;
}

/// Builds a store handle from a connection configuration
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Connect to the store; failures are [`kvconf_core::ConfigError::Connection`]
    async fn connect(&self, config: &ConnectionConfig) -> ConfigResult<Arc<dyn KvStore>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_kind_to_event_type() {
        assert_eq!(EventType::from(ChangeKind::Put), EventType::Put);
        assert_eq!(EventType::from(ChangeKind::Delete), EventType::Delete);
        assert_eq!(EventType::from(ChangeKind::Other(7)), EventType::Null);
    }

    #[test]
    fn test_value_str_is_lossy() {
        let kv = KeyValue::new("k", vec![b'o', b'k', 0xff]);
        assert_eq!(kv.value_str(), "ok\u{fffd}");
    }

    #[test]
    fn test_get_response_count() {
        let rsp = GetResponse::from_kvs(vec![KeyValue::new("a", "1"), KeyValue::new("a", "2")]);
        assert_eq!(rsp.count, 2);
        assert_eq!(GetResponse::default().count, 0);
    }
}
