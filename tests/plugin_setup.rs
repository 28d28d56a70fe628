//! Plugin registration and setup through the host-facing registries

use kvconf_core::{
    ConfigError, ConfigRegistry, Context, JsonDecoder, Kv, KvConfig, PluginRegistry, TomlDecoder,
    Watcher, CONFIG_PLUGIN_TYPE,
};
use kvconf_etcd::{register_with, MemoryConnector, MemoryStore, PLUGIN_NAME};
use kvconf_integration_tests::{init_tracing, RefusingConnector};
use std::sync::Arc;

const ETCD_SECTION: &str = r#"
endpoints = ["127.0.0.1:2379", "127.0.0.1:22379"]
dial_timeout_ms = 5000
username = "config-reader"
password = "secret"
"#;

#[tokio::test]
async fn test_setup_from_toml_section() {
    init_tracing();

    let store = MemoryStore::new();
    store.put("service/timeout", "30s").await;

    let mut plugins = PluginRegistry::new();
    register_with(&mut plugins, Arc::new(MemoryConnector::new(store.clone())));

    let registry = ConfigRegistry::new();
    let decoder = TomlDecoder::parse(ETCD_SECTION).unwrap();
    plugins
        .setup(CONFIG_PLUGIN_TYPE, PLUGIN_NAME, &decoder, &registry)
        .await
        .unwrap();

    assert_eq!(registry.names().await, vec!["etcd".to_string()]);

    let ctx = Context::background();
    let kv = registry.global_kv().await.unwrap();
    assert_eq!(kv.get(&ctx, "service/timeout").await.unwrap().value(), "30s");

    let provider = registry.get("etcd").await.unwrap();
    assert_eq!(provider.name(), "etcd");
    assert!(provider
        .put(&ctx, "service/timeout", "60s")
        .await
        .unwrap_err()
        .is_not_implemented());

    let mut changes = provider.watch(&ctx, "service/timeout").await.unwrap();
    store.put("service/timeout", "45s").await;
    assert_eq!(changes.recv().await.unwrap().value(), "45s");
}

#[tokio::test]
async fn test_setup_rejected_connection() {
    init_tracing();

    let mut plugins = PluginRegistry::new();
    register_with(
        &mut plugins,
        Arc::new(RefusingConnector {
            reason: "construct client fail".to_string(),
        }),
    );

    let registry = ConfigRegistry::new();
    let decoder = TomlDecoder::parse(ETCD_SECTION).unwrap();
    let err = plugins
        .setup(CONFIG_PLUGIN_TYPE, PLUGIN_NAME, &decoder, &registry)
        .await
        .unwrap_err();

    assert!(matches!(err, ConfigError::Connection(_)));
    assert!(registry.global_kv().await.is_none());
    assert!(registry.get("etcd").await.is_none());
}

#[tokio::test]
async fn test_setup_malformed_endpoint() {
    init_tracing();

    let mut plugins = PluginRegistry::new();
    register_with(&mut plugins, Arc::new(MemoryConnector::default()));

    let registry = ConfigRegistry::new();
    let decoder = JsonDecoder(serde_json::json!({ "endpoints": ["etcd-0"] }));
    let err = plugins
        .setup(CONFIG_PLUGIN_TYPE, PLUGIN_NAME, &decoder, &registry)
        .await
        .unwrap_err();

    assert!(matches!(err, ConfigError::Connection(_)));
    assert!(registry.names().await.is_empty());
}

#[tokio::test]
async fn test_setup_undecodable_section() {
    init_tracing();

    let mut plugins = PluginRegistry::new();
    register_with(&mut plugins, Arc::new(MemoryConnector::default()));

    let registry = ConfigRegistry::new();
    let decoder = TomlDecoder::parse("endpoints = [\"127.0.0.1:2379\"]\nretries = 3\n").unwrap();
    let err = plugins
        .setup(CONFIG_PLUGIN_TYPE, PLUGIN_NAME, &decoder, &registry)
        .await
        .unwrap_err();

    assert!(matches!(err, ConfigError::Decode(_)));
}

#[tokio::test]
async fn test_unknown_plugin_name() {
    let plugins = PluginRegistry::new();
    let registry = ConfigRegistry::new();
    let decoder = JsonDecoder(serde_json::Value::Null);

    let err = plugins
        .setup(CONFIG_PLUGIN_TYPE, "consul", &decoder, &registry)
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::PluginNotFound { .. }));
}
