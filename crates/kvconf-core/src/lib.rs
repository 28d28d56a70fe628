//! Configuration provider contract
//!
//! This crate defines what a configuration provider looks like to the host:
//! - [`Response`] and [`EventType`]: a normalized value plus its change kind
//! - [`Kv`], [`Watcher`] and [`KvConfig`]: the capabilities a provider offers
//! - [`WatchStream`]: the single-consumer stream a watch subscription returns
//! - [`Context`]: cooperative cancellation and deadlines for provider calls
//! - [`ConfigRegistry`]: the default provider slot and the named provider table
//! - [`Factory`], [`Decoder`] and [`PluginRegistry`]: plugin setup
//!
//! Store backends live in their own crates and implement these traits.

pub mod context;
pub mod error;
pub mod plugin;
pub mod provider;
pub mod registry;
pub mod response;

pub use context::Context;
pub use error::{BoxError, ConfigError, ConfigResult};
pub use plugin::{Decoder, Factory, JsonDecoder, PluginRegistry, TomlDecoder, CONFIG_PLUGIN_TYPE};
pub use provider::{Kv, KvConfig, WatchStream, Watcher};
pub use registry::ConfigRegistry;
pub use response::{EventType, Response};
