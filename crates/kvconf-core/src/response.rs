//! Normalized configuration responses

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of change a [`Response`] describes.
///
/// Plain reads always carry [`EventType::Null`]; responses delivered on a
/// watch stream carry [`EventType::Put`] or [`EventType::Delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// No change event (a point read, or an unrecognized store event)
    #[default]
    Null,
    /// Key created or updated
    Put,
    /// Key deleted
    Delete,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Null => write!(f, "null"),
            EventType::Put => write!(f, "put"),
            EventType::Delete => write!(f, "delete"),
        }
    }
}

/// Outcome of a read or of a single watch event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    value: String,
    metadata: HashMap<String, String>,
    event: EventType,
}

impl Response {
    /// Response for a point read.
    pub fn from_get(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            metadata: HashMap::new(),
            event: EventType::Null,
        }
    }

    /// Response for a change delivered on a watch stream.
    pub fn from_event(value: impl Into<String>, event: EventType) -> Self {
        Self {
            value: value.into(),
            metadata: HashMap::new(),
            event,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    pub fn event(&self) -> EventType {
        self.event
    }

    pub fn into_value(self) -> String {
        self.value
    }
}
