//! Error types for adapter configuration.
//!
//! Every failure is reported synchronously to the caller of the operation
//! that detected it. Nothing here is retried.

use std::fmt;

use thiserror::Error;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, AdapterConfigError>;

/// Maximum number of characters of a raw payload kept in a [`CoercionError`].
const RAW_SNIPPET_LEN: usize = 64;

/// Direction of a topic binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicDirection {
    /// Topics the adapter subscribes to.
    Incoming,
    /// Topics the adapter publishes on.
    Outgoing,
}

impl fmt::Display for TopicDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incoming => write!(f, "incoming"),
            Self::Outgoing => write!(f, "outgoing"),
        }
    }
}

/// Error type for adapter configuration.
#[derive(Debug, Error)]
pub enum AdapterConfigError {
    /// Invalid or missing required argument, or an empty configuration at build time
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid topic string or conversion function
    #[error("Binding error: {0}")]
    Binding(String),

    /// Topic already registered in the same direction
    #[error("Topic '{topic}' is already registered as an {direction} topic")]
    DuplicateTopic {
        topic: String,
        direction: TopicDirection,
    },

    /// Payload or literal does not parse as its declared type
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    /// A declarative entry could not be applied
    #[error("Invalid declaration '{key}': {source}")]
    Declaration {
        key: String,
        #[source]
        source: Box<AdapterConfigError>,
    },
}

impl AdapterConfigError {
    /// Wrap this error with the key of the declaration that raised it.
    pub fn in_declaration(self, key: impl Into<String>) -> Self {
        Self::Declaration {
            key: key.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through declaration wrappers.
    pub fn root(&self) -> &AdapterConfigError {
        match self {
            Self::Declaration { source, .. } => source.root(),
            other => other,
        }
    }
}

/// A raw value could not be converted to or from its declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot decode {raw:?} as {type_name}: {cause}")]
pub struct CoercionError {
    /// Declared type name
    pub type_name: String,
    /// Leading part of the offending input
    pub raw: String,
    /// What went wrong
    pub cause: String,
}

impl CoercionError {
    pub fn new(type_name: impl Into<String>, raw: &str, cause: impl fmt::Display) -> Self {
        let mut snippet: String = raw.chars().take(RAW_SNIPPET_LEN).collect();
        if raw.chars().count() > RAW_SNIPPET_LEN {
            snippet.push_str("...");
        }
        Self {
            type_name: type_name.into(),
            raw: snippet,
            cause: cause.to_string(),
        }
    }
}
