//! MQTT Physical Adapter Configuration
//!
//! This crate binds MQTT topics to the properties, events and actions of a
//! physical asset so an MQTT device can be exposed as a digital twin without
//! hand-written protocol code.
//!
//! ## Architecture
//!
//! ```text
//! DeclarativeLoader ──┐
//!                     ├──→ ConfigurationBuilder ──→ Configuration
//! direct builder calls┘        │                      ├─ connection parameters
//!                              ├─ BindingRegistry ───→├─ incoming / outgoing bindings
//!                              └─ asset descriptors ─→└─ PhysicalAssetDescription
//! ```
//!
//! - **coercion**: converts string payloads to [`TypedValue`]s and back
//! - **topic**: incoming bindings (payload → model events) and outgoing
//!   bindings (action value → payload)
//! - **registry**: per-direction topic uniqueness
//! - **builder**: validation and freezing into an immutable [`Configuration`]
//! - **loader**: replays a parsed YAML/JSON document through the builder
//!
//! The broker connection itself, subscriptions and publishing belong to the
//! transport client that consumes the [`Configuration`].
//!
//! ## Example
//!
//! ```
//! use neomind_mqtt_adapter::{coercion, ConfigurationBuilder, TypedValue, ValueType};
//!
//! let mut builder = ConfigurationBuilder::with_client_id("127.0.0.1", 1883, "demo")?;
//! builder
//!     .add_typed_property_and_topic(
//!         "intensity",
//!         TypedValue::Integer(0),
//!         "sensor/intensity",
//!         ValueType::Integer,
//!     )?
//!     .add_action_and_topic(
//!         "switch-off",
//!         "sensor.actuation",
//!         "text/plain",
//!         "sensor/actions/switch",
//!         coercion::prefixed("switch"),
//!     )?;
//! let config = builder.build()?;
//!
//! let events = config.incoming_topics()[0].apply("42")?;
//! assert_eq!(events[0].value(), &TypedValue::Integer(42));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod coercion;
pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod persistence;
pub mod registry;
pub mod topic;
pub mod value;

pub use builder::ConfigurationBuilder;
pub use config::{
    ClientIdGenerator, Configuration, ConnectOptions, Credentials, RandomClientId,
    CLIENT_ID_PREFIX, DEFAULT_CONNECTION_TIMEOUT_SECS,
};
pub use error::{AdapterConfigError, CoercionError, Result, TopicDirection};
pub use loader::{ConfigNode, DeclarativeLoader};
pub use model::{
    PhysicalAssetAction, PhysicalAssetDescription, PhysicalAssetEvent, PhysicalAssetProperty,
};
pub use persistence::{ClientPersistence, MemoryPersistence, PersistenceError};
pub use registry::BindingRegistry;
pub use topic::{DecodeFn, EncodeFn, IncomingTopic, ModelEvent, OutgoingTopic, SubscribeFn};
pub use value::{TypedValue, ValueType};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
