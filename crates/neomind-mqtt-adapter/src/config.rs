//! Frozen adapter configuration.
//!
//! A [`Configuration`] is produced once by
//! [`ConfigurationBuilder::build`](crate::ConfigurationBuilder::build) and is
//! read-only afterwards, so it can be shared across threads without locking.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{AdapterConfigError, Result};
use crate::model::PhysicalAssetDescription;
use crate::persistence::ClientPersistence;
use crate::registry::BindingRegistry;
use crate::topic::{IncomingTopic, OutgoingTopic};

/// Prefix of generated client identifiers.
pub const CLIENT_ID_PREFIX: &str = "neomind.mqtt.client.";

/// Default connection timeout in seconds.
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 10;

/// Produces a client identifier when none is given explicitly.
pub trait ClientIdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

impl<F> ClientIdGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn generate(&self) -> String {
        self()
    }
}

/// Generates `neomind.mqtt.client.<random i32>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomClientId;

impl ClientIdGenerator for RandomClientId {
    fn generate(&self) -> String {
        format!("{}{}", CLIENT_ID_PREFIX, rand::thread_rng().gen::<i32>())
    }
}

/// Broker credentials. Both parts are non-empty.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCredentials")]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let username = username.into();
        let password = password.into();
        if username.is_empty() || password.is_empty() {
            return Err(AdapterConfigError::Configuration(
                "username and password must both be non-empty".to_string(),
            ));
        }
        Ok(Self { username, password })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

#[derive(Deserialize)]
struct RawCredentials {
    username: String,
    password: String,
}

impl TryFrom<RawCredentials> for Credentials {
    type Error = AdapterConfigError;

    fn try_from(raw: RawCredentials) -> Result<Self> {
        Self::new(raw.username, raw.password)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Session options handed to the transport client when connecting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOptions {
    #[serde(default = "default_true")]
    pub clean_session: bool,

    #[serde(default = "default_true")]
    pub automatic_reconnect: bool,

    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
}

fn default_true() -> bool {
    true
}

fn default_connection_timeout() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT_SECS
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            clean_session: true,
            automatic_reconnect: true,
            connection_timeout_secs: DEFAULT_CONNECTION_TIMEOUT_SECS,
            credentials: None,
        }
    }
}

/// Immutable configuration of an MQTT physical adapter.
#[derive(Clone)]
pub struct Configuration {
    pub(crate) broker_address: String,
    pub(crate) broker_port: u16,
    pub(crate) client_id: String,
    pub(crate) options: ConnectOptions,
    pub(crate) persistence: Arc<dyn ClientPersistence>,
    pub(crate) registry: BindingRegistry,
    pub(crate) description: PhysicalAssetDescription,
}

impl Configuration {
    pub fn broker_address(&self) -> &str {
        &self.broker_address
    }

    pub fn broker_port(&self) -> u16 {
        self.broker_port
    }

    /// Broker URI in the form `tcp://host:port`.
    pub fn broker_connection_string(&self) -> String {
        format!("tcp://{}:{}", self.broker_address, self.broker_port)
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn connect_options(&self) -> &ConnectOptions {
        &self.options
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.options.credentials.as_ref()
    }

    pub fn persistence(&self) -> Arc<dyn ClientPersistence> {
        Arc::clone(&self.persistence)
    }

    /// Incoming bindings in subscription order.
    pub fn incoming_topics(&self) -> &[IncomingTopic] {
        self.registry.incoming()
    }

    /// Outgoing bindings keyed by action.
    pub fn outgoing_topics(&self) -> &BTreeMap<String, OutgoingTopic> {
        self.registry.outgoing()
    }

    /// Outgoing binding for an action; `None` means the action has no wire
    /// representation.
    pub fn outgoing_topic_by_action_key(&self, action_key: &str) -> Option<&OutgoingTopic> {
        self.registry.lookup_outgoing(action_key)
    }

    pub fn physical_asset_description(&self) -> &PhysicalAssetDescription {
        &self.description
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("broker_address", &self.broker_address)
            .field("broker_port", &self.broker_port)
            .field("client_id", &self.client_id)
            .field("options", &self.options)
            .field("persistence", &self.persistence.name())
            .field("registry", &self.registry)
            .field("description", &self.description)
            .finish()
    }
}
