//! Configuration builder.
//!
//! Accumulates physical asset declarations together with their topic
//! bindings and freezes them into a [`Configuration`]. Each `add_*` call is
//! atomic: when validation fails neither the binding nor the descriptor is
//! recorded. [`ConfigurationBuilder::build`] consumes the builder, so a
//! configuration can only be built once.

use std::sync::Arc;

use crate::config::{
    ClientIdGenerator, Configuration, ConnectOptions, Credentials, RandomClientId,
};
use crate::error::{AdapterConfigError, Result};
use crate::model::{
    PhysicalAssetAction, PhysicalAssetDescription, PhysicalAssetEvent, PhysicalAssetProperty,
};
use crate::persistence::{ClientPersistence, MemoryPersistence};
use crate::registry::BindingRegistry;
use crate::topic::{DecodeFn, EncodeFn, IncomingTopic, OutgoingTopic};
use crate::value::{TypedValue, ValueType};

#[derive(Debug)]
pub struct ConfigurationBuilder {
    broker_address: String,
    broker_port: u16,
    client_id: String,
    options: ConnectOptions,
    persistence: Arc<dyn ClientPersistence>,
    registry: BindingRegistry,
    properties: Vec<PhysicalAssetProperty>,
    actions: Vec<PhysicalAssetAction>,
    events: Vec<PhysicalAssetEvent>,
}

impl ConfigurationBuilder {
    /// Create a builder with a randomly generated client identifier.
    pub fn new(broker_address: impl Into<String>, broker_port: u16) -> Result<Self> {
        Self::with_client_id_generator(broker_address, broker_port, &RandomClientId)
    }

    /// Create a builder with an explicit client identifier.
    pub fn with_client_id(
        broker_address: impl Into<String>,
        broker_port: u16,
        client_id: impl Into<String>,
    ) -> Result<Self> {
        let client_id = client_id.into();
        if client_id.is_empty() {
            return Err(AdapterConfigError::Configuration(
                "client id cannot be empty".to_string(),
            ));
        }
        Self::create(broker_address.into(), broker_port, client_id)
    }

    /// Create a builder whose client identifier comes from `generator`.
    pub fn with_client_id_generator(
        broker_address: impl Into<String>,
        broker_port: u16,
        generator: &dyn ClientIdGenerator,
    ) -> Result<Self> {
        let broker_address = broker_address.into();
        Self::validate_broker(&broker_address, broker_port)?;
        Self::with_client_id(broker_address, broker_port, generator.generate())
    }

    fn create(broker_address: String, broker_port: u16, client_id: String) -> Result<Self> {
        Self::validate_broker(&broker_address, broker_port)?;
        Ok(Self {
            broker_address,
            broker_port,
            client_id,
            options: ConnectOptions::default(),
            persistence: Arc::new(MemoryPersistence::new()),
            registry: BindingRegistry::new(),
            properties: Vec::new(),
            actions: Vec::new(),
            events: Vec::new(),
        })
    }

    fn validate_broker(broker_address: &str, broker_port: u16) -> Result<()> {
        if broker_address.is_empty() {
            return Err(AdapterConfigError::Configuration(
                "broker address cannot be empty".to_string(),
            ));
        }
        if broker_port == 0 {
            return Err(AdapterConfigError::Configuration(
                "broker port must be a positive number".to_string(),
            ));
        }
        Ok(())
    }

    /// Register a property fed by `topic` through a custom decode function.
    pub fn add_property_and_topic(
        &mut self,
        property_key: impl Into<String>,
        initial_value: TypedValue,
        topic: impl Into<String>,
        decode: DecodeFn,
    ) -> Result<&mut Self> {
        let property_key = property_key.into();
        let binding = IncomingTopic::property(topic, property_key.clone(), decode)?;
        self.registry.add_incoming(binding)?;
        self.properties
            .push(PhysicalAssetProperty::new(property_key, initial_value));
        Ok(self)
    }

    /// Register a property fed by `topic`, decoding payloads as `value_type`.
    ///
    /// The initial value must already carry the tag `value_type` implies.
    pub fn add_typed_property_and_topic(
        &mut self,
        property_key: impl Into<String>,
        initial_value: TypedValue,
        topic: impl Into<String>,
        value_type: ValueType,
    ) -> Result<&mut Self> {
        let property_key = property_key.into();
        if !value_type.matches(&initial_value) {
            return Err(AdapterConfigError::Configuration(format!(
                "initial value of property '{}' is {}, expected {}",
                property_key,
                initial_value.kind(),
                value_type
            )));
        }
        let binding = IncomingTopic::typed_property(topic, property_key.clone(), value_type)?;
        self.registry.add_incoming(binding)?;
        self.properties
            .push(PhysicalAssetProperty::new(property_key, initial_value));
        Ok(self)
    }

    /// Register an action published on `topic`.
    ///
    /// Registering the same action key again replaces both its binding and its
    /// descriptor, but the new topic must still be unused.
    pub fn add_action_and_topic(
        &mut self,
        action_key: impl Into<String>,
        action_type: impl Into<String>,
        content_type: impl Into<String>,
        topic: impl Into<String>,
        encode: EncodeFn,
    ) -> Result<&mut Self> {
        let binding = OutgoingTopic::action(topic, encode)?;
        self.add_outgoing_topic(action_key, action_type, content_type, binding)
    }

    /// Register an event fed by `topic`.
    pub fn add_event_and_topic(
        &mut self,
        event_key: impl Into<String>,
        event_type: impl Into<String>,
        topic: impl Into<String>,
        decode: DecodeFn,
    ) -> Result<&mut Self> {
        let event_key = event_key.into();
        let binding = IncomingTopic::event(topic, event_key.clone(), decode)?;
        self.registry.add_incoming(binding)?;
        self.events.push(PhysicalAssetEvent::new(event_key, event_type));
        Ok(self)
    }

    /// Register a pre-built incoming binding with the descriptors it feeds.
    pub fn add_incoming_topic(
        &mut self,
        binding: IncomingTopic,
        properties: Vec<PhysicalAssetProperty>,
        events: Vec<PhysicalAssetEvent>,
    ) -> Result<&mut Self> {
        if properties.is_empty() && events.is_empty() {
            return Err(AdapterConfigError::Configuration(format!(
                "incoming topic '{}' must feed at least one property or event",
                binding.topic()
            )));
        }
        self.registry.add_incoming(binding)?;
        self.properties.extend(properties);
        self.events.extend(events);
        Ok(self)
    }

    /// Register a pre-built outgoing binding for `action_key`.
    pub fn add_outgoing_topic(
        &mut self,
        action_key: impl Into<String>,
        action_type: impl Into<String>,
        content_type: impl Into<String>,
        binding: OutgoingTopic,
    ) -> Result<&mut Self> {
        let action_key = action_key.into();
        if action_key.is_empty() {
            return Err(AdapterConfigError::Binding(
                "action key cannot be empty".to_string(),
            ));
        }
        self.registry.add_outgoing(&action_key, binding)?;

        let action = PhysicalAssetAction::new(action_key, action_type, content_type);
        match self.actions.iter_mut().find(|a| a.key == action.key) {
            Some(existing) => *existing = action,
            None => self.actions.push(action),
        }
        Ok(self)
    }

    /// Connection timeout in seconds; must be positive.
    pub fn set_connection_timeout(&mut self, timeout_secs: u64) -> Result<&mut Self> {
        if timeout_secs == 0 {
            return Err(AdapterConfigError::Configuration(
                "connection timeout must be a positive number".to_string(),
            ));
        }
        self.options.connection_timeout_secs = timeout_secs;
        Ok(self)
    }

    pub fn set_clean_session(&mut self, clean_session: bool) -> &mut Self {
        self.options.clean_session = clean_session;
        self
    }

    pub fn set_automatic_reconnect(&mut self, automatic_reconnect: bool) -> &mut Self {
        self.options.automatic_reconnect = automatic_reconnect;
        self
    }

    /// Username and password, both required.
    pub fn set_credentials(
        &mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<&mut Self> {
        self.options.credentials = Some(Credentials::new(username, password)?);
        Ok(self)
    }

    pub fn set_persistence(&mut self, persistence: Arc<dyn ClientPersistence>) -> &mut Self {
        self.persistence = persistence;
        self
    }

    /// Freeze the accumulated declarations into a [`Configuration`].
    pub fn build(self) -> Result<Configuration> {
        let description = PhysicalAssetDescription {
            actions: self.actions,
            properties: self.properties,
            events: self.events,
        };
        if description.is_empty() {
            return Err(AdapterConfigError::Configuration(
                "physical adapter must have at least one property, action or event".to_string(),
            ));
        }
        if self.registry.is_empty() {
            return Err(AdapterConfigError::Configuration(
                "physical adapter must define at least one incoming or outgoing topic"
                    .to_string(),
            ));
        }

        tracing::info!(
            broker = %format!("{}:{}", self.broker_address, self.broker_port),
            client_id = %self.client_id,
            properties = description.properties.len(),
            actions = description.actions.len(),
            events = description.events.len(),
            incoming_topics = self.registry.incoming().len(),
            outgoing_topics = self.registry.outgoing().len(),
            "Built MQTT physical adapter configuration"
        );

        Ok(Configuration {
            broker_address: self.broker_address,
            broker_port: self.broker_port,
            client_id: self.client_id,
            options: self.options,
            persistence: self.persistence,
            registry: self.registry,
            description,
        })
    }
}
