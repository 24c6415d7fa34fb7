//! Declarative configuration loading.
//!
//! Replays the property, action and event declarations of an already parsed
//! document through a [`ConfigurationBuilder`], in document order. Loading is
//! all-or-nothing: the first bad declaration fails the whole load and no
//! configuration is returned.
//!
//! ```yaml
//! brokerAddress: 127.0.0.1
//! brokerPort: 1883
//! properties:
//!   - key: intensity
//!     topic: sensor/intensity
//!     type: int
//!     initialValue: 0
//!   - key: samples
//!     topic: sensor/samples
//!     type: json-array
//!     fieldType: double
//!     initialValue: []
//! actions:
//!   - key: switch-off
//!     type: sensor.actuation
//!     contentType: text/plain
//!     topic: sensor/actions/switch
//!     action: switch
//! events:
//!   - key: overheating
//!     type: text/plain
//!     topic: sensor/overheating
//! ```

use std::sync::Arc;

use crate::builder::ConfigurationBuilder;
use crate::coercion;
use crate::config::{ClientIdGenerator, Configuration, RandomClientId};
use crate::error::{AdapterConfigError, Result};
use crate::topic::OutgoingTopic;
use crate::value::ValueType;

/// Read access to a parsed configuration tree.
pub trait ConfigNode: Sized {
    /// Child field by name, `None` when absent.
    fn get(&self, name: &str) -> Option<&Self>;

    /// String contents, `None` for non-string nodes.
    fn as_text(&self) -> Option<&str>;

    fn as_integer(&self) -> Option<i64>;

    fn as_bool(&self) -> Option<bool>;

    /// Items of a sequence node, `None` for anything else.
    fn children(&self) -> Option<Vec<&Self>>;

    /// Textual literal of the node: string contents for strings, canonical
    /// text for other scalars and JSON text for sequences and maps. `None`
    /// for null.
    fn to_literal(&self) -> Option<String>;
}

impl ConfigNode for serde_json::Value {
    fn get(&self, name: &str) -> Option<&Self> {
        serde_json::Value::get(self, name)
    }

    fn as_text(&self) -> Option<&str> {
        serde_json::Value::as_str(self)
    }

    fn as_integer(&self) -> Option<i64> {
        serde_json::Value::as_i64(self)
    }

    fn as_bool(&self) -> Option<bool> {
        serde_json::Value::as_bool(self)
    }

    fn children(&self) -> Option<Vec<&Self>> {
        self.as_array().map(|items| items.iter().collect())
    }

    fn to_literal(&self) -> Option<String> {
        match self {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl ConfigNode for serde_yaml::Value {
    fn get(&self, name: &str) -> Option<&Self> {
        serde_yaml::Value::get(self, name)
    }

    fn as_text(&self) -> Option<&str> {
        serde_yaml::Value::as_str(self)
    }

    fn as_integer(&self) -> Option<i64> {
        serde_yaml::Value::as_i64(self)
    }

    fn as_bool(&self) -> Option<bool> {
        serde_yaml::Value::as_bool(self)
    }

    fn children(&self) -> Option<Vec<&Self>> {
        self.as_sequence().map(|items| items.iter().collect())
    }

    fn to_literal(&self) -> Option<String> {
        match self {
            serde_yaml::Value::Null => None,
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            serde_yaml::Value::Number(n) => Some(yaml_number_literal(n)),
            serde_yaml::Value::Tagged(tagged) => tagged.value.to_literal(),
            other => serde_json::to_string(other).ok(),
        }
    }
}

/// YAML spells non-finite floats `.inf` / `.nan`; emit the forms the scalar
/// parsers accept instead.
fn yaml_number_literal(number: &serde_yaml::Number) -> String {
    if let Some(i) = number.as_i64() {
        i.to_string()
    } else if let Some(u) = number.as_u64() {
        u.to_string()
    } else {
        number.as_f64().map_or_else(|| number.to_string(), |f| f.to_string())
    }
}

/// Drives a [`ConfigurationBuilder`] from a declarative document.
#[derive(Clone)]
pub struct DeclarativeLoader {
    client_ids: Arc<dyn ClientIdGenerator>,
}

impl Default for DeclarativeLoader {
    fn default() -> Self {
        Self {
            client_ids: Arc::new(RandomClientId),
        }
    }
}

impl DeclarativeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `generator` when the document does not name a client id.
    pub fn with_client_id_generator(generator: impl ClientIdGenerator + 'static) -> Self {
        Self {
            client_ids: Arc::new(generator),
        }
    }

    /// Parse a JSON document and load it.
    pub fn from_json_str(&self, text: &str) -> Result<Configuration> {
        let document: serde_json::Value = serde_json::from_str(text).map_err(|e| {
            AdapterConfigError::Configuration(format!("invalid JSON document: {}", e))
        })?;
        self.load(&document)
    }

    /// Parse a YAML document and load it.
    pub fn from_yaml_str(&self, text: &str) -> Result<Configuration> {
        let document: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| {
            AdapterConfigError::Configuration(format!("invalid YAML document: {}", e))
        })?;
        self.load(&document)
    }

    /// Load `document` and build the configuration.
    pub fn load<N: ConfigNode>(&self, document: &N) -> Result<Configuration> {
        self.builder(document)?.build()
    }

    /// Load `document` into a builder, leaving it open for further calls.
    pub fn builder<N: ConfigNode>(&self, document: &N) -> Result<ConfigurationBuilder> {
        let mut builder = self.open_builder(document)?;
        apply_connect_options(&mut builder, document)?;

        let properties = declarations(document, &["properties", "paProperties"])?;
        let actions = declarations(document, &["actions", "paActions"])?;
        let events = declarations(document, &["events", "paEvents"])?;

        for (index, node) in properties.iter().enumerate() {
            let key = declaration_key(*node, &["key", "propertyKey"], "properties", index);
            apply_property(&mut builder, *node).map_err(|e| e.in_declaration(key))?;
        }
        for (index, node) in actions.iter().enumerate() {
            let key = declaration_key(*node, &["key", "actionKey"], "actions", index);
            apply_action(&mut builder, *node).map_err(|e| e.in_declaration(key))?;
        }
        for (index, node) in events.iter().enumerate() {
            let key = declaration_key(*node, &["key", "eventKey"], "events", index);
            apply_event(&mut builder, *node).map_err(|e| e.in_declaration(key))?;
        }

        tracing::info!(
            properties = properties.len(),
            actions = actions.len(),
            events = events.len(),
            "Loaded declarative adapter configuration"
        );
        Ok(builder)
    }

    fn open_builder<N: ConfigNode>(&self, document: &N) -> Result<ConfigurationBuilder> {
        let address = required_text(document, &["brokerAddress"])?;
        let port = document
            .get("brokerPort")
            .ok_or_else(|| missing_field("brokerPort"))?
            .as_integer()
            .and_then(|port| u16::try_from(port).ok())
            .filter(|port| *port > 0)
            .ok_or_else(|| {
                AdapterConfigError::Configuration(
                    "brokerPort must be an integer between 1 and 65535".to_string(),
                )
            })?;

        match optional_text(document, &["clientId"])? {
            Some(client_id) => ConfigurationBuilder::with_client_id(address, port, client_id),
            None => {
                ConfigurationBuilder::with_client_id_generator(address, port, &*self.client_ids)
            }
        }
    }
}

fn apply_connect_options<N: ConfigNode>(
    builder: &mut ConfigurationBuilder,
    document: &N,
) -> Result<()> {
    if let Some(node) = document.get("connectionTimeout") {
        let timeout = node
            .as_integer()
            .and_then(|secs| u64::try_from(secs).ok())
            .ok_or_else(|| {
                AdapterConfigError::Configuration(
                    "connectionTimeout must be a positive number".to_string(),
                )
            })?;
        builder.set_connection_timeout(timeout)?;
    }
    if let Some(clean_session) = optional_bool(document, "cleanSession")? {
        builder.set_clean_session(clean_session);
    }
    if let Some(reconnect) = optional_bool(document, "automaticReconnect")? {
        builder.set_automatic_reconnect(reconnect);
    }
    match (
        optional_text(document, &["username"])?,
        optional_text(document, &["password"])?,
    ) {
        (Some(username), Some(password)) => {
            builder.set_credentials(username, password)?;
        }
        (None, None) => {}
        _ => {
            return Err(AdapterConfigError::Configuration(
                "username and password must be given together".to_string(),
            ))
        }
    }
    Ok(())
}

fn apply_property<N: ConfigNode>(builder: &mut ConfigurationBuilder, node: &N) -> Result<()> {
    let key = required_text(node, &["key", "propertyKey"])?;
    let topic = required_text(node, &["topic"])?;
    let value_type = resolve_type(node)?;
    let literal = lookup(node, &["initialValue"])
        .and_then(ConfigNode::to_literal)
        .ok_or_else(|| missing_field("initialValue"))?;
    let initial_value = coercion::decode(&value_type, &literal)?;

    tracing::debug!(
        property = %key,
        topic = %topic,
        value_type = %value_type,
        "Declaring property"
    );
    builder.add_typed_property_and_topic(key, initial_value, topic, value_type)?;
    Ok(())
}

fn apply_action<N: ConfigNode>(builder: &mut ConfigurationBuilder, node: &N) -> Result<()> {
    let key = required_text(node, &["key", "actionKey"])?;
    let action_type = required_text(node, &["type"])?;
    let content_type = required_text(node, &["contentType", "content-type"])?;
    let topic = required_text(node, &["topic"])?;
    let verb = required_text(node, &["action", "verb"])?;

    tracing::debug!(action = %key, topic = %topic, "Declaring action");
    let binding = OutgoingTopic::with_verb(topic, verb)?;
    builder.add_outgoing_topic(key, action_type, content_type, binding)?;
    Ok(())
}

fn apply_event<N: ConfigNode>(builder: &mut ConfigurationBuilder, node: &N) -> Result<()> {
    let key = required_text(node, &["key", "eventKey"])?;
    let event_type = required_text(node, &["type"])?;
    let topic = required_text(node, &["topic"])?;

    tracing::debug!(event = %key, topic = %topic, "Declaring event");
    builder.add_event_and_topic(key, event_type, topic, coercion::identity())?;
    Ok(())
}

/// Resolve the `type` of a declaration, following `fieldType` for arrays.
///
/// `fieldType` is either a type name or a nested node with its own `type`
/// and `fieldType`, which allows arrays of arrays.
fn resolve_type<N: ConfigNode>(node: &N) -> Result<ValueType> {
    let name = required_text(node, &["type"])?;
    let element = if name == "json-array" {
        let field = lookup(node, &["fieldType", "field-type"])
            .ok_or_else(|| missing_field("fieldType"))?;
        Some(match field.as_text() {
            Some(element_name) => ValueType::resolve(element_name, None)?,
            None => resolve_type(field)?,
        })
    } else {
        None
    };
    Ok(ValueType::resolve(&name, element)?)
}

fn declarations<'a, N: ConfigNode>(document: &'a N, names: &[&str]) -> Result<Vec<&'a N>> {
    match lookup(document, names) {
        None => Ok(Vec::new()),
        Some(node) => node.children().ok_or_else(|| {
            AdapterConfigError::Configuration(format!("'{}' must be a list", names[0]))
        }),
    }
}

fn declaration_key<N: ConfigNode>(node: &N, names: &[&str], list: &str, index: usize) -> String {
    lookup(node, names)
        .and_then(ConfigNode::as_text)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}[{}]", list, index))
}

fn lookup<'a, N: ConfigNode>(node: &'a N, names: &[&str]) -> Option<&'a N> {
    names.iter().find_map(|name| node.get(name))
}

fn optional_text<N: ConfigNode>(node: &N, names: &[&str]) -> Result<Option<String>> {
    match lookup(node, names) {
        None => Ok(None),
        Some(value) => value
            .as_text()
            .map(|text| Some(text.to_string()))
            .ok_or_else(|| {
                AdapterConfigError::Configuration(format!("field '{}' must be a string", names[0]))
            }),
    }
}

fn required_text<N: ConfigNode>(node: &N, names: &[&str]) -> Result<String> {
    optional_text(node, names)?.ok_or_else(|| missing_field(names[0]))
}

fn optional_bool<N: ConfigNode>(node: &N, name: &str) -> Result<Option<bool>> {
    match node.get(name) {
        None => Ok(None),
        Some(value) => value.as_bool().map(Some).ok_or_else(|| {
            AdapterConfigError::Configuration(format!("field '{}' must be a boolean", name))
        }),
    }
}

fn missing_field(name: &str) -> AdapterConfigError {
    AdapterConfigError::Configuration(format!("missing required field '{}'", name))
}
