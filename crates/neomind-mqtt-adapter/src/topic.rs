//! Topic bindings.
//!
//! An incoming binding turns a payload received on a subscribed topic into
//! model events. An outgoing binding turns an action value into the payload
//! published on its topic. Conversion functions must be pure: the transport
//! may invoke them concurrently from its dispatch loop.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::coercion;
use crate::error::{AdapterConfigError, CoercionError, Result};
use crate::value::{TypedValue, ValueType};

/// Converts a payload into one typed value.
pub type DecodeFn =
    Arc<dyn Fn(&str) -> std::result::Result<TypedValue, CoercionError> + Send + Sync>;

/// Converts a payload into zero or more model events.
pub type SubscribeFn =
    Arc<dyn Fn(&str) -> std::result::Result<Vec<ModelEvent>, CoercionError> + Send + Sync>;

/// Converts an action value into a payload.
pub type EncodeFn = Arc<dyn Fn(&TypedValue) -> String + Send + Sync>;

/// Event delivered to the physical asset model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelEvent {
    /// New value for a property
    PropertyUpdate { key: String, value: TypedValue },
    /// Domain event notification
    EventNotification { key: String, value: TypedValue },
}

impl ModelEvent {
    pub fn key(&self) -> &str {
        match self {
            Self::PropertyUpdate { key, .. } | Self::EventNotification { key, .. } => key,
        }
    }

    pub fn value(&self) -> &TypedValue {
        match self {
            Self::PropertyUpdate { value, .. } | Self::EventNotification { value, .. } => value,
        }
    }
}

/// Binding for a topic the adapter subscribes to.
#[derive(Clone)]
pub enum IncomingTopic {
    /// Feeds one property
    Property {
        topic: String,
        property_key: String,
        /// Declared type, when the decoder was built from one
        value_type: Option<ValueType>,
        decode: DecodeFn,
    },
    /// Feeds one event
    Event {
        topic: String,
        event_key: String,
        decode: DecodeFn,
    },
    /// Produces any number of events from one payload
    Generic { topic: String, subscribe: SubscribeFn },
}

impl IncomingTopic {
    /// Property binding with a custom decode function.
    pub fn property(
        topic: impl Into<String>,
        property_key: impl Into<String>,
        decode: DecodeFn,
    ) -> Result<Self> {
        let topic = validate_topic(topic.into(), false)?;
        let property_key = validate_key(property_key.into(), "property")?;
        Ok(Self::Property {
            topic,
            property_key,
            value_type: None,
            decode,
        })
    }

    /// Property binding decoding payloads as `value_type`.
    pub fn typed_property(
        topic: impl Into<String>,
        property_key: impl Into<String>,
        value_type: ValueType,
    ) -> Result<Self> {
        let topic = validate_topic(topic.into(), false)?;
        let property_key = validate_key(property_key.into(), "property")?;
        Ok(Self::Property {
            topic,
            property_key,
            decode: coercion::decoder(value_type.clone()),
            value_type: Some(value_type),
        })
    }

    /// Event binding with a custom decode function.
    pub fn event(
        topic: impl Into<String>,
        event_key: impl Into<String>,
        decode: DecodeFn,
    ) -> Result<Self> {
        let topic = validate_topic(topic.into(), false)?;
        let event_key = validate_key(event_key.into(), "event")?;
        Ok(Self::Event {
            topic,
            event_key,
            decode,
        })
    }

    /// Fan-out binding.
    pub fn generic(topic: impl Into<String>, subscribe: SubscribeFn) -> Result<Self> {
        let topic = validate_topic(topic.into(), false)?;
        Ok(Self::Generic { topic, subscribe })
    }

    pub fn topic(&self) -> &str {
        match self {
            Self::Property { topic, .. }
            | Self::Event { topic, .. }
            | Self::Generic { topic, .. } => topic,
        }
    }

    /// Key of the property or event this binding feeds, if it feeds exactly one.
    pub fn target_key(&self) -> Option<&str> {
        match self {
            Self::Property { property_key, .. } => Some(property_key),
            Self::Event { event_key, .. } => Some(event_key),
            Self::Generic { .. } => None,
        }
    }

    /// Convert a payload into model events.
    pub fn apply(&self, payload: &str) -> std::result::Result<Vec<ModelEvent>, CoercionError> {
        match self {
            Self::Property {
                property_key,
                decode,
                ..
            } => Ok(vec![ModelEvent::PropertyUpdate {
                key: property_key.clone(),
                value: decode(payload)?,
            }]),
            Self::Event {
                event_key, decode, ..
            } => Ok(vec![ModelEvent::EventNotification {
                key: event_key.clone(),
                value: decode(payload)?,
            }]),
            Self::Generic { subscribe, .. } => subscribe(payload),
        }
    }
}

impl fmt::Debug for IncomingTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property {
                topic,
                property_key,
                value_type,
                ..
            } => f
                .debug_struct("Property")
                .field("topic", topic)
                .field("property_key", property_key)
                .field("value_type", value_type)
                .finish_non_exhaustive(),
            Self::Event {
                topic, event_key, ..
            } => f
                .debug_struct("Event")
                .field("topic", topic)
                .field("event_key", event_key)
                .finish_non_exhaustive(),
            Self::Generic { topic, .. } => f
                .debug_struct("Generic")
                .field("topic", topic)
                .finish_non_exhaustive(),
        }
    }
}

/// Binding for a topic the adapter publishes action payloads on.
#[derive(Clone)]
pub struct OutgoingTopic {
    topic: String,
    encode: EncodeFn,
}

impl OutgoingTopic {
    /// Action binding with a custom encode function.
    pub fn action(topic: impl Into<String>, encode: EncodeFn) -> Result<Self> {
        let topic = validate_topic(topic.into(), true)?;
        Ok(Self { topic, encode })
    }

    /// Action binding whose payload is `verb` followed by the encoded value.
    pub fn with_verb(topic: impl Into<String>, verb: impl Into<String>) -> Result<Self> {
        Self::action(topic, coercion::prefixed(verb))
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Format an action value as a payload.
    pub fn apply(&self, value: &TypedValue) -> String {
        (self.encode)(value)
    }
}

impl fmt::Debug for OutgoingTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutgoingTopic")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

/// Check a topic string. Publish topics may not contain wildcards.
fn validate_topic(topic: String, publish: bool) -> Result<String> {
    if topic.is_empty() {
        return Err(AdapterConfigError::Binding(
            "topic cannot be empty".to_string(),
        ));
    }
    if topic.contains('\0') {
        return Err(AdapterConfigError::Binding(format!(
            "topic {:?} contains a NUL character",
            topic
        )));
    }
    if publish && topic.contains(['+', '#']) {
        return Err(AdapterConfigError::Binding(format!(
            "publish topic '{}' cannot contain wildcards",
            topic
        )));
    }
    Ok(topic)
}

fn validate_key(key: String, kind: &str) -> Result<String> {
    if key.is_empty() {
        return Err(AdapterConfigError::Binding(format!(
            "{} key cannot be empty",
            kind
        )));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_binding_emits_one_update() {
        let binding =
            IncomingTopic::typed_property("sensor/intensity", "intensity", ValueType::Integer)
                .unwrap();
        let events = binding.apply("42").unwrap();
        assert_eq!(
            events,
            vec![ModelEvent::PropertyUpdate {
                key: "intensity".into(),
                value: TypedValue::Integer(42),
            }]
        );
        assert!(binding.apply("abc").is_err());
    }

    #[test]
    fn test_event_binding_emits_notification() {
        let binding =
            IncomingTopic::event("sensor/overheating", "overheating", coercion::identity())
                .unwrap();
        let events = binding.apply("true").unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ModelEvent::EventNotification { .. }));
        assert_eq!(events[0].value(), &TypedValue::Text("true".into()));
        assert_eq!(binding.target_key(), Some("overheating"));
    }

    #[test]
    fn test_generic_binding_fans_out() {
        let binding = IncomingTopic::generic(
            "sensor/bulk",
            Arc::new(|payload: &str| {
                Ok::<_, CoercionError>(payload
                    .split(',')
                    .filter(|part| !part.is_empty())
                    .map(|part| ModelEvent::PropertyUpdate {
                        key: part.to_string(),
                        value: TypedValue::Boolean(true),
                    })
                    .collect())
            }),
        )
        .unwrap();
        assert_eq!(binding.apply("a,b,c").unwrap().len(), 3);
        assert!(binding.apply("").unwrap().is_empty());
        assert_eq!(binding.target_key(), None);
    }

    #[test]
    fn test_empty_topic_rejected() {
        let err = IncomingTopic::typed_property("", "intensity", ValueType::Integer).unwrap_err();
        assert!(matches!(err, AdapterConfigError::Binding(_)));
        assert!(OutgoingTopic::with_verb("", "switch").is_err());
    }

    #[test]
    fn test_publish_topic_rejects_wildcards() {
        assert!(OutgoingTopic::with_verb("sensor/+/switch", "switch").is_err());
        assert!(OutgoingTopic::with_verb("sensor/#", "switch").is_err());
        assert!(IncomingTopic::event("sensor/#", "all", coercion::identity()).is_ok());
    }

    #[test]
    fn test_outgoing_apply() {
        let binding = OutgoingTopic::with_verb("sensor/actions/switch", "switch").unwrap();
        assert_eq!(binding.apply(&TypedValue::Text("on".into())), "switchon");
        assert_eq!(binding.topic(), "sensor/actions/switch");
    }
}
