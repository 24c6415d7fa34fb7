//! Binding registry.
//!
//! Holds the incoming bindings in registration order and the outgoing
//! bindings keyed by action. Topic uniqueness is enforced per direction by
//! exact string comparison; the same literal topic may appear once in each
//! direction.

use std::collections::BTreeMap;

use crate::error::{AdapterConfigError, Result, TopicDirection};
use crate::topic::{IncomingTopic, OutgoingTopic};

#[derive(Debug, Clone, Default)]
pub struct BindingRegistry {
    incoming: Vec<IncomingTopic>,
    outgoing: BTreeMap<String, OutgoingTopic>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an incoming binding.
    pub fn add_incoming(&mut self, binding: IncomingTopic) -> Result<()> {
        self.check_incoming(binding.topic())?;
        tracing::debug!(topic = binding.topic(), "Registered incoming topic");
        self.incoming.push(binding);
        Ok(())
    }

    /// Register the outgoing binding for `action_key`.
    ///
    /// The topic must not be used by any outgoing binding, including the one
    /// currently held for `action_key`. An existing binding for the key is
    /// replaced.
    pub fn add_outgoing(&mut self, action_key: &str, binding: OutgoingTopic) -> Result<()> {
        self.check_outgoing(binding.topic())?;
        tracing::debug!(action = action_key, topic = binding.topic(), "Registered outgoing topic");
        if let Some(previous) = self.outgoing.insert(action_key.to_string(), binding) {
            tracing::warn!(
                action = action_key,
                previous_topic = previous.topic(),
                "Replaced outgoing topic for action"
            );
        }
        Ok(())
    }

    /// Fail if `topic` is already used on the incoming side.
    pub fn check_incoming(&self, topic: &str) -> Result<()> {
        if self.incoming.iter().any(|b| b.topic() == topic) {
            return Err(AdapterConfigError::DuplicateTopic {
                topic: topic.to_string(),
                direction: TopicDirection::Incoming,
            });
        }
        Ok(())
    }

    /// Fail if `topic` is already used on the outgoing side.
    pub fn check_outgoing(&self, topic: &str) -> Result<()> {
        if self.outgoing.values().any(|b| b.topic() == topic) {
            return Err(AdapterConfigError::DuplicateTopic {
                topic: topic.to_string(),
                direction: TopicDirection::Outgoing,
            });
        }
        Ok(())
    }

    pub fn lookup_outgoing(&self, action_key: &str) -> Option<&OutgoingTopic> {
        self.outgoing.get(action_key)
    }

    pub fn incoming(&self) -> &[IncomingTopic] {
        &self.incoming
    }

    pub fn outgoing(&self) -> &BTreeMap<String, OutgoingTopic> {
        &self.outgoing
    }

    /// Incoming topics in subscription order.
    pub fn incoming_topics(&self) -> impl Iterator<Item = &str> {
        self.incoming.iter().map(IncomingTopic::topic)
    }

    pub fn is_empty(&self) -> bool {
        self.incoming.is_empty() && self.outgoing.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coercion;
    use crate::value::ValueType;

    fn property(topic: &str) -> IncomingTopic {
        IncomingTopic::typed_property(topic, "intensity", ValueType::Integer).unwrap()
    }

    fn action(topic: &str) -> OutgoingTopic {
        OutgoingTopic::with_verb(topic, "switch").unwrap()
    }

    #[test]
    fn test_distinct_incoming_topics() {
        let mut registry = BindingRegistry::new();
        registry.add_incoming(property("a")).unwrap();
        registry.add_incoming(property("b")).unwrap();
        assert_eq!(registry.incoming_topics().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_incoming_topic() {
        let mut registry = BindingRegistry::new();
        registry.add_incoming(property("a")).unwrap();
        let err = registry
            .add_incoming(IncomingTopic::event("a", "alarm", coercion::identity()).unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            AdapterConfigError::DuplicateTopic {
                direction: TopicDirection::Incoming,
                ..
            }
        ));
        assert_eq!(registry.incoming().len(), 1);
    }

    #[test]
    fn test_duplicate_outgoing_topic_across_keys() {
        let mut registry = BindingRegistry::new();
        registry.add_outgoing("on", action("cmd")).unwrap();
        let err = registry.add_outgoing("off", action("cmd")).unwrap_err();
        assert!(matches!(
            err,
            AdapterConfigError::DuplicateTopic {
                direction: TopicDirection::Outgoing,
                ..
            }
        ));
        assert!(registry.lookup_outgoing("off").is_none());
    }

    #[test]
    fn test_same_key_replaces_binding() {
        let mut registry = BindingRegistry::new();
        registry.add_outgoing("on", action("cmd/1")).unwrap();
        registry.add_outgoing("on", action("cmd/2")).unwrap();
        assert_eq!(registry.outgoing().len(), 1);
        assert_eq!(registry.lookup_outgoing("on").unwrap().topic(), "cmd/2");
    }

    #[test]
    fn test_same_key_same_topic_rejected() {
        let mut registry = BindingRegistry::new();
        registry.add_outgoing("on", action("cmd")).unwrap();
        assert!(registry.add_outgoing("on", action("cmd")).is_err());
    }

    #[test]
    fn test_directions_are_independent() {
        let mut registry = BindingRegistry::new();
        registry.add_incoming(property("shared")).unwrap();
        registry.add_outgoing("on", action("shared")).unwrap();
        assert!(!registry.is_empty());
    }
}
