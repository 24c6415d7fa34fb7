//! Physical asset descriptors.
//!
//! The digital twin runtime consumes these as opaque declarations of what the
//! device exposes.

use serde::{Deserialize, Serialize};

use crate::value::TypedValue;

/// A property with its initial value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalAssetProperty {
    pub key: String,
    pub initial_value: TypedValue,
}

impl PhysicalAssetProperty {
    pub fn new(key: impl Into<String>, initial_value: TypedValue) -> Self {
        Self {
            key: key.into(),
            initial_value,
        }
    }
}

/// An event the device can raise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalAssetEvent {
    pub key: String,
    #[serde(rename = "type")]
    pub event_type: String,
}

impl PhysicalAssetEvent {
    pub fn new(key: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            event_type: event_type.into(),
        }
    }
}

/// An action the device accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalAssetAction {
    pub key: String,
    #[serde(rename = "type")]
    pub action_type: String,
    pub content_type: String,
}

impl PhysicalAssetAction {
    pub fn new(
        key: impl Into<String>,
        action_type: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            action_type: action_type.into(),
            content_type: content_type.into(),
        }
    }
}

/// Frozen description of everything the physical asset exposes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalAssetDescription {
    pub actions: Vec<PhysicalAssetAction>,
    pub properties: Vec<PhysicalAssetProperty>,
    pub events: Vec<PhysicalAssetEvent>,
}

impl PhysicalAssetDescription {
    pub fn property(&self, key: &str) -> Option<&PhysicalAssetProperty> {
        self.properties.iter().find(|p| p.key == key)
    }

    pub fn action(&self, key: &str) -> Option<&PhysicalAssetAction> {
        self.actions.iter().find(|a| a.key == key)
    }

    pub fn event(&self, key: &str) -> Option<&PhysicalAssetEvent> {
        self.events.iter().find(|e| e.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.properties.is_empty() && self.events.is_empty()
    }
}
