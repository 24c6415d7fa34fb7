//! Declarative loader tests
//!
//! Loads YAML and JSON adapter documents and checks that malformed
//! declarations fail the whole load.

use neomind_mqtt_adapter::{AdapterConfigError, DeclarativeLoader, TypedValue};
use serde_json::json;

const SENSOR_YAML: &str = r#"
brokerAddress: 127.0.0.1
brokerPort: 1883
clientId: yaml-sensor
connectionTimeout: 20
cleanSession: false
properties:
  - key: intensity
    topic: sensor/intensity
    type: int
    initialValue: 0
  - key: temperature
    topic: sensor/temperature
    type: double
    initialValue: 21.5
  - key: enabled
    topic: sensor/enabled
    type: boolean
    initialValue: true
  - key: label
    topic: sensor/label
    type: string
    initialValue: lamp
  - key: samples
    topic: sensor/samples
    type: json-array
    fieldType: double
    initialValue: [1.5, 2]
  - key: settings
    topic: sensor/settings
    type: json-object
    initialValue: '{"mode": "eco", "level": 2}'
actions:
  - key: switch-off
    type: sensor.actuation
    contentType: text/plain
    topic: sensor/actions/switch
    action: switch
events:
  - key: overheating
    type: text/plain
    topic: sensor/overheating
"#;

fn loader() -> DeclarativeLoader {
    DeclarativeLoader::with_client_id_generator(|| "generated".to_string())
}

fn document() -> serde_json::Value {
    json!({
        "brokerAddress": "127.0.0.1",
        "brokerPort": 1883,
        "properties": [
            {"key": "intensity", "topic": "sensor/intensity", "type": "int", "initialValue": 0}
        ],
        "actions": [
            {
                "key": "switch-off",
                "type": "sensor.actuation",
                "contentType": "text/plain",
                "topic": "sensor/actions/switch",
                "action": "switch"
            }
        ],
        "events": [
            {"key": "overheating", "type": "text/plain", "topic": "sensor/overheating"}
        ]
    })
}

#[test]
fn test_load_yaml_document() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    let config = loader().from_yaml_str(SENSOR_YAML).unwrap();

    assert_eq!(config.broker_connection_string(), "tcp://127.0.0.1:1883");
    assert_eq!(config.client_id(), "yaml-sensor");
    assert_eq!(config.connect_options().connection_timeout_secs, 20);
    assert!(!config.connect_options().clean_session);
    assert!(config.connect_options().automatic_reconnect);

    let description = config.physical_asset_description();
    assert_eq!(description.properties.len(), 6);
    assert_eq!(
        description.property("temperature").unwrap().initial_value,
        TypedValue::Float(21.5)
    );
    assert_eq!(
        description.property("enabled").unwrap().initial_value,
        TypedValue::Boolean(true)
    );
    assert_eq!(
        description.property("label").unwrap().initial_value,
        TypedValue::Text("lamp".to_string())
    );
    assert_eq!(
        description.property("samples").unwrap().initial_value,
        TypedValue::Array(vec![TypedValue::Float(1.5), TypedValue::Float(2.0)])
    );
    let settings = description.property("settings").unwrap();
    assert_eq!(
        settings.initial_value.as_object().unwrap()["mode"],
        TypedValue::Text("eco".to_string())
    );

    // Document order is preserved on the incoming side.
    let topics: Vec<&str> = config.incoming_topics().iter().map(|b| b.topic()).collect();
    assert_eq!(
        topics,
        vec![
            "sensor/intensity",
            "sensor/temperature",
            "sensor/enabled",
            "sensor/label",
            "sensor/samples",
            "sensor/settings",
            "sensor/overheating",
        ]
    );

    let switch = config.outgoing_topic_by_action_key("switch-off").unwrap();
    assert_eq!(switch.apply(&TypedValue::Text("on".to_string())), "switchon");
}

#[test]
fn test_loaded_bindings_decode_payloads() {
    let config = loader().load(&document()).unwrap();

    let intensity = &config.incoming_topics()[0];
    assert_eq!(intensity.apply("42").unwrap()[0].value(), &TypedValue::Integer(42));
    assert!(intensity.apply("abc").is_err());

    let overheating = &config.incoming_topics()[1];
    assert_eq!(
        overheating.apply("true").unwrap()[0].value(),
        &TypedValue::Text("true".to_string())
    );
    assert_eq!(config.client_id(), "generated");
}

#[test]
fn test_json_text_document() {
    let text = document().to_string();
    let config = loader().from_json_str(&text).unwrap();
    assert_eq!(config.incoming_topics().len(), 2);
    assert_eq!(config.outgoing_topics().len(), 1);
}

#[test]
fn test_duplicate_property_topic_fails_whole_load() {
    let mut doc = document();
    doc["properties"] = json!([
        {"key": "a", "topic": "sensor/shared", "type": "int", "initialValue": 0},
        {"key": "b", "topic": "sensor/shared", "type": "int", "initialValue": 1}
    ]);

    let err = loader().load(&doc).unwrap_err();
    match &err {
        AdapterConfigError::Declaration { key, .. } => assert_eq!(key, "b"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(matches!(err.root(), AdapterConfigError::DuplicateTopic { .. }));
}

#[test]
fn test_unknown_type_name_fails_at_load() {
    let mut doc = document();
    doc["properties"][0]["type"] = json!("Integer");

    let err = loader().load(&doc).unwrap_err();
    assert!(err.to_string().contains("intensity"));
    match err.root() {
        AdapterConfigError::Coercion(e) => assert_eq!(e.type_name, "Integer"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_malformed_initial_value_fails_at_load() {
    let mut doc = document();
    doc["properties"][0]["initialValue"] = json!("zero");

    let err = loader().load(&doc).unwrap_err();
    assert!(matches!(err.root(), AdapterConfigError::Coercion(_)));
}

#[test]
fn test_missing_field_names_declaration() {
    let mut doc = document();
    doc["actions"][0]
        .as_object_mut()
        .unwrap()
        .remove("contentType");

    let err = loader().load(&doc).unwrap_err();
    match &err {
        AdapterConfigError::Declaration { key, source } => {
            assert_eq!(key, "switch-off");
            assert!(source.to_string().contains("contentType"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_missing_key_uses_position() {
    let mut doc = document();
    doc["events"] = json!([{"type": "text/plain", "topic": "sensor/overheating"}]);

    let err = loader().load(&doc).unwrap_err();
    match err {
        AdapterConfigError::Declaration { key, .. } => assert_eq!(key, "events[0]"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_empty_document_fails_build() {
    let doc = json!({"brokerAddress": "127.0.0.1", "brokerPort": 1883});
    assert!(loader().builder(&doc).is_ok());
    assert!(matches!(
        loader().load(&doc),
        Err(AdapterConfigError::Configuration(_))
    ));
}

#[test]
fn test_half_credentials_rejected() {
    let mut doc = document();
    doc["username"] = json!("user");
    assert!(loader().load(&doc).is_err());

    doc["password"] = json!("secret");
    let config = loader().load(&doc).unwrap();
    assert_eq!(config.credentials().unwrap().password(), "secret");
}

#[test]
fn test_invalid_yaml_text() {
    let err = loader().from_yaml_str("brokerAddress: [unclosed").unwrap_err();
    assert!(matches!(err, AdapterConfigError::Configuration(_)));
}
