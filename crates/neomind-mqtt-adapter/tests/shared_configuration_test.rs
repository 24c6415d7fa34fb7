//! A built configuration is shared read-only across tasks.

use std::sync::Arc;

use neomind_mqtt_adapter::{coercion, Configuration, ConfigurationBuilder, TypedValue, ValueType};

fn shared_config() -> Arc<Configuration> {
    let mut builder = ConfigurationBuilder::with_client_id("127.0.0.1", 1883, "shared").unwrap();
    builder
        .add_typed_property_and_topic(
            "intensity",
            TypedValue::Integer(0),
            "sensor/intensity",
            ValueType::Integer,
        )
        .unwrap()
        .add_action_and_topic(
            "switch-off",
            "sensor.actuation",
            "text/plain",
            "sensor/actions/switch",
            coercion::prefixed("switch"),
        )
        .unwrap();
    Arc::new(builder.build().unwrap())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_decoding() {
    let config = shared_config();

    let mut handles = Vec::new();
    for i in 0..16i64 {
        let config = Arc::clone(&config);
        handles.push(tokio::spawn(async move {
            let binding = &config.incoming_topics()[0];
            let events = binding.apply(&i.to_string()).unwrap();
            events[0].value().as_i64()
        }));
    }

    let mut decoded = Vec::new();
    for handle in handles {
        decoded.push(handle.await.unwrap().unwrap());
    }
    decoded.sort_unstable();
    assert_eq!(decoded, (0..16).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_encoding() {
    let config = shared_config();

    let tasks: Vec<_> = ["on", "off"]
        .into_iter()
        .map(|value| {
            let config = Arc::clone(&config);
            tokio::spawn(async move {
                let binding = config.outgoing_topic_by_action_key("switch-off").unwrap();
                binding.apply(&TypedValue::Text(value.to_string()))
            })
        })
        .collect();

    let mut payloads = Vec::new();
    for task in tasks {
        payloads.push(task.await.unwrap());
    }
    assert_eq!(payloads, vec!["switchon", "switchoff"]);
}

#[test]
fn test_configuration_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Configuration>();
}
