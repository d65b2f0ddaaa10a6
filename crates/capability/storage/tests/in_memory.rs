use domain::{ComponentDescriptor, NodeId, TelemetrySample, ValueTypeDescriptor};
use gateway_storage::{InMemoryNodeStore, NodeStore};

fn node(id: &str) -> NodeId {
    NodeId::new(id).expect("node id")
}

fn sample_config() -> Vec<ComponentDescriptor> {
    let mut dht = ComponentDescriptor::new("senzor", 5, "DHT22");
    dht.value_types.push(ValueTypeDescriptor {
        value_type: "temperatura".to_string(),
        measuring_unit: "C".to_string(),
        measurement_period: 5,
    });
    let mut bme = ComponentDescriptor::new("senzor", 6, "");
    bme.value_types.push(ValueTypeDescriptor {
        value_type: "temperatura".to_string(),
        measuring_unit: "C".to_string(),
        measurement_period: 6,
    });
    bme.value_types.push(ValueTypeDescriptor {
        value_type: "vlaga".to_string(),
        measuring_unit: "%".to_string(),
        measurement_period: 6,
    });
    let relay = ComponentDescriptor::new("aktuator", 7, "relej");
    vec![dht, bme, relay]
}

#[tokio::test]
async fn config_round_trips_as_units_per_component() {
    let store = InMemoryNodeStore::new();
    let id = node("node-50");
    assert!(!store.node_exists(&id).await.expect("exists"));

    store
        .new_node_config(&id, &sample_config())
        .await
        .expect("stored");
    assert!(store.node_exists(&id).await.expect("exists"));

    let config = store.get_node_config(&id).await.expect("config");
    assert_eq!(config.get(&5), Some(&vec!["C".to_string()]));
    assert_eq!(config.get(&6), Some(&vec!["C".to_string(), "%".to_string()]));
    assert_eq!(config.get(&7), Some(&Vec::new()));
}

#[tokio::test]
async fn config_is_create_only() {
    let store = InMemoryNodeStore::new();
    let id = node("node-50");
    store
        .new_node_config(&id, &sample_config())
        .await
        .expect("stored");
    assert!(store.new_node_config(&id, &sample_config()).await.is_err());
    assert_eq!(store.node_count(), 1);
}

#[tokio::test]
async fn duplicate_component_ids_are_rejected() {
    let store = InMemoryNodeStore::new();
    let components = vec![
        ComponentDescriptor::new("senzor", 5, "a"),
        ComponentDescriptor::new("senzor", 5, "b"),
    ];
    assert!(store.new_node_config(&node("node-1"), &components).await.is_err());
    assert_eq!(store.node_count(), 0);
}

#[tokio::test]
async fn measurement_requires_matching_unit() {
    let store = InMemoryNodeStore::new();
    let id = node("node-50");
    store
        .new_node_config(&id, &sample_config())
        .await
        .expect("stored");

    let mut sample = TelemetrySample {
        node_id: id.clone(),
        component_id_used: 5,
        measuring_unit: "C".to_string(),
        value: 24.5,
        observed_at_ms: 1_700_000_000_000,
    };
    assert!(store.append_measurement(&sample).await.expect("append"));

    sample.measuring_unit = "%".to_string();
    assert!(!store.append_measurement(&sample).await.expect("append"));

    let stored = store.measurements();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].value, 24.5);
    assert_eq!(stored[0].measuring_unit, "C");
}

#[tokio::test]
async fn measurement_buffer_keeps_only_the_newest_samples() {
    let store = InMemoryNodeStore::with_measurement_limit(2);
    let id = node("node-50");
    store
        .new_node_config(&id, &sample_config())
        .await
        .expect("stored");

    for value in [1.0, 2.0, 3.0] {
        let sample = TelemetrySample {
            node_id: id.clone(),
            component_id_used: 5,
            measuring_unit: "C".to_string(),
            value,
            observed_at_ms: 1_700_000_000_000,
        };
        assert!(store.append_measurement(&sample).await.expect("append"));
    }

    let values: Vec<f64> = store.measurements().iter().map(|m| m.value).collect();
    assert_eq!(values, vec![2.0, 3.0]);
}
