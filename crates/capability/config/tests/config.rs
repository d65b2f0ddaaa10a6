use gateway_config::{ConfigError, GatewayConfig};
use std::collections::HashMap;

fn load(pairs: &[(&str, &str)]) -> Result<GatewayConfig, ConfigError> {
    let values: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    GatewayConfig::from_lookup(|key| values.get(key).cloned())
}

#[test]
fn defaults_apply_when_nothing_is_set() {
    let config = load(&[]).expect("config");
    assert_eq!(config.mqtt_host, "127.0.0.1");
    assert_eq!(config.mqtt_port, 1883);
    assert_eq!(config.mqtt_keepalive_seconds, 60);
    assert!(config.mqtt_clean_session);
    assert_eq!(config.onboarding_topic, "start");
    assert!(config.accept_prefix.is_none());
    assert!(config.database_url.is_none());
    assert!(config.mqtt_credentials.is_none());
    assert_eq!(config.inbound_queue, 64);
}

#[test]
fn load_config_from_values() {
    let config = load(&[
        ("GATEWAY_MQTT_HOST", "broker.local"),
        ("GATEWAY_MQTT_PORT", "8883"),
        ("GATEWAY_MQTT_CLEAN_SESSION", "off"),
        ("GATEWAY_MQTT_CLIENT_PREFIX", "site-"),
        ("GATEWAY_MQTT_CLIENT_NAME", "gw1"),
        ("GATEWAY_MQTT_USERNAME", "user"),
        ("GATEWAY_MQTT_PASSWORD", "pass"),
        ("GATEWAY_ACCEPT_PREFIX", "node-"),
        ("GATEWAY_DATABASE_URL", "postgres://localhost/gateway"),
    ])
    .expect("config");

    assert_eq!(config.mqtt_host, "broker.local");
    assert_eq!(config.mqtt_port, 8883);
    assert!(!config.mqtt_clean_session);
    assert_eq!(config.mqtt_client_id.client_id(), "site-gw1");
    assert_eq!(config.accept_prefix.as_deref(), Some("node-"));
    let credentials = config.mqtt_credentials.expect("credentials");
    assert_eq!(credentials.username, "user");
    assert_eq!(credentials.password, "pass");
}

#[test]
fn random_client_id_keeps_prefix() {
    let config = load(&[("GATEWAY_MQTT_CLIENT_PREFIX", "site-")]).expect("config");
    let first = config.mqtt_client_id.client_id();
    let second = config.mqtt_client_id.client_id();
    assert!(first.starts_with("site-gateway-"));
    assert_ne!(first, second);
}

#[test]
fn username_without_password_is_rejected() {
    let err = load(&[("GATEWAY_MQTT_USERNAME", "user")]).expect_err("must fail");
    assert!(matches!(err, ConfigError::Missing(key) if key == "GATEWAY_MQTT_PASSWORD"));
}

#[test]
fn invalid_numbers_are_rejected() {
    assert!(matches!(
        load(&[("GATEWAY_MQTT_PORT", "70000")]),
        Err(ConfigError::Invalid(_, _))
    ));
    assert!(matches!(
        load(&[("GATEWAY_INBOUND_QUEUE", "0")]),
        Err(ConfigError::Invalid(_, _))
    ));
}

#[test]
fn onboarding_topic_must_be_single_level() {
    assert!(load(&[("GATEWAY_ONBOARDING_TOPIC", "a/b")]).is_err());
}

#[test]
fn short_keepalive_is_rejected() {
    assert!(load(&[("GATEWAY_MQTT_KEEPALIVE_SECONDS", "3")]).is_err());
    let config = load(&[("GATEWAY_MQTT_KEEPALIVE_SECONDS", "0")]).expect("config");
    assert_eq!(config.mqtt_keepalive_seconds, 0);
}

#[test]
fn client_name_with_leading_space_is_rejected() {
    assert!(load(&[("GATEWAY_MQTT_CLIENT_NAME", " gw")]).is_err());
}
