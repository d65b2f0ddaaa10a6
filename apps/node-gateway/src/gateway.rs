//! 网关装配模块
//!
//! 把存储、连接监管、出站传输与分发状态机组装成两个任务：
//! 监管任务轮询 broker 事件循环，经有界通道把事件交给唯一的分发任务。

use gateway_config::GatewayConfig;
use gateway_ingest::{
    ConnectionStatus, Dispatcher, DispatcherConfig, IngestError, MqttTransport, Supervisor,
    SupervisorConfig,
};
use gateway_storage::{InMemoryNodeStore, NodeStore, PgNodeStore, StorageError};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub struct GatewayTasks {
    pub supervisor: JoinHandle<Result<(), IngestError>>,
    pub dispatcher: JoinHandle<()>,
}

/// 根据配置选择节点存储；Postgres 启动时执行建表脚本。
pub async fn build_store(config: &GatewayConfig) -> Result<Arc<dyn NodeStore>, StorageError> {
    match config.database_url.as_deref() {
        Some(database_url) => {
            let store = PgNodeStore::connect(database_url).await?;
            store.migrate().await?;
            info!(target: "gateway.storage", backend = "postgres", "node_store_ready");
            Ok(Arc::new(store))
        }
        None => {
            warn!(
                target: "gateway.storage",
                backend = "in_memory",
                persisted = false,
                "node_store_ready"
            );
            Ok(Arc::new(InMemoryNodeStore::new()))
        }
    }
}

pub fn spawn_gateway(
    config: &GatewayConfig,
    store: Arc<dyn NodeStore>,
    shutdown: watch::Receiver<bool>,
) -> GatewayTasks {
    let status = Arc::new(ConnectionStatus::new());
    let supervisor = Supervisor::new(supervisor_config(config), status.clone());
    let (client, eventloop) = supervisor.client();

    let dispatcher = Dispatcher::new(
        DispatcherConfig {
            onboarding_topic: config.onboarding_topic.clone(),
            accept_prefix: config.accept_prefix.clone(),
        },
        store,
        Arc::new(MqttTransport::new(client.clone())),
        status,
    );

    let (events_tx, events_rx) = mpsc::channel(config.inbound_queue);
    let dispatcher = tokio::spawn(dispatcher.run(events_rx));
    let supervisor = tokio::spawn(supervisor.run(client, eventloop, events_tx, shutdown));
    GatewayTasks {
        supervisor,
        dispatcher,
    }
}

fn supervisor_config(config: &GatewayConfig) -> SupervisorConfig {
    SupervisorConfig {
        host: config.mqtt_host.clone(),
        port: config.mqtt_port,
        keepalive_seconds: config.mqtt_keepalive_seconds,
        client_id: config.mqtt_client_id.client_id(),
        clean_session: config.mqtt_clean_session,
        credentials: config
            .mqtt_credentials
            .as_ref()
            .map(|credentials| (credentials.username.clone(), credentials.password.clone())),
        onboarding_topic: config.onboarding_topic.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> GatewayConfig {
        GatewayConfig::from_lookup(|key| {
            pairs
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
        })
        .expect("config")
    }

    #[tokio::test]
    async fn missing_database_url_selects_in_memory_store() {
        let store = build_store(&config(&[])).await.expect("store");
        let node_id = domain_node("node-1");
        assert!(!store.node_exists(&node_id).await.expect("exists"));
    }

    #[test]
    fn supervisor_config_uses_client_id_policy() {
        let supervisor = supervisor_config(&config(&[
            ("GATEWAY_MQTT_CLIENT_PREFIX", "site-"),
            ("GATEWAY_MQTT_CLIENT_NAME", "gw1"),
            ("GATEWAY_MQTT_USERNAME", "user"),
            ("GATEWAY_MQTT_PASSWORD", "pass"),
        ]));
        assert_eq!(supervisor.client_id, "site-gw1");
        assert_eq!(supervisor.onboarding_topic, "start");
        assert_eq!(
            supervisor.credentials,
            Some(("user".to_string(), "pass".to_string()))
        );
    }

    fn domain_node(id: &str) -> domain::NodeId {
        domain::NodeId::new(id).expect("node id")
    }
}
