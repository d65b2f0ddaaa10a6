//! 接入/遥测状态机
//!
//! 按主题形态分流每条入站消息：
//!
//! - 接入主题：节点识别、已知节点直接激活、请求配置、接收并持久化配置
//! - `<节点>/<组件>/<单位>`：遥测，解析数值后写入存储
//! - `<节点>/<组件>`：控制命名空间，当前只做寻址校验
//!
//! 不合法的消息一律静默丢弃，不向节点回复错误码。

use crate::cache::SubscriptionCache;
use crate::event::{GatewayEvent, InboundMessage};
use crate::supervisor::ConnectionStatus;
use crate::transport::Transport;
use domain::{NodeId, TelemetrySample};
use gateway_protocol::{
    MessageType, NodeMessage, ProtocolViolation, TopicKind, classify_topic,
    decode_onboarding_payload, derive_subscription_topics, is_valid_node_id, is_valid_topic_level,
    parse_config, parse_integer, parse_measurement_value,
};
use gateway_storage::NodeStore;
use gateway_telemetry::{
    record_config_stored, record_dropped_invalid, record_dropped_unknown_node,
    record_measurement_stored, record_measurement_unmatched, record_message_received,
    record_node_activated, record_onboarding_request, record_persistence_failure,
    record_persistence_latency_ms, record_reply_config, record_reply_ok, record_transport_failure,
};
use rumqttc::QoS;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// 分发配置。
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub onboarding_topic: String,
    /// 节点 ID 必须带的前缀（None 表示接受任意非空 ID）
    pub accept_prefix: Option<String>,
}

/// 单写者状态机：独占订阅缓存，逐条处理事件。
pub struct Dispatcher {
    config: DispatcherConfig,
    cache: SubscriptionCache,
    store: Arc<dyn NodeStore>,
    transport: Arc<dyn Transport>,
    status: Arc<ConnectionStatus>,
}

impl Dispatcher {
    pub fn new(
        config: DispatcherConfig,
        store: Arc<dyn NodeStore>,
        transport: Arc<dyn Transport>,
        status: Arc<ConnectionStatus>,
    ) -> Self {
        Self {
            config,
            cache: SubscriptionCache::new(),
            store,
            transport,
            status,
        }
    }

    pub fn cache(&self) -> &SubscriptionCache {
        &self.cache
    }

    /// 消费事件直到发送端全部关闭；已收到的事件会先处理完。
    pub async fn run(mut self, mut events: mpsc::Receiver<GatewayEvent>) {
        info!(target: "gateway.ingest", "dispatcher_started");
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        info!(
            target: "gateway.ingest",
            onboarded_nodes = self.cache.len(),
            "dispatcher_stopped"
        );
    }

    pub async fn handle_event(&mut self, event: GatewayEvent) {
        match event {
            GatewayEvent::Connected { session_present } => {
                // broker 侧新会话不再持有节点的遥测订阅，节点需重新走接入握手
                if !session_present && !self.cache.is_empty() {
                    info!(
                        target: "gateway.ingest",
                        nodes = self.cache.len(),
                        "subscription_cache_reset"
                    );
                    self.cache.clear();
                }
            }
            GatewayEvent::Disconnected => {
                debug!(
                    target: "gateway.ingest",
                    onboarded_nodes = self.cache.len(),
                    "broker_session_lost"
                );
            }
            GatewayEvent::Message(message) => self.handle_message(message).await,
        }
    }

    pub async fn handle_message(&mut self, message: InboundMessage) {
        record_message_received();
        debug!(
            target: "gateway.ingest",
            topic = %message.topic,
            payload_size = message.payload.len(),
            connected = self.status.is_connected(),
            "message_received"
        );

        let Ok(payload) = std::str::from_utf8(&message.payload) else {
            record_dropped_invalid();
            debug!(target: "gateway.ingest", topic = %message.topic, "payload_not_utf8");
            return;
        };

        match classify_topic(&message.topic, &self.config.onboarding_topic) {
            TopicKind::Onboarding => self.handle_onboarding(payload).await,
            TopicKind::Telemetry {
                node_id,
                component,
                unit,
            } => {
                self.handle_telemetry(node_id, component, unit, payload, message.received_at_ms)
                    .await
            }
            TopicKind::Control { node_id, component } => self.handle_control(node_id, component),
            TopicKind::Unsupported => {
                drop_violation(None, &ProtocolViolation::UnsupportedTopic(message.topic.clone()))
            }
        }
    }

    async fn handle_onboarding(&mut self, payload: &str) {
        record_onboarding_request();
        let (node_id, message) = match decode_onboarding_payload(payload) {
            Ok(decoded) => decoded,
            Err(violation) => {
                drop_violation(None, &violation);
                return;
            }
        };
        info!(target: "gateway.ingest", node_id = %node_id, "onboarding_request_received");

        // 节点 ID 同时是回复主题与订阅主题的第一层级
        if !is_valid_node_id(node_id.as_str(), self.config.accept_prefix.as_deref())
            || !is_valid_topic_level(node_id.as_str())
        {
            drop_violation(
                Some(&node_id),
                &ProtocolViolation::RejectedNodeId(node_id.to_string()),
            );
            return;
        }

        // 重复接入（节点没收到上一次确认）
        if self.cache.is_onboarded(&node_id) {
            self.reply(&node_id, MessageType::Ok).await;
            return;
        }

        let started = Instant::now();
        let exists = self.store.node_exists(&node_id).await;
        record_persistence_latency_ms(started.elapsed().as_millis() as u64);
        match exists {
            Ok(true) => {
                info!(target: "gateway.ingest", node_id = %node_id, "known_node_reconnected");
                self.prepare_for_use(&node_id).await;
                return;
            }
            Ok(false) => {}
            Err(err) => {
                record_persistence_failure();
                warn!(target: "gateway.ingest", node_id = %node_id, error = %err, "node_lookup_failed");
                return;
            }
        }

        match message {
            NodeMessage::Announce => self.reply(&node_id, MessageType::Config).await,
            NodeMessage::ConfigPayload(fields) => self.accept_config(&node_id, &fields).await,
            NodeMessage::ConfigRequest => {
                drop_violation(Some(&node_id), &ProtocolViolation::MissingConfiguration)
            }
            NodeMessage::Ok => {
                debug!(target: "gateway.ingest", node_id = %node_id, "unsolicited_ok_ignored");
            }
            NodeMessage::Invalid(violation) => drop_violation(Some(&node_id), &violation),
        }
    }

    async fn accept_config(&mut self, node_id: &NodeId, fields: &[String]) {
        let components = match parse_config(fields) {
            Ok(components) => components,
            Err(violation) => {
                drop_violation(Some(node_id), &violation);
                return;
            }
        };
        let unusable_unit = components
            .iter()
            .flat_map(|component| &component.value_types)
            .find(|value_type| !is_valid_topic_level(&value_type.measuring_unit));
        if let Some(value_type) = unusable_unit {
            drop_violation(
                Some(node_id),
                &ProtocolViolation::InvalidTopicLevel(value_type.measuring_unit.clone()),
            );
            return;
        }

        let started = Instant::now();
        let stored = self.store.new_node_config(node_id, &components).await;
        record_persistence_latency_ms(started.elapsed().as_millis() as u64);
        if let Err(err) = stored {
            record_persistence_failure();
            warn!(target: "gateway.ingest", node_id = %node_id, error = %err, "node_config_store_failed");
            return;
        }
        record_config_stored();
        info!(
            target: "gateway.ingest",
            node_id = %node_id,
            components = components.len(),
            "node_config_stored"
        );
        self.prepare_for_use(node_id).await;
    }

    /// 激活节点：按持久化配置建立订阅，全部成功后回复 OK。
    ///
    /// 任一订阅失败时撤销缓存登记，节点重发接入请求会重新激活。
    async fn prepare_for_use(&mut self, node_id: &NodeId) {
        let started = Instant::now();
        let config = self.store.get_node_config(node_id).await;
        record_persistence_latency_ms(started.elapsed().as_millis() as u64);
        let config = match config {
            Ok(config) => config,
            Err(err) => {
                record_persistence_failure();
                warn!(target: "gateway.ingest", node_id = %node_id, error = %err, "node_config_load_failed");
                return;
            }
        };

        // 已持久化的配置也可能含无法订阅的单位，此时不激活节点
        let topics = match derive_subscription_topics(node_id, &config) {
            Ok(topics) => topics,
            Err(violation) => {
                drop_violation(Some(node_id), &violation);
                return;
            }
        };
        self.cache.onboard(node_id.clone());
        for topic in &topics {
            if let Err(err) = self.cache.add_subscription(node_id, topic.as_str()) {
                warn!(target: "gateway.ingest", node_id = %node_id, error = %err, "subscription_cache_failed");
                self.cache.remove(node_id);
                return;
            }
            if let Err(err) = self.transport.subscribe(topic, QoS::AtMostOnce).await {
                record_transport_failure();
                warn!(
                    target: "gateway.ingest",
                    node_id = %node_id,
                    topic = %topic,
                    error = %err,
                    "telemetry_subscribe_failed"
                );
                self.cache.remove(node_id);
                return;
            }
        }

        record_node_activated();
        info!(
            target: "gateway.ingest",
            node_id = %node_id,
            subscriptions = topics.len(),
            "node_activated"
        );
        self.reply(node_id, MessageType::Ok).await;
    }

    async fn handle_telemetry(
        &mut self,
        node_id: &str,
        component: &str,
        unit: &str,
        payload: &str,
        received_at_ms: i64,
    ) {
        let Some(node_id) = self.onboarded(node_id) else {
            return;
        };
        let Some(component_id_used) = parse_integer(component) else {
            drop_violation(
                Some(&node_id),
                &ProtocolViolation::InvalidComponentId(component.to_string()),
            );
            return;
        };
        let value = match parse_measurement_value(payload) {
            Ok(value) => value,
            Err(violation) => {
                drop_violation(Some(&node_id), &violation);
                return;
            }
        };

        let sample = TelemetrySample {
            node_id,
            component_id_used,
            measuring_unit: unit.to_string(),
            value,
            observed_at_ms: received_at_ms,
        };
        let started = Instant::now();
        let appended = self.store.append_measurement(&sample).await;
        record_persistence_latency_ms(started.elapsed().as_millis() as u64);
        match appended {
            Ok(true) => {
                record_measurement_stored();
                debug!(
                    target: "gateway.ingest",
                    node_id = %sample.node_id,
                    component = sample.component_id_used,
                    unit = %sample.measuring_unit,
                    value = sample.value,
                    "measurement_stored"
                );
            }
            Ok(false) => {
                record_measurement_unmatched();
                debug!(
                    target: "gateway.ingest",
                    node_id = %sample.node_id,
                    component = sample.component_id_used,
                    unit = %sample.measuring_unit,
                    "measurement_unmatched"
                );
            }
            Err(err) => {
                record_persistence_failure();
                warn!(
                    target: "gateway.ingest",
                    node_id = %sample.node_id,
                    error = %err,
                    "measurement_store_failed"
                );
            }
        }
    }

    fn handle_control(&self, node_id: &str, component: &str) {
        let Some(node_id) = self.onboarded(node_id) else {
            return;
        };
        if parse_integer(component).is_none() {
            drop_violation(
                Some(&node_id),
                &ProtocolViolation::InvalidComponentId(component.to_string()),
            );
            return;
        }
        debug!(
            target: "gateway.ingest",
            node_id = %node_id,
            component = %component,
            "control_message_ignored"
        );
    }

    /// 只有已接入节点的遥测/控制消息才会继续处理。
    fn onboarded(&self, node_id: &str) -> Option<NodeId> {
        match NodeId::new(node_id) {
            Some(node_id) if self.cache.is_onboarded(&node_id) => Some(node_id),
            _ => {
                record_dropped_unknown_node();
                debug!(target: "gateway.ingest", node_id = %node_id, "unknown_node_dropped");
                None
            }
        }
    }

    async fn reply(&self, node_id: &NodeId, message_type: MessageType) {
        match self
            .transport
            .publish(node_id.as_str(), QoS::AtLeastOnce, message_type.payload())
            .await
        {
            Ok(()) => {
                match message_type {
                    MessageType::Config => record_reply_config(),
                    _ => record_reply_ok(),
                }
                info!(
                    target: "gateway.ingest",
                    node_id = %node_id,
                    code = message_type.code(),
                    "reply_sent"
                );
            }
            Err(err) => {
                record_transport_failure();
                warn!(target: "gateway.ingest", node_id = %node_id, error = %err, "reply_failed");
            }
        }
    }
}

fn drop_violation(node_id: Option<&NodeId>, violation: &ProtocolViolation) {
    record_dropped_invalid();
    debug!(
        target: "gateway.ingest",
        node_id = node_id.map(NodeId::as_str).unwrap_or_default(),
        error = %violation,
        error_code = violation.error_code().code(),
        "message_dropped"
    );
}
