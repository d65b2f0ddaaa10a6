//! 出站传输接口
//!
//! 分发任务通过该接口回复节点、订阅遥测主题。
//! rumqttc 实现使用 `try_*` 请求：只把请求放入客户端队列，由监管任务的事件循环发送，
//! 分发任务不会等待喂给它事件的那个事件循环。

use crate::error::IngestError;
use async_trait::async_trait;
use rumqttc::{AsyncClient, QoS};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn publish(&self, topic: &str, qos: QoS, payload: &str) -> Result<(), IngestError>;
    async fn subscribe(&self, topic: &str, qos: QoS) -> Result<(), IngestError>;
}

#[derive(Clone)]
pub struct MqttTransport {
    client: AsyncClient,
}

impl MqttTransport {
    pub fn new(client: AsyncClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for MqttTransport {
    async fn publish(&self, topic: &str, qos: QoS, payload: &str) -> Result<(), IngestError> {
        self.client
            .try_publish(topic, qos, false, payload.as_bytes().to_vec())
            .map_err(|err| IngestError::Transport(err.to_string()))
    }

    async fn subscribe(&self, topic: &str, qos: QoS) -> Result<(), IngestError> {
        self.client
            .try_subscribe(topic, qos)
            .map_err(|err| IngestError::Transport(err.to_string()))
    }
}
