use domain::now_epoch_ms;

/// 入站应用消息（接收时打上时间戳）。
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub received_at_ms: i64,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            received_at_ms: now_epoch_ms(),
        }
    }
}

/// 监管任务转发给分发任务的事件。
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    /// broker 确认连接；`session_present` 为 false 表示 broker 侧会话是新的
    Connected { session_present: bool },
    Disconnected,
    Message(InboundMessage),
}
