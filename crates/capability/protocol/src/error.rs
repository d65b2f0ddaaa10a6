//! 协议错误类型定义

/// 协议违规：所有违规都在本地丢弃报文，不回复节点。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolViolation {
    #[error("empty node id")]
    EmptyNodeId,

    #[error("node id rejected: {0}")]
    RejectedNodeId(String),

    #[error("message code is not an integer: {0:?}")]
    InvalidMessageCode(String),

    #[error("unsupported message code: {0}")]
    UnsupportedMessageCode(i64),

    /// CONFIG 报文缺少组件字段。
    #[error("config message without components")]
    MissingConfiguration,

    #[error("malformed component #{index}: {reason}")]
    MalformedComponent { index: usize, reason: &'static str },

    #[error("component id is not an integer: {0:?}")]
    InvalidComponentId(String),

    #[error("telemetry value is not numeric: {0:?}")]
    InvalidTelemetryValue(String),

    #[error("unsupported topic: {0}")]
    UnsupportedTopic(String),

    /// 节点 ID 或测量单位无法作为订阅主题层级（含 `/`、`+`、`#`）。
    #[error("not usable as a topic level: {0:?}")]
    InvalidTopicLevel(String),
}

/// 错误码（协议中已定义，网关目前从不下发，仅用于日志）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidFormat = 1,
    UnsupportedId = 3,
    UnknownCode = 4,
}

impl ErrorCode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl ProtocolViolation {
    /// 违规对应的协议错误码。
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyNodeId | Self::RejectedNodeId(_) => ErrorCode::UnsupportedId,
            Self::InvalidMessageCode(_) | Self::UnsupportedMessageCode(_) => ErrorCode::UnknownCode,
            Self::MissingConfiguration
            | Self::MalformedComponent { .. }
            | Self::InvalidComponentId(_)
            | Self::InvalidTelemetryValue(_)
            | Self::UnsupportedTopic(_)
            | Self::InvalidTopicLevel(_) => ErrorCode::InvalidFormat,
        }
    }
}
