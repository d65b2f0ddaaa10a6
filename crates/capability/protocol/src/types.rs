//! 协议相关类型定义

use crate::error::ProtocolViolation;
use crate::grammar::parse_integer;
use domain::NodeId;

/// 节点与网关共享的消息类型码。
///
/// 回复以单字节文本形式发布在节点自己的主题上。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    NotOk = 0,
    Ok = 1,
    Config = 2,
}

impl MessageType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::NotOk),
            1 => Some(Self::Ok),
            2 => Some(Self::Config),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// 回复报文内容（类型码的文本形式）。
    pub fn payload(self) -> &'static str {
        match self {
            Self::NotOk => "0",
            Self::Ok => "1",
            Self::Config => "2",
        }
    }
}

/// 接入主题上解码后的报文体。
///
/// 只在主题边界解码一次，后续流程不再重新解析类型码。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeMessage {
    /// 只有节点 ID，节点尚未提供配置。
    Announce,
    /// 类型码 1。
    Ok,
    /// 类型码 2 且没有组件字段。
    ConfigRequest,
    /// 类型码 2 以及其后的组件字段（未解析）。
    ConfigPayload(Vec<String>),
    /// 第二个字段不是可接受的类型码。
    Invalid(ProtocolViolation),
}

/// 解码接入主题报文：`nodeId[;code[;component;...]]`。
///
/// 仅当节点 ID 为空时返回错误；类型码问题保留在 [`NodeMessage::Invalid`] 中，
/// 因为已接入节点的重复请求无论类型码如何都要回复 OK。
pub fn decode_onboarding_payload(payload: &str) -> Result<(NodeId, NodeMessage), ProtocolViolation> {
    let mut fields = payload.split(';');
    let node_id = fields
        .next()
        .and_then(NodeId::new)
        .ok_or(ProtocolViolation::EmptyNodeId)?;

    let Some(code_field) = fields.next() else {
        return Ok((node_id, NodeMessage::Announce));
    };

    let message = match parse_integer(code_field) {
        None => NodeMessage::Invalid(ProtocolViolation::InvalidMessageCode(code_field.to_string())),
        Some(code) => match MessageType::from_code(code) {
            Some(MessageType::Ok) => NodeMessage::Ok,
            Some(MessageType::Config) => {
                let rest: Vec<String> = fields.map(str::to_string).collect();
                if rest.is_empty() {
                    NodeMessage::ConfigRequest
                } else {
                    NodeMessage::ConfigPayload(rest)
                }
            }
            Some(MessageType::NotOk) | None => {
                NodeMessage::Invalid(ProtocolViolation::UnsupportedMessageCode(code))
            }
        },
    };
    Ok((node_id, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_node_id_is_announce() {
        let (node_id, message) = decode_onboarding_payload("node-50").expect("decoded");
        assert_eq!(node_id.as_str(), "node-50");
        assert_eq!(message, NodeMessage::Announce);
    }

    #[test]
    fn config_code_without_components_is_request() {
        let (_, message) = decode_onboarding_payload("node-50;2").expect("decoded");
        assert_eq!(message, NodeMessage::ConfigRequest);
    }

    #[test]
    fn config_code_keeps_component_fields() {
        let (_, message) =
            decode_onboarding_payload("node-50;2;senzor|5|DHT22;senzor|6|").expect("decoded");
        assert_eq!(
            message,
            NodeMessage::ConfigPayload(vec!["senzor|5|DHT22".to_string(), "senzor|6|".to_string()])
        );
    }

    #[test]
    fn empty_code_field_is_invalid() {
        let (_, message) = decode_onboarding_payload("node-50;").expect("decoded");
        assert_eq!(
            message,
            NodeMessage::Invalid(ProtocolViolation::InvalidMessageCode(String::new()))
        );
    }

    #[test]
    fn unknown_code_is_invalid() {
        let (_, message) = decode_onboarding_payload("node-50;7;x").expect("decoded");
        assert_eq!(
            message,
            NodeMessage::Invalid(ProtocolViolation::UnsupportedMessageCode(7))
        );
        let (_, message) = decode_onboarding_payload("node-50;0").expect("decoded");
        assert_eq!(
            message,
            NodeMessage::Invalid(ProtocolViolation::UnsupportedMessageCode(0))
        );
    }

    #[test]
    fn empty_node_id_fails() {
        assert_eq!(
            decode_onboarding_payload(";2;senzor|5|x"),
            Err(ProtocolViolation::EmptyNodeId)
        );
        assert_eq!(decode_onboarding_payload(""), Err(ProtocolViolation::EmptyNodeId));
    }

    #[test]
    fn reply_payloads_are_single_digit_codes() {
        assert_eq!(MessageType::Ok.payload(), "1");
        assert_eq!(MessageType::Config.payload(), "2");
        assert_eq!(MessageType::Config.code(), 2);
    }
}
