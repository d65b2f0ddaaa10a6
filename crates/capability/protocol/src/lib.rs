//! # 接入协议能力模块
//!
//! 节点与网关之间的文本协议，全部为纯函数，不持有状态：
//! - **配置报文语法**：`;` 分隔组件、`|` 分隔字段的组件配置解析
//! - **节点 ID 校验**：可选的接入前缀校验
//! - **接入报文解码**：把接入主题上的报文一次性解码为封闭的消息变体
//! - **主题分类**：接入主题 / 控制主题 / 遥测主题
//!
//! ## 报文格式
//!
//! ```text
//! 接入主题:  nodeId[;code[;type|idUsed|name[|valueType|unit|period]*]*]
//! 遥测主题:  {nodeId}/{componentIdUsed}/{measuringUnit}   payload = "24.5"
//! 控制主题:  {nodeId}/{componentIdUsed}
//! 回复主题:  {nodeId}                                      payload = "1" | "2"
//! ```

mod error;
mod grammar;
mod identity;
mod topic;
mod types;

pub use error::{ErrorCode, ProtocolViolation};
pub use grammar::{parse_config, parse_integer, parse_measurement_value};
pub use identity::is_valid_node_id;
pub use topic::{TopicKind, classify_topic, derive_subscription_topics, is_valid_topic_level};
pub use types::{MessageType, NodeMessage, decode_onboarding_payload};

/// 默认的接入主题。
pub const DEFAULT_ONBOARDING_TOPIC: &str = "start";
