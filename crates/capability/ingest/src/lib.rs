//! # Gateway Ingest 模块
//!
//! 节点接入与遥测入库的运行时部分。
//!
//! ## 组成
//!
//! - `cache.rs`：订阅缓存（会话内已接入节点 -> 已订阅主题集合）
//! - `transport.rs`：出站发布/订阅接口及 rumqttc 实现
//! - `dispatcher.rs`：接入/遥测状态机，串行处理入站事件
//! - `supervisor.rs`：broker 连接监管（重连、接入主题订阅、事件转发）
//! - `event.rs`：监管任务与分发任务之间传递的事件
//!
//! ## 并发模型
//!
//! 监管任务轮询 rumqttc `EventLoop`，通过有界 mpsc 通道把事件交给唯一的分发任务；
//! 订阅缓存只由分发任务持有和修改，入站消息按接收顺序逐条处理完毕。

mod cache;
mod dispatcher;
mod error;
mod event;
mod supervisor;
mod transport;

pub use cache::SubscriptionCache;
pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use error::{CacheError, IngestError};
pub use event::{GatewayEvent, InboundMessage};
pub use supervisor::{
    ConnectionFailure, ConnectionState, ConnectionStatus, RECONNECT_DELAY, Supervisor,
    SupervisorConfig, classify_connection_error, resolve_broker,
};
pub use transport::{MqttTransport, Transport};
