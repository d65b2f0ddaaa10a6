//! broker 连接监管
//!
//! - 启动前解析一次 broker 主机名，解析失败视为配置错误，直接退出
//! - 连接被拒绝/超时：同类失败只记录一次日志，固定间隔后重连
//! - 每次连接成功（含重连）重新订阅接入主题（QoS 1）
//! - 入站消息按接收顺序转发给分发任务

use crate::error::IngestError;
use crate::event::{GatewayEvent, InboundMessage};
use gateway_telemetry::{record_connect, record_disconnect, record_transport_failure};
use rumqttc::{
    AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
};
use std::io::ErrorKind;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// 重连间隔。
pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// 客户端请求队列容量（回复与遥测订阅共用）。
const REQUEST_CAPACITY: usize = 256;

/// 连接监管配置。
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub host: String,
    pub port: u16,
    pub keepalive_seconds: u16,
    pub client_id: String,
    pub clean_session: bool,
    pub credentials: Option<(String, String)>,
    pub onboarding_topic: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
}

/// 连接状态：监管任务写入，分发任务只读（仅用于日志）。
#[derive(Debug)]
pub struct ConnectionStatus {
    state: AtomicU8,
}

impl ConnectionStatus {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(ConnectionState::Disconnected as u8),
        }
    }

    pub fn get(&self) -> ConnectionState {
        match self.state.load(Ordering::Relaxed) {
            2 => ConnectionState::Connected,
            1 => ConnectionState::Connecting,
            _ => ConnectionState::Disconnected,
        }
    }

    pub fn set(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::Relaxed);
    }

    pub fn is_connected(&self) -> bool {
        self.get() == ConnectionState::Connected
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// 连接失败分类。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionFailure {
    Refused,
    Timeout,
    Unresolvable,
    Other,
}

impl ConnectionFailure {
    fn as_str(self) -> &'static str {
        match self {
            Self::Refused => "refused",
            Self::Timeout => "timeout",
            Self::Unresolvable => "unresolvable",
            Self::Other => "other",
        }
    }
}

/// 对事件循环返回的错误分类。
pub fn classify_connection_error(err: &ConnectionError) -> ConnectionFailure {
    match err {
        ConnectionError::ConnectionRefused(_) => ConnectionFailure::Refused,
        ConnectionError::NetworkTimeout | ConnectionError::FlushTimeout => {
            ConnectionFailure::Timeout
        }
        ConnectionError::Io(io) => match io.kind() {
            ErrorKind::ConnectionRefused => ConnectionFailure::Refused,
            ErrorKind::TimedOut => ConnectionFailure::Timeout,
            _ if is_lookup_failure(&io.to_string()) => ConnectionFailure::Unresolvable,
            _ => ConnectionFailure::Other,
        },
        _ => ConnectionFailure::Other,
    }
}

fn is_lookup_failure(message: &str) -> bool {
    ["lookup address", "Name or service not known", "nodename nor servname", "No such host"]
        .iter()
        .any(|needle| message.contains(needle))
}

/// 解析 broker 地址；失败表示配置错误，不重试。
pub async fn resolve_broker(host: &str, port: u16) -> Result<(), IngestError> {
    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|err| IngestError::UnresolvableHost(format!("{}: {}", host, err)))?;
    if addrs.next().is_none() {
        return Err(IngestError::UnresolvableHost(host.to_string()));
    }
    Ok(())
}

pub struct Supervisor {
    config: SupervisorConfig,
    status: Arc<ConnectionStatus>,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig, status: Arc<ConnectionStatus>) -> Self {
        Self { config, status }
    }

    pub fn mqtt_options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(
            self.config.client_id.clone(),
            self.config.host.clone(),
            self.config.port,
        );
        options.set_keep_alive(Duration::from_secs(u64::from(self.config.keepalive_seconds)));
        options.set_clean_session(self.config.clean_session);
        if let Some((username, password)) = self.config.credentials.as_ref() {
            options.set_credentials(username, password);
        }
        options
    }

    /// 创建客户端与事件循环；客户端交给出站传输，事件循环交给 [`Supervisor::run`]。
    pub fn client(&self) -> (AsyncClient, EventLoop) {
        AsyncClient::new(self.mqtt_options(), REQUEST_CAPACITY)
    }

    /// 运行连接循环，直到收到停机信号、分发任务退出或主机名无法解析。
    pub async fn run(
        self,
        client: AsyncClient,
        mut eventloop: EventLoop,
        events: mpsc::Sender<GatewayEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), IngestError> {
        resolve_broker(&self.config.host, self.config.port).await?;
        info!(
            target: "gateway.supervisor",
            host = %self.config.host,
            port = self.config.port,
            client_id = %self.config.client_id,
            clean_session = self.config.clean_session,
            "supervisor_started"
        );

        self.status.set(ConnectionState::Connecting);
        let mut last_failure: Option<ConnectionFailure> = None;
        let result = loop {
            if *shutdown.borrow() {
                break Ok(());
            }
            let polled = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break Ok(());
                    }
                    continue;
                }
                polled = eventloop.poll() => polled,
            };

            match polled {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    last_failure = None;
                    self.status.set(ConnectionState::Connected);
                    record_connect();
                    info!(
                        target: "gateway.supervisor",
                        session_present = ack.session_present,
                        "broker_connected"
                    );
                    if let Err(err) =
                        client.try_subscribe(self.config.onboarding_topic.as_str(), QoS::AtLeastOnce)
                    {
                        record_transport_failure();
                        warn!(
                            target: "gateway.supervisor",
                            topic = %self.config.onboarding_topic,
                            error = %err,
                            "onboarding_subscribe_failed"
                        );
                    }
                    let event = GatewayEvent::Connected {
                        session_present: ack.session_present,
                    };
                    if events.send(event).await.is_err() {
                        break Err(IngestError::Shutdown);
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let message = InboundMessage::new(publish.topic, publish.payload.to_vec());
                    if events.send(GatewayEvent::Message(message)).await.is_err() {
                        break Err(IngestError::Shutdown);
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    if self.status.is_connected() {
                        record_disconnect();
                        warn!(target: "gateway.supervisor", error = %err, "broker_disconnected");
                        if events.send(GatewayEvent::Disconnected).await.is_err() {
                            break Err(IngestError::Shutdown);
                        }
                    }
                    self.status.set(ConnectionState::Disconnected);

                    let failure = classify_connection_error(&err);
                    if failure == ConnectionFailure::Unresolvable {
                        break Err(IngestError::UnresolvableHost(self.config.host.clone()));
                    }
                    if last_failure != Some(failure) {
                        record_transport_failure();
                        warn!(
                            target: "gateway.supervisor",
                            failure = failure.as_str(),
                            error = %err,
                            retry_in_ms = RECONNECT_DELAY.as_millis() as u64,
                            "broker_connection_failed"
                        );
                        last_failure = Some(failure);
                    } else {
                        debug!(target: "gateway.supervisor", failure = failure.as_str(), "broker_connection_retry");
                    }

                    tokio::select! {
                        changed = shutdown.changed() => {
                            if changed.is_err() {
                                break Ok(());
                            }
                        }
                        _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                    }
                    self.status.set(ConnectionState::Connecting);
                }
            }
        };

        if self.status.is_connected() {
            disconnect(&client, &mut eventloop).await;
        }
        self.status.set(ConnectionState::Disconnected);
        info!(target: "gateway.supervisor", "supervisor_stopped");
        result
    }
}

/// 尽力发送 DISCONNECT，最多等待一秒。
async fn disconnect(client: &AsyncClient, eventloop: &mut EventLoop) {
    if client.try_disconnect().is_err() {
        return;
    }
    let _ = tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    })
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumqttc::ConnectReturnCode;
    use std::io;

    #[test]
    fn refused_and_timeout_are_retryable() {
        assert_eq!(
            classify_connection_error(&ConnectionError::ConnectionRefused(
                ConnectReturnCode::NotAuthorized
            )),
            ConnectionFailure::Refused
        );
        assert_eq!(
            classify_connection_error(&ConnectionError::Io(io::Error::new(
                ErrorKind::ConnectionRefused,
                "connection refused"
            ))),
            ConnectionFailure::Refused
        );
        assert_eq!(
            classify_connection_error(&ConnectionError::NetworkTimeout),
            ConnectionFailure::Timeout
        );
    }

    #[test]
    fn lookup_errors_are_unresolvable() {
        let err = ConnectionError::Io(io::Error::other(
            "failed to lookup address information: Name or service not known",
        ));
        assert_eq!(classify_connection_error(&err), ConnectionFailure::Unresolvable);
    }

    #[test]
    fn status_transitions() {
        let status = ConnectionStatus::new();
        assert_eq!(status.get(), ConnectionState::Disconnected);
        status.set(ConnectionState::Connecting);
        assert!(!status.is_connected());
        status.set(ConnectionState::Connected);
        assert!(status.is_connected());
    }

    #[test]
    fn options_carry_session_settings() {
        let supervisor = Supervisor::new(
            SupervisorConfig {
                host: "127.0.0.1".to_string(),
                port: 1883,
                keepalive_seconds: 60,
                client_id: "gw-test".to_string(),
                clean_session: false,
                credentials: Some(("user".to_string(), "pass".to_string())),
                onboarding_topic: "start".to_string(),
            },
            Arc::new(ConnectionStatus::new()),
        );
        let options = supervisor.mqtt_options();
        assert_eq!(options.client_id(), "gw-test");
        assert_eq!(options.keep_alive(), Duration::from_secs(60));
        assert!(!options.clean_session());
        assert_eq!(
            options.credentials(),
            Some(("user".to_string(), "pass".to_string()))
        );
    }

    #[tokio::test]
    async fn unknown_host_is_fatal() {
        let err = resolve_broker("no-such-host.invalid", 1883)
            .await
            .expect_err("must fail");
        assert!(matches!(err, IngestError::UnresolvableHost(_)));
    }
}
