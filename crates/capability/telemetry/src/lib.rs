//! 追踪初始化与网关计数指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 指标快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub onboarding_requests: u64,
    pub replies_ok: u64,
    pub replies_config: u64,
    pub nodes_activated: u64,
    pub configs_stored: u64,
    pub dropped_invalid: u64,
    pub dropped_unknown_node: u64,
    pub measurements_stored: u64,
    pub measurements_unmatched: u64,
    pub persistence_failures: u64,
    pub transport_failures: u64,
    pub persistence_latency_ms_total: u64,
    pub persistence_latency_ms_count: u64,
    pub connects: u64,
    pub disconnects: u64,
}

/// 网关计数指标。
pub struct GatewayMetrics {
    messages_received: AtomicU64,
    onboarding_requests: AtomicU64,
    replies_ok: AtomicU64,
    replies_config: AtomicU64,
    nodes_activated: AtomicU64,
    configs_stored: AtomicU64,
    dropped_invalid: AtomicU64,
    dropped_unknown_node: AtomicU64,
    measurements_stored: AtomicU64,
    measurements_unmatched: AtomicU64,
    persistence_failures: AtomicU64,
    transport_failures: AtomicU64,
    persistence_latency_ms_total: AtomicU64,
    persistence_latency_ms_count: AtomicU64,
    connects: AtomicU64,
    disconnects: AtomicU64,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            onboarding_requests: AtomicU64::new(0),
            replies_ok: AtomicU64::new(0),
            replies_config: AtomicU64::new(0),
            nodes_activated: AtomicU64::new(0),
            configs_stored: AtomicU64::new(0),
            dropped_invalid: AtomicU64::new(0),
            dropped_unknown_node: AtomicU64::new(0),
            measurements_stored: AtomicU64::new(0),
            measurements_unmatched: AtomicU64::new(0),
            persistence_failures: AtomicU64::new(0),
            transport_failures: AtomicU64::new(0),
            persistence_latency_ms_total: AtomicU64::new(0),
            persistence_latency_ms_count: AtomicU64::new(0),
            connects: AtomicU64::new(0),
            disconnects: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            onboarding_requests: self.onboarding_requests.load(Ordering::Relaxed),
            replies_ok: self.replies_ok.load(Ordering::Relaxed),
            replies_config: self.replies_config.load(Ordering::Relaxed),
            nodes_activated: self.nodes_activated.load(Ordering::Relaxed),
            configs_stored: self.configs_stored.load(Ordering::Relaxed),
            dropped_invalid: self.dropped_invalid.load(Ordering::Relaxed),
            dropped_unknown_node: self.dropped_unknown_node.load(Ordering::Relaxed),
            measurements_stored: self.measurements_stored.load(Ordering::Relaxed),
            measurements_unmatched: self.measurements_unmatched.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            persistence_latency_ms_total: self
                .persistence_latency_ms_total
                .load(Ordering::Relaxed),
            persistence_latency_ms_count: self
                .persistence_latency_ms_count
                .load(Ordering::Relaxed),
            connects: self.connects.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
        }
    }
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<GatewayMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static GatewayMetrics {
    METRICS.get_or_init(GatewayMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 记录收到的应用消息。
pub fn record_message_received() {
    metrics().messages_received.fetch_add(1, Ordering::Relaxed);
}

/// 记录接入主题上的请求。
pub fn record_onboarding_request() {
    metrics().onboarding_requests.fetch_add(1, Ordering::Relaxed);
}

/// 记录发出的 OK 回复。
pub fn record_reply_ok() {
    metrics().replies_ok.fetch_add(1, Ordering::Relaxed);
}

/// 记录发出的 CONFIG 回复。
pub fn record_reply_config() {
    metrics().replies_config.fetch_add(1, Ordering::Relaxed);
}

/// 记录节点激活（订阅全部建立）。
pub fn record_node_activated() {
    metrics().nodes_activated.fetch_add(1, Ordering::Relaxed);
}

/// 记录新写入的节点配置。
pub fn record_config_stored() {
    metrics().configs_stored.fetch_add(1, Ordering::Relaxed);
}

/// 记录因格式/标识不合法而静默丢弃的消息。
pub fn record_dropped_invalid() {
    metrics().dropped_invalid.fetch_add(1, Ordering::Relaxed);
}

/// 记录来自未接入节点的遥测。
pub fn record_dropped_unknown_node() {
    metrics().dropped_unknown_node.fetch_add(1, Ordering::Relaxed);
}

/// 记录写入成功的测量值。
pub fn record_measurement_stored() {
    metrics().measurements_stored.fetch_add(1, Ordering::Relaxed);
}

/// 记录没有匹配单位的测量值。
pub fn record_measurement_unmatched() {
    metrics()
        .measurements_unmatched
        .fetch_add(1, Ordering::Relaxed);
}

pub fn record_persistence_failure() {
    metrics().persistence_failures.fetch_add(1, Ordering::Relaxed);
}

pub fn record_transport_failure() {
    metrics().transport_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录一次存储调用耗时（毫秒）。
pub fn record_persistence_latency_ms(latency_ms: u64) {
    let metrics = metrics();
    metrics
        .persistence_latency_ms_total
        .fetch_add(latency_ms, Ordering::Relaxed);
    metrics
        .persistence_latency_ms_count
        .fetch_add(1, Ordering::Relaxed);
}

pub fn record_connect() {
    metrics().connects.fetch_add(1, Ordering::Relaxed);
}

pub fn record_disconnect() {
    metrics().disconnects.fetch_add(1, Ordering::Relaxed);
}
