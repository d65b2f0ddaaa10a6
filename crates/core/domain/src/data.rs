use crate::node::NodeId;
use std::collections::BTreeMap;

/// 节点的持久化配置视图：组件编号 -> 按顺序排列的测量单位。
pub type NodeConfig = BTreeMap<i64, Vec<String>>;

/// 单条遥测样本，按消息构造后立即交给存储层，不在内存中保留。
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySample {
    pub node_id: NodeId,
    pub component_id_used: i64,
    pub measuring_unit: String,
    pub value: f64,
    pub observed_at_ms: i64,
}

/// 当前 Unix 时间戳（毫秒）。
pub fn now_epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
