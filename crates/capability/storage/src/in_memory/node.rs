//! 节点内存存储实现
//!
//! 语义与 Postgres 实现保持一致：
//! - 配置只能创建一次，重复创建视为约束冲突
//! - 测量值只写入到匹配的 (节点, 组件, 单位) 上

use crate::error::StorageError;
use crate::traits::NodeStore;
use crate::validation::ensure_unique_components;
use domain::{ComponentDescriptor, NodeConfig, NodeId, TelemetrySample};
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

/// 默认保留的最近测量值条数
pub const DEFAULT_MEASUREMENT_LIMIT: usize = 10_000;

/// 节点内存存储
///
/// 使用 RwLock + HashMap 提供线程安全的内存存储。
/// 测量值只保留最近 `measurement_limit` 条，超出后丢弃最旧的。
pub struct InMemoryNodeStore {
    nodes: RwLock<HashMap<NodeId, Vec<ComponentDescriptor>>>,
    measurements: RwLock<VecDeque<TelemetrySample>>,
    measurement_limit: usize,
}

impl InMemoryNodeStore {
    pub fn new() -> Self {
        Self::with_measurement_limit(DEFAULT_MEASUREMENT_LIMIT)
    }

    pub fn with_measurement_limit(measurement_limit: usize) -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
            measurements: RwLock::new(VecDeque::new()),
            measurement_limit,
        }
    }

    /// 保留中的测量值快照，按写入顺序（用于测试）
    pub fn measurements(&self) -> Vec<TelemetrySample> {
        self.measurements
            .read()
            .map(|values| values.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// 已配置的节点数量（用于测试）
    pub fn node_count(&self) -> usize {
        self.nodes.read().map(|nodes| nodes.len()).unwrap_or(0)
    }
}

impl Default for InMemoryNodeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl NodeStore for InMemoryNodeStore {
    async fn node_exists(&self, node_id: &NodeId) -> Result<bool, StorageError> {
        let nodes = self
            .nodes
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(nodes.contains_key(node_id))
    }

    async fn get_node_config(&self, node_id: &NodeId) -> Result<NodeConfig, StorageError> {
        let nodes = self
            .nodes
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut config = NodeConfig::new();
        if let Some(components) = nodes.get(node_id) {
            for component in components {
                config.insert(
                    component.id_used,
                    component
                        .value_types
                        .iter()
                        .map(|value_type| value_type.measuring_unit.clone())
                        .collect(),
                );
            }
        }
        Ok(config)
    }

    async fn new_node_config(
        &self,
        node_id: &NodeId,
        components: &[ComponentDescriptor],
    ) -> Result<(), StorageError> {
        ensure_unique_components(components)?;
        let mut nodes = self
            .nodes
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if nodes.contains_key(node_id) {
            return Err(StorageError::new(format!("node {} already configured", node_id)));
        }
        nodes.insert(node_id.clone(), components.to_vec());
        Ok(())
    }

    async fn append_measurement(&self, sample: &TelemetrySample) -> Result<bool, StorageError> {
        let matched = {
            let nodes = self
                .nodes
                .read()
                .map_err(|_| StorageError::new("lock failed"))?;
            nodes.get(&sample.node_id).is_some_and(|components| {
                components.iter().any(|component| {
                    component.id_used == sample.component_id_used
                        && component
                            .value_types
                            .iter()
                            .any(|value_type| value_type.measuring_unit == sample.measuring_unit)
                })
            })
        };
        if !matched {
            return Ok(false);
        }
        let mut measurements = self
            .measurements
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if self.measurement_limit == 0 {
            return Ok(true);
        }
        while measurements.len() >= self.measurement_limit {
            measurements.pop_front();
        }
        measurements.push_back(sample.clone());
        Ok(true)
    }
}
