//! 存储接口 Trait 定义
//!
//! 设计原则：
//! - 所有接口返回 StorageError，调用方把失败视为非致命（触发报文丢失，不重试）
//! - 使用 async_trait 支持动态分发

use crate::error::StorageError;
use async_trait::async_trait;
use domain::{ComponentDescriptor, NodeConfig, NodeId, TelemetrySample};

/// 节点存储接口
///
/// 持久化节点是否存在、节点配置以及测量值。
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// 节点是否已有持久化配置
    async fn node_exists(&self, node_id: &NodeId) -> Result<bool, StorageError>;

    /// 读取节点配置：组件编号 -> 按顺序排列的测量单位
    ///
    /// 节点不存在时返回空配置。
    async fn get_node_config(&self, node_id: &NodeId) -> Result<NodeConfig, StorageError>;

    /// 创建节点及其完整配置（仅创建，不更新）
    async fn new_node_config(
        &self,
        node_id: &NodeId,
        components: &[ComponentDescriptor],
    ) -> Result<(), StorageError>;

    /// 追加测量值
    ///
    /// 返回 `false` 表示没有匹配的 (节点, 组件, 单位) 配置，样本未写入。
    async fn append_measurement(&self, sample: &TelemetrySample) -> Result<bool, StorageError>;
}
