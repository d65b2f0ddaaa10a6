//! 订阅缓存
//!
//! 会话级的"节点是否已接入"唯一依据，不持久化。
//! 只由分发任务持有，不需要内部加锁。

use crate::error::CacheError;
use domain::NodeId;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
pub struct SubscriptionCache {
    nodes: HashMap<NodeId, BTreeSet<String>>,
}

impl SubscriptionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_onboarded(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// 以空订阅集合登记节点；重复调用会清空已有集合，调用方需先检查 `is_onboarded`。
    pub fn onboard(&mut self, node_id: NodeId) {
        self.nodes.insert(node_id, BTreeSet::new());
    }

    pub fn add_subscription(
        &mut self,
        node_id: &NodeId,
        topic: impl Into<String>,
    ) -> Result<(), CacheError> {
        let topics = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| CacheError::NotOnboarded(node_id.to_string()))?;
        topics.insert(topic.into());
        Ok(())
    }

    pub fn subscriptions(&self, node_id: &NodeId) -> Option<&BTreeSet<String>> {
        self.nodes.get(node_id)
    }

    /// 撤销节点接入（激活失败回滚）。
    pub fn remove(&mut self, node_id: &NodeId) -> bool {
        self.nodes.remove(node_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> NodeId {
        NodeId::new(id).expect("node id")
    }

    #[test]
    fn add_subscription_requires_onboarding() {
        let mut cache = SubscriptionCache::new();
        assert_eq!(
            cache.add_subscription(&node("node-1"), "node-1/5/C"),
            Err(CacheError::NotOnboarded("node-1".to_string()))
        );
        assert!(!cache.is_onboarded(&node("node-1")));
    }

    #[test]
    fn onboard_twice_resets_subscriptions() {
        let mut cache = SubscriptionCache::new();
        cache.onboard(node("node-1"));
        cache
            .add_subscription(&node("node-1"), "node-1/5/C")
            .expect("added");
        assert_eq!(cache.subscriptions(&node("node-1")).map(|s| s.len()), Some(1));

        cache.onboard(node("node-1"));
        assert_eq!(cache.subscriptions(&node("node-1")).map(|s| s.len()), Some(0));
    }

    #[test]
    fn remove_and_clear_forget_nodes() {
        let mut cache = SubscriptionCache::new();
        cache.onboard(node("node-1"));
        cache.onboard(node("node-2"));
        assert!(cache.remove(&node("node-1")));
        assert!(!cache.remove(&node("node-1")));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
