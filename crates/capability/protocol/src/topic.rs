//! 主题分类与订阅主题推导

use crate::error::ProtocolViolation;
use domain::{NodeConfig, NodeId};
use std::collections::BTreeSet;

/// 入站主题的形状。
///
/// 组件编号与单位保持原始文本，由调用方在确认节点已接入后再解析。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicKind<'a> {
    /// 众所周知的接入主题。
    Onboarding,
    /// `{nodeId}/{componentIdUsed}`，保留给控制/执行器。
    Control { node_id: &'a str, component: &'a str },
    /// `{nodeId}/{componentIdUsed}/{measuringUnit}`。
    Telemetry {
        node_id: &'a str,
        component: &'a str,
        unit: &'a str,
    },
    Unsupported,
}

pub fn classify_topic<'a>(topic: &'a str, onboarding_topic: &str) -> TopicKind<'a> {
    if topic == onboarding_topic {
        return TopicKind::Onboarding;
    }
    let segments: Vec<&str> = topic.split('/').collect();
    match segments[..] {
        [node_id, component] => TopicKind::Control { node_id, component },
        [node_id, component, unit] => TopicKind::Telemetry {
            node_id,
            component,
            unit,
        },
        _ => TopicKind::Unsupported,
    }
}

/// 能否作为订阅过滤器中的单个层级：不含层级分隔符、通配符与 NUL。
pub fn is_valid_topic_level(level: &str) -> bool {
    !level.contains(['/', '+', '#', '\0'])
}

/// 按 (组件编号, 测量单位) 推导节点的遥测订阅主题。
///
/// 节点 ID 或任一单位不能作为主题层级时整体失败，不产生部分订阅。
pub fn derive_subscription_topics(
    node_id: &NodeId,
    config: &NodeConfig,
) -> Result<BTreeSet<String>, ProtocolViolation> {
    if !is_valid_topic_level(node_id.as_str()) {
        return Err(ProtocolViolation::InvalidTopicLevel(node_id.to_string()));
    }
    let mut topics = BTreeSet::new();
    for (id_used, units) in config {
        for unit in units {
            if !is_valid_topic_level(unit) {
                return Err(ProtocolViolation::InvalidTopicLevel(unit.clone()));
            }
            topics.insert(format!("{}/{}/{}", node_id, id_used, unit));
        }
    }
    Ok(topics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_segment_count() {
        assert_eq!(classify_topic("start", "start"), TopicKind::Onboarding);
        assert_eq!(
            classify_topic("node-50/5", "start"),
            TopicKind::Control {
                node_id: "node-50",
                component: "5"
            }
        );
        assert_eq!(
            classify_topic("node-50/6/%", "start"),
            TopicKind::Telemetry {
                node_id: "node-50",
                component: "6",
                unit: "%"
            }
        );
        assert_eq!(classify_topic("node-50", "start"), TopicKind::Unsupported);
        assert_eq!(classify_topic("a/b/c/d", "start"), TopicKind::Unsupported);
    }

    #[test]
    fn topics_cover_every_component_unit_pair() {
        let node_id = NodeId::new("node-50").expect("node id");
        let mut config = NodeConfig::new();
        config.insert(5, vec!["C".to_string()]);
        config.insert(6, vec!["C".to_string(), "%".to_string()]);
        config.insert(7, Vec::new());

        let topics: Vec<String> = derive_subscription_topics(&node_id, &config)
            .expect("topics")
            .into_iter()
            .collect();
        assert_eq!(topics, vec!["node-50/5/C", "node-50/6/%", "node-50/6/C"]);
    }

    #[test]
    fn wildcards_and_separators_are_not_topic_levels() {
        assert!(is_valid_topic_level("C"));
        assert!(is_valid_topic_level("%"));
        assert!(is_valid_topic_level(""));
        for bad in ["C#", "+", "m/s", "a\0b"] {
            assert!(!is_valid_topic_level(bad), "{bad:?}");
        }
    }

    #[test]
    fn unusable_unit_yields_no_topics() {
        let node_id = NodeId::new("node-50").expect("node id");
        let mut config = NodeConfig::new();
        config.insert(5, vec!["C".to_string()]);
        config.insert(6, vec!["m/s".to_string()]);
        assert_eq!(
            derive_subscription_topics(&node_id, &config),
            Err(ProtocolViolation::InvalidTopicLevel("m/s".to_string()))
        );

        let node_id = NodeId::new("node-#").expect("node id");
        config.remove(&6);
        assert_eq!(
            derive_subscription_topics(&node_id, &config),
            Err(ProtocolViolation::InvalidTopicLevel("node-#".to_string()))
        );
    }
}
