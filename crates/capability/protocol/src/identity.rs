//! 节点 ID 校验

/// 校验节点声明的 ID。
///
/// 未配置前缀时任何非空 ID 都合法；配置了前缀时 ID 必须以该前缀开头
/// （区分大小写），且长度严格大于前缀。
pub fn is_valid_node_id(node_id: &str, accept_prefix: Option<&str>) -> bool {
    if node_id.is_empty() {
        return false;
    }
    match accept_prefix {
        None => true,
        Some(prefix) => node_id.len() > prefix.len() && node_id.starts_with(prefix),
    }
}
