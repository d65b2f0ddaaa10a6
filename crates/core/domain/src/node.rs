//! 节点与组件描述。

use std::fmt;

/// 节点标识：现场设备的不透明字符串 ID。
///
/// 同时作为持久化主键与订阅缓存键；构造后不可变，且保证非空。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(String);

impl NodeId {
    /// 空字符串不是合法节点 ID。
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            return None;
        }
        Some(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 组件支持的测量类型（测量量、单位、采样周期）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueTypeDescriptor {
    pub value_type: String,
    pub measuring_unit: String,
    pub measurement_period: i64,
}

/// 节点上的一个传感器/执行器组件，以设备内整数编号寻址。
///
/// `value_types` 可以为空（仅注册组件本身）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDescriptor {
    pub component_type: String,
    pub id_used: i64,
    pub name: String,
    pub value_types: Vec<ValueTypeDescriptor>,
}

impl ComponentDescriptor {
    pub fn new(component_type: impl Into<String>, id_used: i64, name: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            id_used,
            name: name.into(),
            value_types: Vec::new(),
        }
    }
}
