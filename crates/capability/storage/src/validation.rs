//! 验证辅助函数
//!
//! 写入配置前校验与数据库唯一约束一致的规则，内存实现与 Postgres 实现共用：
//! - 同一节点内组件编号唯一
//! - 同一组件内测量类型唯一

use crate::error::StorageError;
use domain::ComponentDescriptor;
use std::collections::HashSet;

/// 校验一份配置是否满足唯一约束
pub fn ensure_unique_components(components: &[ComponentDescriptor]) -> Result<(), StorageError> {
    let mut ids = HashSet::new();
    for component in components {
        if !ids.insert(component.id_used) {
            return Err(StorageError::new(format!(
                "duplicate component id_used {}",
                component.id_used
            )));
        }
        let mut value_types = HashSet::new();
        for value_type in &component.value_types {
            if !value_types.insert(value_type.value_type.as_str()) {
                return Err(StorageError::new(format!(
                    "duplicate value type {} on component {}",
                    value_type.value_type, component.id_used
                )));
            }
        }
    }
    Ok(())
}
