//! 组件配置报文语法解析
//!
//! 每个组件是一段以 `|` 分隔的字段：
//!
//! ```text
//! type|idUsed|name[|valueType|unit|period]*
//! ```
//!
//! 前三个字段描述组件本身（`name` 可为空），其后每三个字段描述一种测量类型。
//! 任意一个组件不合法，整份配置都被拒绝。

use crate::error::ProtocolViolation;
use domain::{ComponentDescriptor, ValueTypeDescriptor};

/// 组件头字段数，同时也是每个测量类型记录的字段数。
const RECORD_SIZE: usize = 3;

/// 解析组件配置（已去掉节点 ID 与类型码后的字段序列）。
pub fn parse_config<S: AsRef<str>>(
    fields: &[S],
) -> Result<Vec<ComponentDescriptor>, ProtocolViolation> {
    let mut components = Vec::with_capacity(fields.len());

    for (index, field) in fields.iter().enumerate() {
        let parts: Vec<&str> = field.as_ref().split('|').collect();
        if parts.len() < RECORD_SIZE {
            return Err(ProtocolViolation::MalformedComponent {
                index,
                reason: "expected type|idUsed|name",
            });
        }
        if (parts.len() - RECORD_SIZE) % RECORD_SIZE != 0 {
            return Err(ProtocolViolation::MalformedComponent {
                index,
                reason: "value types must come in valueType|unit|period triples",
            });
        }

        let id_used = parse_integer(parts[1]).ok_or(ProtocolViolation::MalformedComponent {
            index,
            reason: "idUsed is not an integer",
        })?;
        let mut component = ComponentDescriptor::new(parts[0], id_used, parts[2]);

        for record in parts[RECORD_SIZE..].chunks_exact(RECORD_SIZE) {
            let measurement_period =
                parse_integer(record[2]).ok_or(ProtocolViolation::MalformedComponent {
                    index,
                    reason: "measurement period is not an integer",
                })?;
            component.value_types.push(ValueTypeDescriptor {
                value_type: record[0].to_string(),
                measuring_unit: record[1].to_string(),
                measurement_period,
            });
        }

        components.push(component);
    }

    Ok(components)
}

/// 整数字段：非空、仅 ASCII 数字（不接受符号与空白）。
pub fn parse_integer(value: &str) -> Option<i64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse::<i64>().ok()
}

/// 遥测值：整数或小数，可带前导 `-`，最多一个小数点且不能以小数点结尾。
pub fn parse_measurement_value(value: &str) -> Result<f64, ProtocolViolation> {
    let invalid = || ProtocolViolation::InvalidTelemetryValue(value.to_string());
    let digits = value.strip_prefix('-').unwrap_or(value);

    let mut seen_dot = false;
    let mut seen_digit = false;
    for b in digits.bytes() {
        match b {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => return Err(invalid()),
        }
    }
    if !seen_digit || digits.ends_with('.') {
        return Err(invalid());
    }
    value.parse::<f64>().map_err(|_| invalid())
}
