//! 内存存储实现模块
//!
//! 用于测试，以及未配置数据库时的网关运行（重启后配置丢失）。

pub mod node;

pub use node::*;
