//! # Gateway Storage 模块
//!
//! 节点配置与测量值的持久化抽象（接入状态机眼中的"持久化网关"）。
//!
//! ## 架构设计
//!
//! 1. **接口抽象层** (`traits.rs`)：`NodeStore` 异步接口
//! 2. **错误处理层** (`error.rs`)：统一的存储错误类型
//! 3. **验证辅助层** (`validation.rs`)：写入前的配置唯一性校验
//! 4. **连接管理层** (`connection.rs`)：数据库连接池管理
//! 5. **实现层**：
//!    - `in_memory/`：内存存储实现（用于测试和无数据库运行）
//!    - `postgres/`：PostgreSQL 存储实现（生产环境使用）
//!
//! ## 数据模型
//!
//! 与现场设备的配置协商一一对应：
//!
//! - `node`：节点（节点 ID 为主键）
//! - `component`：节点上的组件（`(node_id, id_used)` 唯一）
//! - `component_value_type`：组件支持的测量类型（`(component_id, value_type)` 唯一）
//! - `config_update`：一次配置提交
//! - `component_settings`：某次配置提交下测量类型的单位与采样周期
//! - `measurement`：测量值，挂在具体的 `component_settings` 上
//!
//! 读取配置时，每个测量类型取最新一次配置提交的单位。
//!
//! ## 设计约束
//!
//! - 仅支持首次创建配置，不支持配置更新
//! - 配置写入是全有或全无的（PostgreSQL 使用事务）
//! - 测量值只在存在匹配的 (节点, 组件, 单位) 配置时写入

pub mod connection;
pub mod error;
pub mod in_memory;
pub mod postgres;
pub mod traits;
pub mod validation;

pub use connection::*;
pub use error::*;
pub use traits::*;
pub use validation::*;

pub use in_memory::InMemoryNodeStore;
pub use postgres::PgNodeStore;
