//! # PostgreSQL 存储实现模块
//!
//! ## 设计原则
//!
//! 1. **参数化查询**：所有 SQL 查询使用参数绑定
//! 2. **事务写入**：节点配置在单个事务内创建，失败时整体回滚
//! 3. **单行操作**：测量值写入是一条 `insert ... select`，保持分发循环的阻塞时间短
//!
//! ## 数据库模式
//!
//! 见 `migrations/0001_node_data.sql`，可通过 [`PgNodeStore::migrate`] 幂等执行。

pub mod node;

pub use node::*;
