//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! SeaORM 实体定义：待办记录表和批量操作审计表。

pub mod batch_operation_log;
pub mod todo;
