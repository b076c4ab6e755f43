//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! `batch_operation_logs` 表实体，只追加写入。

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "batch_operation_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub owner_id: i32,
    pub operation_type: String,
    /// 请求的记录ID，JSON数组文本
    #[sea_orm(column_type = "Text")]
    pub affected_todo_ids: String,
    pub status: String,
    #[sea_orm(column_type = "Text")]
    pub details: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
