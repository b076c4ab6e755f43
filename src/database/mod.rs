//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 持久化存储模块
//!
//! 负责建立SeaORM连接池、创建缺失的表以及存储健康检查

use crate::config::StoreConfig;
use crate::error::Result;
use crate::utils::redaction::redact_connection_string;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, EntityTrait,
    Schema,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};

pub mod entity;

/// 数据库类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseType {
    PostgreSQL,
    MySQL,
    SQLite,
}

impl DatabaseType {
    /// 从URL字符串解析数据库类型
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            DatabaseType::PostgreSQL
        } else if url.starts_with("mysql://") {
            DatabaseType::MySQL
        } else {
            DatabaseType::SQLite
        }
    }
}

/// 根据配置建立数据库连接池
///
/// 若 `auto_create_schema` 开启，会在返回前创建缺失的表
#[instrument(skip(config), level = "info", name = "connect_store")]
pub async fn connect(config: &StoreConfig) -> Result<DatabaseConnection> {
    let url = config.url.expose_secret();
    info!(
        "Connecting to {:?} store: {}",
        DatabaseType::from_url(url),
        redact_connection_string(url)
    );

    let mut opt = ConnectOptions::new(url.to_string());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .sqlx_logging(config.sqlx_logging);

    let db = Database::connect(opt).await?;

    if config.auto_create_schema {
        ensure_schema(&db).await?;
    }

    Ok(db)
}

/// 根据实体定义创建 `todos` 与 `batch_operation_logs` 表（已存在则跳过）
#[instrument(skip(db), level = "info")]
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<()> {
    create_table_for(db, entity::todo::Entity).await?;
    create_table_for(db, entity::batch_operation_log::Entity).await?;
    info!("Store schema is up to date");
    Ok(())
}

async fn create_table_for<E>(db: &DatabaseConnection, entity: E) -> Result<()>
where
    E: EntityTrait + Copy,
{
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(backend.build(&table)).await?;

    // MySQL 不支持 CREATE INDEX IF NOT EXISTS
    if backend != DatabaseBackend::MySql {
        for mut index in schema.create_index_from_entity(entity) {
            index.if_not_exists();
            db.execute(backend.build(&index)).await?;
        }
    }

    debug!("Ensured table {}", entity.table_name());
    Ok(())
}

/// 检查存储连接是否可用
pub async fn ping(db: &DatabaseConnection) -> Result<()> {
    db.ping().await?;
    Ok(())
}
