//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 记录服务门面
//!
//! 对外暴露的操作入口：先做结构性参数校验，再调用仓储或批量引擎，
//! 最后把内部错误转换为 [`ServiceError`]。存储错误的原始文本只写入日志。

use crate::backend::{self, CacheBackend};
use crate::batch::BatchEngine;
use crate::cache::RecordCache;
use crate::config::Config;
use crate::database;
use crate::error::{Result, ServiceError, TodoError};
use crate::model::{
    BatchAction, BatchOperationLog, BatchOutcome, OwnerId, Todo, TodoId, UpdateTodo,
};
use crate::repository::TodoRepository;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, instrument, warn};

/// 健康检查结果
///
/// 缓存不可用只代表降级，服务仍然可以工作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub store: bool,
    pub cache: bool,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.store
    }

    pub fn is_degraded(&self) -> bool {
        self.store && !self.cache
    }
}

/// 记录服务
#[derive(Debug, Clone)]
pub struct TodoService {
    db: DatabaseConnection,
    cache: RecordCache,
    repository: TodoRepository,
    batch: BatchEngine,
}

impl TodoService {
    /// 使用已建立的存储连接和缓存后端创建服务
    pub fn new(db: DatabaseConnection, backend: Arc<dyn CacheBackend>, ttl_secs: u64) -> Self {
        let cache = RecordCache::new(backend, ttl_secs);
        Self {
            repository: TodoRepository::new(db.clone(), cache.clone()),
            batch: BatchEngine::new(db.clone(), cache.clone()),
            db,
            cache,
        }
    }

    /// 根据配置建立存储连接与缓存后端
    ///
    /// 存储不可用时返回错误；缓存不可用时降级为空缓存
    pub async fn from_config(config: &Config) -> Result<Self> {
        let db = database::connect(&config.store).await?;
        let backend = backend::from_config_or_degraded(&config.cache).await;
        Ok(Self::new(db, backend, config.cache.ttl_secs))
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn cache_backend_name(&self) -> &'static str {
        self.cache.backend().name()
    }

    #[instrument(skip(self, title, description), level = "debug")]
    pub async fn create_todo(
        &self,
        owner_id: OwnerId,
        title: &str,
        description: Option<&str>,
    ) -> std::result::Result<Todo, ServiceError> {
        validate_owner(owner_id)?;
        validate_title(title)?;

        self.repository
            .create(owner_id, title.to_string(), description.map(str::to_string))
            .await
            .map_err(|e| to_service_error("create todo", e))
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn get_todos(
        &self,
        owner_id: OwnerId,
    ) -> std::result::Result<Vec<Todo>, ServiceError> {
        validate_owner(owner_id)?;

        self.repository
            .list(owner_id)
            .await
            .map_err(|e| to_service_error("list todos", e))
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn get_todo_by_id(
        &self,
        owner_id: OwnerId,
        todo_id: TodoId,
    ) -> std::result::Result<Todo, ServiceError> {
        validate_owner(owner_id)?;
        validate_todo_id(todo_id)?;

        self.repository
            .get(owner_id, todo_id)
            .await
            .map_err(|e| to_service_error("get todo", e))
    }

    #[instrument(skip(self, update), level = "debug")]
    pub async fn update_todo(
        &self,
        owner_id: OwnerId,
        todo_id: TodoId,
        update: UpdateTodo,
    ) -> std::result::Result<Todo, ServiceError> {
        validate_owner(owner_id)?;
        validate_todo_id(todo_id)?;
        validate_title(&update.title)?;

        self.repository
            .update(owner_id, todo_id, update)
            .await
            .map_err(|e| to_service_error("update todo", e))
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn delete_todo(
        &self,
        owner_id: OwnerId,
        todo_id: TodoId,
    ) -> std::result::Result<(), ServiceError> {
        validate_owner(owner_id)?;
        validate_todo_id(todo_id)?;

        self.repository
            .delete(owner_id, todo_id)
            .await
            .map_err(|e| to_service_error("delete todo", e))
    }

    #[instrument(skip(self, todo_ids), level = "debug")]
    pub async fn batch_update_todos(
        &self,
        owner_id: OwnerId,
        todo_ids: &[TodoId],
        action: BatchAction,
    ) -> std::result::Result<BatchOutcome, ServiceError> {
        validate_owner(owner_id)?;
        if todo_ids.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "todo ids must not be empty".to_string(),
            ));
        }
        if action == BatchAction::Unspecified {
            return Err(ServiceError::InvalidArgument(
                "batch action must be specified".to_string(),
            ));
        }

        self.batch
            .apply(owner_id, todo_ids, action)
            .await
            .map_err(|e| to_service_error("batch update todos", e))
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn batch_history(
        &self,
        owner_id: OwnerId,
        limit: u64,
    ) -> std::result::Result<Vec<BatchOperationLog>, ServiceError> {
        validate_owner(owner_id)?;

        self.batch
            .recent_logs(owner_id, limit)
            .await
            .map_err(|e| to_service_error("read batch history", e))
    }

    /// 检查存储与缓存后端
    pub async fn health(&self) -> HealthReport {
        let store = match database::ping(&self.db).await {
            Ok(()) => true,
            Err(e) => {
                error!("Store health check failed: {}", e);
                false
            }
        };
        let cache = match self.cache.backend().ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Cache backend {} unavailable, running degraded: {}",
                    self.cache.backend().name(),
                    e
                );
                false
            }
        };
        HealthReport { store, cache }
    }
}

fn validate_owner(owner_id: OwnerId) -> std::result::Result<(), ServiceError> {
    if owner_id <= 0 {
        return Err(ServiceError::InvalidArgument(
            "owner id must be positive".to_string(),
        ));
    }
    Ok(())
}

fn validate_todo_id(todo_id: TodoId) -> std::result::Result<(), ServiceError> {
    if todo_id <= 0 {
        return Err(ServiceError::InvalidArgument(
            "todo id must be positive".to_string(),
        ));
    }
    Ok(())
}

/// 只拒绝空字符串，仅含空白的标题按原样保存
fn validate_title(title: &str) -> std::result::Result<(), ServiceError> {
    if title.is_empty() {
        return Err(ServiceError::InvalidArgument(
            "title must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// 将内部错误转换为服务错误
///
/// NotFound 不区分“不存在”与“属于他人”；其余内部错误只返回固定消息
fn to_service_error(operation: &str, err: TodoError) -> ServiceError {
    match err {
        TodoError::InvalidArgument(msg) => ServiceError::InvalidArgument(msg),
        TodoError::NotFound => ServiceError::NotFound("todo not found".to_string()),
        other => {
            error!("Failed to {}: {}", operation, other);
            ServiceError::Internal(format!("failed to {}", operation))
        }
    }
}
