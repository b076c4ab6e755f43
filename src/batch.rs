//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 批量变更引擎
//!
//! 在一个数据库事务中完成批量更新与审计条目写入，
//! 提交后再对涉及的缓存键做一次失效清扫。

use crate::cache::{owner_list_key, todo_key, RecordCache};
use crate::database::entity::{batch_operation_log, todo};
use crate::error::{Result, TodoError};
use crate::model::{BatchAction, BatchOperationLog, BatchOutcome, BatchStatus, OwnerId, TodoId};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, NotSet,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// 批量变更引擎
#[derive(Debug, Clone)]
pub struct BatchEngine {
    db: DatabaseConnection,
    cache: RecordCache,
}

/// 去重后保留首次出现的顺序
fn dedupe_ids(todo_ids: &[TodoId]) -> Vec<TodoId> {
    let mut seen = HashSet::with_capacity(todo_ids.len());
    todo_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

impl BatchEngine {
    pub fn new(db: DatabaseConnection, cache: RecordCache) -> Self {
        Self { db, cache }
    }

    /// 对所有者的一组记录执行批量操作
    ///
    /// `PartialFailure` 与 `Failure` 同样会提交事务并写入审计条目，
    /// 只有存储故障才返回错误，此时事务整体回滚。
    /// 非正数的ID不会匹配任何记录，按未命中计入分类。
    #[instrument(skip(self, todo_ids), level = "debug", fields(requested = todo_ids.len()))]
    pub async fn apply(
        &self,
        owner_id: OwnerId,
        todo_ids: &[TodoId],
        action: BatchAction,
    ) -> Result<BatchOutcome> {
        if owner_id <= 0 {
            return Err(TodoError::InvalidArgument("owner id must be positive".to_string()));
        }
        if todo_ids.is_empty() {
            return Err(TodoError::InvalidArgument("todo ids must not be empty".to_string()));
        }
        let completed = action.completed_value().ok_or_else(|| {
            TodoError::InvalidArgument("batch action must be specified".to_string())
        })?;

        let ids = dedupe_ids(todo_ids);
        let ids_json = serde_json::to_string(&ids)?;

        let txn = self.db.begin().await?;
        let applied = apply_in_txn(&txn, owner_id, &ids, &ids_json, action, completed).await;
        let outcome = match applied {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!("Failed to roll back batch transaction: {}", rollback_err);
                }
                return Err(e);
            }
        };
        txn.commit().await?;

        info!(
            "Batch {} for owner {} committed: {} ({}/{} affected)",
            action, owner_id, outcome.status, outcome.affected, outcome.requested
        );

        // 无论结果如何都清扫，避免部分更新的记录留下旧缓存
        let mut keys = Vec::with_capacity(ids.len() + 1);
        keys.push(owner_list_key(owner_id));
        keys.extend(ids.iter().map(|id| todo_key(*id)));
        self.cache.invalidate(&keys).await;

        Ok(outcome)
    }

    /// 读取所有者最近的审计条目，新的在前
    #[instrument(skip(self), level = "debug")]
    pub async fn recent_logs(
        &self,
        owner_id: OwnerId,
        limit: u64,
    ) -> Result<Vec<BatchOperationLog>> {
        batch_operation_log::Entity::find()
            .filter(batch_operation_log::Column::OwnerId.eq(owner_id))
            .order_by_desc(batch_operation_log::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(BatchOperationLog::try_from)
            .collect()
    }
}

async fn apply_in_txn(
    txn: &DatabaseTransaction,
    owner_id: OwnerId,
    ids: &[TodoId],
    ids_json: &str,
    action: BatchAction,
    completed: bool,
) -> Result<BatchOutcome> {
    let result = todo::Entity::update_many()
        .col_expr(todo::Column::Completed, Expr::value(completed))
        .col_expr(todo::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(todo::Column::Id.is_in(ids.iter().copied()))
        .filter(todo::Column::OwnerId.eq(owner_id))
        .exec(txn)
        .await?;

    let affected = result.rows_affected;
    let status = BatchStatus::classify(ids.len(), affected);
    let details = status.details(action, ids.len(), affected);
    debug!("Batch update touched {} of {} todos", affected, ids.len());

    let log = batch_operation_log::ActiveModel {
        id: NotSet,
        owner_id: Set(owner_id),
        operation_type: Set(action.as_str().to_string()),
        affected_todo_ids: Set(ids_json.to_string()),
        status: Set(status.as_str().to_string()),
        details: Set(details.clone()),
        created_at: Set(Utc::now()),
    }
    .insert(txn)
    .await?;

    Ok(BatchOutcome {
        log_id: log.id,
        status,
        requested: ids.len(),
        affected,
        details,
    })
}
