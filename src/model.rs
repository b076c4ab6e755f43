//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了待办记录、批量操作及其审计条目的领域模型。

use crate::database::entity::{batch_operation_log, todo};
use crate::error::{Result, TodoError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 记录ID
pub type TodoId = i32;
/// 所有者ID
pub type OwnerId = i32;

/// 待办记录
///
/// 同时作为缓存中的序列化载荷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub owner_id: OwnerId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<todo::Model> for Todo {
    fn from(model: todo::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            title: model.title,
            description: model.description,
            completed: model.completed,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// 全字段更新请求
///
/// 三个可变字段总是一起写入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTodo {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
}

/// 空字符串描述视为未提供
pub(crate) fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|d| !d.is_empty())
}

/// 批量操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchAction {
    /// 未指定，总是被拒绝
    #[default]
    Unspecified,
    MarkAsCompleted,
    MarkAsIncomplete,
}

impl BatchAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchAction::Unspecified => "ACTION_TYPE_UNSPECIFIED",
            BatchAction::MarkAsCompleted => "MARK_AS_COMPLETED",
            BatchAction::MarkAsIncomplete => "MARK_AS_INCOMPLETE",
        }
    }

    /// 该操作写入的 `completed` 值；未指定时为 None
    pub fn completed_value(&self) -> Option<bool> {
        match self {
            BatchAction::Unspecified => None,
            BatchAction::MarkAsCompleted => Some(true),
            BatchAction::MarkAsIncomplete => Some(false),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            BatchAction::Unspecified => "unspecified action",
            BatchAction::MarkAsCompleted => "mark as completed",
            BatchAction::MarkAsIncomplete => "mark as incomplete",
        }
    }
}

impl fmt::Display for BatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 批量操作结果状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Success,
    PartialFailure,
    Failure,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Success => "SUCCESS",
            BatchStatus::PartialFailure => "PARTIAL_FAILURE",
            BatchStatus::Failure => "FAILURE",
        }
    }

    /// 根据请求数量和实际影响行数分类
    pub fn classify(requested: usize, affected: u64) -> Self {
        if affected == 0 {
            BatchStatus::Failure
        } else if affected >= requested as u64 {
            BatchStatus::Success
        } else {
            BatchStatus::PartialFailure
        }
    }

    /// 生成写入审计条目的说明文字
    pub fn details(&self, action: BatchAction, requested: usize, affected: u64) -> String {
        let action = action.describe();
        match self {
            BatchStatus::Success => {
                format!("{} succeeded, {} todo(s) affected.", action, affected)
            }
            BatchStatus::PartialFailure => format!(
                "{} partially succeeded: {} requested, {} affected. Some todos do not exist or are not owned by the requester.",
                action, requested, affected
            ),
            BatchStatus::Failure => format!(
                "{} failed: {} requested, none affected. The todos do not exist or are not owned by the requester.",
                action, requested
            ),
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchStatus {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SUCCESS" => Ok(BatchStatus::Success),
            "PARTIAL_FAILURE" => Ok(BatchStatus::PartialFailure),
            "FAILURE" => Ok(BatchStatus::Failure),
            other => Err(TodoError::Serialization(format!(
                "unknown batch status '{}'",
                other
            ))),
        }
    }
}

/// 一次已提交批量操作的结果
///
/// `PartialFailure` 与 `Failure` 也是成功完成的事务，调用方需检查 `status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// 对应审计条目的ID
    pub log_id: i32,
    pub status: BatchStatus,
    /// 去重后的请求数量
    pub requested: usize,
    pub affected: u64,
    pub details: String,
}

/// 批量操作审计条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOperationLog {
    pub id: i32,
    pub owner_id: OwnerId,
    pub operation_type: String,
    pub affected_todo_ids: Vec<TodoId>,
    pub status: BatchStatus,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<batch_operation_log::Model> for BatchOperationLog {
    type Error = TodoError;

    fn try_from(model: batch_operation_log::Model) -> Result<Self> {
        Ok(Self {
            id: model.id,
            owner_id: model.owner_id,
            operation_type: model.operation_type,
            affected_todo_ids: serde_json::from_str(&model.affected_todo_ids)?,
            status: model.status.parse()?,
            details: model.details,
            created_at: model.created_at,
        })
    }
}
