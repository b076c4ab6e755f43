//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 记录仓储
//!
//! 单条记录的读写入口：读取走旁路缓存，写入落库后删除相关缓存键。
//! 所有查询都按 `(id, owner_id)` 限定范围，其他所有者的记录一律表现为不存在。

use crate::cache::{owner_list_key, todo_key, CacheLookup, RecordCache};
use crate::database::entity::todo;
use crate::error::{Result, TodoError};
use crate::model::{normalize_description, OwnerId, Todo, TodoId, UpdateTodo};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set,
};
use tracing::{debug, instrument, warn};

/// 记录仓储
#[derive(Debug, Clone)]
pub struct TodoRepository {
    db: DatabaseConnection,
    cache: RecordCache,
}

impl TodoRepository {
    pub fn new(db: DatabaseConnection, cache: RecordCache) -> Self {
        Self { db, cache }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    /// 读取单条记录
    ///
    /// 缓存命中但所有者不符时视为未命中，回源到存储
    #[instrument(skip(self), level = "debug")]
    pub async fn get(&self, owner_id: OwnerId, todo_id: TodoId) -> Result<Todo> {
        if let CacheLookup::Hit(cached) = self.cache.get_todo(todo_id).await {
            if cached.owner_id == owner_id {
                return Ok(cached);
            }
            warn!(
                "Cached todo {} belongs to another owner, falling back to store",
                todo_id
            );
        }

        let todo = self
            .find_owned(owner_id, todo_id)
            .await?
            .ok_or(TodoError::NotFound)?;

        self.cache.put_todo(&todo).await;
        Ok(todo)
    }

    /// 列出所有者的全部记录，按ID升序
    #[instrument(skip(self), level = "debug")]
    pub async fn list(&self, owner_id: OwnerId) -> Result<Vec<Todo>> {
        if let CacheLookup::Hit(cached) = self.cache.get_owner_list(owner_id).await {
            if cached.iter().all(|t| t.owner_id == owner_id) {
                return Ok(cached);
            }
            warn!(
                "Cached list for owner {} contains foreign todos, falling back to store",
                owner_id
            );
        }

        let todos: Vec<Todo> = todo::Entity::find()
            .filter(todo::Column::OwnerId.eq(owner_id))
            .order_by_asc(todo::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Todo::from)
            .collect();

        self.cache.put_owner_list(owner_id, &todos).await;
        Ok(todos)
    }

    /// 新建记录并删除所有者列表缓存
    #[instrument(skip(self, title, description), level = "debug")]
    pub async fn create(
        &self,
        owner_id: OwnerId,
        title: String,
        description: Option<String>,
    ) -> Result<Todo> {
        let now = Utc::now();
        let model = todo::ActiveModel {
            id: NotSet,
            owner_id: Set(owner_id),
            title: Set(title),
            description: Set(normalize_description(description)),
            completed: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        debug!("Created todo {} for owner {}", model.id, owner_id);
        self.cache.invalidate(&[owner_list_key(owner_id)]).await;
        Ok(Todo::from(model))
    }

    /// 全字段更新记录，成功后删除记录与列表缓存并从存储重新读取
    #[instrument(skip(self, update), level = "debug")]
    pub async fn update(
        &self,
        owner_id: OwnerId,
        todo_id: TodoId,
        update: UpdateTodo,
    ) -> Result<Todo> {
        if self.find_owned(owner_id, todo_id).await?.is_none() {
            return Err(TodoError::NotFound);
        }

        let result = todo::Entity::update_many()
            .col_expr(todo::Column::Title, Expr::value(update.title))
            .col_expr(
                todo::Column::Description,
                Expr::value(normalize_description(update.description)),
            )
            .col_expr(todo::Column::Completed, Expr::value(update.completed))
            .col_expr(todo::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(todo::Column::Id.eq(todo_id))
            .filter(todo::Column::OwnerId.eq(owner_id))
            .exec(&self.db)
            .await?;

        // 查找成功后却没有更新到行，说明存储状态异常
        if result.rows_affected == 0 {
            return Err(TodoError::Database(DbErr::RecordNotUpdated));
        }

        self.cache
            .invalidate(&[todo_key(todo_id), owner_list_key(owner_id)])
            .await;

        self.find_owned(owner_id, todo_id)
            .await?
            .ok_or(TodoError::NotFound)
    }

    /// 删除记录
    ///
    /// 未删除任何行时返回 NotFound，且不触碰缓存
    #[instrument(skip(self), level = "debug")]
    pub async fn delete(&self, owner_id: OwnerId, todo_id: TodoId) -> Result<()> {
        let result = todo::Entity::delete_many()
            .filter(todo::Column::Id.eq(todo_id))
            .filter(todo::Column::OwnerId.eq(owner_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(TodoError::NotFound);
        }

        debug!("Deleted todo {} of owner {}", todo_id, owner_id);
        self.cache
            .invalidate(&[todo_key(todo_id), owner_list_key(owner_id)])
            .await;
        Ok(())
    }

    async fn find_owned(&self, owner_id: OwnerId, todo_id: TodoId) -> Result<Option<Todo>> {
        let model = todo::Entity::find_by_id(todo_id)
            .filter(todo::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?;
        Ok(model.map(Todo::from))
    }
}
