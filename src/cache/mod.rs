//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 记录缓存层
//!
//! 在 [`CacheBackend`] 之上提供类型化的旁路缓存读写。
//! 所有后端错误与反序列化错误都在这里被记录并转换为 `Skipped`，
//! 因此缓存故障永远不会进入业务操作的错误通道。

use crate::backend::CacheBackend;
use crate::model::{OwnerId, Todo, TodoId};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// 单条记录的缓存键
pub fn todo_key(todo_id: TodoId) -> String {
    format!("record:{}", todo_id)
}

/// 所有者记录列表的缓存键
pub fn owner_list_key(owner_id: OwnerId) -> String {
    format!("owner_todos:{}", owner_id)
}

/// 缓存读取结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<T> {
    /// 命中并成功解码
    Hit(T),
    /// 键不存在
    Miss,
    /// 后端故障或载荷无法解码，视同未命中
    Skipped,
}

/// 缓存写入或失效结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheWrite {
    Applied,
    /// 操作已放弃，仅损失缓存优化
    Skipped,
}

/// 类型化记录缓存
#[derive(Clone)]
pub struct RecordCache {
    backend: Arc<dyn CacheBackend>,
    ttl_secs: u64,
}

impl std::fmt::Debug for RecordCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCache")
            .field("backend", &self.backend.name())
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl RecordCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl_secs: u64) -> Self {
        Self { backend, ttl_secs }
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub async fn get_todo(&self, todo_id: TodoId) -> CacheLookup<Todo> {
        self.lookup(&todo_key(todo_id)).await
    }

    pub async fn put_todo(&self, todo: &Todo) -> CacheWrite {
        self.store(&todo_key(todo.id), todo).await
    }

    pub async fn get_owner_list(&self, owner_id: OwnerId) -> CacheLookup<Vec<Todo>> {
        self.lookup(&owner_list_key(owner_id)).await
    }

    pub async fn put_owner_list(&self, owner_id: OwnerId, todos: &[Todo]) -> CacheWrite {
        self.store(&owner_list_key(owner_id), todos).await
    }

    /// 删除给定的缓存键
    ///
    /// 失效总是删除而不是覆盖
    pub async fn invalidate(&self, keys: &[String]) -> CacheWrite {
        match self.backend.delete_many(keys).await {
            Ok(()) => {
                debug!("Invalidated cache keys: {:?}", keys);
                CacheWrite::Applied
            }
            Err(e) => {
                warn!(
                    "Failed to invalidate cache keys {:?} on {}: {}",
                    keys,
                    self.backend.name(),
                    e
                );
                CacheWrite::Skipped
            }
        }
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> CacheLookup<T> {
        match self.backend.get_bytes(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    debug!("Cache hit: {}", key);
                    CacheLookup::Hit(value)
                }
                Err(e) => {
                    warn!("Failed to decode cached value for {}: {}", key, e);
                    CacheLookup::Skipped
                }
            },
            Ok(None) => {
                debug!("Cache miss: {}", key);
                CacheLookup::Miss
            }
            Err(e) => {
                warn!(
                    "Failed to read {} from {}: {}",
                    key,
                    self.backend.name(),
                    e
                );
                CacheLookup::Skipped
            }
        }
    }

    async fn store<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> CacheWrite {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to encode value for {}: {}", key, e);
                return CacheWrite::Skipped;
            }
        };

        match self.backend.set_bytes(key, bytes, self.ttl_secs).await {
            Ok(()) => {
                debug!("Cached {} for {}s", key, self.ttl_secs);
                CacheWrite::Applied
            }
            Err(e) => {
                warn!(
                    "Failed to write {} to {}: {}",
                    key,
                    self.backend.name(),
                    e
                );
                CacheWrite::Skipped
            }
        }
    }
}
