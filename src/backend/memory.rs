//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了进程内缓存后端，基于Moka实现，适用于单实例部署和测试。

use super::CacheBackend;
use crate::error::Result;
use async_trait::async_trait;
use moka::future::Cache;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// 进程内缓存后端实现
#[derive(Clone)]
pub struct MemoryBackend {
    // 值: (数据, 过期时间)
    cache: Cache<String, (Vec<u8>, Instant)>,
}

impl MemoryBackend {
    /// 创建新的进程内缓存后端
    ///
    /// # 参数
    ///
    /// * `capacity` - 最大缓存条目数
    pub fn new(capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(capacity).build(),
        }
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    #[instrument(skip(self), level = "debug")]
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.cache.get(key).await {
            Some((bytes, expire_at)) => {
                if Instant::now() >= expire_at {
                    self.cache.invalidate(key).await;
                    debug!("memory get_bytes: key={}, expired=true, removed", key);
                    return Ok(None);
                }
                debug!("memory get_bytes: key={}, found=true", key);
                Ok(Some(bytes))
            }
            None => {
                debug!("memory get_bytes: key={}, found=false", key);
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, value), level = "debug", fields(value_len = value.len()))]
    async fn set_bytes(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> Result<()> {
        let expire_at = Instant::now() + Duration::from_secs(ttl_secs);
        self.cache.insert(key.to_string(), (value, expire_at)).await;
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
