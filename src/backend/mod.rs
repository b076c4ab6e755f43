//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存后端接口及其实现：Redis、进程内Moka缓存和空缓存。

pub mod memory;
pub mod noop;
pub mod redis;

use crate::config::{CacheConfig, CacheMode};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub use self::memory::MemoryBackend;
pub use self::noop::NoopBackend;
pub use self::redis::RedisBackend;

/// 缓存后端特征
///
/// 只提供字节级的读写删，类型化与错误吸收由 [`crate::cache::RecordCache`] 负责
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// 获取缓存值，不存在或已过期时返回None
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// 写入缓存值并设置过期时间（秒）
    async fn set_bytes(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> Result<()>;

    /// 删除缓存项，键不存在时也返回成功
    async fn delete(&self, key: &str) -> Result<()>;

    /// 批量删除缓存项
    ///
    /// 默认逐个删除；单个键失败不会中断其余键，返回最后一个错误
    async fn delete_many(&self, keys: &[String]) -> Result<()> {
        let mut last_error = None;
        for key in keys {
            if let Err(e) = self.delete(key).await {
                last_error = Some(e);
            }
        }
        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// 检查后端是否可用
    async fn ping(&self) -> Result<()>;

    /// 后端名称，用于日志
    fn name(&self) -> &'static str;
}

/// 根据配置创建缓存后端
///
/// Redis 连接失败时返回错误
pub async fn from_config(config: &CacheConfig) -> Result<Arc<dyn CacheBackend>> {
    let backend: Arc<dyn CacheBackend> = match config.mode {
        CacheMode::Standalone | CacheMode::Cluster => Arc::new(RedisBackend::new(config).await?),
        CacheMode::Memory => Arc::new(MemoryBackend::new(config.max_capacity)),
        CacheMode::Disabled => Arc::new(NoopBackend),
    };
    info!("Cache backend initialized: {}", backend.name());
    Ok(backend)
}

/// 根据配置创建缓存后端，Redis 不可达时降级为空缓存
///
/// 缓存只是派生视图，启动时不可用不应阻止服务运行
pub async fn from_config_or_degraded(config: &CacheConfig) -> Arc<dyn CacheBackend> {
    match from_config(config).await {
        Ok(backend) => backend,
        Err(e) => {
            warn!(
                "Cache backend unavailable ({}), continuing without cache",
                e
            );
            Arc::new(NoopBackend)
        }
    }
}
