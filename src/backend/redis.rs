//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了基于Redis的缓存后端，支持单机和集群模式。

use super::CacheBackend;
use crate::config::{CacheConfig, CacheMode};
use crate::error::{Result, TodoError};
use crate::utils::redaction::redact_connection_string;
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError, RedisResult};
use secrecy::ExposeSecret;
use std::future::Future;
use tokio::time::{timeout, Duration};
use tracing::{debug, instrument};

/// Redis缓存后端实现
#[derive(Clone)]
pub enum RedisBackend {
    Standalone {
        manager: ConnectionManager,
        command_timeout_ms: u64,
    },
    Cluster {
        client: redis::cluster::ClusterClient,
        command_timeout_ms: u64,
    },
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standalone { .. } => write!(f, "RedisBackend::Standalone"),
            Self::Cluster { .. } => write!(f, "RedisBackend::Cluster"),
        }
    }
}

impl RedisBackend {
    /// 创建新的Redis缓存后端实例
    ///
    /// # 参数
    ///
    /// * `config` - 缓存配置，`mode` 必须为 standalone 或 cluster
    #[instrument(
        skip(config),
        level = "info",
        name = "init_redis_backend",
        fields(mode = ?config.mode)
    )]
    pub async fn new(config: &CacheConfig) -> Result<Self> {
        match config.mode {
            CacheMode::Standalone => {
                let manager = open_standalone(config).await?;
                Ok(RedisBackend::Standalone {
                    manager,
                    command_timeout_ms: config.command_timeout_ms,
                })
            }
            CacheMode::Cluster => {
                let client = open_cluster(config).await?;
                Ok(RedisBackend::Cluster {
                    client,
                    command_timeout_ms: config.command_timeout_ms,
                })
            }
            other => Err(TodoError::Config(format!(
                "cache mode {:?} is not a Redis mode",
                other
            ))),
        }
    }

    /// 获取命令超时时间（毫秒）
    pub fn command_timeout_ms(&self) -> u64 {
        match self {
            RedisBackend::Standalone {
                command_timeout_ms, ..
            } => *command_timeout_ms,
            RedisBackend::Cluster {
                command_timeout_ms, ..
            } => *command_timeout_ms,
        }
    }

    /// 在命令超时内执行一次Redis调用
    async fn bounded<T, F>(&self, command: &str, fut: F) -> Result<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        let timeout_ms = self.command_timeout_ms();
        match timeout(Duration::from_millis(timeout_ms), fut).await {
            Ok(res) => res.map_err(TodoError::from),
            Err(_) => Err(TodoError::Timeout(format!(
                "Redis {} timed out after {}ms",
                command, timeout_ms
            ))),
        }
    }
}

async fn open_standalone(config: &CacheConfig) -> Result<ConnectionManager> {
    let connection_string = config.connection_string.expose_secret();
    let client = Client::open(connection_string)?;

    match timeout(
        Duration::from_millis(config.connection_timeout_ms),
        client.get_connection_manager(),
    )
    .await
    {
        Ok(res) => Ok(res?),
        Err(_) => Err(TodoError::Cache(format!(
            "Connection timed out after {}ms. Target: {}",
            config.connection_timeout_ms,
            redact_connection_string(connection_string)
        ))),
    }
}

async fn open_cluster(config: &CacheConfig) -> Result<redis::cluster::ClusterClient> {
    if config.cluster_nodes.is_empty() {
        return Err(TodoError::Config(
            "Cluster mode requires cluster_nodes".to_string(),
        ));
    }

    let mut builder = redis::cluster::ClusterClient::builder(config.cluster_nodes.clone());
    if let Some(password) = &config.password {
        builder = builder.password(password.expose_secret().to_string());
    }
    let client = builder.build()?;

    timeout(
        Duration::from_millis(config.connection_timeout_ms),
        client.get_async_connection(),
    )
    .await
    .map_err(|_| {
        TodoError::Cache(format!(
            "Cluster connection timed out after {}ms",
            config.connection_timeout_ms
        ))
    })??;

    Ok(client)
}

#[async_trait]
impl CacheBackend for RedisBackend {
    #[instrument(skip(self), level = "debug")]
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self {
            RedisBackend::Standalone { manager, .. } => {
                let mut conn = manager.clone();
                self.bounded("GET", async move {
                    let value: Option<Vec<u8>> = conn.get(key).await?;
                    Ok::<_, RedisError>(value)
                })
                .await
            }
            RedisBackend::Cluster { client, .. } => {
                self.bounded("GET", async move {
                    let mut conn = client.get_async_connection().await?;
                    let value: Option<Vec<u8>> = conn.get(key).await?;
                    Ok::<_, RedisError>(value)
                })
                .await
            }
        }
    }

    #[instrument(skip(self, value), level = "debug", fields(value_len = value.len()))]
    async fn set_bytes(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> Result<()> {
        debug!("Setting key: {} with ttl: {}s", key, ttl_secs);
        match self {
            RedisBackend::Standalone { manager, .. } => {
                let mut conn = manager.clone();
                self.bounded("SET", async move {
                    let _: () = conn.set_ex(key, value, ttl_secs).await?;
                    Ok::<_, RedisError>(())
                })
                .await
            }
            RedisBackend::Cluster { client, .. } => {
                self.bounded("SET", async move {
                    let mut conn = client.get_async_connection().await?;
                    let _: () = conn.set_ex(key, value, ttl_secs).await?;
                    Ok::<_, RedisError>(())
                })
                .await
            }
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, key: &str) -> Result<()> {
        debug!("Deleting key: {}", key);
        match self {
            RedisBackend::Standalone { manager, .. } => {
                let mut conn = manager.clone();
                self.bounded("DEL", async move {
                    let _: () = conn.del(key).await?;
                    Ok::<_, RedisError>(())
                })
                .await
            }
            RedisBackend::Cluster { client, .. } => {
                self.bounded("DEL", async move {
                    let mut conn = client.get_async_connection().await?;
                    let _: () = conn.del(key).await?;
                    Ok::<_, RedisError>(())
                })
                .await
            }
        }
    }

    /// 单机模式下通过管道一次性删除；集群模式下键可能分布在不同槽位，逐个删除
    #[instrument(skip(self, keys), level = "debug", fields(key_count = keys.len()))]
    async fn delete_many(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        match self {
            RedisBackend::Standalone { manager, .. } => {
                debug!("Pipeline batch delete with {} keys", keys.len());
                let mut pipe = redis::pipe();
                for key in keys {
                    pipe.del(key).ignore();
                }
                let mut conn = manager.clone();
                self.bounded("DEL", async move { pipe.query_async::<()>(&mut conn).await })
                    .await
            }
            RedisBackend::Cluster { client, .. } => {
                self.bounded("DEL", async move {
                    let mut conn = client.get_async_connection().await?;
                    for key in keys {
                        let _: () = conn.del(key).await?;
                    }
                    Ok::<_, RedisError>(())
                })
                .await
            }
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn ping(&self) -> Result<()> {
        match self {
            RedisBackend::Standalone { manager, .. } => {
                let mut conn = manager.clone();
                self.bounded("PING", async move {
                    redis::cmd("PING").query_async::<String>(&mut conn).await
                })
                .await?;
            }
            RedisBackend::Cluster { client, .. } => {
                self.bounded("PING", async move {
                    let mut conn = client.get_async_connection().await?;
                    redis::cmd("PING").query_async::<String>(&mut conn).await
                })
                .await?;
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        match self {
            RedisBackend::Standalone { .. } => "redis-standalone",
            RedisBackend::Cluster { .. } => "redis-cluster",
        }
    }
}
