//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了记录引擎的配置结构和解析逻辑。

use crate::error::{Result, TodoError};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;

/// 数据库连接串的环境变量
pub const ENV_DATABASE_URL: &str = "OXTODO_DATABASE_URL";
/// Redis连接串的环境变量
pub const ENV_REDIS_URL: &str = "OXTODO_REDIS_URL";
/// 日志过滤器的环境变量
pub const ENV_LOG_FILTER: &str = "OXTODO_LOG";

/// 缓存记录默认过期时间（秒）
pub const DEFAULT_RECORD_TTL_SECS: u64 = 600;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 持久化存储配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct StoreConfig {
    /// 数据库连接字符串（postgres://、mysql:// 或 sqlite:）
    pub url: SecretString,
    /// 连接池最大连接数
    pub max_connections: u32,
    /// 连接池最小连接数
    pub min_connections: u32,
    /// 连接超时时间（毫秒）
    pub connect_timeout_ms: u64,
    /// 是否输出sqlx语句日志
    pub sqlx_logging: bool,
    /// 启动时是否创建缺失的表
    pub auto_create_schema: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: SecretString::new("sqlite://oxtodo.db?mode=rwc".to_string().into()),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_ms: 5000,
            sqlx_logging: false,
            auto_create_schema: true,
        }
    }
}

/// 缓存后端模式
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Redis单机模式
    #[default]
    Standalone,
    /// Redis集群模式
    Cluster,
    /// 进程内Moka缓存
    Memory,
    /// 不使用缓存，所有读取都回源
    Disabled,
}

/// 缓存配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct CacheConfig {
    pub mode: CacheMode,
    /// Redis连接字符串
    pub connection_string: SecretString,
    /// 集群初始节点列表
    pub cluster_nodes: Vec<String>,
    /// Redis 密码（集群模式使用）
    pub password: Option<SecretString>,
    /// 连接超时时间（毫秒）
    pub connection_timeout_ms: u64,
    /// 命令执行超时时间（毫秒）
    pub command_timeout_ms: u64,
    /// 记录缓存过期时间（秒）
    pub ttl_secs: u64,
    /// 进程内缓存最大条目数
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            mode: CacheMode::Standalone,
            connection_string: SecretString::new("redis://127.0.0.1:6379".to_string().into()),
            cluster_nodes: Vec::new(),
            password: None,
            connection_timeout_ms: 5000,
            command_timeout_ms: 3000,
            ttl_secs: DEFAULT_RECORD_TTL_SECS,
            max_capacity: 10_000,
        }
    }
}

/// 日志配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct LoggingConfig {
    pub service_name: String,
    /// EnvFilter 语法，例如 "info,oxtodo=debug"
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            service_name: "oxtodo".to_string(),
            filter: "info".to_string(),
        }
    }
}

impl Config {
    /// 从TOML字符串解析配置
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| TodoError::Config(e.to_string()))
    }

    /// 从TOML文件加载配置
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&source)
    }

    /// 使用进程环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// 使用给定的查找函数覆盖配置，空值被忽略
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = value(ENV_DATABASE_URL) {
            self.store.url = SecretString::new(url.into());
        }
        if let Some(url) = value(ENV_REDIS_URL) {
            self.cache.connection_string = SecretString::new(url.into());
        }
        if let Some(filter) = value(ENV_LOG_FILTER) {
            self.logging.filter = filter;
        }
    }

    /// 验证配置
    ///
    /// 检查配置的有效性，确保所有值都在合理范围内
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.store.max_connections == 0 {
            return Err("Store max_connections cannot be zero".to_string());
        }

        if self.store.min_connections > self.store.max_connections {
            return Err(format!(
                "Store min_connections ({}) must be <= max_connections ({})",
                self.store.min_connections, self.store.max_connections
            ));
        }

        if !(100..=60000).contains(&self.store.connect_timeout_ms) {
            return Err("Store connect_timeout_ms must be between 100 and 60000 ms".to_string());
        }

        if self.cache.ttl_secs == 0 {
            return Err("Cache ttl_secs cannot be zero".to_string());
        }

        if self.cache.ttl_secs > 86400 * 30 {
            return Err("Cache ttl_secs cannot exceed 30 days (2592000 seconds)".to_string());
        }

        match self.cache.mode {
            CacheMode::Standalone | CacheMode::Cluster => {
                let timeout = self.cache.connection_timeout_ms;
                if !(100..=30000).contains(&timeout) {
                    return Err(
                        "Cache connection_timeout_ms must be between 100 and 30000 ms".to_string(),
                    );
                }

                let timeout = self.cache.command_timeout_ms;
                if !(100..=60000).contains(&timeout) {
                    return Err(
                        "Cache command_timeout_ms must be between 100 and 60000 ms".to_string()
                    );
                }

                if self.cache.mode == CacheMode::Cluster && self.cache.cluster_nodes.is_empty() {
                    return Err(
                        "Cluster mode requires at least one entry in cluster_nodes".to_string()
                    );
                }
            }
            CacheMode::Memory => {
                if self.cache.max_capacity == 0 {
                    return Err("Cache max_capacity cannot be zero in memory mode".to_string());
                }
            }
            CacheMode::Disabled => {}
        }

        if self.logging.service_name.is_empty() {
            return Err("Logging service_name cannot be empty".to_string());
        }

        Ok(())
    }
}
