//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了记录引擎的内部错误类型，以及对外暴露的服务错误分类。

use thiserror::Error;

/// 记录引擎内部错误类型枚举
///
/// 仓储层、批量引擎和缓存后端之间传递的错误
#[derive(Error, Debug)]
pub enum TodoError {
    /// 参数不合法
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 记录不存在或不属于调用者
    #[error("Todo not found")]
    NotFound,

    /// Sea-ORM数据库错误
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Redis错误
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// 缓存后端错误
    #[error("Cache error: {0}")]
    Cache(String),

    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 超时错误
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for TodoError {
    fn from(err: serde_json::Error) -> Self {
        TodoError::Serialization(err.to_string())
    }
}

/// 记录引擎操作结果类型别名
pub type Result<T> = std::result::Result<T, TodoError>;

/// 服务错误的稳定符号分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    Internal,
}

impl ErrorKind {
    /// 返回稳定的符号名称，供传输层映射状态码
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::AlreadyExists => "ALREADY_EXISTS",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 服务边界错误
///
/// 只携带简短的消息；存储层的原始错误文本只写入服务端日志
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// 保留给身份注册等协作方，本引擎不会产生
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            ServiceError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ServiceError::InvalidArgument(msg)
            | ServiceError::NotFound(msg)
            | ServiceError::AlreadyExists(msg)
            | ServiceError::Internal(msg) => msg,
        }
    }
}
