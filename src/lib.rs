//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! oxtodo - 缓存一致的待办记录引擎
//!
//! 以关系型数据库为唯一可信数据源，Redis（或进程内Moka缓存）作为旁路缓存，
//! 提供按所有者隔离的记录读写，以及带审计条目的事务性批量变更。
//! 缓存故障只会降低性能，不会改变任何操作的结果。

#![doc(html_root_url = "https://docs.rs/oxtodo/0.1.0")]

pub mod backend;
pub mod batch;
pub mod cache;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod model;
pub mod repository;
pub mod service;
pub mod telemetry;
pub mod utils;

// Re-export commonly used items
pub use backend::CacheBackend;
pub use config::Config;
pub use error::{ErrorKind, ServiceError, TodoError};
pub use model::{BatchAction, BatchOperationLog, BatchOutcome, BatchStatus, Todo, UpdateTodo};
pub use service::{HealthReport, TodoService};

/// oxtodo 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
