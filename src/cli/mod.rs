//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了CLI命令行接口。

use crate::config::Config;
use crate::service::TodoService;
use crate::telemetry;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "oxtodo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Path to the TOML configuration file")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(name = "status", about = "Check store and cache health")]
    Status(StatusArgs),

    #[command(name = "schema", about = "Create missing tables")]
    Schema,

    #[command(name = "todo", about = "Read and modify todos of one owner")]
    Todo(TodoArgs),

    #[command(name = "batch", about = "Mark several todos at once")]
    Batch(BatchArgs),

    #[command(name = "history", about = "Show recent batch operations of an owner")]
    History(HistoryArgs),
}

#[derive(Parser, Debug)]
pub struct StatusArgs {
    #[arg(short, long, help = "Show configuration details")]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
pub struct HistoryArgs {
    #[arg(short, long, help = "Owner id")]
    pub owner: i32,

    #[arg(short, long, default_value_t = 10, help = "Maximum number of entries")]
    pub limit: u64,
}

mod status;
mod todo;

pub use todo::{BatchArgs, BatchSubcommand, TodoArgs, TodoSubcommand};

/// 读取配置文件并应用环境变量覆盖
///
/// 未指定文件时使用默认配置
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env_overrides();
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    telemetry::init_tracing(&config.logging.service_name, &config.logging.filter);

    let result = match &cli.command {
        Commands::Schema => {
            let db = crate::database::connect(&config.store).await?;
            crate::database::ensure_schema(&db).await?;
            println!("Schema is up to date.");
            Ok(())
        }
        Commands::Status(args) => status::execute(&config, args).await,
        Commands::Todo(args) => {
            let service = TodoService::from_config(&config).await?;
            todo::execute_todo(&service, args).await
        }
        Commands::Batch(args) => {
            let service = TodoService::from_config(&config).await?;
            todo::execute_batch(&service, args).await
        }
        Commands::History(args) => {
            let service = TodoService::from_config(&config).await?;
            todo::execute_history(&service, args).await
        }
    };

    telemetry::shutdown_tracing();
    result
}
