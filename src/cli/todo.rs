//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了记录读写、批量操作和审计查询命令的实现。

use crate::cli::HistoryArgs;
use crate::model::{BatchAction, Todo, UpdateTodo};
use crate::service::TodoService;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
pub struct TodoArgs {
    #[command(subcommand)]
    pub command: TodoSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum TodoSubcommand {
    #[command(about = "List all todos of an owner")]
    List(OwnerArgs),

    #[command(about = "Show one todo")]
    Get(TodoRef),

    #[command(about = "Create a todo")]
    Create(CreateArgs),

    #[command(about = "Replace title, description and completion of a todo")]
    Update(UpdateArgs),

    #[command(about = "Delete a todo")]
    Delete(TodoRef),
}

#[derive(Args, Debug)]
pub struct OwnerArgs {
    #[arg(short, long, help = "Owner id")]
    pub owner: i32,
}

#[derive(Args, Debug)]
pub struct TodoRef {
    #[arg(short, long, help = "Owner id")]
    pub owner: i32,

    #[arg(help = "Todo id")]
    pub id: i32,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(short, long, help = "Owner id")]
    pub owner: i32,

    #[arg(short, long)]
    pub title: String,

    #[arg(short, long)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[arg(short, long, help = "Owner id")]
    pub owner: i32,

    #[arg(help = "Todo id")]
    pub id: i32,

    #[arg(short, long)]
    pub title: String,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(long, help = "Mark the todo as completed")]
    pub completed: bool,
}

#[derive(Parser, Debug)]
pub struct BatchArgs {
    #[command(subcommand)]
    pub command: BatchSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum BatchSubcommand {
    #[command(about = "Mark todos as completed")]
    Complete(BatchIds),

    #[command(about = "Mark todos as incomplete")]
    Incomplete(BatchIds),
}

#[derive(Args, Debug)]
pub struct BatchIds {
    #[arg(short, long, help = "Owner id")]
    pub owner: i32,

    #[arg(required = true, num_args = 1.., help = "Todo ids")]
    pub ids: Vec<i32>,
}

pub async fn execute_todo(service: &TodoService, args: &TodoArgs) -> Result<()> {
    match &args.command {
        TodoSubcommand::List(args) => {
            let todos = service.get_todos(args.owner).await?;
            if todos.is_empty() {
                println!("No todos.");
            }
            for todo in &todos {
                print_todo(todo);
            }
        }
        TodoSubcommand::Get(args) => {
            let todo = service.get_todo_by_id(args.owner, args.id).await?;
            print_todo(&todo);
        }
        TodoSubcommand::Create(args) => {
            let todo = service
                .create_todo(args.owner, &args.title, args.description.as_deref())
                .await?;
            println!("Created todo {}", todo.id);
            print_todo(&todo);
        }
        TodoSubcommand::Update(args) => {
            let update = UpdateTodo {
                title: args.title.clone(),
                description: args.description.clone(),
                completed: args.completed,
            };
            let todo = service.update_todo(args.owner, args.id, update).await?;
            print_todo(&todo);
        }
        TodoSubcommand::Delete(args) => {
            service.delete_todo(args.owner, args.id).await?;
            println!("Deleted todo {}", args.id);
        }
    }
    Ok(())
}

pub async fn execute_batch(service: &TodoService, args: &BatchArgs) -> Result<()> {
    let (ids, action) = match &args.command {
        BatchSubcommand::Complete(ids) => (ids, BatchAction::MarkAsCompleted),
        BatchSubcommand::Incomplete(ids) => (ids, BatchAction::MarkAsIncomplete),
    };

    let outcome = service
        .batch_update_todos(ids.owner, &ids.ids, action)
        .await?;
    println!(
        "{} ({}/{} affected, log #{})",
        outcome.status, outcome.affected, outcome.requested, outcome.log_id
    );
    println!("{}", outcome.details);
    Ok(())
}

pub async fn execute_history(service: &TodoService, args: &HistoryArgs) -> Result<()> {
    let logs = service.batch_history(args.owner, args.limit).await?;
    if logs.is_empty() {
        println!("No batch operations.");
    }
    for log in &logs {
        println!(
            "#{} {} {} {:?} at {}",
            log.id,
            log.operation_type,
            log.status,
            log.affected_todo_ids,
            log.created_at.to_rfc3339()
        );
        println!("    {}", log.details);
    }
    Ok(())
}

fn print_todo(todo: &Todo) {
    let mark = if todo.completed { "x" } else { " " };
    println!("[{}] #{} {}", mark, todo.id, todo.title);
    if let Some(description) = &todo.description {
        println!("    {}", description);
    }
}
