//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 记录仓储集成测试
//!
//! 使用内存SQLite作为存储、记录删除键的内存后端作为缓存

use oxtodo::cache::{owner_list_key, todo_key, RecordCache};
use oxtodo::error::TodoError;
use oxtodo::repository::TodoRepository;
use oxtodo::UpdateTodo;
use serde_json::json;
use std::sync::Arc;

#[path = "../common/mod.rs"]
mod common;

use common::{sqlite_store, RecordingBackend};

async fn setup() -> (TodoRepository, Arc<RecordingBackend>) {
    let backend = Arc::new(RecordingBackend::new());
    let cache = RecordCache::new(backend.clone(), 600);
    (TodoRepository::new(sqlite_store().await, cache), backend)
}

#[tokio::test]
async fn test_create_then_get_populates_cache() {
    let (repo, backend) = setup().await;

    let created = repo
        .create(1, "buy milk".to_string(), Some("2 litres".to_string()))
        .await
        .unwrap();
    assert_eq!(created.owner_id, 1);
    assert!(!created.completed);
    assert_eq!(backend.take_deleted().await, vec![owner_list_key(1)]);

    assert!(!backend.contains(&todo_key(created.id)).await);
    let fetched = repo.get(1, created.id).await.unwrap();
    assert_eq!(fetched.title, "buy milk");
    assert_eq!(fetched.description.as_deref(), Some("2 litres"));
    assert!(backend.contains(&todo_key(created.id)).await);
}

#[tokio::test]
async fn test_empty_description_is_stored_as_absent() {
    let (repo, _backend) = setup().await;

    let created = repo
        .create(1, "call mom".to_string(), Some(String::new()))
        .await
        .unwrap();
    assert_eq!(created.description, None);
    assert_eq!(repo.get(1, created.id).await.unwrap().description, None);
}

#[tokio::test]
async fn test_get_of_foreign_record_is_not_found() {
    let (repo, backend) = setup().await;
    let todo = repo.create(1, "private".to_string(), None).await.unwrap();

    let err = repo.get(2, todo.id).await.unwrap_err();
    assert!(matches!(err, TodoError::NotFound));
    // 不存在的结果不写入缓存
    assert!(!backend.contains(&todo_key(todo.id)).await);
}

#[tokio::test]
async fn test_poisoned_cache_entry_does_not_leak_across_owners() {
    let (repo, backend) = setup().await;
    let todo = repo.create(1, "secret plan".to_string(), None).await.unwrap();

    // 缓存中的记录属于所有者1，所有者2读取时必须回源并得到 NotFound
    repo.get(1, todo.id).await.unwrap();
    assert!(backend.contains(&todo_key(todo.id)).await);
    assert!(matches!(
        repo.get(2, todo.id).await.unwrap_err(),
        TodoError::NotFound
    ));

    // 伪造一个声称属于所有者2的列表缓存，其中混入所有者1的记录
    backend
        .poison(
            &owner_list_key(2),
            &json!([{
                "id": todo.id,
                "owner_id": 1,
                "title": "secret plan",
                "completed": false,
                "created_at": todo.created_at,
                "updated_at": todo.updated_at,
            }]),
        )
        .await;
    assert!(repo.list(2).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_undecodable_cache_entry_falls_back_to_store() {
    let (repo, backend) = setup().await;
    let todo = repo.create(4, "water plants".to_string(), None).await.unwrap();

    backend
        .poison(&todo_key(todo.id), &json!({"unexpected": true}))
        .await;
    assert_eq!(repo.get(4, todo.id).await.unwrap().title, "water plants");
}

#[tokio::test]
async fn test_list_is_ordered_and_sees_new_records_once() {
    let (repo, backend) = setup().await;
    let first = repo.create(7, "first".to_string(), None).await.unwrap();
    let second = repo.create(7, "second".to_string(), None).await.unwrap();
    repo.create(8, "other owner".to_string(), None).await.unwrap();

    let listed = repo.list(7).await.unwrap();
    assert_eq!(
        listed.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );
    assert!(backend.contains(&owner_list_key(7)).await);

    // 新建后列表缓存被删除，下一次列表恰好包含新记录一次
    let third = repo.create(7, "third".to_string(), None).await.unwrap();
    assert!(!backend.contains(&owner_list_key(7)).await);
    let listed = repo.list(7).await.unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed.iter().filter(|t| t.id == third.id).count(), 1);
}

#[tokio::test]
async fn test_update_is_visible_through_cached_get() {
    let (repo, backend) = setup().await;
    let todo = repo
        .create(3, "draft".to_string(), Some("v1".to_string()))
        .await
        .unwrap();
    repo.get(3, todo.id).await.unwrap();
    repo.list(3).await.unwrap();
    backend.take_deleted().await;

    let updated = repo
        .update(
            3,
            todo.id,
            UpdateTodo {
                title: "final".to_string(),
                description: None,
                completed: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "final");
    assert_eq!(updated.description, None);
    assert!(updated.completed);
    assert!(updated.updated_at >= todo.updated_at);

    let deleted = backend.take_deleted().await;
    assert!(deleted.contains(&todo_key(todo.id)));
    assert!(deleted.contains(&owner_list_key(3)));

    let fetched = repo.get(3, todo.id).await.unwrap();
    assert_eq!(fetched.title, "final");
    assert!(fetched.completed);
    assert!(repo.list(3).await.unwrap()[0].completed);
}

#[tokio::test]
async fn test_update_of_foreign_record_is_not_found() {
    let (repo, backend) = setup().await;
    let todo = repo.create(1, "mine".to_string(), None).await.unwrap();
    backend.take_deleted().await;

    let err = repo
        .update(
            2,
            todo.id,
            UpdateTodo {
                title: "hijacked".to_string(),
                description: None,
                completed: true,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TodoError::NotFound));
    assert!(backend.take_deleted().await.is_empty());
    assert_eq!(repo.get(1, todo.id).await.unwrap().title, "mine");
}

#[tokio::test]
async fn test_delete_missing_or_foreign_mutates_nothing() {
    let (repo, backend) = setup().await;
    let todo = repo.create(1, "keep me".to_string(), None).await.unwrap();
    backend.take_deleted().await;

    assert!(matches!(
        repo.delete(2, todo.id).await.unwrap_err(),
        TodoError::NotFound
    ));
    assert!(matches!(
        repo.delete(1, todo.id + 100).await.unwrap_err(),
        TodoError::NotFound
    ));
    assert!(backend.take_deleted().await.is_empty());
    assert!(repo.get(1, todo.id).await.is_ok());
}

#[tokio::test]
async fn test_delete_invalidates_record_and_list() {
    let (repo, backend) = setup().await;
    let todo = repo.create(5, "done soon".to_string(), None).await.unwrap();
    repo.get(5, todo.id).await.unwrap();
    repo.list(5).await.unwrap();
    backend.take_deleted().await;

    repo.delete(5, todo.id).await.unwrap();

    let deleted = backend.take_deleted().await;
    assert_eq!(deleted, vec![todo_key(todo.id), owner_list_key(5)]);
    assert!(matches!(
        repo.get(5, todo.id).await.unwrap_err(),
        TodoError::NotFound
    ));
    assert!(repo.list(5).await.unwrap().is_empty());
}
