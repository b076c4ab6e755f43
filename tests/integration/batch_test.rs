//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 批量变更引擎集成测试

use chrono::Utc;
use oxtodo::batch::BatchEngine;
use oxtodo::cache::{owner_list_key, todo_key, RecordCache};
use oxtodo::database::entity::todo;
use oxtodo::error::TodoError;
use oxtodo::repository::TodoRepository;
use oxtodo::{BatchAction, BatchStatus};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, NotSet, Set, TransactionTrait,
};
use std::sync::Arc;
use std::time::Duration;

#[path = "../common/mod.rs"]
mod common;

use common::{sqlite_file_store, sqlite_store, RecordingBackend};

struct Fixture {
    db: DatabaseConnection,
    repo: TodoRepository,
    engine: BatchEngine,
    backend: Arc<RecordingBackend>,
}

async fn setup() -> Fixture {
    fixture_on(sqlite_store().await)
}

fn fixture_on(db: DatabaseConnection) -> Fixture {
    let backend = Arc::new(RecordingBackend::new());
    let cache = RecordCache::new(backend.clone(), 600);
    Fixture {
        repo: TodoRepository::new(db.clone(), cache.clone()),
        engine: BatchEngine::new(db.clone(), cache),
        db,
        backend,
    }
}

#[tokio::test]
async fn test_batch_all_owned_succeeds() {
    let f = setup().await;
    let a = f.repo.create(1, "a".to_string(), None).await.unwrap();
    let b = f.repo.create(1, "b".to_string(), None).await.unwrap();

    let outcome = f
        .engine
        .apply(1, &[a.id, b.id], BatchAction::MarkAsCompleted)
        .await
        .unwrap();

    assert_eq!(outcome.status, BatchStatus::Success);
    assert_eq!(outcome.requested, 2);
    assert_eq!(outcome.affected, 2);
    assert!(f.repo.get(1, a.id).await.unwrap().completed);
    assert!(f.repo.get(1, b.id).await.unwrap().completed);

    let logs = f.engine.recent_logs(1, 10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].id, outcome.log_id);
    assert_eq!(logs[0].operation_type, "MARK_AS_COMPLETED");
    assert_eq!(logs[0].affected_todo_ids, vec![a.id, b.id]);
    assert_eq!(logs[0].status, BatchStatus::Success);
}

#[tokio::test]
async fn test_batch_with_foreign_record_is_partial_failure() {
    let f = setup().await;
    let mine = f.repo.create(1, "mine".to_string(), None).await.unwrap();
    let theirs = f.repo.create(2, "theirs".to_string(), None).await.unwrap();

    let outcome = f
        .engine
        .apply(1, &[mine.id, theirs.id], BatchAction::MarkAsCompleted)
        .await
        .unwrap();

    assert_eq!(outcome.status, BatchStatus::PartialFailure);
    assert_eq!(outcome.affected, 1);
    assert!(outcome.details.contains("2 requested"));
    assert!(f.repo.get(1, mine.id).await.unwrap().completed);
    assert!(!f.repo.get(2, theirs.id).await.unwrap().completed);

    let logs = f.engine.recent_logs(1, 10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, BatchStatus::PartialFailure);
    assert!(f.engine.recent_logs(2, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_batch_without_matches_is_failure_and_audited() {
    let f = setup().await;
    let theirs = f.repo.create(2, "theirs".to_string(), None).await.unwrap();

    let outcome = f
        .engine
        .apply(1, &[theirs.id, 9999], BatchAction::MarkAsCompleted)
        .await
        .unwrap();

    assert_eq!(outcome.status, BatchStatus::Failure);
    assert_eq!(outcome.affected, 0);
    assert!(!f.repo.get(2, theirs.id).await.unwrap().completed);

    let logs = f.engine.recent_logs(1, 10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, BatchStatus::Failure);
}

#[tokio::test]
async fn test_repeated_batch_is_idempotent() {
    let f = setup().await;
    let a = f.repo.create(1, "a".to_string(), None).await.unwrap();
    let b = f.repo.create(1, "b".to_string(), None).await.unwrap();

    for _ in 0..2 {
        let outcome = f
            .engine
            .apply(1, &[a.id, b.id], BatchAction::MarkAsCompleted)
            .await
            .unwrap();
        assert_eq!(outcome.status, BatchStatus::Success);
    }

    let todos = f.repo.list(1).await.unwrap();
    assert!(todos.iter().all(|t| t.completed));
    assert_eq!(f.engine.recent_logs(1, 10).await.unwrap().len(), 2);

    let outcome = f
        .engine
        .apply(1, &[a.id], BatchAction::MarkAsIncomplete)
        .await
        .unwrap();
    assert_eq!(outcome.status, BatchStatus::Success);
    assert!(!f.repo.get(1, a.id).await.unwrap().completed);
    assert!(f.repo.get(1, b.id).await.unwrap().completed);
}

#[tokio::test]
async fn test_duplicate_ids_are_collapsed() {
    let f = setup().await;
    let a = f.repo.create(1, "a".to_string(), None).await.unwrap();

    let outcome = f
        .engine
        .apply(1, &[a.id, a.id, a.id], BatchAction::MarkAsCompleted)
        .await
        .unwrap();

    assert_eq!(outcome.requested, 1);
    assert_eq!(outcome.status, BatchStatus::Success);
    let logs = f.engine.recent_logs(1, 1).await.unwrap();
    assert_eq!(logs[0].affected_todo_ids, vec![a.id]);
}

#[tokio::test]
async fn test_invalid_requests_are_rejected_without_audit() {
    let f = setup().await;
    let a = f.repo.create(1, "a".to_string(), None).await.unwrap();

    let cases: Vec<(i32, Vec<i32>, BatchAction)> = vec![
        (1, vec![], BatchAction::MarkAsCompleted),
        (1, vec![a.id], BatchAction::Unspecified),
        (0, vec![a.id], BatchAction::MarkAsCompleted),
    ];
    for (owner, ids, action) in cases {
        let err = f.engine.apply(owner, &ids, action).await.unwrap_err();
        assert!(
            matches!(err, TodoError::InvalidArgument(_)),
            "unexpected error: {:?}",
            err
        );
    }

    assert!(f.engine.recent_logs(1, 10).await.unwrap().is_empty());
    assert!(!f.repo.get(1, a.id).await.unwrap().completed);
}

#[tokio::test]
async fn test_audit_insert_failure_rolls_back_update() {
    let f = setup().await;
    let a = f.repo.create(1, "a".to_string(), None).await.unwrap();
    f.backend.take_deleted().await;

    f.db
        .execute_unprepared("DROP TABLE batch_operation_logs")
        .await
        .unwrap();

    let err = f
        .engine
        .apply(1, &[a.id], BatchAction::MarkAsCompleted)
        .await
        .unwrap_err();
    assert!(matches!(err, TodoError::Database(_)));

    assert!(!f.repo.get(1, a.id).await.unwrap().completed);
    // 回滚的尝试不清扫缓存
    assert!(!f.backend.take_deleted().await.contains(&owner_list_key(1)));
}

#[tokio::test]
async fn test_sweep_deletes_every_named_key() {
    let f = setup().await;
    let a = f.repo.create(1, "a".to_string(), None).await.unwrap();
    let theirs = f.repo.create(2, "theirs".to_string(), None).await.unwrap();
    f.repo.get(1, a.id).await.unwrap();
    f.repo.list(1).await.unwrap();
    f.backend.take_deleted().await;

    f.engine
        .apply(1, &[a.id, theirs.id, 424242], BatchAction::MarkAsCompleted)
        .await
        .unwrap();

    let deleted = f.backend.take_deleted().await;
    assert_eq!(
        deleted,
        vec![
            owner_list_key(1),
            todo_key(a.id),
            todo_key(theirs.id),
            todo_key(424242)
        ]
    );
    // 缓存读路径看到新状态
    assert!(f.repo.get(1, a.id).await.unwrap().completed);
    assert!(f.repo.list(1).await.unwrap()[0].completed);
}

#[tokio::test]
async fn test_recent_logs_newest_first_with_limit() {
    let f = setup().await;
    let a = f.repo.create(1, "a".to_string(), None).await.unwrap();

    let first = f
        .engine
        .apply(1, &[a.id], BatchAction::MarkAsCompleted)
        .await
        .unwrap();
    let second = f
        .engine
        .apply(1, &[a.id], BatchAction::MarkAsIncomplete)
        .await
        .unwrap();
    let third = f
        .engine
        .apply(1, &[a.id], BatchAction::MarkAsCompleted)
        .await
        .unwrap();

    let logs = f.engine.recent_logs(1, 2).await.unwrap();
    assert_eq!(
        logs.iter().map(|l| l.id).collect::<Vec<_>>(),
        vec![third.log_id, second.log_id]
    );
    assert!(logs.iter().all(|l| l.id != first.log_id));
    assert_eq!(logs[1].operation_type, "MARK_AS_INCOMPLETE");
}

#[tokio::test]
async fn test_non_positive_ids_count_as_unmatched() {
    let f = setup().await;
    let a = f.repo.create(1, "a".to_string(), None).await.unwrap();

    let outcome = f
        .engine
        .apply(1, &[a.id, 0, -4], BatchAction::MarkAsCompleted)
        .await
        .unwrap();

    assert_eq!(outcome.status, BatchStatus::PartialFailure);
    assert_eq!(outcome.requested, 3);
    assert_eq!(outcome.affected, 1);
    assert!(f.repo.get(1, a.id).await.unwrap().completed);

    let logs = f.engine.recent_logs(1, 10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].affected_todo_ids, vec![a.id, 0, -4]);
}

#[tokio::test]
async fn test_cancelled_batch_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cancel.db");
    let f = fixture_on(sqlite_file_store(&path).await);
    let a = f.repo.create(1, "a".to_string(), None).await.unwrap();
    f.backend.take_deleted().await;

    // 另一个连接持有写锁，批量事务开始后阻塞在批量更新上
    let writer = sqlite_file_store(&path).await;
    let blocking = writer.begin().await.unwrap();
    todo::ActiveModel {
        id: NotSet,
        owner_id: Set(99),
        title: Set("lock holder".to_string()),
        description: Set(None),
        completed: Set(false),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(&blocking)
    .await
    .unwrap();

    let cancelled = tokio::time::timeout(
        Duration::from_millis(200),
        f.engine.apply(1, &[a.id], BatchAction::MarkAsCompleted),
    )
    .await;
    assert!(cancelled.is_err(), "batch should still be waiting for the lock");

    blocking.rollback().await.unwrap();

    assert!(!f.repo.get(1, a.id).await.unwrap().completed);
    assert!(f.engine.recent_logs(1, 10).await.unwrap().is_empty());
    // 未提交的批量不清扫缓存
    assert!(f.backend.take_deleted().await.is_empty());
}
