// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;
use webcraft::domain::models::task::{HttpMethod, SpiderTask, TaskStatus};
use webcraft::domain::repositories::task_repository::TaskRepository;
use webcraft::infrastructure::repositories::file_task_repository::FileTaskRepository;

fn new_task(url: &str) -> SpiderTask {
    SpiderTask::create_single_task(url, "default", HttpMethod::Get, 10, 2, 0.1)
}

fn repository(dir: &std::path::Path) -> FileTaskRepository {
    FileTaskRepository::new(dir).unwrap()
}

#[tokio::test]
async fn test_create_and_find_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let repo = repository(dir.path());

    let task = new_task("https://example.com");
    repo.create(&task).await.unwrap();

    // 记录落在pending分区
    assert!(dir
        .path()
        .join("pending")
        .join(format!("{}.json", task.id))
        .exists());

    let found = repo.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(found, task);
}

#[tokio::test]
async fn test_find_missing_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    let repo = repository(dir.path());

    let found = repo.find_by_id(uuid::Uuid::new_v4()).await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_delete_removes_record() {
    let dir = tempfile::tempdir().unwrap();
    let repo = repository(dir.path());

    let task = new_task("https://example.com");
    repo.create(&task).await.unwrap();

    assert!(repo.delete(task.id).await.unwrap());
    assert!(repo.find_by_id(task.id).await.unwrap().is_none());

    // 再次删除同一ID返回false而不是报错
    assert!(!repo.delete(task.id).await.unwrap());
}

#[tokio::test]
async fn test_update_moves_record_between_partitions() {
    let dir = tempfile::tempdir().unwrap();
    let repo = repository(dir.path());

    let task = new_task("https://example.com");
    repo.create(&task).await.unwrap();

    let running = task.start().unwrap();
    repo.update(&running).await.unwrap();

    let file_name = format!("{}.json", running.id);
    assert!(dir.path().join("running").join(&file_name).exists());
    assert!(!dir.path().join("pending").join(&file_name).exists());

    let found = repo.find_by_id(running.id).await.unwrap().unwrap();
    assert_eq!(found.status, TaskStatus::Running);

    // 同一更新重放依然成功（best-effort幂等）
    repo.update(&running).await.unwrap();
}

#[tokio::test]
async fn test_list_sorts_by_creation_time_descending() {
    let dir = tempfile::tempdir().unwrap();
    let repo = repository(dir.path());

    let mut first = new_task("https://a.example.com");
    let mut second = new_task("https://b.example.com");
    let mut third = new_task("https://c.example.com");
    first.created_at = chrono::Utc::now() - chrono::Duration::seconds(30);
    second.created_at = chrono::Utc::now() - chrono::Duration::seconds(20);
    third.created_at = chrono::Utc::now() - chrono::Duration::seconds(10);

    repo.create(&second).await.unwrap();
    repo.create(&first).await.unwrap();
    repo.create(&third).await.unwrap();

    let tasks = repo.list(None, None, None).await.unwrap();
    let urls: Vec<&str> = tasks.iter().map(|t| t.urls[0].as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://c.example.com",
            "https://b.example.com",
            "https://a.example.com"
        ]
    );

    // limit在排序之后截断
    let limited = repo.list(None, None, Some(2)).await.unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].urls[0], "https://c.example.com");
}

#[tokio::test]
async fn test_list_status_filter_is_exact() {
    let dir = tempfile::tempdir().unwrap();
    let repo = repository(dir.path());

    // Cancelled记录与Failed共用分区目录，但过滤必须精确
    let cancelled = new_task("https://x.example.com").cancel().unwrap();
    let failed = new_task("https://y.example.com")
        .start()
        .unwrap()
        .fail("boom", 0.1)
        .unwrap();
    repo.create(&cancelled).await.unwrap();
    repo.create(&failed).await.unwrap();

    let only_failed = repo.list(Some(TaskStatus::Failed), None, None).await.unwrap();
    assert_eq!(only_failed.len(), 1);
    assert_eq!(only_failed[0].status, TaskStatus::Failed);

    let only_cancelled = repo
        .list(Some(TaskStatus::Cancelled), None, None)
        .await
        .unwrap();
    assert_eq!(only_cancelled.len(), 1);
    assert_eq!(only_cancelled[0].status, TaskStatus::Cancelled);
}

#[tokio::test]
async fn test_acquire_next_claims_and_persists_running() {
    let dir = tempfile::tempdir().unwrap();
    let repo = repository(dir.path());

    assert!(repo.acquire_next().await.unwrap().is_none());

    let task = new_task("https://example.com");
    repo.create(&task).await.unwrap();

    let claimed = repo.acquire_next().await.unwrap().unwrap();
    assert_eq!(claimed.id, task.id);
    assert_eq!(claimed.status, TaskStatus::Running);

    // 认领即持久化：磁盘上的记录已经是Running
    let found = repo.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(found.status, TaskStatus::Running);

    // 没有第二个Pending任务可认领
    assert!(repo.acquire_next().await.unwrap().is_none());
}

#[tokio::test]
async fn test_cleanup_removes_only_old_terminal_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let repo = repository(dir.path());

    let pending = new_task("https://p.example.com");
    let completed = new_task("https://c.example.com")
        .start()
        .unwrap()
        .complete(0.1)
        .unwrap();
    let failed = new_task("https://f.example.com")
        .start()
        .unwrap()
        .fail("boom", 0.1)
        .unwrap();

    repo.create(&pending).await.unwrap();
    repo.create(&completed).await.unwrap();
    repo.create(&failed).await.unwrap();

    // 让文件修改时间落在截止点之前
    tokio::time::sleep(Duration::from_millis(50)).await;

    let removed = repo.cleanup(0).await.unwrap();
    assert_eq!(removed, 2);

    assert!(repo.find_by_id(pending.id).await.unwrap().is_some());
    assert!(repo.find_by_id(completed.id).await.unwrap().is_none());
    assert!(repo.find_by_id(failed.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_cleanup_retains_recent_terminal_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let repo = repository(dir.path());

    let completed = new_task("https://c.example.com")
        .start()
        .unwrap()
        .complete(0.1)
        .unwrap();
    repo.create(&completed).await.unwrap();

    // 保留期7天，刚写入的记录不会被清理
    let removed = repo.cleanup(7).await.unwrap();
    assert_eq!(removed, 0);
    assert!(repo.find_by_id(completed.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_stats_counts_by_status() {
    let dir = tempfile::tempdir().unwrap();
    let repo = repository(dir.path());

    repo.create(&new_task("https://a.example.com")).await.unwrap();
    repo.create(&new_task("https://b.example.com")).await.unwrap();
    let completed = new_task("https://c.example.com")
        .start()
        .unwrap()
        .complete(0.1)
        .unwrap();
    repo.create(&completed).await.unwrap();

    let stats = repo.stats().await.unwrap();
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.total, 3);
}
