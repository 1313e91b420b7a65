// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use webcraft::domain::models::task::{HttpMethod, SpiderTask, TaskStatus};
use webcraft::domain::repositories::task_repository::TaskRepository;
use webcraft::engines::fetch_engine::FetchEngine;
use webcraft::infrastructure::repositories::file_task_repository::FileTaskRepository;
use webcraft::strategies::registry::StrategyRegistry;
use webcraft::strategies::traits::{ParseError, Strategy};
use webcraft::workers::crawl_worker::CrawlWorker;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// parse抛出错误的策略
struct ErroringStrategy;

impl Strategy for ErroringStrategy {
    fn name(&self) -> &str {
        "erroring"
    }
    fn label(&self) -> &str {
        "ErroringStrategy"
    }
    fn parse(
        &self,
        _raw_content: &str,
        _url: &str,
        _headers: &HashMap<String, String>,
    ) -> Result<Value, ParseError> {
        Err(ParseError::Failed("selector table exploded".to_string()))
    }
}

/// parse直接panic的策略，模拟失控的用户代码
struct PanickingStrategy;

impl Strategy for PanickingStrategy {
    fn name(&self) -> &str {
        "panicking"
    }
    fn label(&self) -> &str {
        "PanickingStrategy"
    }
    fn parse(
        &self,
        _raw_content: &str,
        _url: &str,
        _headers: &HashMap<String, String>,
    ) -> Result<Value, ParseError> {
        panic!("user code went off the rails");
    }
}

struct Harness {
    repository: Arc<FileTaskRepository>,
    registry: Arc<StrategyRegistry>,
    _dir: tempfile::TempDir,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(FileTaskRepository::new(dir.path().join("tasks")).unwrap());
        let registry = Arc::new(StrategyRegistry::new(dir.path().join("strategies")));
        Self {
            repository,
            registry,
            _dir: dir,
        }
    }

    fn without_builtins() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(FileTaskRepository::new(dir.path().join("tasks")).unwrap());
        let registry = Arc::new(StrategyRegistry::with_builtins(
            dir.path().join("strategies"),
            vec![],
        ));
        Self {
            repository,
            registry,
            _dir: dir,
        }
    }

    fn spawn_worker(&self) -> tokio::task::JoinHandle<()> {
        let worker = Arc::new(CrawlWorker::new(
            self.repository.clone(),
            self.registry.clone(),
            Arc::new(FetchEngine::default()),
            Duration::from_millis(20),
        ));
        tokio::spawn(async move { worker.run_loop().await })
    }

    async fn wait_terminal(&self, id: Uuid) -> SpiderTask {
        for _ in 0..250 {
            if let Some(task) = self.repository.find_by_id(id).await.unwrap() {
                if task.status.is_terminal() {
                    return task;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("task {} did not reach a terminal status in time", id);
    }
}

fn task_for(url: &str, strategy: &str) -> SpiderTask {
    SpiderTask::create_single_task(url, strategy, HttpMethod::Get, 5, 0, 0.05)
}

#[tokio::test]
async fn test_scenario_successful_crawl_completes_task() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>content</html>"))
        .mount(&server)
        .await;

    let harness = Harness::new();
    let task = task_for(&server.uri(), "default");
    harness.repository.create(&task).await.unwrap();

    let handle = harness.spawn_worker();
    let finished = harness.wait_terminal(task.id).await;
    handle.abort();

    assert_eq!(finished.status, TaskStatus::Completed);
    assert_eq!(finished.success_count, 1);
    assert_eq!(finished.fail_count, 0);
    assert_eq!(finished.progress, 100.0);
    assert!(finished.execution_time_seconds.is_some());
    assert!(finished.error_message.is_none());
}

#[tokio::test]
async fn test_scenario_missing_strategy_without_default_fails_task() {
    // default被移除时，未知策略名不再有回退
    let harness = Harness::without_builtins();
    let task = task_for("https://example.com", "ghost");
    harness.repository.create(&task).await.unwrap();

    let handle = harness.spawn_worker();
    let finished = harness.wait_terminal(task.id).await;
    handle.abort();

    assert_eq!(finished.status, TaskStatus::Failed);
    assert_eq!(finished.fail_count, 1);
    let message = finished.error_message.unwrap();
    assert!(message.contains("not found"), "message: {}", message);
}

#[tokio::test]
async fn test_scenario_transport_failure_fails_task() {
    let harness = Harness::new();
    // 未监听端口，传输层失败
    let task = task_for("http://127.0.0.1:1/", "default");
    harness.repository.create(&task).await.unwrap();

    let handle = harness.spawn_worker();
    let finished = harness.wait_terminal(task.id).await;
    handle.abort();

    assert_eq!(finished.status, TaskStatus::Failed);
    let message = finished.error_message.unwrap();
    assert!(message.contains("Fetch failed"), "message: {}", message);
}

#[tokio::test]
async fn test_scenario_parser_error_fails_task_and_loop_survives() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let harness = Harness::new();
    harness.registry.register(Arc::new(ErroringStrategy)).unwrap();

    let erroring = task_for(&server.uri(), "erroring");
    harness.repository.create(&erroring).await.unwrap();

    let handle = harness.spawn_worker();
    let finished = harness.wait_terminal(erroring.id).await;

    assert_eq!(finished.status, TaskStatus::Failed);
    let message = finished.error_message.unwrap();
    assert!(message.contains("selector table exploded"), "message: {}", message);

    // 失败之后循环继续工作，下一个任务正常完成
    let follow_up = task_for(&server.uri(), "default");
    harness.repository.create(&follow_up).await.unwrap();
    let finished = harness.wait_terminal(follow_up.id).await;
    handle.abort();

    assert_eq!(finished.status, TaskStatus::Completed);
}

#[tokio::test]
async fn test_scenario_panicking_parser_fails_task_without_crashing_executor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let harness = Harness::new();
    harness
        .registry
        .register(Arc::new(PanickingStrategy))
        .unwrap();

    let panicking = task_for(&server.uri(), "panicking");
    harness.repository.create(&panicking).await.unwrap();

    let handle = harness.spawn_worker();
    let finished = harness.wait_terminal(panicking.id).await;

    assert_eq!(finished.status, TaskStatus::Failed);
    let message = finished.error_message.unwrap();
    assert!(
        message.contains("user code went off the rails"),
        "message: {}",
        message
    );

    // panic被执行器边界吸收，后续任务仍然被处理
    let follow_up = task_for(&server.uri(), "default");
    harness.repository.create(&follow_up).await.unwrap();
    let finished = harness.wait_terminal(follow_up.id).await;
    handle.abort();

    assert_eq!(finished.status, TaskStatus::Completed);
}

#[tokio::test]
async fn test_unknown_strategy_falls_back_to_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fallback body"))
        .mount(&server)
        .await;

    let harness = Harness::new();
    let task = task_for(&server.uri(), "ghost");
    harness.repository.create(&task).await.unwrap();

    let handle = harness.spawn_worker();
    let finished = harness.wait_terminal(task.id).await;
    handle.abort();

    // 未知名称回退到default策略执行
    assert_eq!(finished.status, TaskStatus::Completed);
    assert_eq!(finished.success_count, 1);
}
