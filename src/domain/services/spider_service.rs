// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::{HttpMethod, SpiderTask, TaskStatus, TaskType};
use crate::domain::repositories::task_repository::{RepositoryError, TaskRepository, TaskStats};
use crate::strategies::registry::StrategyRegistry;
use crate::strategies::source_store::{SourceStoreError, StrategySourceStore};
use crate::strategies::validator::{StrategyValidator, ValidationReport};
use crate::utils::validators;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// 服务错误类型
#[derive(Error, Debug)]
pub enum ServiceError {
    /// 策略源校验失败，携带结构化错误明细
    #[error("Strategy validation failed")]
    Validation(ValidationReport),

    /// 请求参数非法
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// 目标不存在
    #[error("{0} not found")]
    NotFound(String),

    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// 策略源存储错误
    #[error("Strategy source error: {0}")]
    Source(#[from] SourceStoreError),
}

/// 创建单URL任务的参数
#[derive(Debug, Clone)]
pub struct CreateTaskParams {
    pub url: String,
    pub strategy_name: String,
    pub method: HttpMethod,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: f64,
}

/// 爬虫服务门面
///
/// 编排任务创建、状态查询和策略源管理。进程启动时构造一次，
/// 以句柄形式传递给表示层，不依赖全局可变状态。
pub struct SpiderService<R>
where
    R: TaskRepository + Send + Sync,
{
    repository: Arc<R>,
    registry: Arc<StrategyRegistry>,
    validator: StrategyValidator,
    sources: StrategySourceStore,
}

impl<R> SpiderService<R>
where
    R: TaskRepository + Send + Sync,
{
    /// 创建新的爬虫服务实例
    pub fn new(
        repository: Arc<R>,
        registry: Arc<StrategyRegistry>,
        sources: StrategySourceStore,
    ) -> Self {
        Self {
            repository,
            registry,
            validator: StrategyValidator::new(),
            sources,
        }
    }

    /// 创建单URL抓取任务
    ///
    /// # 参数
    ///
    /// * `params` - 任务参数
    ///
    /// # 返回值
    ///
    /// * `Ok(SpiderTask)` - 已持久化的Pending任务
    /// * `Err(ServiceError)` - 参数非法或持久化失败
    pub async fn create_single_task(
        &self,
        params: CreateTaskParams,
    ) -> Result<SpiderTask, ServiceError> {
        validators::validate_url(&params.url)
            .map_err(|e| ServiceError::InvalidParameter(e.to_string()))?;

        if params.timeout_seconds == 0 {
            return Err(ServiceError::InvalidParameter(
                "timeout_seconds must be greater than zero".to_string(),
            ));
        }

        let task = SpiderTask::create_single_task(
            params.url,
            params.strategy_name,
            params.method,
            params.timeout_seconds,
            params.max_retries,
            params.retry_delay_seconds,
        );

        self.repository.create(&task).await?;
        info!("Created task {} for {}", task.id, task.urls[0]);
        metrics::counter!("webcraft_tasks_created_total").increment(1);

        Ok(task)
    }

    /// 查询任务
    pub async fn get_task(&self, id: Uuid) -> Result<SpiderTask, ServiceError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Task '{}'", id)))
    }

    /// 列出任务
    pub async fn list_tasks(
        &self,
        status: Option<TaskStatus>,
        task_type: Option<TaskType>,
        limit: Option<usize>,
    ) -> Result<Vec<SpiderTask>, ServiceError> {
        Ok(self.repository.list(status, task_type, limit).await?)
    }

    /// 取消任务
    ///
    /// 仅允许取消仍处于Pending的任务；Running任务运行至终态
    pub async fn cancel_task(&self, id: Uuid) -> Result<SpiderTask, ServiceError> {
        let task = self.get_task(id).await?;

        if task.status != TaskStatus::Pending {
            return Err(ServiceError::InvalidParameter(format!(
                "Only pending tasks can be cancelled, task is {}",
                task.status
            )));
        }

        let cancelled = task
            .cancel()
            .map_err(|e| ServiceError::InvalidParameter(e.to_string()))?;
        self.repository.update(&cancelled).await?;
        Ok(cancelled)
    }

    /// 清理过期的终态任务
    pub async fn cleanup_tasks(&self, older_than_days: u32) -> Result<usize, ServiceError> {
        Ok(self.repository.cleanup(older_than_days).await?)
    }

    /// 任务统计
    pub async fn task_stats(&self) -> Result<TaskStats, ServiceError> {
        Ok(self.repository.stats().await?)
    }

    /// 列出全部可用策略
    pub fn list_strategies(&self) -> BTreeMap<String, String> {
        self.registry.list()
    }

    /// 读取策略源文本
    pub fn get_strategy_source(&self, name: &str) -> Result<String, ServiceError> {
        Ok(self.sources.read(name)?)
    }

    /// 创建新策略
    ///
    /// 校验通过后持久化源文本并重载注册表
    pub fn create_strategy(&self, name: &str, source: &str) -> Result<(), ServiceError> {
        let report = self.validator.validate_all(source);
        if !report.success {
            return Err(ServiceError::Validation(report));
        }

        self.sources.create(name, source)?;
        let count = self.registry.reload();
        info!("Created strategy '{}', {} strategies registered", name, count);
        Ok(())
    }

    /// 编辑已有策略
    pub fn edit_strategy(&self, name: &str, source: &str) -> Result<(), ServiceError> {
        let report = self.validator.validate_all(source);
        if !report.success {
            return Err(ServiceError::Validation(report));
        }

        self.sources.edit(name, source)?;
        self.registry.reload();
        info!("Updated strategy '{}'", name);
        Ok(())
    }

    /// 删除策略，保留名称拒绝删除
    pub fn delete_strategy(&self, name: &str) -> Result<(), ServiceError> {
        self.sources.delete(name)?;
        self.registry.reload();
        info!("Deleted strategy '{}'", name);
        Ok(())
    }

    /// 重载全部策略
    pub fn reload_strategies(&self) -> usize {
        self.registry.reload()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::file_task_repository::FileTaskRepository;

    fn service(
        dir: &std::path::Path,
    ) -> SpiderService<FileTaskRepository> {
        let repository = Arc::new(FileTaskRepository::new(dir.join("tasks")).unwrap());
        let registry = Arc::new(StrategyRegistry::new(dir.join("strategies")));
        let sources = StrategySourceStore::new(dir.join("strategies")).unwrap();
        SpiderService::new(repository, registry, sources)
    }

    fn params(url: &str) -> CreateTaskParams {
        CreateTaskParams {
            url: url.to_string(),
            strategy_name: "default".to_string(),
            method: HttpMethod::Get,
            timeout_seconds: 10,
            max_retries: 2,
            retry_delay_seconds: 0.1,
        }
    }

    #[tokio::test]
    async fn test_create_single_task_starts_pending() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let task = service
            .create_single_task(params("https://example.com"))
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0.0);

        let fetched = service.get_task(task.id).await.unwrap();
        assert_eq!(fetched.id, task.id);
    }

    #[tokio::test]
    async fn test_create_task_rejects_bad_url() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let result = service.create_single_task(params("not a url")).await;
        assert!(matches!(result, Err(ServiceError::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn test_cancel_only_pending_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let task = service
            .create_single_task(params("https://example.com"))
            .await
            .unwrap();
        let cancelled = service.cancel_task(task.id).await.unwrap();
        assert_eq!(cancelled.status, TaskStatus::Cancelled);

        // 终态任务不能再次取消
        let result = service.cancel_task(task.id).await;
        assert!(matches!(result, Err(ServiceError::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let result = service.get_task(Uuid::new_v4()).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_strategy_validates_and_registers() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        // 非法源拒绝且不落盘
        let result = service.create_strategy("broken", "{nope");
        assert!(matches!(result, Err(ServiceError::Validation(_))));
        assert!(service.get_strategy_source("broken").is_err());

        let source = r#"{"name": "quotes", "start_url": "https://quotes.example",
            "parse": {"fields": {"q": {"selector": ".quote"}}}}"#;
        service.create_strategy("quotes", source).unwrap();

        assert!(service.list_strategies().contains_key("quotes"));
        assert!(service.get_strategy_source("quotes").is_ok());
    }

    #[tokio::test]
    async fn test_delete_protected_strategy_refused() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let result = service.delete_strategy("default");
        assert!(matches!(
            result,
            Err(ServiceError::Source(SourceStoreError::Protected(_)))
        ));
    }
}
