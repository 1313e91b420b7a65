// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::task_repository::TaskRepository;
use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// 任务保留清理工作器
///
/// 定期删除超过保留期的Completed/Failed任务记录
pub struct CleanupWorker<R>
where
    R: TaskRepository + Send + Sync + 'static,
{
    repository: Arc<R>,
    interval: Duration,
    retention_days: u32,
}

impl<R> CleanupWorker<R>
where
    R: TaskRepository + Send + Sync + 'static,
{
    pub fn new(repository: Arc<R>, interval: Duration, retention_days: u32) -> Self {
        Self {
            repository,
            interval,
            retention_days,
        }
    }

    /// 运行清理循环
    pub async fn run_loop(&self) {
        info!(
            "Cleanup worker started, retention {} days",
            self.retention_days
        );

        let mut interval = tokio::time::interval(self.interval);
        // 启动时的首个tick跳过，避免开机即清理
        interval.tick().await;

        loop {
            interval.tick().await;

            match self.repository.cleanup(self.retention_days).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired task records", count);
                    }
                }
                Err(e) => {
                    error!("Failed to cleanup expired tasks: {}", e);
                }
            }
        }
    }
}

#[async_trait]
impl<R> Worker for CleanupWorker<R>
where
    R: TaskRepository + Send + Sync + 'static,
{
    async fn run(&self) -> Result<(), WorkerError> {
        self.run_loop().await;
        Ok(())
    }

    fn name(&self) -> &str {
        "cleanup_worker"
    }
}
