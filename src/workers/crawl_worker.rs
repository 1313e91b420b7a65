// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::task::SpiderTask;
use crate::domain::repositories::task_repository::TaskRepository;
use crate::engines::fetch_engine::FetchEngine;
use crate::engines::traits::FetchRequest;
use crate::strategies::registry::StrategyRegistry;
use crate::strategies::traits::Strategy;
use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;
use anyhow::Result;
use async_trait::async_trait;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 抓取执行工作器
///
/// 单个逻辑执行循环：认领一个Pending任务，独占地驱动
/// 抓取→解析→落盘，记录终态。同一时刻最多一个任务在途，
/// 横向扩展依赖多个独立执行器实例而非内部并行。
pub struct CrawlWorker<R>
where
    R: TaskRepository + Send + Sync + 'static,
{
    repository: Arc<R>,
    registry: Arc<StrategyRegistry>,
    engine: Arc<FetchEngine>,
    poll_interval: Duration,
    worker_id: Uuid,
}

impl<R> CrawlWorker<R>
where
    R: TaskRepository + Send + Sync + 'static,
{
    /// 创建新的抓取执行工作器实例
    ///
    /// # 参数
    ///
    /// * `repository` - 任务仓库
    /// * `registry` - 策略注册表
    /// * `engine` - 抓取引擎
    /// * `poll_interval` - 空闲时的轮询间隔
    pub fn new(
        repository: Arc<R>,
        registry: Arc<StrategyRegistry>,
        engine: Arc<FetchEngine>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            repository,
            registry,
            engine,
            poll_interval,
            worker_id: Uuid::new_v4(),
        }
    }

    /// 运行执行循环
    ///
    /// 单个任务的任何失败都不会终止循环；空闲时休眠一个
    /// 轮询间隔后重新扫描。
    pub async fn run_loop(&self) {
        info!("Crawl worker {} started", self.worker_id);

        loop {
            match self.process_next_task().await {
                Ok(processed) => {
                    if !processed {
                        sleep(self.poll_interval).await;
                    }
                }
                Err(e) => {
                    error!("Error processing task: {}", e);
                    sleep(self.poll_interval).await;
                }
            }
        }
    }

    /// 认领并处理下一个任务
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 处理了一个任务
    /// * `Ok(false)` - 当前没有待处理任务
    async fn process_next_task(&self) -> Result<bool> {
        let task_opt = self.repository.acquire_next().await?;

        if let Some(task) = task_opt {
            self.process_task(task).await?;
            return Ok(true);
        }

        Ok(false)
    }

    #[instrument(skip(self, task), fields(task_id = %task.id, strategy = %task.strategy_name))]
    async fn process_task(&self, task: SpiderTask) -> Result<()> {
        info!("Processing task");
        let started = Instant::now();

        // 策略解析带default回退；default也缺失时任务直接失败
        let Some(strategy) = self.registry.get(&task.strategy_name) else {
            let message = format!(
                "Strategy '{}' not found and no default fallback is registered",
                task.strategy_name
            );
            return self.finalize_failure(task, message, started).await;
        };

        let request = Self::build_fetch_request(&task, strategy.as_ref());
        let result = self.engine.fetch_with_retry(&request).await;

        if !result.success {
            let message = result
                .error_message
                .unwrap_or_else(|| "Request failed, no response received".to_string());
            return self
                .finalize_failure(task, format!("Fetch failed: {}", message), started)
                .await;
        }

        // 用户提交的解析代码出任何问题都不能击穿执行循环
        let parsed = panic::catch_unwind(AssertUnwindSafe(|| {
            strategy.parse(&result.raw_content, &result.final_url, &result.response_headers)
        }));

        match parsed {
            Ok(Ok(data)) => {
                info!(
                    "Fetch successful, status: {}, extracted {} bytes of data",
                    result.status_code,
                    data.to_string().len()
                );
                debug!("Extracted data: {}", data);
                self.finalize_success(task, started).await
            }
            Ok(Err(e)) => {
                warn!("Strategy parse failed: {}", e);
                self.finalize_failure(task, format!("Parser error: {}", e), started)
                    .await
            }
            Err(payload) => {
                let message = panic_message(payload);
                warn!("Strategy parse panicked: {}", message);
                self.finalize_failure(task, format!("Parser panicked: {}", message), started)
                    .await
            }
        }
    }

    /// 构建抓取请求
    ///
    /// 策略绑定的start_url优先，否则使用任务记录的URL
    fn build_fetch_request(task: &SpiderTask, strategy: &dyn Strategy) -> FetchRequest {
        let url = strategy
            .start_url()
            .map(str::to_string)
            .or_else(|| task.urls.first().cloned())
            .unwrap_or_default();

        FetchRequest {
            url,
            method: task.method,
            headers: Default::default(),
            params: Default::default(),
            body: None,
            timeout: Duration::from_secs(task.timeout_seconds),
            max_retries: task.max_retries,
            retry_delay: Duration::from_secs_f64(task.retry_delay_seconds.max(0.0)),
        }
    }

    async fn finalize_success(&self, mut task: SpiderTask, started: Instant) -> Result<()> {
        task.update_progress(1, 1, 0);
        let completed = task
            .complete(started.elapsed().as_secs_f64())
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        self.repository.update(&completed).await?;
        metrics::counter!("webcraft_tasks_completed_total").increment(1);
        Ok(())
    }

    async fn finalize_failure(
        &self,
        mut task: SpiderTask,
        message: String,
        started: Instant,
    ) -> Result<()> {
        task.update_progress(1, 0, 1);
        let failed = task
            .fail(message, started.elapsed().as_secs_f64())
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        self.repository.update(&failed).await?;
        metrics::counter!("webcraft_tasks_failed_total").increment(1);
        Ok(())
    }
}

#[async_trait]
impl<R> Worker for CrawlWorker<R>
where
    R: TaskRepository + Send + Sync + 'static,
{
    async fn run(&self) -> Result<(), WorkerError> {
        self.run_loop().await;
        Ok(())
    }

    fn name(&self) -> &str {
        "crawl_worker"
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
