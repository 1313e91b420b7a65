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

use axum::Extension;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use webcraft::config::settings::Settings;
use webcraft::domain::services::spider_service::SpiderService;
use webcraft::engines::fetch_engine::FetchEngine;
use webcraft::infrastructure::repositories::file_task_repository::FileTaskRepository;
use webcraft::presentation::routes;
use webcraft::strategies::registry::StrategyRegistry;
use webcraft::strategies::source_store::StrategySourceStore;
use webcraft::utils::telemetry;
use webcraft::workers::cleanup_worker::CleanupWorker;
use webcraft::workers::crawl_worker::CrawlWorker;
use webcraft::workers::manager::WorkerManager;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting webcraft...");

    // Initialize Prometheus Metrics
    webcraft::infrastructure::metrics::init_metrics();

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // 3. Initialize long-lived components, passed by handle from here on
    let repository = Arc::new(FileTaskRepository::new(&settings.tasks.dir)?);
    let registry = Arc::new(StrategyRegistry::new(&settings.strategies.dir));
    let engine = Arc::new(FetchEngine::new(&settings.fetch.user_agent));
    let sources = StrategySourceStore::new(&settings.strategies.dir)?;
    info!("Task store and strategy registry initialized");

    let service = Arc::new(SpiderService::new(
        repository.clone(),
        registry.clone(),
        sources,
    ));

    // 4. Start workers
    // 认领步骤在多进程间不是原子的，执行器只启动一个实例
    let mut worker_manager = WorkerManager::new();
    worker_manager.spawn(CrawlWorker::new(
        repository.clone(),
        registry.clone(),
        engine.clone(),
        Duration::from_secs(settings.tasks.poll_interval_secs),
    ));
    worker_manager.spawn(CleanupWorker::new(
        repository.clone(),
        Duration::from_secs(settings.tasks.cleanup_interval_secs),
        settings.tasks.retention_days,
    ));
    info!("{} workers started", worker_manager.worker_count());

    // 5. Start HTTP server
    let app = routes::routes()
        .layer(Extension(service))
        .layer(Extension(settings.clone()))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
