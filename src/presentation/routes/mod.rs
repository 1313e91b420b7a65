// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::infrastructure::repositories::file_task_repository::FileTaskRepository;
use crate::presentation::handlers::{strategy_handler, task_handler};
use axum::{
    routing::{delete, get, post, put},
    Router,
};

/// 创建应用路由
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let api_routes = Router::new()
        .route(
            "/v1/crawl/single",
            post(task_handler::create_crawl_task::<FileTaskRepository>),
        )
        .route(
            "/v1/tasks",
            get(task_handler::list_tasks::<FileTaskRepository>),
        )
        .route(
            "/v1/tasks/stats",
            get(task_handler::task_stats::<FileTaskRepository>),
        )
        .route(
            "/v1/tasks/{id}",
            get(task_handler::get_task_status::<FileTaskRepository>),
        )
        .route(
            "/v1/tasks/{id}",
            delete(task_handler::cancel_task::<FileTaskRepository>),
        )
        .route(
            "/v1/strategies",
            get(strategy_handler::list_strategies::<FileTaskRepository>),
        )
        .route(
            "/v1/strategies",
            post(strategy_handler::create_strategy::<FileTaskRepository>),
        )
        .route(
            "/v1/strategies/reload",
            post(strategy_handler::reload_strategies::<FileTaskRepository>),
        )
        .route(
            "/v1/strategies/{name}",
            get(strategy_handler::get_strategy_code::<FileTaskRepository>),
        )
        .route(
            "/v1/strategies/{name}",
            put(strategy_handler::edit_strategy::<FileTaskRepository>),
        )
        .route(
            "/v1/strategies/{name}",
            delete(strategy_handler::delete_strategy::<FileTaskRepository>),
        );

    Router::new().merge(public_routes).merge(api_routes)
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
