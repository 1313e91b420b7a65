// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::api_response::ApiResponse;
use crate::application::dto::crawl_request::{
    CrawlSingleRequestDto, CrawlSingleResponseDto, TaskListQueryDto,
};
use crate::config::settings::Settings;
use crate::domain::models::task::{SpiderTask, TaskStatus, TaskType};
use crate::domain::repositories::task_repository::{TaskRepository, TaskStats};
use crate::domain::services::spider_service::{CreateTaskParams, SpiderService};
use crate::presentation::errors::{bad_request, ApiError};
use axum::extract::{Extension, Path, Query};
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 创建单URL抓取任务
///
/// 任务受理后立即返回任务ID，由后台执行器处理；
/// 缺省的超时和重试参数取自系统配置
pub async fn create_crawl_task<R>(
    Extension(service): Extension<Arc<SpiderService<R>>>,
    Extension(settings): Extension<Arc<Settings>>,
    Json(request): Json<CrawlSingleRequestDto>,
) -> Result<Json<ApiResponse<CrawlSingleResponseDto>>, ApiError>
where
    R: TaskRepository + Send + Sync,
{
    request.validate().map_err(bad_request)?;

    let task = service
        .create_single_task(CreateTaskParams {
            url: request.url,
            strategy_name: request.strategy_name,
            method: request.method,
            timeout_seconds: request.timeout.unwrap_or(settings.fetch.timeout_secs),
            max_retries: request.max_retries.unwrap_or(settings.fetch.max_retries),
            retry_delay_seconds: request.delay.unwrap_or(settings.fetch.retry_delay_secs),
        })
        .await?;

    let response = CrawlSingleResponseDto {
        success: true,
        status_code: 202,
        extracted_data: None,
        error_message: None,
        task_id: task.id,
    };

    Ok(Json(ApiResponse::ok("Task created", response)))
}

/// 查询任务状态
pub async fn get_task_status<R>(
    Extension(service): Extension<Arc<SpiderService<R>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SpiderTask>>, ApiError>
where
    R: TaskRepository + Send + Sync,
{
    let task = service.get_task(id).await?;
    Ok(Json(ApiResponse::ok("Task retrieved", task)))
}

/// 列出任务
pub async fn list_tasks<R>(
    Extension(service): Extension<Arc<SpiderService<R>>>,
    Query(query): Query<TaskListQueryDto>,
) -> Result<Json<ApiResponse<Vec<SpiderTask>>>, ApiError>
where
    R: TaskRepository + Send + Sync,
{
    let status = match &query.status {
        Some(raw) => Some(
            raw.parse::<TaskStatus>()
                .map_err(|_| bad_request(format!("Unknown task status '{}'", raw)))?,
        ),
        None => None,
    };
    let task_type = match &query.task_type {
        Some(raw) => Some(
            raw.parse::<TaskType>()
                .map_err(|_| bad_request(format!("Unknown task type '{}'", raw)))?,
        ),
        None => None,
    };

    let tasks = service.list_tasks(status, task_type, query.limit).await?;
    Ok(Json(ApiResponse::ok("Tasks retrieved", tasks)))
}

/// 取消待处理任务
pub async fn cancel_task<R>(
    Extension(service): Extension<Arc<SpiderService<R>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SpiderTask>>, ApiError>
where
    R: TaskRepository + Send + Sync,
{
    let task = service.cancel_task(id).await?;
    Ok(Json(ApiResponse::ok("Task cancelled", task)))
}

/// 任务统计
pub async fn task_stats<R>(
    Extension(service): Extension<Arc<SpiderService<R>>>,
) -> Result<Json<ApiResponse<TaskStats>>, ApiError>
where
    R: TaskRepository + Send + Sync,
{
    let stats = service.task_stats().await?;
    Ok(Json(ApiResponse::ok("Task stats retrieved", stats)))
}
