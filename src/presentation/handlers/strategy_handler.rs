// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::api_response::ApiResponse;
use crate::application::dto::strategy_request::{
    CreateStrategyRequestDto, EditStrategyRequestDto, StrategyCodeDto, StrategyListDto,
};
use crate::domain::repositories::task_repository::TaskRepository;
use crate::domain::services::spider_service::SpiderService;
use crate::presentation::errors::{bad_request, ApiError};
use axum::extract::{Extension, Path};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

/// 列出全部可用策略
pub async fn list_strategies<R>(
    Extension(service): Extension<Arc<SpiderService<R>>>,
) -> Result<Json<ApiResponse<StrategyListDto>>, ApiError>
where
    R: TaskRepository + Send + Sync,
{
    let strategies = service.list_strategies();
    let count = strategies.len();
    Ok(Json(ApiResponse::ok(
        "Available strategies retrieved",
        StrategyListDto { strategies, count },
    )))
}

/// 读取策略源文本
pub async fn get_strategy_code<R>(
    Extension(service): Extension<Arc<SpiderService<R>>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<StrategyCodeDto>>, ApiError>
where
    R: TaskRepository + Send + Sync,
{
    let code = service.get_strategy_source(&name)?;
    Ok(Json(ApiResponse::ok(
        "Strategy code retrieved",
        StrategyCodeDto {
            strategy_name: name,
            strategy_code: code,
        },
    )))
}

/// 创建新策略
pub async fn create_strategy<R>(
    Extension(service): Extension<Arc<SpiderService<R>>>,
    Json(request): Json<CreateStrategyRequestDto>,
) -> Result<Json<ApiResponse<Value>>, ApiError>
where
    R: TaskRepository + Send + Sync,
{
    request.validate().map_err(bad_request)?;

    service.create_strategy(&request.strategy_name, &request.strategy_code)?;
    Ok(Json(ApiResponse::ok(
        "Strategy created",
        json!({"strategy_name": request.strategy_name}),
    )))
}

/// 编辑已有策略
pub async fn edit_strategy<R>(
    Extension(service): Extension<Arc<SpiderService<R>>>,
    Path(name): Path<String>,
    Json(request): Json<EditStrategyRequestDto>,
) -> Result<Json<ApiResponse<Value>>, ApiError>
where
    R: TaskRepository + Send + Sync,
{
    request.validate().map_err(bad_request)?;

    service.edit_strategy(&name, &request.strategy_code)?;
    Ok(Json(ApiResponse::ok(
        "Strategy updated",
        json!({"strategy_name": name}),
    )))
}

/// 删除策略
pub async fn delete_strategy<R>(
    Extension(service): Extension<Arc<SpiderService<R>>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<Value>>, ApiError>
where
    R: TaskRepository + Send + Sync,
{
    service.delete_strategy(&name)?;
    Ok(Json(ApiResponse::ok(
        "Strategy deleted",
        json!({"strategy_name": name}),
    )))
}

/// 重载全部策略
pub async fn reload_strategies<R>(
    Extension(service): Extension<Arc<SpiderService<R>>>,
) -> Result<Json<ApiResponse<Value>>, ApiError>
where
    R: TaskRepository + Send + Sync,
{
    let count = service.reload_strategies();
    Ok(Json(ApiResponse::ok(
        "Strategies reloaded",
        json!({"count": count}),
    )))
}
