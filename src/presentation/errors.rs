// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;

use crate::domain::repositories::task_repository::RepositoryError;
use crate::domain::services::spider_service::ServiceError;
use crate::strategies::source_store::SourceStoreError;

/// 应用错误类型
///
/// 将服务层错误映射为统一的HTTP错误响应
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ServiceError::InvalidParameter(_) => (StatusCode::BAD_REQUEST, "INVALID_PARAMETER"),
            ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ServiceError::Source(source) => match source {
                SourceStoreError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                SourceStoreError::AlreadyExists(_) => (StatusCode::CONFLICT, "ALREADY_EXISTS"),
                SourceStoreError::Protected(_) => (StatusCode::FORBIDDEN, "PROTECTED"),
                SourceStoreError::InvalidName(_) => (StatusCode::BAD_REQUEST, "INVALID_NAME"),
                SourceStoreError::Io(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR")
                }
            },
            ServiceError::Repository(RepositoryError::NotFound) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            ServiceError::Repository(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR")
            }
        };

        let mut body = json!({
            "success": false,
            "message": self.0.to_string(),
            "error_code": error_code,
            "timestamp": Utc::now().to_rfc3339(),
        });

        // 校验失败时附带结构化错误明细
        if let ServiceError::Validation(report) = &self.0 {
            body["errors"] = serde_json::to_value(&report.errors).unwrap_or_default();
        }

        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

/// 请求DTO校验失败的快捷错误响应
pub fn bad_request(message: impl std::fmt::Display) -> ApiError {
    ApiError(ServiceError::InvalidParameter(message.to_string()))
}
