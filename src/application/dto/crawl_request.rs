// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::HttpMethod;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

fn default_strategy_name() -> String {
    "default".to_string()
}

/// 单URL抓取任务请求
///
/// 超时和重试参数缺省时使用系统配置的默认值
#[derive(Debug, Deserialize, Validate)]
pub struct CrawlSingleRequestDto {
    /// 目标URL
    #[validate(length(min = 1, message = "url cannot be empty"))]
    pub url: String,
    /// 策略名称
    #[serde(default = "default_strategy_name")]
    pub strategy_name: String,
    /// HTTP请求方法
    #[serde(default)]
    pub method: HttpMethod,
    /// 请求超时时间（秒）
    #[serde(default)]
    #[validate(range(min = 1, max = 300))]
    pub timeout: Option<u64>,
    /// 最大重试次数
    #[serde(default)]
    #[validate(range(max = 10))]
    pub max_retries: Option<u32>,
    /// 重试基础延迟（秒）
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub delay: Option<f64>,
}

/// 任务创建响应
#[derive(Debug, Serialize)]
pub struct CrawlSingleResponseDto {
    /// 是否成功
    pub success: bool,
    /// 状态码（任务受理为202）
    pub status_code: u16,
    /// 提取数据，任务受理阶段为空
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<serde_json::Value>,
    /// 错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// 任务ID
    pub task_id: Uuid,
}

/// 任务列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQueryDto {
    /// 状态过滤
    pub status: Option<String>,
    /// 类型过滤
    pub task_type: Option<String>,
    /// 数量上限
    pub limit: Option<usize>,
}
