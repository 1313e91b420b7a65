// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 爬虫任务实体
///
/// 表示系统中一个持久化的抓取工作单元。任务绑定一个提取策略，
/// 具有状态生命周期、重试配置和执行统计等属性。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpiderTask {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 任务类型，决定任务的处理方式
    pub task_type: TaskType,
    /// 任务状态，跟踪任务在其生命周期中的当前阶段
    pub status: TaskStatus,
    /// 创建时间，任务创建的时间戳
    pub created_at: DateTime<Utc>,
    /// 更新时间，任务信息最后更新的时间戳
    pub updated_at: DateTime<Utc>,
    /// 目标URL列表，创建后不可变（至少一个）
    pub urls: Vec<String>,
    /// 绑定的提取策略名称
    pub strategy_name: String,
    /// HTTP请求方法
    pub method: HttpMethod,
    /// 请求超时时间（秒）
    pub timeout_seconds: u64,
    /// 最大重试次数
    pub max_retries: u32,
    /// 重试基础延迟（秒），线性退避的系数
    pub retry_delay_seconds: f64,
    /// 执行进度（0-100），单调不减
    pub progress: f64,
    /// 已处理URL数量
    pub processed_count: u32,
    /// 成功数量
    pub success_count: u32,
    /// 失败数量
    pub fail_count: u32,
    /// 错误信息，任务失败时记录
    pub error_message: Option<String>,
    /// 执行耗时（秒），从认领到终态的墙钟时间
    pub execution_time_seconds: Option<f64>,
}

/// 任务类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// 单URL抓取任务
    #[default]
    Single,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskType::Single => write!(f, "single"),
        }
    }
}

impl FromStr for TaskType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(TaskType::Single),
            _ => Err(()),
        }
    }
}

/// 任务状态枚举
///
/// 状态转换只允许向前：
/// Pending → Running → Completed/Failed
/// Cancelled 仅可从 Pending 或 Running 到达
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// 待处理，任务已创建但尚未被认领
    #[default]
    Pending,
    /// 运行中，任务已被执行器认领
    Running,
    /// 已完成
    Completed,
    /// 已失败
    Failed,
    /// 已取消
    Cancelled,
}

impl TaskStatus {
    /// 判断是否为终态（不再参与调度）
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "running" => Ok(TaskStatus::Running),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// HTTP请求方法枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Delete => write!(f, "DELETE"),
            HttpMethod::Head => write!(f, "HEAD"),
            HttpMethod::Options => write!(f, "OPTIONS"),
        }
    }
}

impl FromStr for HttpMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(()),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 无效的状态转换，当任务状态转换不符合生命周期规则时发生
    #[error("Invalid state transition")]
    InvalidStateTransition,

    /// 验证错误，当输入数据不符合领域规则时发生
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl SpiderTask {
    /// 创建单URL抓取任务
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    /// * `strategy_name` - 提取策略名称
    /// * `method` - HTTP请求方法
    /// * `timeout_seconds` - 请求超时时间
    /// * `max_retries` - 最大重试次数
    /// * `retry_delay_seconds` - 重试基础延迟
    ///
    /// # 返回值
    ///
    /// 返回处于Pending状态、进度为0的新任务
    pub fn create_single_task(
        url: impl Into<String>,
        strategy_name: impl Into<String>,
        method: HttpMethod,
        timeout_seconds: u64,
        max_retries: u32,
        retry_delay_seconds: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            task_type: TaskType::Single,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
            urls: vec![url.into()],
            strategy_name: strategy_name.into(),
            method,
            timeout_seconds,
            max_retries,
            retry_delay_seconds,
            progress: 0.0,
            processed_count: 0,
            success_count: 0,
            fail_count: 0,
            error_message: None,
            execution_time_seconds: None,
        }
    }

    /// 启动任务
    ///
    /// 将任务状态从Pending变更为Running
    ///
    /// # 返回值
    ///
    /// * `Ok(SpiderTask)` - 成功启动的任务
    /// * `Err(DomainError)` - 状态转换失败
    pub fn start(mut self) -> Result<Self, DomainError> {
        match self.status {
            TaskStatus::Pending => {
                self.status = TaskStatus::Running;
                self.updated_at = Utc::now();
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 完成任务
    ///
    /// 将任务状态从Running变更为Completed，进度置为100
    ///
    /// # 返回值
    ///
    /// * `Ok(SpiderTask)` - 成功完成的任务
    /// * `Err(DomainError)` - 状态转换失败
    pub fn complete(mut self, execution_time_seconds: f64) -> Result<Self, DomainError> {
        match self.status {
            TaskStatus::Running => {
                self.status = TaskStatus::Completed;
                self.progress = 100.0;
                self.execution_time_seconds = Some(execution_time_seconds);
                self.updated_at = Utc::now();
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 标记任务失败
    ///
    /// 将任务状态从Running变更为Failed并记录错误信息
    ///
    /// # 返回值
    ///
    /// * `Ok(SpiderTask)` - 失败的任务
    /// * `Err(DomainError)` - 状态转换失败
    pub fn fail(
        mut self,
        error_message: impl Into<String>,
        execution_time_seconds: f64,
    ) -> Result<Self, DomainError> {
        match self.status {
            TaskStatus::Running => {
                self.status = TaskStatus::Failed;
                self.progress = 100.0;
                self.error_message = Some(error_message.into());
                self.execution_time_seconds = Some(execution_time_seconds);
                self.updated_at = Utc::now();
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 取消任务
    ///
    /// 将任务状态变更为Cancelled，仅允许从Pending或Running到达
    ///
    /// # 返回值
    ///
    /// * `Ok(SpiderTask)` - 已取消的任务
    /// * `Err(DomainError)` - 状态转换失败
    pub fn cancel(mut self) -> Result<Self, DomainError> {
        match self.status {
            TaskStatus::Pending | TaskStatus::Running => {
                self.status = TaskStatus::Cancelled;
                self.updated_at = Utc::now();
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 更新任务进度
    ///
    /// 进度按已处理URL占比计算，且保证单调不减
    pub fn update_progress(&mut self, processed_count: u32, success_count: u32, fail_count: u32) {
        self.processed_count = processed_count;
        self.success_count = success_count;
        self.fail_count = fail_count;

        if !self.urls.is_empty() {
            let next = (processed_count as f64 / self.urls.len() as f64) * 100.0;
            self.progress = self.progress.max(next.min(100.0));
        }

        self.updated_at = Utc::now();
    }

    /// 序列化为JSON字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 从JSON字符串反序列化任务
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_task() -> SpiderTask {
        SpiderTask::create_single_task(
            "https://example.com",
            "default",
            HttpMethod::Get,
            10,
            3,
            1.0,
        )
    }

    #[test]
    fn test_create_single_task_defaults() {
        let task = new_task();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0.0);
        assert_eq!(task.task_type, TaskType::Single);
        assert_eq!(task.urls, vec!["https://example.com".to_string()]);
        assert_eq!(task.processed_count, 0);
        assert!(task.error_message.is_none());
    }

    #[test]
    fn test_task_lifecycle_happy_path() {
        let task = new_task();
        let running = task.start().unwrap();
        assert_eq!(running.status, TaskStatus::Running);

        let completed = running.complete(0.5).unwrap();
        assert_eq!(completed.status, TaskStatus::Completed);
        assert_eq!(completed.progress, 100.0);
        assert_eq!(completed.execution_time_seconds, Some(0.5));
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        // Pending任务不能直接完成
        let task = new_task();
        assert!(task.complete(0.1).is_err());

        // 终态任务不能再取消
        let task = new_task().start().unwrap().fail("boom", 0.1).unwrap();
        assert!(task.cancel().is_err());
    }

    #[test]
    fn test_cancel_from_pending_and_running() {
        let task = new_task();
        assert!(task.cancel().is_ok());

        let task = new_task().start().unwrap();
        assert!(task.cancel().is_ok());
    }

    #[test]
    fn test_progress_monotonic() {
        let mut task = new_task().start().unwrap();
        task.update_progress(1, 1, 0);
        assert_eq!(task.progress, 100.0);

        // 回退的进度更新不会降低已记录的进度
        task.update_progress(0, 0, 0);
        assert_eq!(task.progress, 100.0);
    }

    #[test]
    fn test_json_round_trip() {
        let mut task = new_task();
        task.error_message = Some("connect refused".to_string());
        task.execution_time_seconds = Some(1.25);

        let json = task.to_json().unwrap();
        let restored = SpiderTask::from_json(&json).unwrap();
        assert_eq!(task, restored);
    }

    #[test]
    fn test_enum_string_representation() {
        let json = serde_json::to_value(&new_task()).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["task_type"], "single");
        assert_eq!(json["method"], "GET");

        assert_eq!("running".parse::<TaskStatus>(), Ok(TaskStatus::Running));
        assert_eq!("POST".parse::<HttpMethod>(), Ok(HttpMethod::Post));
        assert!("fetch".parse::<HttpMethod>().is_err());
    }
}
