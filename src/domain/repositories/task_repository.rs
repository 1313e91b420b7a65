// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::{SpiderTask, TaskStatus, TaskType};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 持久化错误
    #[error("Persistence error: {0}")]
    Persistence(String),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 任务统计信息
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TaskStats {
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
}

/// 任务仓库特质
///
/// 定义任务数据访问接口，记录按当前状态物理分区存储
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// 创建新任务
    async fn create(&self, task: &SpiderTask) -> Result<(), RepositoryError>;

    /// 根据ID查找任务，扫描所有状态分区
    async fn find_by_id(&self, id: Uuid) -> Result<Option<SpiderTask>, RepositoryError>;

    /// 更新任务，状态变化时在分区间迁移记录
    async fn update(&self, task: &SpiderTask) -> Result<(), RepositoryError>;

    /// 删除任务记录
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;

    /// 列出任务，按创建时间降序排序
    async fn list(
        &self,
        status: Option<TaskStatus>,
        task_type: Option<TaskType>,
        limit: Option<usize>,
    ) -> Result<Vec<SpiderTask>, RepositoryError>;

    /// 认领下一个待处理任务
    ///
    /// 读取一个Pending任务，立即标记为Running并持久化后返回。
    /// 认领步骤在多进程间不是原子的，部署约束为每个任务目录
    /// 最多一个执行器实例。
    async fn acquire_next(&self) -> Result<Option<SpiderTask>, RepositoryError>;

    /// 清理过期的终态任务
    ///
    /// 仅删除最后修改时间早于截止点的Completed/Failed任务，
    /// 单文件失败不中断整批，返回删除数量
    async fn cleanup(&self, older_than_days: u32) -> Result<usize, RepositoryError>;

    /// 按状态统计任务数量
    async fn stats(&self) -> Result<TaskStats, RepositoryError>;
}
