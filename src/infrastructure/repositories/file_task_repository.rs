// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::{SpiderTask, TaskStatus, TaskType};
use crate::domain::repositories::task_repository::{RepositoryError, TaskRepository, TaskStats};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// 状态分区目录名，按查找扫描顺序排列
const PARTITIONS: [&str; 4] = ["pending", "running", "completed", "failed"];

/// 文件系统任务仓库
///
/// 每个任务持久化为一个自描述JSON文档，按当前状态分目录存放，
/// 便于按状态过滤扫描。按ID查找的代价为 O(分区数)。
pub struct FileTaskRepository {
    base_dir: PathBuf,
}

impl FileTaskRepository {
    /// 创建新的文件系统任务仓库实例
    ///
    /// # 参数
    ///
    /// * `base_dir` - 任务记录根目录，分区子目录会被自动创建
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let base_dir = base_dir.into();
        for partition in PARTITIONS {
            std::fs::create_dir_all(base_dir.join(partition))?;
        }
        Ok(Self { base_dir })
    }

    /// 状态对应的分区目录，Cancelled记录与Failed同目录存放
    fn partition_dir(&self, status: TaskStatus) -> PathBuf {
        let name = match status {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed | TaskStatus::Cancelled => "failed",
        };
        self.base_dir.join(name)
    }

    fn record_path(&self, id: Uuid, status: TaskStatus) -> PathBuf {
        self.partition_dir(status).join(format!("{}.json", id))
    }

    /// 按固定扫描顺序查找任务文件
    ///
    /// 迁移窗口内可能短暂存在跨分区重复记录，按扫描顺序取第一个
    async fn find_record_path(&self, id: Uuid) -> Option<PathBuf> {
        let file_name = format!("{}.json", id);
        for partition in PARTITIONS {
            let path = self.base_dir.join(partition).join(&file_name);
            if fs::try_exists(&path).await.unwrap_or(false) {
                return Some(path);
            }
        }
        None
    }

    /// 原子替换写入：先写临时文件再重命名
    async fn write_record(&self, path: &Path, task: &SpiderTask) -> Result<(), RepositoryError> {
        let json = task.to_json()?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json.as_bytes())
            .await
            .map_err(|e| RepositoryError::Persistence(format!("write {}: {}", path.display(), e)))?;
        fs::rename(&tmp_path, path)
            .await
            .map_err(|e| RepositoryError::Persistence(format!("rename {}: {}", path.display(), e)))
    }

    async fn read_record(&self, path: &Path) -> Result<SpiderTask, RepositoryError> {
        let content = fs::read_to_string(path).await?;
        Ok(SpiderTask::from_json(&content)?)
    }

    /// 读取一个分区内的全部任务，损坏的记录跳过并告警
    async fn read_partition(&self, dir: &Path) -> Result<Vec<SpiderTask>, RepositoryError> {
        let mut tasks = Vec::new();
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read_record(&path).await {
                Ok(task) => tasks.push(task),
                Err(e) => {
                    warn!("Skipping unreadable task record {}: {}", path.display(), e);
                }
            }
        }
        Ok(tasks)
    }
}

#[async_trait]
impl TaskRepository for FileTaskRepository {
    async fn create(&self, task: &SpiderTask) -> Result<(), RepositoryError> {
        let path = self.record_path(task.id, task.status);
        self.write_record(&path, task).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SpiderTask>, RepositoryError> {
        match self.find_record_path(id).await {
            Some(path) => Ok(Some(self.read_record(&path).await?)),
            None => Ok(None),
        }
    }

    /// 更新任务记录
    ///
    /// 状态变化时先写入新分区，再删除旧分区记录。旧记录删除失败
    /// 不回滚新写入（at-least-once语义），跨分区重复在下次读取时
    /// 按扫描顺序自愈。
    async fn update(&self, task: &SpiderTask) -> Result<(), RepositoryError> {
        let old_path = self.find_record_path(task.id).await;
        let new_path = self.record_path(task.id, task.status);

        self.write_record(&new_path, task).await?;

        if let Some(old) = old_path {
            if old != new_path {
                if let Err(e) = fs::remove_file(&old).await {
                    warn!(
                        "Failed to remove stale task record {}: {}",
                        old.display(),
                        e
                    );
                }
            }
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        match self.find_record_path(id).await {
            Some(path) => {
                fs::remove_file(&path).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(
        &self,
        status: Option<TaskStatus>,
        task_type: Option<TaskType>,
        limit: Option<usize>,
    ) -> Result<Vec<SpiderTask>, RepositoryError> {
        let dirs: Vec<PathBuf> = match status {
            Some(s) => vec![self.partition_dir(s)],
            None => PARTITIONS.iter().map(|p| self.base_dir.join(p)).collect(),
        };

        let mut tasks = Vec::new();
        for dir in dirs {
            tasks.extend(self.read_partition(&dir).await?);
        }

        // Cancelled记录与Failed同分区，状态过滤需要精确匹配
        if let Some(s) = status {
            tasks.retain(|t| t.status == s);
        }
        if let Some(t) = task_type {
            tasks.retain(|task| task.task_type == t);
        }

        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        if let Some(limit) = limit {
            tasks.truncate(limit);
        }

        Ok(tasks)
    }

    async fn acquire_next(&self) -> Result<Option<SpiderTask>, RepositoryError> {
        let pending = self.list(Some(TaskStatus::Pending), None, Some(1)).await?;
        let Some(task) = pending.into_iter().next() else {
            return Ok(None);
        };

        // 先标记Running并持久化再返回，认领后崩溃会留下可观测的Running记录
        let claimed = task
            .start()
            .map_err(|e| RepositoryError::Persistence(e.to_string()))?;
        self.update(&claimed).await?;

        debug!("Claimed task {}", claimed.id);
        Ok(Some(claimed))
    }

    async fn cleanup(&self, older_than_days: u32) -> Result<usize, RepositoryError> {
        let cutoff = SystemTime::now() - Duration::from_secs(u64::from(older_than_days) * 86_400);
        let mut removed = 0usize;

        for partition in ["completed", "failed"] {
            let dir = self.base_dir.join(partition);
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Cleanup cannot read {}: {}", dir.display(), e);
                    continue;
                }
            };

            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }

                let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                    Ok(modified) => modified,
                    Err(e) => {
                        warn!("Cleanup cannot stat {}: {}", path.display(), e);
                        continue;
                    }
                };

                if modified < cutoff {
                    match fs::remove_file(&path).await {
                        Ok(()) => removed += 1,
                        Err(e) => warn!("Cleanup cannot remove {}: {}", path.display(), e),
                    }
                }
            }
        }

        Ok(removed)
    }

    async fn stats(&self) -> Result<TaskStats, RepositoryError> {
        let mut stats = TaskStats::default();
        for task in self.list(None, None, None).await? {
            match task.status {
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::Running => stats.running += 1,
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Failed | TaskStatus::Cancelled => stats.failed += 1,
            }
            stats.total += 1;
        }
        Ok(stats)
    }
}
