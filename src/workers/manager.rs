// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::workers::worker::Worker;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
///
/// 持有所有后台工作器的任务句柄。执行工作器部署约束为
/// 每个任务目录最多一个实例，认领步骤在多进程间不是原子的。
#[derive(Default)]
pub struct WorkerManager {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 启动一个后台工作器
    pub fn spawn<W>(&mut self, worker: W)
    where
        W: Worker + 'static,
    {
        let handle = tokio::spawn(async move {
            let name = worker.name().to_string();
            if let Err(e) = worker.run().await {
                error!("Worker {} exited with error: {}", name, e);
            }
        });
        self.handles.push(handle);
    }

    /// 当前持有的工作器数量
    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// 停止全部工作器
    pub fn shutdown(self) {
        info!("Shutting down {} workers", self.handles.len());
        for handle in self.handles {
            handle.abort();
        }
    }
}
