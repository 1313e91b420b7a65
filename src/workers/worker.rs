// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::WorkerError;
use async_trait::async_trait;

/// 后台工作器特质
///
/// 执行工作器和清理工作器的公共接口，由WorkerManager统一启动
#[async_trait]
pub trait Worker: Send + Sync {
    /// 运行工作器主循环，正常情况下不返回
    async fn run(&self) -> Result<(), WorkerError>;

    /// 工作器名称，用于日志标识
    fn name(&self) -> &str;
}
