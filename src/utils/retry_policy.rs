// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

/// 重试策略配置
///
/// 抓取引擎的重试封装使用线性退避：第n次尝试失败后休眠
/// `delay * n`，总尝试次数为`max_retries + 1`。
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大重试次数（首次尝试之外的次数）
    pub max_retries: u32,
    /// 基础延迟，线性退避的系数
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// 创建线性退避重试策略
    pub fn linear(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// 计算第attempt次尝试失败后的退避时间
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.delay.saturating_mul(attempt)
    }

    /// 是否还应重试
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt <= self.max_retries
    }
}
