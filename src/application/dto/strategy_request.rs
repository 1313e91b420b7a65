// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

/// 创建策略请求
#[derive(Debug, Deserialize, Validate)]
pub struct CreateStrategyRequestDto {
    /// 策略名称（亦即文件名）
    #[validate(length(min = 1))]
    pub strategy_name: String,
    /// 完整的策略源文本
    #[validate(length(min = 1))]
    pub strategy_code: String,
}

/// 编辑策略请求
#[derive(Debug, Deserialize, Validate)]
pub struct EditStrategyRequestDto {
    /// 更新后的策略源文本
    #[validate(length(min = 1))]
    pub strategy_code: String,
}

/// 策略列表响应
#[derive(Debug, Serialize)]
pub struct StrategyListDto {
    /// 名称 → 显示标签
    pub strategies: BTreeMap<String, String>,
    /// 数量
    pub count: usize,
}

/// 策略源响应
#[derive(Debug, Serialize)]
pub struct StrategyCodeDto {
    /// 策略名称
    pub strategy_name: String,
    /// 策略源文本
    pub strategy_code: String,
}
