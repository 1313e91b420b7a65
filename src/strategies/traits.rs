// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// 解析错误类型
#[derive(Error, Debug)]
pub enum ParseError {
    /// 内容解析失败
    #[error("Parse failed: {0}")]
    Failed(String),
}

/// 提取策略特质
///
/// 一个策略绑定可选的起始URL和一个纯解析函数。策略实例由
/// 注册表共享持有，解析实现必须无副作用且线程安全。
pub trait Strategy: Send + Sync {
    /// 策略名称，注册表中的主键
    fn name(&self) -> &str;

    /// 显示标签（来源类型标识），用于对外列表
    fn label(&self) -> &str;

    /// 策略绑定的起始URL
    fn start_url(&self) -> Option<&str> {
        None
    }

    /// 解析响应内容并提取数据
    ///
    /// # 参数
    ///
    /// * `raw_content` - 原始HTML/文本内容
    /// * `url` - 实际请求的URL
    /// * `headers` - 响应头信息
    ///
    /// # 返回值
    ///
    /// * `Ok(Value)` - 提取的结构化数据
    /// * `Err(ParseError)` - 解析失败
    fn parse(
        &self,
        raw_content: &str,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<Value, ParseError>;
}
