// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::task::HttpMethod;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// 抓取请求
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// 目标URL
    pub url: String,
    /// HTTP请求方法
    pub method: HttpMethod,
    /// 请求头
    pub headers: HashMap<String, String>,
    /// URL查询参数
    pub params: HashMap<String, String>,
    /// 请求体
    pub body: Option<Value>,
    /// 超时时间
    pub timeout: Duration,
    /// 最大重试次数（仅fetch_with_retry使用）
    pub max_retries: u32,
    /// 重试基础延迟（仅fetch_with_retry使用）
    pub retry_delay: Duration,
}

impl FetchRequest {
    /// 创建GET请求，使用默认的重试配置
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: HashMap::new(),
            params: HashMap::new(),
            body: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// 抓取结果
///
/// 每次尝试产生一个，交给解析器后即弃；除任务摘要字段外不持久化。
/// `success`仅表示传输层是否拿到了响应，HTTP状态语义由调用方判断。
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// 实际响应的URL（重定向后）
    pub final_url: String,
    /// HTTP状态码，传输层失败时为0
    pub status_code: u16,
    /// 传输层是否成功
    pub success: bool,
    /// 解码后的响应内容
    pub raw_content: String,
    /// 内容长度
    pub content_length: usize,
    /// 检测到的内容编码
    pub encoding: String,
    /// 响应头
    pub response_headers: HashMap<String, String>,
    /// 响应耗时（秒）
    pub response_time_seconds: f64,
    /// 错误信息，传输层失败时记录
    pub error_message: Option<String>,
}

impl FetchResult {
    /// 构造传输层失败结果
    pub fn transport_failure(
        url: impl Into<String>,
        error_message: impl Into<String>,
        response_time_seconds: f64,
    ) -> Self {
        Self {
            final_url: url.into(),
            status_code: 0,
            success: false,
            raw_content: String::new(),
            content_length: 0,
            encoding: String::new(),
            response_headers: HashMap::new(),
            response_time_seconds,
            error_message: Some(error_message.into()),
        }
    }
}
