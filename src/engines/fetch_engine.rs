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
use crate::engines::traits::{FetchRequest, FetchResult};
use crate::utils::retry_policy::RetryPolicy;
use crate::utils::text_encoding;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, warn};

/// 抓取引擎
///
/// 基于reqwest的HTTP抓取引擎。每次调用执行一次网络请求，
/// 传输层失败（连接拒绝、超时、DNS失败）转换为
/// `success=false, status_code=0`的结果，永不向调用方抛错。
pub struct FetchEngine {
    user_agent: String,
}

impl Default for FetchEngine {
    fn default() -> Self {
        Self::new("Mozilla/5.0 (compatible; webcraft/1.0; +http://webcraft.dev)")
    }
}

impl FetchEngine {
    /// 创建新的抓取引擎实例
    ///
    /// # 参数
    ///
    /// * `user_agent` - 请求使用的User-Agent
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }

    /// 执行单次HTTP抓取
    ///
    /// # 参数
    ///
    /// * `request` - 抓取请求
    ///
    /// # 返回值
    ///
    /// 抓取结果；HTTP层的4xx/5xx响应仍视为传输成功
    pub async fn fetch(&self, request: &FetchRequest) -> FetchResult {
        let start = Instant::now();
        metrics::counter!("webcraft_fetch_attempts_total").increment(1);

        // Each request gets a fresh client for cookie isolation
        let client = match reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(request.timeout)
            .cookie_store(true)
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                return FetchResult::transport_failure(
                    &request.url,
                    format!("Failed to build client: {}", e),
                    start.elapsed().as_secs_f64(),
                );
            }
        };

        let mut headers = HeaderMap::new();
        for (k, v) in &request.headers {
            if let (Ok(k), Ok(v)) = (
                HeaderName::from_bytes(k.as_bytes()),
                HeaderValue::from_str(v),
            ) {
                headers.insert(k, v);
            }
        }

        let mut builder = client
            .request(Self::method(request.method), &request.url)
            .headers(headers);

        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Fetch failed for {}: {}", request.url, e);
                return FetchResult::transport_failure(
                    &request.url,
                    e.to_string(),
                    start.elapsed().as_secs_f64(),
                );
            }
        };

        let final_url = response.url().to_string();
        let status_code = response.status().as_u16();

        let mut response_headers = HashMap::new();
        for (k, v) in response.headers() {
            if let Ok(v_str) = v.to_str() {
                response_headers.insert(k.as_str().to_string(), v_str.to_string());
            }
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                return FetchResult::transport_failure(
                    &final_url,
                    format!("Failed to read response body: {}", e),
                    start.elapsed().as_secs_f64(),
                );
            }
        };

        let content_type = response_headers.get("content-type").map(String::as_str);
        let (raw_content, encoding) = text_encoding::decode_body(&bytes, content_type);

        FetchResult {
            final_url,
            status_code,
            success: true,
            content_length: raw_content.len(),
            raw_content,
            encoding,
            response_headers,
            response_time_seconds: start.elapsed().as_secs_f64(),
            error_message: None,
        }
    }

    /// 带重试的抓取
    ///
    /// 最多执行`max_retries + 1`次尝试，尝试之间按
    /// `delay * 尝试序号`线性退避休眠；只有HTTP状态恰为200才提前
    /// 停止；全部尝试耗尽后返回最后一次的结果。
    ///
    /// # 参数
    ///
    /// * `request` - 抓取请求，重试配置取自其中
    pub async fn fetch_with_retry(&self, request: &FetchRequest) -> FetchResult {
        let policy = RetryPolicy::linear(request.max_retries, request.retry_delay);

        let mut result = self.fetch(request).await;
        let mut attempt = 1u32;

        while result.status_code != 200 && policy.should_retry(attempt) {
            let backoff = policy.backoff_for(attempt);
            warn!(
                "Fetch attempt {}/{} for {} returned status {}, retrying in {:?}",
                attempt,
                request.max_retries + 1,
                request.url,
                result.status_code,
                backoff
            );
            tokio::time::sleep(backoff).await;

            attempt += 1;
            result = self.fetch(request).await;
        }

        result
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }
}
