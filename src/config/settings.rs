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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含服务器、任务存储、策略目录和抓取引擎等所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 任务存储配置
    pub tasks: TaskSettings,
    /// 策略配置
    pub strategies: StrategySettings,
    /// 抓取引擎配置
    pub fetch: FetchSettings,
}

/// 服务器配置设置
#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 任务存储配置设置
#[derive(Debug, Deserialize)]
pub struct TaskSettings {
    /// 任务记录根目录
    pub dir: String,
    /// 执行器空闲轮询间隔（秒）
    pub poll_interval_secs: u64,
    /// 终态任务保留天数
    pub retention_days: u32,
    /// 清理工作器运行间隔（秒）
    pub cleanup_interval_secs: u64,
}

/// 策略配置设置
#[derive(Debug, Deserialize)]
pub struct StrategySettings {
    /// 策略源文件目录
    pub dir: String,
}

/// 抓取引擎配置设置
#[derive(Debug, Deserialize)]
pub struct FetchSettings {
    /// 默认请求超时时间（秒）
    pub timeout_secs: u64,
    /// 默认最大重试次数
    pub max_retries: u32,
    /// 默认重试基础延迟（秒）
    pub retry_delay_secs: f64,
    /// User-Agent请求头
    pub user_agent: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Start with default settings
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            // Default task store settings
            .set_default("tasks.dir", "data/tasks")?
            .set_default("tasks.poll_interval_secs", 1)?
            .set_default("tasks.retention_days", 7)?
            .set_default("tasks.cleanup_interval_secs", 3600)?
            // Default strategy settings
            .set_default("strategies.dir", "data/strategies")?
            // Default fetch settings
            .set_default("fetch.timeout_secs", 30)?
            .set_default("fetch.max_retries", 3)?
            .set_default("fetch.retry_delay_secs", 1.0)?
            .set_default(
                "fetch.user_agent",
                "Mozilla/5.0 (compatible; webcraft/1.0; +http://webcraft.dev)",
            )?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("WEBCRAFT").separator("__"));

        builder.build()?.try_deserialize()
    }
}
