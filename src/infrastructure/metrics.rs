// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 初始化Prometheus指标导出器
///
/// 暴露任务计数（webcraft_tasks_created/completed/failed_total）和
/// 抓取尝试计数（webcraft_fetch_attempts_total）。监听地址可通过
/// WEBCRAFT_METRICS_ADDR覆盖。
pub fn init_metrics() {
    let addr = std::env::var("WEBCRAFT_METRICS_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:9100".to_string());

    let addr: SocketAddr = match addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address '{}': {}", addr, e);
            return;
        }
    };

    // 端口被占用时仅告警，不阻止进程启动
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => info!("Metrics exporter listening on {}", addr),
        Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
    }
}
