// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// 安装Prometheus导出器
///
/// 导出器监听独立端口，与业务API分开。端口被占用时只告警
/// 不中断启动，计数器调用在没有导出器时是空操作。
pub fn init_metrics(port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        tracing::warn!(
            "Failed to install Prometheus recorder on {}: {}. Metrics will not be exported.",
            addr,
            e
        );
        return;
    }

    info!("Metrics exporter listening on {}", addr);
}
