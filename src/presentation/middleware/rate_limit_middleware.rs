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

use crate::config::settings::RateLimitingSettings;
use crate::presentation::middleware::auth_middleware::WorkerToken;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use metrics::counter;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// 速率限制错误类型
#[derive(Error, Debug)]
pub enum RateLimitError {
    /// 请求过多错误
    #[error("Too many requests")]
    TooManyRequests {
        /// 建议的重试等待秒数
        retry_after_secs: u64,
    },
}

/// 单个工作器的计数窗口
#[derive(Debug)]
struct Window {
    started: Instant,
    hits: u32,
}

/// API请求频率限制器
///
/// 固定窗口计数器，按工作器标识分桶，窗口到期后重新计数。
/// 计数器只存在于本进程内，多实例部署时每个实例独立限流。
pub struct ApiRateLimiter {
    /// 各工作器的当前窗口
    windows: DashMap<String, Window>,
    /// 每窗口允许的请求数
    max_requests: u32,
    /// 窗口长度
    window: Duration,
    /// 是否启用，关闭时所有请求直接放行
    enabled: bool,
}

impl ApiRateLimiter {
    /// 创建新的速率限制器实例
    ///
    /// # 参数
    ///
    /// * `settings` - 速率限制配置
    ///
    /// # 返回值
    ///
    /// 返回新的速率限制器实例
    pub fn new(settings: &RateLimitingSettings) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests: settings.max_requests,
            window: Duration::from_secs(settings.window_minutes * 60),
            enabled: settings.enabled,
        }
    }

    /// 检查工作器的请求速率是否超出限制
    ///
    /// # 参数
    ///
    /// * `worker_id` - 工作器标识
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 请求未超出限制
    /// * `Err(RateLimitError)` - 请求超出限制
    pub fn check(&self, worker_id: &str) -> Result<(), RateLimitError> {
        if !self.enabled {
            return Ok(());
        }

        let mut entry = self
            .windows
            .entry(worker_id.to_string())
            .or_insert_with(|| Window {
                started: Instant::now(),
                hits: 0,
            });

        if entry.started.elapsed() >= self.window {
            entry.started = Instant::now();
            entry.hits = 0;
        }

        entry.hits += 1;
        if entry.hits > self.max_requests {
            return Err(RateLimitError::TooManyRequests {
                retry_after_secs: self.window.as_secs(),
            });
        }

        Ok(())
    }
}

/// 速率限制中间件
///
/// 请求按`X-Worker-Id`请求头分桶；未携带时退回认证令牌，
/// 再退回匿名桶。超限时返回429并附带重试等待时间。
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<ApiRateLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let worker_key = req
        .headers()
        .get("x-worker-id")
        .and_then(|header| header.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            req.extensions()
                .get::<WorkerToken>()
                .map(|token| token.0.clone())
        })
        .unwrap_or_else(|| "anonymous".to_string());

    if let Err(RateLimitError::TooManyRequests { retry_after_secs }) = limiter.check(&worker_key) {
        counter!("linkrs_api_rate_limited_total").increment(1);
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "Too many requests", "retry_after": retry_after_secs })),
        )
            .into_response();
    }

    next.run(req).await
}
