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

use crate::utils::token::ApiTokenSet;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// 认证状态
#[derive(Clone)]
pub struct AuthState {
    /// 已配置的API令牌集合，含轮换期的旧令牌
    pub tokens: Arc<ApiTokenSet>,
}

/// 请求方的工作器令牌，认证通过后写入请求扩展
#[derive(Clone)]
pub struct WorkerToken(pub String);

/// 认证中间件
///
/// 校验`X-API-Token`请求头。缺失或不在令牌集合内时关闭式
/// 失败，不做任何后续处理。
///
/// # 参数
///
/// * `state` - 认证状态
/// * `req` - HTTP请求
/// * `next` - 下一个中间件
///
/// # 返回值
///
/// 认证通过时返回后续处理的响应，否则返回401
pub async fn auth_middleware(State(state): State<AuthState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path();
    debug!("AuthMiddleware processing path: {}", path);

    let token = req
        .headers()
        .get("x-api-token")
        .and_then(|header| header.to_str().ok())
        .map(str::to_string);

    match token {
        Some(token) if state.tokens.contains(&token) => {
            req.extensions_mut().insert(WorkerToken(token));
            next.run(req).await
        }
        Some(_) => {
            warn!("Rejected request with invalid API token on path: {}", path);
            unauthorized()
        }
        None => unauthorized(),
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Unauthorized" })),
    )
        .into_response()
}
