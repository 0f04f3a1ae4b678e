// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;

use crate::domain::models::task::DomainError;
use crate::domain::repositories::task_repository::RepositoryError;
use crate::domain::services::opportunity_selector::SelectionError;
use crate::domain::services::rate_limit_service::{seconds_until_utc_midnight, RateLimitError};

/// API错误类型
///
/// 边界层是内部失败翻译成HTTP状态码的唯一位置，
/// 领域层和仓储层只返回类型化的结果。
#[derive(Debug)]
pub enum ApiError {
    /// 输入校验失败或状态值越界
    Validation(String),

    /// 资源不存在
    NotFound(String),

    /// 并发冲突，锁已被其他工作器持有
    Conflict(String),

    /// 活动配置不完整，调用方需先补全配置
    Configuration(String),

    /// 触发频率限制，调用方应按提示退避
    RateLimited {
        message: String,
        retry_after_secs: u64,
    },

    /// 其他内部错误
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": message })),
            )
                .into_response(),
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Conflict(message) => {
                (StatusCode::CONFLICT, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Configuration(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::RateLimited {
                message,
                retry_after_secs,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "error": message, "retry_after": retry_after_secs })),
            )
                .into_response(),
            ApiError::Internal(err) => {
                tracing::error!("Internal error while handling request: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ApiError::NotFound("Resource not found".to_string()),
            RepositoryError::InvalidTransition { from, to } => {
                ApiError::Validation(format!("Invalid status transition from {} to {}", from, to))
            }
            RepositoryError::DailyQuotaConsumed { domain } => ApiError::RateLimited {
                message: format!("Daily backlink limit already reached for domain {}", domain),
                retry_after_secs: seconds_until_utc_midnight(Utc::now()),
            },
            RepositoryError::Database(err) => ApiError::Internal(err.into()),
        }
    }
}

impl From<SelectionError> for ApiError {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::CampaignNotFound => {
                ApiError::NotFound("Campaign not found".to_string())
            }
            SelectionError::NoPlanAssigned => {
                ApiError::Configuration("Campaign has no plan assigned".to_string())
            }
            SelectionError::NoCategorySelected => {
                ApiError::Configuration("Campaign has no category selected".to_string())
            }
            SelectionError::Repository(err) => err.into(),
        }
    }
}

impl From<RateLimitError> for ApiError {
    fn from(err: RateLimitError) -> Self {
        match err {
            RateLimitError::InvalidUrl(url) => {
                ApiError::Validation(format!("Invalid URL: {}", url))
            }
            RateLimitError::Repository(err) => err.into(),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Validation(err.to_string())
    }
}
