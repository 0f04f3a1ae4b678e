// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::task_request::{
    LockTaskRequestDto, PendingTasksQuery, UpdateTaskStatusRequestDto,
};
use crate::application::dto::task_response::{PendingTaskDto, TaskDto};
use crate::domain::models::task::{TaskStatus, TaskType};
use crate::domain::repositories::task_repository::{LockOutcome, TaskRepository};
use crate::presentation::errors::ApiError;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// 待处理任务列表处理器
///
/// 工作器轮询入口，按创建时间先进先出返回未锁定的待处理任务
///
/// # 参数
///
/// * `task_repo` - 任务仓库
/// * `query` - 查询参数
///
/// # 返回值
///
/// 返回待处理任务列表
pub async fn list_pending_tasks<T: TaskRepository>(
    Extension(task_repo): Extension<Arc<T>>,
    Query(query): Query<PendingTasksQuery>,
) -> Result<Response, ApiError> {
    let limit = query.limit.unwrap_or(10).min(100);

    let task_type = match query.task_type.as_deref() {
        Some(raw) => Some(
            raw.parse::<TaskType>()
                .map_err(|_| ApiError::Validation(format!("Invalid task type: {}", raw)))?,
        ),
        None => None,
    };

    let tasks = task_repo.list_pending(task_type, limit).await?;
    let tasks: Vec<PendingTaskDto> = tasks.into_iter().map(PendingTaskDto::from).collect();

    Ok((StatusCode::OK, Json(json!({ "tasks": tasks }))).into_response())
}

/// 任务加锁处理器
///
/// 为请求方工作器锁定任务。同一任务的并发加锁请求恰有
/// 一个成功，其余收到409。
///
/// # 参数
///
/// * `task_repo` - 任务仓库
/// * `id` - 任务ID
/// * `request` - 加锁请求，未携带工作器标识时由服务端生成
pub async fn lock_task<T: TaskRepository>(
    Extension(task_repo): Extension<Arc<T>>,
    Path(id): Path<Uuid>,
    Json(request): Json<LockTaskRequestDto>,
) -> Result<Response, ApiError> {
    let worker_id = request
        .worker_id
        .filter(|worker_id| !worker_id.is_empty())
        .unwrap_or_else(|| format!("worker-{}", Uuid::new_v4()));

    match task_repo.lock(id, &worker_id).await? {
        LockOutcome::Acquired(task) => {
            info!(task_id = %id, worker_id = %worker_id, "Task locked");
            Ok((
                StatusCode::OK,
                Json(json!({
                    "message": "Task locked",
                    "task": TaskDto::from(task),
                })),
            )
                .into_response())
        }
        LockOutcome::Held => Err(ApiError::Conflict(
            "Task is already locked by another worker".to_string(),
        )),
    }
}

/// 任务解锁处理器
///
/// 无条件清空任务的锁，用于显式释放或管理操作
pub async fn unlock_task<T: TaskRepository>(
    Extension(task_repo): Extension<Arc<T>>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    task_repo.unlock(id).await?;
    info!(task_id = %id, "Task unlocked");

    Ok((StatusCode::OK, Json(json!({ "message": "Task unlocked" }))).into_response())
}

/// 任务状态更新处理器
///
/// 工作器回报任务执行进度。状态值必须是
/// pending、running、success 或 failed 之一。
///
/// # 参数
///
/// * `task_repo` - 任务仓库
/// * `id` - 任务ID
/// * `request` - 状态更新请求
pub async fn update_task_status<T: TaskRepository>(
    Extension(task_repo): Extension<Arc<T>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTaskStatusRequestDto>,
) -> Result<Response, ApiError> {
    let status = request
        .status
        .parse::<TaskStatus>()
        .map_err(|_| ApiError::Validation(format!("Invalid status value: {}", request.status)))?;

    // cancelled 只能由管理操作设置，不开放给工作器
    if !matches!(
        status,
        TaskStatus::Pending | TaskStatus::Running | TaskStatus::Success | TaskStatus::Failed
    ) {
        return Err(ApiError::Validation(format!(
            "Invalid status value: {}",
            request.status
        )));
    }

    task_repo
        .update_status(id, status, request.result, request.error_message)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Task status updated" })),
    )
        .into_response())
}
