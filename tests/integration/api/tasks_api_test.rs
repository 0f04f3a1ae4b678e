// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::integration::helpers::{
    comment_task, spawn_app, spawn_app_with, task_of_type, LEGACY_TOKEN, TEST_TOKEN,
};
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use futures::future::join_all;
use linkrs::domain::models::task::{TaskStatus, TaskType};
use linkrs::domain::repositories::task_repository::TaskRepository;
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn test_request_without_token_is_rejected() {
    let (server, _context, _db) = spawn_app().await;

    let response = server.get("/api/v1/tasks/pending").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body, json!({ "error": "Unauthorized" }));
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let (server, _context, _db) = spawn_app().await;

    let response = server
        .get("/api/v1/tasks/pending")
        .add_header("x-api-token", "wrong")
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_legacy_token_still_accepted_during_rotation() {
    let (server, _context, _db) = spawn_app().await;

    let response = server
        .get("/api/v1/tasks/pending")
        .add_header("x-api-token", LEGACY_TOKEN)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_endpoint_is_public() {
    let (server, _context, _db) = spawn_app().await;

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "OK");
}

#[tokio::test]
async fn test_pending_tasks_are_fifo_ordered() {
    let (server, context, _db) = spawn_app().await;
    let campaign_id = Uuid::new_v4();

    // 乱序写入三个任务，created_at 依次错开
    let now = Utc::now();
    let mut expected = Vec::new();
    for (offset, url) in [(3, "http://first.com"), (2, "http://second.com"), (1, "http://third.com")]
    {
        let mut task = comment_task(campaign_id, url, 3);
        task.created_at = (now - Duration::minutes(offset)).into();
        context.task_repo.create(&task).await.unwrap();
        expected.push(task.id);
    }

    let response = server
        .get("/api/v1/tasks/pending")
        .add_header("x-api-token", TEST_TOKEN)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let ids: Vec<String> = body["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap().to_string())
        .collect();

    let expected: Vec<String> = expected.iter().map(|id| id.to_string()).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_pending_tasks_filtered_by_type() {
    let (server, context, _db) = spawn_app().await;
    let campaign_id = Uuid::new_v4();

    context
        .task_repo
        .create(&task_of_type(campaign_id, TaskType::Comment, "http://a.com"))
        .await
        .unwrap();
    context
        .task_repo
        .create(&task_of_type(campaign_id, TaskType::Forum, "http://b.com"))
        .await
        .unwrap();

    let response = server
        .get("/api/v1/tasks/pending")
        .add_query_param("type", "forum")
        .add_header("x-api-token", TEST_TOKEN)
        .await;

    let body: Value = response.json();
    let tasks = body["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["type"], json!("forum"));
}

#[tokio::test]
async fn test_pending_tasks_rejects_unknown_type() {
    let (server, _context, _db) = spawn_app().await;

    let response = server
        .get("/api/v1/tasks/pending")
        .add_query_param("type", "carrier-pigeon")
        .add_header("x-api-token", TEST_TOKEN)
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_lock_conflict_returns_409() {
    let (server, context, _db) = spawn_app().await;
    let task = comment_task(Uuid::new_v4(), "http://a.com", 3);
    context.task_repo.create(&task).await.unwrap();

    let first = server
        .post(&format!("/api/v1/tasks/{}/lock", task.id))
        .add_header("x-api-token", TEST_TOKEN)
        .json(&json!({ "worker_id": "w1" }))
        .await;
    assert_eq!(first.status_code(), StatusCode::OK);
    let body: Value = first.json();
    assert_eq!(body["task"]["locked_by"], json!("w1"));

    let second = server
        .post(&format!("/api/v1/tasks/{}/lock", task.id))
        .add_header("x-api-token", TEST_TOKEN)
        .json(&json!({ "worker_id": "w2" }))
        .await;
    assert_eq!(second.status_code(), StatusCode::CONFLICT);

    // 锁持有者没有被并发请求覆盖
    let stored = context.task_repo.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(stored.locked_by.as_deref(), Some("w1"));
}

#[tokio::test]
async fn test_concurrent_lock_requests_have_one_winner() {
    let (server, context, _db) = spawn_app().await;
    let task = comment_task(Uuid::new_v4(), "http://a.com", 3);
    context.task_repo.create(&task).await.unwrap();

    let server = &server;
    let id = task.id;
    let requests = (0..8).map(|i| async move {
        server
            .post(&format!("/api/v1/tasks/{}/lock", id))
            .add_header("x-api-token", TEST_TOKEN)
            .json(&json!({ "worker_id": format!("w{}", i) }))
            .await
    });
    let responses = join_all(requests).await;

    let winners = responses
        .iter()
        .filter(|r| r.status_code() == StatusCode::OK)
        .count();
    let conflicts = responses
        .iter()
        .filter(|r| r.status_code() == StatusCode::CONFLICT)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test]
async fn test_lock_unknown_task_returns_404() {
    let (server, _context, _db) = spawn_app().await;

    let response = server
        .post(&format!("/api/v1/tasks/{}/lock", Uuid::new_v4()))
        .add_header("x-api-token", TEST_TOKEN)
        .json(&json!({}))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unlock_clears_the_lock() {
    let (server, context, _db) = spawn_app().await;
    let task = comment_task(Uuid::new_v4(), "http://a.com", 3);
    context.task_repo.create(&task).await.unwrap();

    server
        .post(&format!("/api/v1/tasks/{}/lock", task.id))
        .add_header("x-api-token", TEST_TOKEN)
        .json(&json!({ "worker_id": "w1" }))
        .await;

    let response = server
        .post(&format!("/api/v1/tasks/{}/unlock", task.id))
        .add_header("x-api-token", TEST_TOKEN)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let stored = context.task_repo.find_by_id(task.id).await.unwrap().unwrap();
    assert!(stored.locked_by.is_none());
    assert!(stored.locked_at.is_none());
}

#[tokio::test]
async fn test_happy_path_poll_lock_run_succeed() {
    let (server, context, _db) = spawn_app().await;
    let campaign_id = Uuid::new_v4();
    let task = task_of_type(campaign_id, TaskType::Comment, "http://a.com");
    context.task_repo.create(&task).await.unwrap();

    // 轮询看到任务
    let poll = server
        .get("/api/v1/tasks/pending")
        .add_query_param("type", "comment")
        .add_header("x-api-token", TEST_TOKEN)
        .await;
    let body: Value = poll.json();
    assert_eq!(body["tasks"][0]["id"], json!(task.id.to_string()));

    // 加锁
    let lock = server
        .post(&format!("/api/v1/tasks/{}/lock", task.id))
        .add_header("x-api-token", TEST_TOKEN)
        .json(&json!({ "worker_id": "w1" }))
        .await;
    assert_eq!(lock.status_code(), StatusCode::OK);

    // 回报运行中
    let running = server
        .patch(&format!("/api/v1/tasks/{}/status", task.id))
        .add_header("x-api-token", TEST_TOKEN)
        .json(&json!({ "status": "running" }))
        .await;
    assert_eq!(running.status_code(), StatusCode::OK);

    let stored = context.task_repo.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Running);
    assert!(stored.started_at.is_some());

    // 回报成功
    let success = server
        .patch(&format!("/api/v1/tasks/{}/status", task.id))
        .add_header("x-api-token", TEST_TOKEN)
        .json(&json!({ "status": "success", "result": { "posted_url": "http://a.com/c/1" } }))
        .await;
    assert_eq!(success.status_code(), StatusCode::OK);

    let stored = context.task_repo.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Success);
    assert!(stored.completed_at.is_some());
    assert_eq!(stored.result.unwrap()["posted_url"], json!("http://a.com/c/1"));
}

#[tokio::test]
async fn test_invalid_status_value_returns_422() {
    let (server, context, _db) = spawn_app().await;
    let task = comment_task(Uuid::new_v4(), "http://a.com", 3);
    context.task_repo.create(&task).await.unwrap();

    for bad in ["done", "cancelled", ""] {
        let response = server
            .patch(&format!("/api/v1/tasks/{}/status", task.id))
            .add_header("x-api-token", TEST_TOKEN)
            .json(&json!({ "status": bad }))
            .await;
        assert_eq!(
            response.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "status value {:?} should be rejected",
            bad
        );
    }
}

#[tokio::test]
async fn test_illegal_transition_returns_422() {
    let (server, context, _db) = spawn_app().await;
    let task = comment_task(Uuid::new_v4(), "http://a.com", 3);
    context.task_repo.create(&task).await.unwrap();

    // pending → success 不在转换表内
    let response = server
        .patch(&format!("/api/v1/tasks/{}/status", task.id))
        .add_header("x-api-token", TEST_TOKEN)
        .json(&json!({ "status": "success" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let stored = context.task_repo.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Pending);
}

#[tokio::test]
async fn test_status_update_unknown_task_returns_404() {
    let (server, _context, _db) = spawn_app().await;

    let response = server
        .patch(&format!("/api/v1/tasks/{}/status", Uuid::new_v4()))
        .add_header("x-api-token", TEST_TOKEN)
        .json(&json!({ "status": "running" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failure_requeues_until_retry_bound() {
    let (server, context, _db) = spawn_app().await;
    let task = comment_task(Uuid::new_v4(), "http://a.com", 2);
    context.task_repo.create(&task).await.unwrap();

    async fn report_cycle(
        server: &axum_test::TestServer,
        id: Uuid,
        attempt: u32,
    ) -> axum_test::TestResponse {
        server
            .post(&format!("/api/v1/tasks/{}/lock", id))
            .add_header("x-api-token", TEST_TOKEN)
            .json(&json!({ "worker_id": format!("w{}", attempt) }))
            .await;
        server
            .patch(&format!("/api/v1/tasks/{}/status", id))
            .add_header("x-api-token", TEST_TOKEN)
            .json(&json!({ "status": "running" }))
            .await;
        server
            .patch(&format!("/api/v1/tasks/{}/status", id))
            .add_header("x-api-token", TEST_TOKEN)
            .json(&json!({ "status": "failed", "error_message": "captcha wall" }))
            .await
    }

    // 第一次失败：未达上限，自动重新入队并清锁
    let first = report_cycle(&server, task.id, 1).await;
    assert_eq!(first.status_code(), StatusCode::OK);

    let stored = context.task_repo.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Pending);
    assert_eq!(stored.retry_count, 1);
    assert!(stored.locked_by.is_none());
    assert_eq!(stored.error_message.as_deref(), Some("captcha wall"));

    // 第二次失败：达到上限，终结于失败态
    let second = report_cycle(&server, task.id, 2).await;
    assert_eq!(second.status_code(), StatusCode::OK);

    let stored = context.task_repo.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Failed);
    assert_eq!(stored.retry_count, 2);
    assert!(stored.completed_at.is_some());
}

#[tokio::test]
async fn test_api_rate_limit_returns_429_with_retry_hint() {
    let (server, _context, _db) = spawn_app_with(2).await;

    for _ in 0..2 {
        let ok = server
            .get("/api/v1/tasks/pending")
            .add_header("x-api-token", TEST_TOKEN)
            .add_header("x-worker-id", "w1")
            .await;
        assert_eq!(ok.status_code(), StatusCode::OK);
    }

    let limited = server
        .get("/api/v1/tasks/pending")
        .add_header("x-api-token", TEST_TOKEN)
        .add_header("x-worker-id", "w1")
        .await;
    assert_eq!(limited.status_code(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = limited.json();
    assert_eq!(body["retry_after"], json!(60));

    // 其他工作器不受影响
    let other = server
        .get("/api/v1/tasks/pending")
        .add_header("x-api-token", TEST_TOKEN)
        .add_header("x-worker-id", "w2")
        .await;
    assert_eq!(other.status_code(), StatusCode::OK);
}
