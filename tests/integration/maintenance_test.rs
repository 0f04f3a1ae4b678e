// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::integration::helpers::{active_opportunity, comment_task, spawn_app};
use chrono::{Duration, Utc};
use linkrs::domain::models::backlink::Backlink;
use linkrs::domain::models::task::{TaskStatus, TaskType};
use linkrs::domain::repositories::backlink_repository::BacklinkRepository;
use linkrs::domain::repositories::opportunity_repository::OpportunityRepository;
use linkrs::domain::repositories::task_repository::TaskRepository;
use linkrs::queue::reassignment::ReassignmentPipeline;
use uuid::Uuid;

#[tokio::test]
async fn test_sweep_resets_stuck_task() {
    let (_server, context, _db) = spawn_app().await;

    let mut task = comment_task(Uuid::new_v4(), "http://slow.example.com/post", 3);
    task.status = TaskStatus::Running;
    task.locked_by = Some("worker-7".to_string());
    task.locked_at = Some((Utc::now() - Duration::minutes(45)).into());
    task.started_at = Some((Utc::now() - Duration::minutes(45)).into());
    context.task_repo.create(&task).await.unwrap();

    let reports = context
        .task_repo
        .reset_stuck_tasks(Duration::minutes(30))
        .await
        .unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].task_id, task.id);
    assert!(reports[0].reason.contains("worker-7"));

    let stored = context.task_repo.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Pending);
    assert!(stored.locked_by.is_none());
    assert!(stored.locked_at.is_none());
    assert!(stored.started_at.is_none());
    // 诊断信息落在任务本身上，便于事后排查
    assert_eq!(stored.error_message.as_deref(), Some(reports[0].reason.as_str()));
}

#[tokio::test]
async fn test_sweep_is_idempotent() {
    let (_server, context, _db) = spawn_app().await;

    let mut task = comment_task(Uuid::new_v4(), "http://slow.example.com/post", 3);
    task.status = TaskStatus::Running;
    task.locked_at = Some((Utc::now() - Duration::minutes(45)).into());
    task.started_at = Some((Utc::now() - Duration::minutes(45)).into());
    context.task_repo.create(&task).await.unwrap();

    let first = context
        .task_repo
        .reset_stuck_tasks(Duration::minutes(30))
        .await
        .unwrap();
    assert_eq!(first.len(), 1);

    let second = context
        .task_repo
        .reset_stuck_tasks(Duration::minutes(30))
        .await
        .unwrap();
    assert!(second.is_empty());
}

#[tokio::test]
async fn test_sweep_spares_recently_locked_task() {
    let (_server, context, _db) = spawn_app().await;

    // 锁是新的：任务刚被另一个工作器重新领走
    let mut task = comment_task(Uuid::new_v4(), "http://a.com", 3);
    task.status = TaskStatus::Running;
    task.locked_by = Some("w2".to_string());
    task.locked_at = Some(Utc::now().into());
    task.started_at = Some(Utc::now().into());
    context.task_repo.create(&task).await.unwrap();

    let reports = context
        .task_repo
        .reset_stuck_tasks(Duration::minutes(30))
        .await
        .unwrap();

    assert!(reports.is_empty());
    let stored = context.task_repo.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Running);
    assert_eq!(stored.locked_by.as_deref(), Some("w2"));
}

#[tokio::test]
async fn test_reassignment_rebuilds_resettable_tasks_from_opportunities() {
    let (_server, context, _db) = spawn_app().await;
    let campaign_id = Uuid::new_v4();

    // 三个可重建：pending、failed、cancelled
    let pending = comment_task(campaign_id, "http://stale-1.com", 3);
    let mut failed = comment_task(campaign_id, "http://stale-2.com", 3);
    failed.status = TaskStatus::Failed;
    let mut cancelled = comment_task(campaign_id, "http://stale-3.com", 3);
    cancelled.status = TaskStatus::Cancelled;
    // 运行中的不动
    let mut running = comment_task(campaign_id, "http://busy.com", 3);
    running.status = TaskStatus::Running;
    for task in [&pending, &failed, &cancelled, &running] {
        context.task_repo.create(task).await.unwrap();
    }

    // 两个活跃机会，URL各不相同
    let first = active_opportunity(campaign_id, None, "http://target-1.com", 50, 50);
    let second = active_opportunity(campaign_id, None, "http://target-2.com", 60, 60);
    context.opportunity_repo.create(&first).await.unwrap();
    context.opportunity_repo.create(&second).await.unwrap();

    let pipeline = ReassignmentPipeline::new(
        context.task_repo.clone(),
        context.opportunity_repo.clone(),
        context.backlink_repo.clone(),
    );
    let reports = pipeline.run(TaskType::Comment, None).await.unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].campaign_id, campaign_id);
    assert_eq!(reports[0].deleted, 3);
    assert_eq!(reports[0].created, 3);
    assert_eq!(reports[0].source, "opportunities");

    // 旧的可重建任务已不在，新任务数量补齐，目标在候选间循环
    for old in [&pending, &failed, &cancelled] {
        assert!(context.task_repo.find_by_id(old.id).await.unwrap().is_none());
    }
    let rebuilt = context
        .task_repo
        .list_pending(Some(TaskType::Comment), 10)
        .await
        .unwrap();
    assert_eq!(rebuilt.len(), 3);
    let urls: Vec<&str> = rebuilt.iter().map(|t| t.payload.target_url()).collect();
    assert!(urls
        .iter()
        .all(|url| *url == "http://target-1.com" || *url == "http://target-2.com"));

    // 运行中的任务不受影响
    let untouched = context.task_repo.find_by_id(running.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, TaskStatus::Running);
}

#[tokio::test]
async fn test_reassignment_falls_back_to_backlink_history() {
    let (_server, context, _db) = spawn_app().await;
    let campaign_id = Uuid::new_v4();

    context
        .task_repo
        .create(&comment_task(campaign_id, "http://stale.com", 3))
        .await
        .unwrap();

    // 没有活跃机会，只有一条历史外链
    let backlink = Backlink::from_placement(
        campaign_id,
        None,
        "http://history.com/post",
        "comment",
        Some(40),
        Some(40),
    )
    .unwrap();
    context.backlink_repo.create(&backlink).await.unwrap();

    let pipeline = ReassignmentPipeline::new(
        context.task_repo.clone(),
        context.opportunity_repo.clone(),
        context.backlink_repo.clone(),
    );
    let reports = pipeline.run(TaskType::Comment, Some(campaign_id)).await.unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].source, "backlink_history");
    assert_eq!(reports[0].created, 1);

    let rebuilt = context
        .task_repo
        .list_pending(Some(TaskType::Comment), 10)
        .await
        .unwrap();
    assert_eq!(rebuilt[0].payload.target_url(), "http://history.com/post");
}

#[tokio::test]
async fn test_reassignment_dry_run_leaves_tasks_untouched() {
    let (_server, context, _db) = spawn_app().await;
    let campaign_id = Uuid::new_v4();

    let task = comment_task(campaign_id, "http://stale.com", 3);
    context.task_repo.create(&task).await.unwrap();
    let opportunity = active_opportunity(campaign_id, None, "http://target.com", 50, 50);
    context.opportunity_repo.create(&opportunity).await.unwrap();

    let pipeline = ReassignmentPipeline::new(
        context.task_repo.clone(),
        context.opportunity_repo.clone(),
        context.backlink_repo.clone(),
    );
    let plans = pipeline.plan(TaskType::Comment, None).await.unwrap();

    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].resettable, 1);
    assert_eq!(plans[0].planned(), 1);

    // 只出方案，原任务原样保留
    let stored = context.task_repo.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Pending);
}

#[tokio::test]
async fn test_reassignment_without_targets_keeps_campaign_untouched() {
    let (_server, context, _db) = spawn_app().await;
    let campaign_id = Uuid::new_v4();

    let task = comment_task(campaign_id, "http://stale.com", 3);
    context.task_repo.create(&task).await.unwrap();

    let pipeline = ReassignmentPipeline::new(
        context.task_repo.clone(),
        context.opportunity_repo.clone(),
        context.backlink_repo.clone(),
    );
    let reports = pipeline.run(TaskType::Comment, None).await.unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].deleted, 0);
    assert_eq!(reports[0].created, 0);
    assert!(context.task_repo.find_by_id(task.id).await.unwrap().is_some());
}
