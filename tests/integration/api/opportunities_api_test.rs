// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::integration::helpers::{
    active_opportunity, seed_campaign, seed_plan, spawn_app, TEST_TOKEN,
};
use axum::http::StatusCode;
use chrono::Utc;
use linkrs::domain::models::backlink::Backlink;
use linkrs::domain::models::opportunity::OpportunityStatus;
use linkrs::domain::repositories::backlink_repository::BacklinkRepository;
use linkrs::domain::repositories::opportunity_repository::OpportunityRepository;
use serde_json::{json, Value};
use uuid::Uuid;

fn placement_report(campaign_id: Uuid, status: &str, url: &str) -> Value {
    json!({
        "campaign_id": campaign_id,
        "backlink_id": Uuid::new_v4(),
        "type": "comment",
        "status": status,
        "url": url,
        "pa": 40,
        "da": 50,
    })
}

#[tokio::test]
async fn test_placement_report_records_backlink() {
    let (server, context, _db) = spawn_app().await;
    let campaign_id = Uuid::new_v4();

    let response = server
        .post("/api/v1/opportunities")
        .add_header("x-api-token", TEST_TOKEN)
        .json(&placement_report(campaign_id, "submitted", "http://blog.example.com/post/1"))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["opportunity"]["status"], json!("submitted"));

    // 投放落地的同时记了一条外链
    let recorded = context
        .backlink_repo
        .count_for_campaign_on(campaign_id, Utc::now().date_naive())
        .await
        .unwrap();
    assert_eq!(recorded, 1);
}

#[tokio::test]
async fn test_same_domain_same_day_is_rejected() {
    let (server, context, _db) = spawn_app().await;
    let campaign_id = Uuid::new_v4();

    let first = server
        .post("/api/v1/opportunities")
        .add_header("x-api-token", TEST_TOKEN)
        .json(&placement_report(campaign_id, "active", "http://example.com/page/1"))
        .await;
    assert_eq!(first.status_code(), StatusCode::CREATED);

    // 同域名不同页面，当日配额已用尽
    let second = server
        .post("/api/v1/opportunities")
        .add_header("x-api-token", TEST_TOKEN)
        .json(&placement_report(campaign_id, "active", "http://www.example.com/page/2"))
        .await;
    assert_eq!(second.status_code(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = second.json();
    assert!(body["retry_after"].as_u64().unwrap() > 0);
    assert!(body["error"].as_str().unwrap().contains("example.com"));

    let recorded = context
        .backlink_repo
        .count_for_campaign_on(campaign_id, Utc::now().date_naive())
        .await
        .unwrap();
    assert_eq!(recorded, 1);
}

#[tokio::test]
async fn test_domain_quota_is_per_campaign() {
    let (server, _context, _db) = spawn_app().await;

    let first = server
        .post("/api/v1/opportunities")
        .add_header("x-api-token", TEST_TOKEN)
        .json(&placement_report(Uuid::new_v4(), "active", "http://example.com/a"))
        .await;
    assert_eq!(first.status_code(), StatusCode::CREATED);

    let other_campaign = server
        .post("/api/v1/opportunities")
        .add_header("x-api-token", TEST_TOKEN)
        .json(&placement_report(Uuid::new_v4(), "active", "http://example.com/b"))
        .await;
    assert_eq!(other_campaign.status_code(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_error_report_does_not_consume_quota() {
    let (server, context, _db) = spawn_app().await;
    let campaign_id = Uuid::new_v4();

    let mut report = placement_report(campaign_id, "error", "http://example.com/a");
    report["error_message"] = json!("login form changed");

    let response = server
        .post("/api/v1/opportunities")
        .add_header("x-api-token", TEST_TOKEN)
        .json(&report)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let recorded = context
        .backlink_repo
        .count_for_campaign_on(campaign_id, Utc::now().date_naive())
        .await
        .unwrap();
    assert_eq!(recorded, 0);

    // 失败后同域名的投放仍然允许
    let retry = server
        .post("/api/v1/opportunities")
        .add_header("x-api-token", TEST_TOKEN)
        .json(&placement_report(campaign_id, "active", "http://example.com/b"))
        .await;
    assert_eq!(retry.status_code(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_create_rejects_invalid_input() {
    let (server, _context, _db) = spawn_app().await;

    let mut out_of_range = placement_report(Uuid::new_v4(), "active", "http://example.com/a");
    out_of_range["pa"] = json!(150);
    let response = server
        .post("/api/v1/opportunities")
        .add_header("x-api-token", TEST_TOKEN)
        .json(&out_of_range)
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let bad_url = placement_report(Uuid::new_v4(), "active", "not a url");
    let response = server
        .post("/api/v1/opportunities")
        .add_header("x-api-token", TEST_TOKEN)
        .json(&bad_url)
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let unknown_status = placement_report(Uuid::new_v4(), "launched", "http://example.com/a");
    let response = server
        .post("/api/v1/opportunities")
        .add_header("x-api-token", TEST_TOKEN)
        .json(&unknown_status)
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_update_to_verified_stamps_timestamp() {
    let (server, context, _db) = spawn_app().await;
    let opportunity = active_opportunity(Uuid::new_v4(), None, "http://example.com/a", 40, 50);
    context.opportunity_repo.create(&opportunity).await.unwrap();

    let response = server
        .patch(&format!("/api/v1/opportunities/{}", opportunity.id))
        .add_header("x-api-token", TEST_TOKEN)
        .json(&json!({ "status": "verified" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["opportunity"]["status"], json!("verified"));
    assert!(body["opportunity"]["verified_at"].is_string());

    let stored = context
        .opportunity_repo
        .find_by_id(opportunity.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, OpportunityStatus::Verified);
    assert!(stored.verified_at.is_some());
}

#[tokio::test]
async fn test_update_unknown_opportunity_returns_404() {
    let (server, _context, _db) = spawn_app().await;

    let response = server
        .patch(&format!("/api/v1/opportunities/{}", Uuid::new_v4()))
        .add_header("x-api-token", TEST_TOKEN)
        .json(&json!({ "status": "error", "error_message": "target gone" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_selection_respects_plan_bounds_and_category() {
    let (server, context, db) = spawn_app().await;
    let plan_id = seed_plan(&db, 20, 80, 20, 80).await;
    let category_id = Uuid::new_v4();
    let campaign_id = seed_campaign(&db, Some(plan_id), Some(category_id), 10).await;

    // 区间内且分类匹配
    let eligible =
        active_opportunity(campaign_id, Some(category_id), "http://in-range.com", 50, 60);
    // 权威度越界
    let too_strong =
        active_opportunity(campaign_id, Some(category_id), "http://too-strong.com", 95, 60);
    // 分类不匹配
    let wrong_category =
        active_opportunity(campaign_id, Some(Uuid::new_v4()), "http://other-topic.com", 50, 60);
    for opportunity in [&eligible, &too_strong, &wrong_category] {
        context.opportunity_repo.create(opportunity).await.unwrap();
    }

    let response = server
        .get(&format!("/api/v1/opportunities/for-campaign/{}", campaign_id))
        .add_query_param("count", "5")
        .add_header("x-api-token", TEST_TOKEN)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["campaign"]["id"], json!(campaign_id.to_string()));
    assert_eq!(body["plan_limits"]["max_pa"], json!(80));

    let urls: Vec<&str> = body["opportunities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["url"].as_str().unwrap())
        .collect();
    assert_eq!(urls, vec!["http://in-range.com"]);
}

#[tokio::test]
async fn test_selection_filters_by_site_type() {
    let (server, context, db) = spawn_app().await;
    let plan_id = seed_plan(&db, 0, 100, 0, 100).await;
    let category_id = Uuid::new_v4();
    let campaign_id = seed_campaign(&db, Some(plan_id), Some(category_id), 10).await;

    let comment = active_opportunity(campaign_id, Some(category_id), "http://a.com", 50, 50);
    let mut forum = active_opportunity(campaign_id, Some(category_id), "http://b.com", 50, 50);
    forum.site_type = "forum".to_string();
    context.opportunity_repo.create(&comment).await.unwrap();
    context.opportunity_repo.create(&forum).await.unwrap();

    let response = server
        .get(&format!("/api/v1/opportunities/for-campaign/{}", campaign_id))
        .add_query_param("count", "5")
        .add_query_param("site_type", "forum")
        .add_header("x-api-token", TEST_TOKEN)
        .await;

    let body: Value = response.json();
    let opportunities = body["opportunities"].as_array().unwrap();
    assert_eq!(opportunities.len(), 1);
    assert_eq!(opportunities[0]["type"], json!("forum"));
}

#[tokio::test]
async fn test_selection_skips_opportunity_already_used_today() {
    let (server, context, db) = spawn_app().await;
    let plan_id = seed_plan(&db, 0, 100, 0, 100).await;
    let category_id = Uuid::new_v4();
    let campaign_id = seed_campaign(&db, Some(plan_id), Some(category_id), 10).await;

    let opportunity = active_opportunity(campaign_id, Some(category_id), "http://used.com", 50, 50);
    context.opportunity_repo.create(&opportunity).await.unwrap();

    let backlink = Backlink::from_placement(
        campaign_id,
        Some(opportunity.id),
        "http://used.com/post",
        "comment",
        Some(50),
        Some(50),
    )
    .unwrap();
    context.backlink_repo.create(&backlink).await.unwrap();

    let response = server
        .get(&format!("/api/v1/opportunities/for-campaign/{}", campaign_id))
        .add_query_param("count", "5")
        .add_header("x-api-token", TEST_TOKEN)
        .await;

    let body: Value = response.json();
    assert_eq!(body["opportunities"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_selection_returns_empty_when_daily_limit_reached() {
    let (server, context, db) = spawn_app().await;
    let plan_id = seed_plan(&db, 0, 100, 0, 100).await;
    let category_id = Uuid::new_v4();
    let campaign_id = seed_campaign(&db, Some(plan_id), Some(category_id), 1).await;

    // 当日额度1，已经投出一条
    let backlink = Backlink::from_placement(
        campaign_id,
        None,
        "http://done.com/post",
        "comment",
        Some(50),
        Some(50),
    )
    .unwrap();
    context.backlink_repo.create(&backlink).await.unwrap();

    let fresh = active_opportunity(campaign_id, Some(category_id), "http://fresh.com", 50, 50);
    context.opportunity_repo.create(&fresh).await.unwrap();

    let response = server
        .get(&format!("/api/v1/opportunities/for-campaign/{}", campaign_id))
        .add_query_param("count", "5")
        .add_header("x-api-token", TEST_TOKEN)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["opportunities"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_selection_requires_plan_and_category() {
    let (server, _context, db) = spawn_app().await;

    let no_plan = seed_campaign(&db, None, Some(Uuid::new_v4()), 10).await;
    let response = server
        .get(&format!("/api/v1/opportunities/for-campaign/{}", no_plan))
        .add_header("x-api-token", TEST_TOKEN)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let plan_id = seed_plan(&db, 0, 100, 0, 100).await;
    let no_category = seed_campaign(&db, Some(plan_id), None, 10).await;
    let response = server
        .get(&format!("/api/v1/opportunities/for-campaign/{}", no_category))
        .add_header("x-api-token", TEST_TOKEN)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_selection_unknown_campaign_returns_404() {
    let (server, _context, _db) = spawn_app().await;

    let response = server
        .get(&format!("/api/v1/opportunities/for-campaign/{}", Uuid::new_v4()))
        .add_header("x-api-token", TEST_TOKEN)
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
