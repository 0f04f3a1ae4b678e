// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum_test::TestServer;
use chrono::Utc;
use linkrs::config::settings::{
    AuthSettings, DatabaseSettings, RateLimitingSettings, SelectionSettings, ServerSettings,
    Settings, TaskSettings,
};
use linkrs::domain::models::opportunity::{BacklinkOpportunity, OpportunityStatus};
use linkrs::domain::models::task::{AutomationTask, TaskPayload, TaskType};
use linkrs::presentation::routes::{routes, AppContext};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use std::sync::Arc;
use uuid::Uuid;

/// 测试用API令牌（当前值）
pub const TEST_TOKEN: &str = "test-token";
/// 测试用API令牌（轮换期的旧值）
pub const LEGACY_TOKEN: &str = "legacy-token";

/// 构造测试配置
pub fn test_settings(max_requests: u32) -> Settings {
    Settings {
        database: DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: None,
            min_connections: None,
            connect_timeout: None,
            idle_timeout: None,
        },
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            metrics_port: 0,
        },
        auth: AuthSettings {
            api_tokens: vec![TEST_TOKEN.to_string(), LEGACY_TOKEN.to_string()],
        },
        rate_limiting: RateLimitingSettings {
            enabled: true,
            max_requests,
            window_minutes: 1,
        },
        tasks: TaskSettings {
            stuck_timeout_minutes: 30,
            default_max_retries: 3,
        },
        selection: SelectionSettings {
            oversample_factor: 10,
        },
    }
}

/// 搭建内存SQLite上的完整应用
///
/// # 参数
///
/// * `max_requests` - 每分钟窗口的API请求上限
pub async fn spawn_app_with(
    max_requests: u32,
) -> (TestServer, AppContext, Arc<DatabaseConnection>) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    let db = Arc::new(db);

    let settings = test_settings(max_requests);
    let context = AppContext::new(db.clone(), &settings);
    let server = TestServer::new(routes(context.clone())).unwrap();

    (server, context, db)
}

/// 搭建应用，请求频率上限放得足够高不会触发
pub async fn spawn_app() -> (TestServer, AppContext, Arc<DatabaseConnection>) {
    spawn_app_with(100_000).await
}

/// 写入一个套餐
pub async fn seed_plan(
    db: &DatabaseConnection,
    min_pa: i32,
    max_pa: i32,
    min_da: i32,
    max_da: i32,
) -> Uuid {
    let id = Uuid::new_v4();
    let model = linkrs::infrastructure::database::entities::plan::ActiveModel {
        id: Set(id),
        name: Set(format!("plan-{}", id)),
        min_pa: Set(min_pa),
        max_pa: Set(max_pa),
        min_da: Set(min_da),
        max_da: Set(max_da),
        created_at: Set(Utc::now().into()),
    };
    model.insert(db).await.unwrap();
    id
}

/// 写入一个活动
pub async fn seed_campaign(
    db: &DatabaseConnection,
    plan_id: Option<Uuid>,
    category_id: Option<Uuid>,
    daily_limit: i32,
) -> Uuid {
    let id = Uuid::new_v4();
    let model = linkrs::infrastructure::database::entities::campaign::ActiveModel {
        id: Set(id),
        name: Set(format!("campaign-{}", id)),
        plan_id: Set(plan_id),
        category_id: Set(category_id),
        subcategory_id: Set(None),
        daily_limit: Set(daily_limit),
        status: Set("active".to_string()),
        created_at: Set(Utc::now().into()),
    };
    model.insert(db).await.unwrap();
    id
}

/// 构造评论类型任务
pub fn comment_task(campaign_id: Uuid, url: &str, max_retries: i32) -> AutomationTask {
    AutomationTask::new(
        campaign_id,
        TaskPayload::Comment {
            target_url: url.to_string(),
            opportunity_id: None,
            keyword: None,
            anchor_text: None,
        },
        max_retries,
    )
}

/// 构造指定类型的任务
pub fn task_of_type(campaign_id: Uuid, task_type: TaskType, url: &str) -> AutomationTask {
    AutomationTask::new(
        campaign_id,
        TaskPayload::from_target(task_type, url.to_string(), None, None, None),
        3,
    )
}

/// 构造一个活跃机会
pub fn active_opportunity(
    campaign_id: Uuid,
    category_id: Option<Uuid>,
    url: &str,
    pa: i32,
    da: i32,
) -> BacklinkOpportunity {
    BacklinkOpportunity {
        id: Uuid::new_v4(),
        campaign_id,
        backlink_id: Uuid::new_v4(),
        url: Some(url.to_string()),
        site_type: "comment".to_string(),
        pa: Some(pa),
        da: Some(da),
        status: OpportunityStatus::Active,
        keyword: None,
        anchor_text: None,
        category_id,
        site_account_id: None,
        daily_site_limit: None,
        error_message: None,
        verified_at: None,
        created_at: Utc::now().into(),
    }
}

