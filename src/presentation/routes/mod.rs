// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Settings;
use crate::domain::services::opportunity_selector::OpportunitySelector;
use crate::domain::services::rate_limit_service::RateLimitService;
use crate::infrastructure::repositories::backlink_repo_impl::BacklinkRepositoryImpl;
use crate::infrastructure::repositories::campaign_repo_impl::CampaignRepositoryImpl;
use crate::infrastructure::repositories::opportunity_repo_impl::OpportunityRepositoryImpl;
use crate::infrastructure::repositories::task_repo_impl::TaskRepositoryImpl;
use crate::presentation::handlers::{opportunity_handler, task_handler};
use crate::presentation::middleware::auth_middleware::{auth_middleware, AuthState};
use crate::presentation::middleware::rate_limit_middleware::{
    rate_limit_middleware, ApiRateLimiter,
};
use crate::utils::token::ApiTokenSet;
use axum::{
    middleware,
    routing::{get, patch, post},
    Extension, Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// 应用组件集合
///
/// 将仓库、领域服务和中间件状态装配到一起，
/// 服务进程、命令行入口和集成测试共用同一套装配逻辑。
#[derive(Clone)]
pub struct AppContext {
    /// 任务仓库
    pub task_repo: Arc<TaskRepositoryImpl>,
    /// 机会仓库
    pub opportunity_repo: Arc<OpportunityRepositoryImpl>,
    /// 外链记录仓库
    pub backlink_repo: Arc<BacklinkRepositoryImpl>,
    /// 活动仓库
    pub campaign_repo: Arc<CampaignRepositoryImpl>,
    /// 机会选取服务
    pub selector: Arc<
        OpportunitySelector<CampaignRepositoryImpl, OpportunityRepositoryImpl, BacklinkRepositoryImpl>,
    >,
    /// 域名频率服务
    pub rate_limit: Arc<RateLimitService<BacklinkRepositoryImpl>>,
    /// API请求频率限制器
    pub limiter: Arc<ApiRateLimiter>,
    /// API令牌集合
    pub tokens: Arc<ApiTokenSet>,
}

impl AppContext {
    /// 从配置和数据库连接装配应用组件
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    /// * `settings` - 应用配置
    ///
    /// # 返回值
    ///
    /// 返回装配好的组件集合
    pub fn new(db: Arc<DatabaseConnection>, settings: &Settings) -> Self {
        let task_repo = Arc::new(TaskRepositoryImpl::new(
            db.clone(),
            settings.tasks.default_max_retries,
        ));
        let opportunity_repo = Arc::new(OpportunityRepositoryImpl::new(db.clone()));
        let backlink_repo = Arc::new(BacklinkRepositoryImpl::new(db.clone()));
        let campaign_repo = Arc::new(CampaignRepositoryImpl::new(db));

        let selector = Arc::new(OpportunitySelector::new(
            campaign_repo.clone(),
            opportunity_repo.clone(),
            backlink_repo.clone(),
            settings.selection.oversample_factor,
        ));
        let rate_limit = Arc::new(RateLimitService::new(backlink_repo.clone()));
        let limiter = Arc::new(ApiRateLimiter::new(&settings.rate_limiting));
        let tokens = Arc::new(ApiTokenSet::new(&settings.auth.api_tokens));

        Self {
            task_repo,
            opportunity_repo,
            backlink_repo,
            campaign_repo,
            selector,
            rate_limit,
            limiter,
            tokens,
        }
    }
}

/// 创建应用路由
///
/// 公开路由只有健康检查和版本查询；其余端点都经过
/// 认证和请求频率两层中间件。
///
/// # 参数
///
/// * `context` - 应用组件集合
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(context: AppContext) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let protected_routes = Router::new()
        .route(
            "/api/v1/tasks/pending",
            get(task_handler::list_pending_tasks::<TaskRepositoryImpl>),
        )
        .route(
            "/api/v1/tasks/{id}/lock",
            post(task_handler::lock_task::<TaskRepositoryImpl>),
        )
        .route(
            "/api/v1/tasks/{id}/unlock",
            post(task_handler::unlock_task::<TaskRepositoryImpl>),
        )
        .route(
            "/api/v1/tasks/{id}/status",
            patch(task_handler::update_task_status::<TaskRepositoryImpl>),
        )
        .route(
            "/api/v1/opportunities",
            post(
                opportunity_handler::create_opportunity::<
                    OpportunityRepositoryImpl,
                    BacklinkRepositoryImpl,
                >,
            ),
        )
        .route(
            "/api/v1/opportunities/{id}",
            patch(opportunity_handler::update_opportunity::<OpportunityRepositoryImpl>),
        )
        .route(
            "/api/v1/opportunities/for-campaign/{campaign_id}",
            get(opportunity_handler::opportunities_for_campaign::<
                CampaignRepositoryImpl,
                OpportunityRepositoryImpl,
                BacklinkRepositoryImpl,
            >),
        )
        .layer(
            ServiceBuilder::new()
                .layer(Extension(context.task_repo.clone()))
                .layer(Extension(context.opportunity_repo.clone()))
                .layer(Extension(context.selector.clone()))
                .layer(Extension(context.rate_limit.clone())),
        )
        .layer(middleware::from_fn_with_state(
            context.limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            AuthState {
                tokens: context.tokens.clone(),
            },
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
