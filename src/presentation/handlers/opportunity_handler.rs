// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::opportunity_request::{
    CreateOpportunityRequestDto, ForCampaignQuery, UpdateOpportunityRequestDto,
};
use crate::application::dto::opportunity_response::{CampaignDto, OpportunityDto, PlanLimitsDto};
use crate::domain::models::backlink::Backlink;
use crate::domain::models::opportunity::{BacklinkOpportunity, OpportunityStatus};
use crate::domain::repositories::backlink_repository::BacklinkRepository;
use crate::domain::repositories::campaign_repository::CampaignRepository;
use crate::domain::repositories::opportunity_repository::OpportunityRepository;
use crate::domain::services::opportunity_selector::OpportunitySelector;
use crate::domain::services::rate_limit_service::{
    seconds_until_utc_midnight, RateLimitService,
};
use crate::presentation::errors::ApiError;
use crate::utils::url_utils::extract_domain;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// 机会创建处理器
///
/// 工作器回报一次投放动作。状态代表已落地投放且携带URL时，
/// 先做域名频率快速检查，再在同一事务内落库机会和外链记录；
/// 失败状态的回报不占用配额，跳过频率检查。
///
/// # 参数
///
/// * `opportunity_repo` - 机会仓库
/// * `rate_limit` - 域名频率服务
/// * `request` - 创建请求
pub async fn create_opportunity<O, B>(
    Extension(opportunity_repo): Extension<Arc<O>>,
    Extension(rate_limit): Extension<Arc<RateLimitService<B>>>,
    Json(request): Json<CreateOpportunityRequestDto>,
) -> Result<Response, ApiError>
where
    O: OpportunityRepository + 'static,
    B: BacklinkRepository + 'static,
{
    if let Err(errors) = request.validate() {
        return Err(ApiError::Validation(format!(
            "Validation error: {}",
            errors
        )));
    }

    let status = request
        .status
        .parse::<OpportunityStatus>()
        .map_err(|_| ApiError::Validation(format!("Invalid status value: {}", request.status)))?;

    let opportunity = BacklinkOpportunity {
        id: Uuid::new_v4(),
        campaign_id: request.campaign_id,
        backlink_id: request.backlink_id,
        url: request.url,
        site_type: request.site_type,
        pa: request.pa,
        da: request.da,
        status,
        keyword: request.keyword,
        anchor_text: request.anchor_text,
        category_id: request.category_id,
        site_account_id: request.site_account_id,
        daily_site_limit: request.daily_site_limit,
        error_message: request.error_message,
        verified_at: None,
        created_at: Utc::now().into(),
    };

    let placement_url = opportunity
        .url
        .clone()
        .filter(|_| opportunity.status.is_placement());

    let created = match placement_url {
        Some(url) => {
            let allowed = rate_limit
                .check_domain_rate_limit(&url, opportunity.campaign_id)
                .await?;
            if !allowed {
                let domain = extract_domain(&url).unwrap_or_else(|| url.clone());
                return Err(ApiError::RateLimited {
                    message: format!(
                        "Daily backlink limit already reached for domain {}",
                        domain
                    ),
                    retry_after_secs: seconds_until_utc_midnight(Utc::now()),
                });
            }

            let backlink = Backlink::from_placement(
                opportunity.campaign_id,
                Some(opportunity.id),
                &url,
                &opportunity.site_type,
                opportunity.pa,
                opportunity.da,
            )?;

            opportunity_repo
                .create_with_backlink(&opportunity, Some(&backlink))
                .await?
        }
        None => opportunity_repo.create(&opportunity).await?,
    };

    info!(
        opportunity_id = %created.id,
        campaign_id = %created.campaign_id,
        status = %created.status,
        "Opportunity recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Opportunity recorded",
            "opportunity": OpportunityDto::from(created),
        })),
    )
        .into_response())
}

/// 机会更新处理器
///
/// 工作器回报既有机会的执行结果。状态转为 verified 且未
/// 显式给出核实时间时自动补记当前时间。
pub async fn update_opportunity<O>(
    Extension(opportunity_repo): Extension<Arc<O>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateOpportunityRequestDto>,
) -> Result<Response, ApiError>
where
    O: OpportunityRepository + 'static,
{
    let status = match request.status.as_deref() {
        Some(raw) => Some(
            raw.parse::<OpportunityStatus>()
                .map_err(|_| ApiError::Validation(format!("Invalid status value: {}", raw)))?,
        ),
        None => None,
    };

    let mut opportunity = opportunity_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Opportunity not found".to_string()))?;

    if let Some(url) = request.url {
        opportunity.url = Some(url);
    }
    opportunity.apply_report(status, request.error_message, request.verified_at);

    let updated = opportunity_repo.update(&opportunity).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Opportunity updated",
            "opportunity": OpportunityDto::from(updated),
        })),
    )
        .into_response())
}

/// 活动选取处理器
///
/// 为活动返回下一批可投放机会，约束见选取服务
///
/// # 参数
///
/// * `selector` - 机会选取服务
/// * `campaign_id` - 活动ID
/// * `query` - 查询参数
pub async fn opportunities_for_campaign<C, O, B>(
    Extension(selector): Extension<Arc<OpportunitySelector<C, O, B>>>,
    Path(campaign_id): Path<Uuid>,
    Query(query): Query<ForCampaignQuery>,
) -> Result<Response, ApiError>
where
    C: CampaignRepository + 'static,
    O: OpportunityRepository + 'static,
    B: BacklinkRepository + 'static,
{
    let count = query.count.unwrap_or(1).min(50);

    let selection = selector
        .select_for_campaign(campaign_id, count, query.site_type.as_deref())
        .await?;

    let opportunities: Vec<OpportunityDto> = selection
        .opportunities
        .into_iter()
        .map(OpportunityDto::from)
        .collect();

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "opportunities": opportunities,
            "campaign": CampaignDto::from(&selection.campaign),
            "plan_limits": PlanLimitsDto::from(&selection.plan),
            "task_type": query.task_type,
        })),
    )
        .into_response())
}
