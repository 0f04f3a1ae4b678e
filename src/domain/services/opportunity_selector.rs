// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::campaign::{Campaign, Plan};
use crate::domain::models::opportunity::BacklinkOpportunity;
use crate::domain::repositories::backlink_repository::BacklinkRepository;
use crate::domain::repositories::campaign_repository::CampaignRepository;
use crate::domain::repositories::opportunity_repository::{
    CandidateFilter, OpportunityRepository,
};
use crate::domain::repositories::task_repository::RepositoryError;
use chrono::Utc;
use rand::seq::SliceRandom;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// 选取过程错误类型
#[derive(Error, Debug)]
pub enum SelectionError {
    /// 活动不存在
    #[error("Campaign not found")]
    CampaignNotFound,

    /// 活动未分配套餐，无法确定配额边界
    #[error("Campaign has no plan assigned")]
    NoPlanAssigned,

    /// 活动未配置分类
    #[error("Campaign has no category selected")]
    NoCategorySelected,

    /// 仓储层错误
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// 选取结果
///
/// 除选中的机会外携带活动与套餐，供响应组装使用。
#[derive(Debug)]
pub struct Selection {
    /// 选中的机会列表
    pub opportunities: Vec<BacklinkOpportunity>,
    /// 所属活动
    pub campaign: Campaign,
    /// 活动所属套餐
    pub plan: Plan,
}

/// 机会选取服务
///
/// 为活动挑选下一批可投放的机会。选取以套餐的权威度区间
/// 和活动的分类配置为硬边界，叠加三层配额约束：
/// 活动每日总量、单站点每日上限、同一机会当日不重复。
/// 合格者先按权威度截取较优的一半再随机打乱，在质量和
/// 目标多样性之间折中。
pub struct OpportunitySelector<C, O, B>
where
    C: CampaignRepository,
    O: OpportunityRepository,
    B: BacklinkRepository,
{
    campaign_repo: Arc<C>,
    opportunity_repo: Arc<O>,
    backlink_repo: Arc<B>,
    /// 过采样倍数，候选查询取 count 的该倍数以吸收配额过滤损耗
    oversample_factor: u64,
}

impl<C, O, B> OpportunitySelector<C, O, B>
where
    C: CampaignRepository,
    O: OpportunityRepository,
    B: BacklinkRepository,
{
    /// 创建选取服务实例
    pub fn new(
        campaign_repo: Arc<C>,
        opportunity_repo: Arc<O>,
        backlink_repo: Arc<B>,
        oversample_factor: u64,
    ) -> Self {
        Self {
            campaign_repo,
            opportunity_repo,
            backlink_repo,
            oversample_factor: oversample_factor.max(1),
        }
    }

    /// 为活动选取下一批机会
    ///
    /// # 参数
    ///
    /// * `campaign_id` - 活动ID
    /// * `count` - 期望数量
    /// * `site_type` - 站点类型过滤，为空则不限类型
    ///
    /// # 返回值
    ///
    /// * `Ok(Selection)` - 选取结果；活动当日配额已满时机会列表为空
    /// * `Err(SelectionError)` - 活动缺失或配置不完整
    pub async fn select_for_campaign(
        &self,
        campaign_id: uuid::Uuid,
        count: usize,
        site_type: Option<&str>,
    ) -> Result<Selection, SelectionError> {
        let campaign = self
            .campaign_repo
            .find_by_id(campaign_id)
            .await?
            .ok_or(SelectionError::CampaignNotFound)?;

        let plan_id = campaign.plan_id.ok_or(SelectionError::NoPlanAssigned)?;
        let plan = self
            .campaign_repo
            .find_plan(plan_id)
            .await?
            .ok_or(SelectionError::NoPlanAssigned)?;

        let category_ids = campaign.category_ids();
        if category_ids.is_empty() {
            return Err(SelectionError::NoCategorySelected);
        }

        let today = Utc::now().date_naive();

        // 活动每日总量在整个选取过程中只检查一次
        let placed_today = self
            .backlink_repo
            .count_for_campaign_on(campaign_id, today)
            .await?;
        if placed_today >= campaign.daily_limit.max(0) as u64 {
            debug!(
                campaign_id = %campaign_id,
                placed_today,
                limit = campaign.daily_limit,
                "Campaign daily backlink limit reached, returning empty selection"
            );
            return Ok(Selection {
                opportunities: Vec::new(),
                campaign,
                plan,
            });
        }

        let filter = CandidateFilter {
            min_pa: plan.min_pa,
            max_pa: plan.max_pa,
            min_da: plan.min_da,
            max_da: plan.max_da,
            category_ids,
            site_type: site_type.map(str::to_string),
            limit: count as u64 * self.oversample_factor,
        };
        let candidates = self.opportunity_repo.find_candidates(&filter).await?;

        let mut survivors = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if let Some(site_limit) = candidate.daily_site_limit {
                let placed = self
                    .backlink_repo
                    .count_for_opportunity_on(candidate.id, today)
                    .await?;
                if placed >= site_limit.max(0) as u64 {
                    continue;
                }
            }
            let repeated = self
                .backlink_repo
                .exists_for_campaign_opportunity_on(campaign_id, candidate.id, today)
                .await?;
            if repeated {
                continue;
            }
            survivors.push(candidate);
        }

        // 合格者多于所需时：截取权威度较优的一半（不少于count），
        // 打乱后再截到count
        if survivors.len() > count {
            let half = count.max(survivors.len().div_ceil(2));
            survivors.truncate(half);
            let mut rng = rand::rng();
            survivors.shuffle(&mut rng);
            survivors.truncate(count);
        }

        debug!(
            campaign_id = %campaign_id,
            requested = count,
            selected = survivors.len(),
            "Opportunity selection completed"
        );

        Ok(Selection {
            opportunities: survivors,
            campaign,
            plan,
        })
    }
}
