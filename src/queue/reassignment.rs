// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::opportunity::{ReassignTarget, TargetSource};
use crate::domain::models::task::TaskType;
use crate::domain::repositories::backlink_repository::BacklinkRepository;
use crate::domain::repositories::opportunity_repository::OpportunityRepository;
use crate::domain::repositories::task_repository::{RepositoryError, TaskRepository};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// 单个活动的重新分配方案
///
/// 计划阶段的产物：该活动下有多少任务可重建，以及候选目标
/// 来自哪个来源。干跑模式只产出方案，不做任何写入。
#[derive(Debug)]
pub struct CampaignPlan {
    /// 活动ID
    pub campaign_id: Uuid,
    /// 可重建的任务数（pending/failed/cancelled）
    pub resettable: u64,
    /// 候选目标来源
    pub source: TargetSource,
}

impl CampaignPlan {
    /// 计划重建的任务数
    ///
    /// 没有任何候选目标的活动不做替换，保持原任务集不变。
    pub fn planned(&self) -> u64 {
        if self.source.targets().is_empty() {
            0
        } else {
            self.resettable
        }
    }
}

/// 单个活动的重新分配执行报告
#[derive(Debug, Clone)]
pub struct CampaignReport {
    /// 活动ID
    pub campaign_id: Uuid,
    /// 删除的任务数
    pub deleted: u64,
    /// 新建的任务数
    pub created: u64,
    /// 候选目标来源标签
    pub source: &'static str,
}

/// 任务重新分配流水线
///
/// 分三步走：选出各活动可重建的任务 → 为每个活动计算候选
/// 目标集 → 在事务内删除并重建。候选优先取活动的活跃机会，
/// 机会为空时回落到历史外链记录；两条路径都按URL去重。
/// 目标数少于任务数时循环复用候选。
pub struct ReassignmentPipeline<T, O, B>
where
    T: TaskRepository,
    O: OpportunityRepository,
    B: BacklinkRepository,
{
    task_repo: Arc<T>,
    opportunity_repo: Arc<O>,
    backlink_repo: Arc<B>,
}

impl<T, O, B> ReassignmentPipeline<T, O, B>
where
    T: TaskRepository,
    O: OpportunityRepository,
    B: BacklinkRepository,
{
    /// 创建流水线实例
    pub fn new(task_repo: Arc<T>, opportunity_repo: Arc<O>, backlink_repo: Arc<B>) -> Self {
        Self {
            task_repo,
            opportunity_repo,
            backlink_repo,
        }
    }

    /// 计算重新分配方案
    ///
    /// # 参数
    ///
    /// * `task_type` - 任务类型
    /// * `campaign_id` - 只处理指定活动，为空则处理所有活动
    ///
    /// # 返回值
    ///
    /// 返回各活动的方案，没有可重建任务的活动不在列表中
    pub async fn plan(
        &self,
        task_type: TaskType,
        campaign_id: Option<Uuid>,
    ) -> Result<Vec<CampaignPlan>, RepositoryError> {
        let counts = self.task_repo.count_resettable_by_campaign(task_type).await?;

        let mut plans = Vec::new();
        for (candidate, resettable) in counts {
            if let Some(only) = campaign_id {
                if candidate != only {
                    continue;
                }
            }

            let source = self.resolve_targets(candidate, task_type).await?;
            if source.targets().is_empty() {
                warn!(
                    campaign_id = %candidate,
                    resettable,
                    "No reassignment targets available, campaign left untouched"
                );
            }

            plans.push(CampaignPlan {
                campaign_id: candidate,
                resettable,
                source,
            });
        }

        Ok(plans)
    }

    /// 执行重新分配方案
    ///
    /// 每个活动的删除与重建在单个事务内完成，活动之间相互独立，
    /// 某个活动失败不影响已完成的活动。
    pub async fn execute(
        &self,
        task_type: TaskType,
        plans: &[CampaignPlan],
    ) -> Result<Vec<CampaignReport>, RepositoryError> {
        let mut reports = Vec::with_capacity(plans.len());

        for plan in plans {
            let outcome = self
                .task_repo
                .replace_campaign_tasks(plan.campaign_id, task_type, plan.source.targets())
                .await?;

            info!(
                campaign_id = %plan.campaign_id,
                deleted = outcome.deleted,
                created = outcome.created,
                source = plan.source.label(),
                "Campaign tasks reassigned"
            );

            reports.push(CampaignReport {
                campaign_id: plan.campaign_id,
                deleted: outcome.deleted,
                created: outcome.created,
                source: plan.source.label(),
            });
        }

        Ok(reports)
    }

    /// 计算并执行重新分配
    ///
    /// # 参数
    ///
    /// * `task_type` - 任务类型
    /// * `campaign_id` - 只处理指定活动，为空则处理所有活动
    pub async fn run(
        &self,
        task_type: TaskType,
        campaign_id: Option<Uuid>,
    ) -> Result<Vec<CampaignReport>, RepositoryError> {
        let plans = self.plan(task_type, campaign_id).await?;
        self.execute(task_type, &plans).await
    }

    /// 为活动解析候选目标集
    ///
    /// 活跃机会按URL去重后作为首选来源；一个可用机会都没有时
    /// 回落到该活动的历史外链记录。
    async fn resolve_targets(
        &self,
        campaign_id: Uuid,
        task_type: TaskType,
    ) -> Result<TargetSource, RepositoryError> {
        let site_type = task_type.to_string();

        let opportunities = self
            .opportunity_repo
            .find_active_for_campaign(campaign_id, &site_type)
            .await?;

        let mut seen = HashSet::new();
        let targets: Vec<ReassignTarget> = opportunities
            .into_iter()
            .filter_map(|opportunity| {
                let url = opportunity.url?;
                if !seen.insert(url.clone()) {
                    return None;
                }
                Some(ReassignTarget {
                    opportunity_id: Some(opportunity.id),
                    url,
                    keyword: opportunity.keyword,
                    anchor_text: opportunity.anchor_text,
                })
            })
            .collect();

        if !targets.is_empty() {
            return Ok(TargetSource::Opportunities(targets));
        }

        let backlinks = self
            .backlink_repo
            .list_for_campaign(campaign_id, Some(&site_type))
            .await?;

        let mut seen = HashSet::new();
        let targets: Vec<ReassignTarget> = backlinks
            .into_iter()
            .filter_map(|backlink| {
                if !seen.insert(backlink.url.clone()) {
                    return None;
                }
                Some(ReassignTarget {
                    opportunity_id: backlink.backlink_opportunity_id,
                    url: backlink.url,
                    keyword: None,
                    anchor_text: None,
                })
            })
            .collect();

        Ok(TargetSource::BacklinkHistory(targets))
    }
}
