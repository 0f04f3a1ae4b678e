// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::campaign::{Campaign, Plan};
use crate::domain::models::opportunity::BacklinkOpportunity;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 机会视图
#[derive(Debug, Deserialize, Serialize)]
pub struct OpportunityDto {
    /// 机会ID
    pub id: Uuid,
    /// 目标页面URL
    pub url: Option<String>,
    /// 站点类型
    #[serde(rename = "type")]
    pub site_type: String,
    /// 页面权威度
    pub pa: Option<i32>,
    /// 域名权威度
    pub da: Option<i32>,
    /// 机会状态
    pub status: String,
    /// 该站点每日投放上限
    pub daily_site_limit: Option<i32>,
    /// 分类ID
    pub category_id: Option<Uuid>,
    /// 目标关键词
    pub keyword: Option<String>,
    /// 锚文本
    pub anchor_text: Option<String>,
    /// 核实时间
    pub verified_at: Option<DateTime<FixedOffset>>,
}

impl From<BacklinkOpportunity> for OpportunityDto {
    fn from(opportunity: BacklinkOpportunity) -> Self {
        Self {
            id: opportunity.id,
            url: opportunity.url,
            site_type: opportunity.site_type,
            pa: opportunity.pa,
            da: opportunity.da,
            status: opportunity.status.to_string(),
            daily_site_limit: opportunity.daily_site_limit,
            category_id: opportunity.category_id,
            keyword: opportunity.keyword,
            anchor_text: opportunity.anchor_text,
            verified_at: opportunity.verified_at,
        }
    }
}

/// 活动概要视图
#[derive(Debug, Deserialize, Serialize)]
pub struct CampaignDto {
    /// 活动ID
    pub id: Uuid,
    /// 活动名称
    pub name: String,
    /// 每日外链上限
    pub daily_limit: i32,
    /// 配置的分类ID列表
    pub category_ids: Vec<Uuid>,
}

impl From<&Campaign> for CampaignDto {
    fn from(campaign: &Campaign) -> Self {
        Self {
            id: campaign.id,
            name: campaign.name.clone(),
            daily_limit: campaign.daily_limit,
            category_ids: campaign.category_ids(),
        }
    }
}

/// 套餐权威度边界视图
#[derive(Debug, Deserialize, Serialize)]
pub struct PlanLimitsDto {
    /// 页面权威度下限
    pub min_pa: i32,
    /// 页面权威度上限
    pub max_pa: i32,
    /// 域名权威度下限
    pub min_da: i32,
    /// 域名权威度上限
    pub max_da: i32,
}

impl From<&Plan> for PlanLimitsDto {
    fn from(plan: &Plan) -> Self {
        Self {
            min_pa: plan.min_pa,
            max_pa: plan.max_pa,
            min_da: plan.min_da,
            max_da: plan.max_da,
        }
    }
}
