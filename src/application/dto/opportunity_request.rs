// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 机会创建请求
///
/// 工作器回报一次投放动作时提交，携带机会属性和可选的
/// 外链落地信息
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateOpportunityRequestDto {
    /// 所属活动ID
    pub campaign_id: Uuid,
    /// 站点目录中对应站点的ID
    pub backlink_id: Uuid,
    /// 站点类型
    #[serde(rename = "type")]
    pub site_type: String,
    /// 机会状态
    pub status: String,
    /// 目标页面URL
    #[validate(url)]
    pub url: Option<String>,
    /// 页面权威度
    #[validate(range(min = 0, max = 100))]
    pub pa: Option<i32>,
    /// 域名权威度
    #[validate(range(min = 0, max = 100))]
    pub da: Option<i32>,
    /// 目标关键词
    pub keyword: Option<String>,
    /// 锚文本
    pub anchor_text: Option<String>,
    /// 站点账号ID
    pub site_account_id: Option<Uuid>,
    /// 分类ID
    pub category_id: Option<Uuid>,
    /// 该站点每日投放上限
    #[validate(range(min = 1))]
    pub daily_site_limit: Option<i32>,
    /// 失败说明，回报 error 状态时携带
    pub error_message: Option<String>,
}

/// 机会更新请求
///
/// 工作器回报既有机会的执行结果
#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateOpportunityRequestDto {
    /// 新状态
    pub status: Option<String>,
    /// 失败说明
    pub error_message: Option<String>,
    /// 核实时间
    pub verified_at: Option<DateTime<FixedOffset>>,
    /// 最终落地URL
    pub url: Option<String>,
}

/// 活动选取查询参数
#[derive(Debug, Deserialize, Serialize)]
pub struct ForCampaignQuery {
    /// 期望数量，缺省为1，上限50
    pub count: Option<usize>,
    /// 任务类型，原样回显给调用方
    pub task_type: Option<String>,
    /// 站点类型过滤
    pub site_type: Option<String>,
}
