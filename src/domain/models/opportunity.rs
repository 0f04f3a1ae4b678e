// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 外链机会实体
///
/// 表示一个可投放外链的目标站点页面，携带权威度指标（PA/DA）、
/// 分类信息和生命周期状态。工作器回报投放结果时会更新此实体。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacklinkOpportunity {
    /// 机会唯一标识符
    pub id: Uuid,
    /// 所属活动ID
    pub campaign_id: Uuid,
    /// 站点目录中对应站点的ID
    pub backlink_id: Uuid,
    /// 目标页面URL
    pub url: Option<String>,
    /// 站点类型，对应可投放的任务类型（comment/profile/forum/guestposting）
    pub site_type: String,
    /// 页面权威度（0-100）
    pub pa: Option<i32>,
    /// 域名权威度（0-100）
    pub da: Option<i32>,
    /// 机会状态
    pub status: OpportunityStatus,
    /// 目标关键词
    pub keyword: Option<String>,
    /// 锚文本
    pub anchor_text: Option<String>,
    /// 分类ID
    pub category_id: Option<Uuid>,
    /// 站点账号ID，投放时使用的账号
    pub site_account_id: Option<Uuid>,
    /// 该站点每日投放上限，为空表示不限
    pub daily_site_limit: Option<i32>,
    /// 失败原因说明
    pub error_message: Option<String>,
    /// 外链核实时间
    pub verified_at: Option<DateTime<FixedOffset>>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
}

/// 机会状态枚举
///
/// active 表示机会可参与选取；submitted/verified 表示外链已投放；
/// error 表示工作器回报了失败；inactive 和 banned 将机会移出选取池。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityStatus {
    /// 待核实，机会已录入但尚未确认可用
    #[default]
    Pending,
    /// 可用，参与任务选取
    Active,
    /// 已停用
    Inactive,
    /// 已封禁，目标站点拒绝投放
    Banned,
    /// 已提交，外链已投放但尚未核实
    Submitted,
    /// 已核实，外链确认存在
    Verified,
    /// 投放失败
    Error,
}

impl fmt::Display for OpportunityStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OpportunityStatus::Pending => write!(f, "pending"),
            OpportunityStatus::Active => write!(f, "active"),
            OpportunityStatus::Inactive => write!(f, "inactive"),
            OpportunityStatus::Banned => write!(f, "banned"),
            OpportunityStatus::Submitted => write!(f, "submitted"),
            OpportunityStatus::Verified => write!(f, "verified"),
            OpportunityStatus::Error => write!(f, "error"),
        }
    }
}

impl FromStr for OpportunityStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OpportunityStatus::Pending),
            "active" => Ok(OpportunityStatus::Active),
            "inactive" => Ok(OpportunityStatus::Inactive),
            "banned" => Ok(OpportunityStatus::Banned),
            "submitted" => Ok(OpportunityStatus::Submitted),
            "verified" => Ok(OpportunityStatus::Verified),
            "error" => Ok(OpportunityStatus::Error),
            _ => Err(()),
        }
    }
}

impl OpportunityStatus {
    /// 判断该状态是否代表一次已落地的外链投放
    pub fn is_placement(self) -> bool {
        matches!(
            self,
            OpportunityStatus::Active | OpportunityStatus::Submitted | OpportunityStatus::Verified
        )
    }
}

impl BacklinkOpportunity {
    /// 应用工作器回报的执行结果
    ///
    /// 状态转为 verified 且调用方未显式给出核实时间时，
    /// 若实体尚无核实时间则补记为当前时间。
    ///
    /// # 参数
    ///
    /// * `status` - 回报的新状态
    /// * `error_message` - 失败说明（若有）
    /// * `verified_at` - 显式核实时间（若有）
    pub fn apply_report(
        &mut self,
        status: Option<OpportunityStatus>,
        error_message: Option<String>,
        verified_at: Option<DateTime<FixedOffset>>,
    ) {
        if let Some(status) = status {
            self.status = status;
        }
        if let Some(message) = error_message {
            self.error_message = Some(message);
        }
        if let Some(at) = verified_at {
            self.verified_at = Some(at);
        } else if self.status == OpportunityStatus::Verified && self.verified_at.is_none() {
            self.verified_at = Some(Utc::now().into());
        }
    }
}

/// 重新分配候选目标
///
/// 批量重建任务时的投放目标，来自活跃机会或历史外链记录。
#[derive(Debug, Clone)]
pub struct ReassignTarget {
    /// 关联机会ID，来自历史外链时可能为空
    pub opportunity_id: Option<Uuid>,
    /// 目标URL
    pub url: String,
    /// 目标关键词
    pub keyword: Option<String>,
    /// 锚文本
    pub anchor_text: Option<String>,
}

/// 重新分配的目标来源
///
/// 优先使用活动的活跃机会；没有可用机会时回落到历史外链记录。
#[derive(Debug, Clone)]
pub enum TargetSource {
    /// 来自活跃机会
    Opportunities(Vec<ReassignTarget>),
    /// 来自历史外链记录
    BacklinkHistory(Vec<ReassignTarget>),
}

impl TargetSource {
    /// 返回候选目标列表
    pub fn targets(&self) -> &[ReassignTarget] {
        match self {
            TargetSource::Opportunities(targets) => targets,
            TargetSource::BacklinkHistory(targets) => targets,
        }
    }

    /// 返回来源标签，用于日志与报告
    pub fn label(&self) -> &'static str {
        match self {
            TargetSource::Opportunities(_) => "opportunities",
            TargetSource::BacklinkHistory(_) => "backlink_history",
        }
    }
}
