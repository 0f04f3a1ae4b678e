// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 活动实体
///
/// 外链投放活动。任务选取以活动的分类配置、每日上限和
/// 所属套餐的权威度边界为约束。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    /// 活动唯一标识符
    pub id: Uuid,
    /// 活动名称
    pub name: String,
    /// 所属套餐ID，为空表示未分配套餐
    pub plan_id: Option<Uuid>,
    /// 主分类ID
    pub category_id: Option<Uuid>,
    /// 子分类ID
    pub subcategory_id: Option<Uuid>,
    /// 每日外链上限，以外链记录表计数
    pub daily_limit: i32,
    /// 活动状态
    pub status: String,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
}

impl Campaign {
    /// 返回活动配置的分类ID列表
    ///
    /// 主分类与子分类合并，未配置的留空。选取时机会的分类
    /// 必须落在该列表内。
    pub fn category_ids(&self) -> Vec<Uuid> {
        [self.category_id, self.subcategory_id]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// 套餐实体
///
/// 定义活动可投放机会的权威度区间。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// 套餐唯一标识符
    pub id: Uuid,
    /// 套餐名称
    pub name: String,
    /// 页面权威度下限
    pub min_pa: i32,
    /// 页面权威度上限
    pub max_pa: i32,
    /// 域名权威度下限
    pub min_da: i32,
    /// 域名权威度上限
    pub max_da: i32,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
}
