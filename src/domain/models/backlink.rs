// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::task::DomainError;
use crate::utils::url_utils::extract_domain;

/// 外链记录实体
///
/// 每条记录对应一次已落地的外链投放。记录按
/// （活动，域名，日期）维度唯一，该约束由存储层唯一索引保证，
/// 是每域每日一条外链配额的依据。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backlink {
    /// 记录唯一标识符
    pub id: Uuid,
    /// 所属活动ID
    pub campaign_id: Uuid,
    /// 关联的机会ID（若有）
    pub backlink_opportunity_id: Option<Uuid>,
    /// 外链所在页面URL
    pub url: String,
    /// 归一化域名，用于配额判定
    pub domain: String,
    /// 站点类型
    pub site_type: String,
    /// 页面权威度
    pub pa: Option<i32>,
    /// 域名权威度
    pub da: Option<i32>,
    /// 记录状态
    pub status: String,
    /// 投放日期（UTC），配额窗口按该日期切分
    pub link_date: NaiveDate,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
}

impl Backlink {
    /// 从一次投放构建外链记录
    ///
    /// 域名从URL中提取并归一化（小写、去掉www前缀），
    /// 投放日期取当前UTC日期。
    ///
    /// # 参数
    ///
    /// * `campaign_id` - 所属活动ID
    /// * `opportunity_id` - 关联机会ID（若有）
    /// * `url` - 外链所在页面URL
    /// * `site_type` - 站点类型
    /// * `pa` - 页面权威度
    /// * `da` - 域名权威度
    ///
    /// # 返回值
    ///
    /// * `Ok(Backlink)` - 构建成功
    /// * `Err(DomainError)` - URL无法解析出域名
    pub fn from_placement(
        campaign_id: Uuid,
        opportunity_id: Option<Uuid>,
        url: &str,
        site_type: &str,
        pa: Option<i32>,
        da: Option<i32>,
    ) -> Result<Self, DomainError> {
        let domain = extract_domain(url).ok_or_else(|| {
            DomainError::ValidationError(format!("cannot extract domain from url: {}", url))
        })?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            campaign_id,
            backlink_opportunity_id: opportunity_id,
            url: url.to_string(),
            domain,
            site_type: site_type.to_string(),
            pa,
            da,
            status: "active".to_string(),
            link_date: now.date_naive(),
            created_at: now.into(),
        })
    }
}
