// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::backlink::Backlink;
use crate::domain::repositories::task_repository::RepositoryError;
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

/// 外链记录仓储接口
///
/// 计数查询均以UTC日期为窗口，供配额判定使用。
#[async_trait]
pub trait BacklinkRepository: Send + Sync {
    /// 记录一条外链
    ///
    /// # 返回值
    ///
    /// * `Ok(Backlink)` - 记录成功
    /// * `Err(RepositoryError::DailyQuotaConsumed)` - 命中（活动，域名，日期）唯一约束
    async fn create(&self, backlink: &Backlink) -> Result<Backlink, RepositoryError>;

    /// 统计活动在指定域名、指定日期的外链数
    async fn count_for_campaign_domain_on(
        &self,
        campaign_id: Uuid,
        domain: &str,
        date: NaiveDate,
    ) -> Result<u64, RepositoryError>;

    /// 统计活动在指定日期的外链总数
    async fn count_for_campaign_on(
        &self,
        campaign_id: Uuid,
        date: NaiveDate,
    ) -> Result<u64, RepositoryError>;

    /// 统计机会在指定日期的外链数
    async fn count_for_opportunity_on(
        &self,
        opportunity_id: Uuid,
        date: NaiveDate,
    ) -> Result<u64, RepositoryError>;

    /// 判断活动当日是否已对该机会投放过
    async fn exists_for_campaign_opportunity_on(
        &self,
        campaign_id: Uuid,
        opportunity_id: Uuid,
        date: NaiveDate,
    ) -> Result<bool, RepositoryError>;

    /// 列出活动的历史外链记录
    ///
    /// # 参数
    ///
    /// * `campaign_id` - 活动ID
    /// * `site_type` - 按站点类型过滤，为空则不过滤
    async fn list_for_campaign(
        &self,
        campaign_id: Uuid,
        site_type: Option<&str>,
    ) -> Result<Vec<Backlink>, RepositoryError>;
}
