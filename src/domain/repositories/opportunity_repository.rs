// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::backlink::Backlink;
use crate::domain::models::opportunity::BacklinkOpportunity;
use crate::domain::repositories::task_repository::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 候选机会筛选条件
///
/// 权威度区间来自活动所属套餐，分类来自活动配置。
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    /// 页面权威度下限（含）
    pub min_pa: i32,
    /// 页面权威度上限（含）
    pub max_pa: i32,
    /// 域名权威度下限（含）
    pub min_da: i32,
    /// 域名权威度上限（含）
    pub max_da: i32,
    /// 允许的分类ID列表
    pub category_ids: Vec<Uuid>,
    /// 站点类型过滤，为空则不过滤
    pub site_type: Option<String>,
    /// 返回数量上限
    pub limit: u64,
}

/// 机会仓储接口
#[async_trait]
pub trait OpportunityRepository: Send + Sync {
    /// 创建机会
    async fn create(
        &self,
        opportunity: &BacklinkOpportunity,
    ) -> Result<BacklinkOpportunity, RepositoryError>;

    /// 根据ID查找机会
    async fn find_by_id(&self, id: Uuid) -> Result<Option<BacklinkOpportunity>, RepositoryError>;

    /// 持久化机会的全部可变字段
    async fn update(
        &self,
        opportunity: &BacklinkOpportunity,
    ) -> Result<BacklinkOpportunity, RepositoryError>;

    /// 查询符合条件的活跃候选机会
    ///
    /// 只返回 active 状态的机会，按权威度之和（PA+DA）降序排列。
    ///
    /// # 参数
    ///
    /// * `filter` - 筛选条件
    async fn find_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<BacklinkOpportunity>, RepositoryError>;

    /// 查询活动下指定站点类型的活跃机会
    ///
    /// 按权威度之和降序排列，用于批量重建任务时生成候选目标。
    async fn find_active_for_campaign(
        &self,
        campaign_id: Uuid,
        site_type: &str,
    ) -> Result<Vec<BacklinkOpportunity>, RepositoryError>;

    /// 在同一事务内创建机会并记录外链
    ///
    /// 外链插入命中（活动，域名，日期）唯一约束时整个事务回滚，
    /// 返回配额错误，机会不会被落库。
    ///
    /// # 参数
    ///
    /// * `opportunity` - 要创建的机会
    /// * `backlink` - 随之记录的外链，为空则只创建机会
    ///
    /// # 返回值
    ///
    /// * `Ok(BacklinkOpportunity)` - 创建成功
    /// * `Err(RepositoryError::DailyQuotaConsumed)` - 当日配额已用尽
    async fn create_with_backlink(
        &self,
        opportunity: &BacklinkOpportunity,
        backlink: Option<&Backlink>,
    ) -> Result<BacklinkOpportunity, RepositoryError>;
}
