// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::backlink::Backlink;
use crate::domain::repositories::backlink_repository::BacklinkRepository;
use crate::domain::repositories::task_repository::RepositoryError;
use crate::infrastructure::database::entities::backlink as backlink_entity;
use async_trait::async_trait;
use chrono::NaiveDate;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use std::sync::Arc;
use uuid::Uuid;

/// 外链记录仓库实现
///
/// 基于SeaORM实现的外链记录数据访问层
#[derive(Clone)]
pub struct BacklinkRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl BacklinkRepositoryImpl {
    /// 创建新的外链记录仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    ///
    /// # 返回值
    ///
    /// 返回新的外链记录仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<backlink_entity::Model> for Backlink {
    fn from(model: backlink_entity::Model) -> Self {
        Self {
            id: model.id,
            campaign_id: model.campaign_id,
            backlink_opportunity_id: model.backlink_opportunity_id,
            url: model.url,
            domain: model.domain,
            site_type: model.site_type,
            pa: model.pa,
            da: model.da,
            status: model.status,
            link_date: model.link_date,
            created_at: model.created_at,
        }
    }
}

impl From<Backlink> for backlink_entity::ActiveModel {
    fn from(backlink: Backlink) -> Self {
        Self {
            id: Set(backlink.id),
            campaign_id: Set(backlink.campaign_id),
            backlink_opportunity_id: Set(backlink.backlink_opportunity_id),
            url: Set(backlink.url.clone()),
            domain: Set(backlink.domain.clone()),
            site_type: Set(backlink.site_type.clone()),
            pa: Set(backlink.pa),
            da: Set(backlink.da),
            status: Set(backlink.status.clone()),
            link_date: Set(backlink.link_date),
            created_at: Set(backlink.created_at),
        }
    }
}

#[async_trait]
impl BacklinkRepository for BacklinkRepositoryImpl {
    async fn create(&self, backlink: &Backlink) -> Result<Backlink, RepositoryError> {
        let model: backlink_entity::ActiveModel = backlink.clone().into();

        // （活动，域名，日期）唯一索引让插入本身成为原子的配额检查
        if let Err(err) = model.insert(self.db.as_ref()).await {
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                return Err(RepositoryError::DailyQuotaConsumed {
                    domain: backlink.domain.clone(),
                });
            }
            return Err(err.into());
        }

        counter!("linkrs_backlinks_recorded_total").increment(1);
        Ok(backlink.clone())
    }

    async fn count_for_campaign_domain_on(
        &self,
        campaign_id: Uuid,
        domain: &str,
        date: NaiveDate,
    ) -> Result<u64, RepositoryError> {
        let count = backlink_entity::Entity::find()
            .filter(backlink_entity::Column::CampaignId.eq(campaign_id))
            .filter(backlink_entity::Column::Domain.eq(domain))
            .filter(backlink_entity::Column::LinkDate.eq(date))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    async fn count_for_campaign_on(
        &self,
        campaign_id: Uuid,
        date: NaiveDate,
    ) -> Result<u64, RepositoryError> {
        let count = backlink_entity::Entity::find()
            .filter(backlink_entity::Column::CampaignId.eq(campaign_id))
            .filter(backlink_entity::Column::LinkDate.eq(date))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    async fn count_for_opportunity_on(
        &self,
        opportunity_id: Uuid,
        date: NaiveDate,
    ) -> Result<u64, RepositoryError> {
        let count = backlink_entity::Entity::find()
            .filter(backlink_entity::Column::BacklinkOpportunityId.eq(opportunity_id))
            .filter(backlink_entity::Column::LinkDate.eq(date))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    async fn exists_for_campaign_opportunity_on(
        &self,
        campaign_id: Uuid,
        opportunity_id: Uuid,
        date: NaiveDate,
    ) -> Result<bool, RepositoryError> {
        let count = backlink_entity::Entity::find()
            .filter(backlink_entity::Column::CampaignId.eq(campaign_id))
            .filter(backlink_entity::Column::BacklinkOpportunityId.eq(opportunity_id))
            .filter(backlink_entity::Column::LinkDate.eq(date))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }

    async fn list_for_campaign(
        &self,
        campaign_id: Uuid,
        site_type: Option<&str>,
    ) -> Result<Vec<Backlink>, RepositoryError> {
        let mut query = backlink_entity::Entity::find()
            .filter(backlink_entity::Column::CampaignId.eq(campaign_id));

        if let Some(site_type) = site_type {
            query = query.filter(backlink_entity::Column::SiteType.eq(site_type));
        }

        let models = query
            .order_by_desc(backlink_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Backlink::from).collect())
    }
}
