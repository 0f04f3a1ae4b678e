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
use crate::domain::models::opportunity::{BacklinkOpportunity, OpportunityStatus};
use crate::domain::repositories::opportunity_repository::{CandidateFilter, OpportunityRepository};
use crate::domain::repositories::task_repository::RepositoryError;
use crate::infrastructure::database::entities::backlink as backlink_entity;
use crate::infrastructure::database::entities::backlink_opportunity as opportunity_entity;
use async_trait::async_trait;
use metrics::counter;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

/// 机会仓库实现
///
/// 基于SeaORM实现的外链机会数据访问层
#[derive(Clone)]
pub struct OpportunityRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl OpportunityRepositoryImpl {
    /// 创建新的机会仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    ///
    /// # 返回值
    ///
    /// 返回新的机会仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<opportunity_entity::Model> for BacklinkOpportunity {
    fn from(model: opportunity_entity::Model) -> Self {
        Self {
            id: model.id,
            campaign_id: model.campaign_id,
            backlink_id: model.backlink_id,
            url: model.url,
            site_type: model.site_type,
            pa: model.pa,
            da: model.da,
            status: model.status.parse().unwrap_or_default(),
            keyword: model.keyword,
            anchor_text: model.anchor_text,
            category_id: model.category_id,
            site_account_id: model.site_account_id,
            daily_site_limit: model.daily_site_limit,
            error_message: model.error_message,
            verified_at: model.verified_at,
            created_at: model.created_at,
        }
    }
}

impl From<BacklinkOpportunity> for opportunity_entity::ActiveModel {
    fn from(opportunity: BacklinkOpportunity) -> Self {
        Self {
            id: Set(opportunity.id),
            campaign_id: Set(opportunity.campaign_id),
            backlink_id: Set(opportunity.backlink_id),
            url: Set(opportunity.url.clone()),
            site_type: Set(opportunity.site_type.clone()),
            pa: Set(opportunity.pa),
            da: Set(opportunity.da),
            status: Set(opportunity.status.to_string()),
            keyword: Set(opportunity.keyword.clone()),
            anchor_text: Set(opportunity.anchor_text.clone()),
            site_account_id: Set(opportunity.site_account_id),
            error_message: Set(opportunity.error_message.clone()),
            daily_site_limit: Set(opportunity.daily_site_limit),
            category_id: Set(opportunity.category_id),
            verified_at: Set(opportunity.verified_at),
            created_at: Set(opportunity.created_at),
        }
    }
}

#[async_trait]
impl OpportunityRepository for OpportunityRepositoryImpl {
    async fn create(
        &self,
        opportunity: &BacklinkOpportunity,
    ) -> Result<BacklinkOpportunity, RepositoryError> {
        let model: opportunity_entity::ActiveModel = opportunity.clone().into();

        model.insert(self.db.as_ref()).await?;
        Ok(opportunity.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<BacklinkOpportunity>, RepositoryError> {
        let model = opportunity_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn update(
        &self,
        opportunity: &BacklinkOpportunity,
    ) -> Result<BacklinkOpportunity, RepositoryError> {
        let model: opportunity_entity::ActiveModel = opportunity.clone().into();

        let updated = model.update(self.db.as_ref()).await?;
        Ok(updated.into())
    }

    async fn find_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<BacklinkOpportunity>, RepositoryError> {
        let mut query = opportunity_entity::Entity::find()
            .filter(
                opportunity_entity::Column::Status.eq(OpportunityStatus::Active.to_string()),
            )
            .filter(opportunity_entity::Column::Pa.between(filter.min_pa, filter.max_pa))
            .filter(opportunity_entity::Column::Da.between(filter.min_da, filter.max_da))
            .filter(opportunity_entity::Column::CategoryId.is_in(filter.category_ids.clone()));

        if let Some(site_type) = &filter.site_type {
            query = query.filter(opportunity_entity::Column::SiteType.eq(site_type.clone()));
        }

        // 权威度之和降序，质量高的站点排在前面
        let models = query
            .order_by_desc(
                Expr::col(opportunity_entity::Column::Pa)
                    .add(Expr::col(opportunity_entity::Column::Da)),
            )
            .limit(filter.limit)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(BacklinkOpportunity::from).collect())
    }

    async fn find_active_for_campaign(
        &self,
        campaign_id: Uuid,
        site_type: &str,
    ) -> Result<Vec<BacklinkOpportunity>, RepositoryError> {
        let models = opportunity_entity::Entity::find()
            .filter(opportunity_entity::Column::CampaignId.eq(campaign_id))
            .filter(
                opportunity_entity::Column::Status.eq(OpportunityStatus::Active.to_string()),
            )
            .filter(opportunity_entity::Column::SiteType.eq(site_type))
            .order_by_desc(
                Expr::col(opportunity_entity::Column::Pa)
                    .add(Expr::col(opportunity_entity::Column::Da)),
            )
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(BacklinkOpportunity::from).collect())
    }

    async fn create_with_backlink(
        &self,
        opportunity: &BacklinkOpportunity,
        backlink: Option<&Backlink>,
    ) -> Result<BacklinkOpportunity, RepositoryError> {
        // 机会和外链记录在同一事务内落库，外链命中当日配额唯一
        // 约束时整体回滚
        let txn = self.db.begin().await?;

        let model: opportunity_entity::ActiveModel = opportunity.clone().into();
        model.insert(&txn).await?;

        if let Some(backlink) = backlink {
            let model: backlink_entity::ActiveModel = backlink.clone().into();
            if let Err(err) = model.insert(&txn).await {
                if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    return Err(RepositoryError::DailyQuotaConsumed {
                        domain: backlink.domain.clone(),
                    });
                }
                return Err(err.into());
            }
            counter!("linkrs_backlinks_recorded_total").increment(1);
        }

        txn.commit().await?;

        Ok(opportunity.clone())
    }
}
