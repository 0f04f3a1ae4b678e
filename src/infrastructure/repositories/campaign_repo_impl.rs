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

use crate::domain::models::campaign::{Campaign, Plan};
use crate::domain::repositories::campaign_repository::CampaignRepository;
use crate::domain::repositories::task_repository::RepositoryError;
use crate::infrastructure::database::entities::campaign as campaign_entity;
use crate::infrastructure::database::entities::plan as plan_entity;
use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait};
use std::sync::Arc;
use uuid::Uuid;

/// 活动仓库实现
#[derive(Clone)]
pub struct CampaignRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl CampaignRepositoryImpl {
    /// 创建新的活动仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<campaign_entity::Model> for Campaign {
    fn from(model: campaign_entity::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            plan_id: model.plan_id,
            category_id: model.category_id,
            subcategory_id: model.subcategory_id,
            daily_limit: model.daily_limit,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

impl From<plan_entity::Model> for Plan {
    fn from(model: plan_entity::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            min_pa: model.min_pa,
            max_pa: model.max_pa,
            min_da: model.min_da,
            max_da: model.max_da,
            created_at: model.created_at,
        }
    }
}

#[async_trait]
impl CampaignRepository for CampaignRepositoryImpl {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Campaign>, RepositoryError> {
        let model = campaign_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn find_plan(&self, plan_id: Uuid) -> Result<Option<Plan>, RepositoryError> {
        let model = plan_entity::Entity::find_by_id(plan_id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }
}
