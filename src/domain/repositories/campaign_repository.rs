// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::campaign::{Campaign, Plan};
use crate::domain::repositories::task_repository::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 活动仓储接口
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// 根据ID查找活动
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Campaign>, RepositoryError>;

    /// 根据ID查找套餐
    async fn find_plan(&self, plan_id: Uuid) -> Result<Option<Plan>, RepositoryError>;
}
