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

use crate::domain::models::opportunity::ReassignTarget;
use crate::domain::models::task::{AutomationTask, TaskPayload, TaskStatus, TaskType};
use crate::domain::repositories::task_repository::{
    LockOutcome, ReplaceOutcome, RepositoryError, StuckTaskReport, TaskRepository,
};
use crate::infrastructure::database::entities::automation_task as task_entity;
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use metrics::counter;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// 任务仓库实现
///
/// 基于SeaORM实现的任务数据访问层
#[derive(Clone)]
pub struct TaskRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
    /// 批量重建任务时使用的最大重试次数
    default_max_retries: i32,
}

impl TaskRepositoryImpl {
    /// 创建新的任务仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    /// * `default_max_retries` - 重建任务的最大重试次数
    ///
    /// # 返回值
    ///
    /// 返回新的任务仓库实例
    pub fn new(db: Arc<DatabaseConnection>, default_max_retries: i32) -> Self {
        Self {
            db,
            default_max_retries,
        }
    }
}

impl From<task_entity::Model> for AutomationTask {
    fn from(model: task_entity::Model) -> Self {
        Self {
            id: model.id,
            campaign_id: model.campaign_id,
            task_type: model.task_type.parse().unwrap_or_default(),
            status: model.status.parse().unwrap_or_default(),
            payload: serde_json::from_value(model.payload).unwrap_or_default(),
            result: model.result,
            error_message: model.error_message,
            retry_count: model.retry_count,
            max_retries: model.max_retries,
            locked_by: model.locked_by,
            locked_at: model.locked_at,
            started_at: model.started_at,
            completed_at: model.completed_at,
            created_at: model.created_at,
        }
    }
}

impl From<AutomationTask> for task_entity::ActiveModel {
    fn from(task: AutomationTask) -> Self {
        Self {
            id: Set(task.id),
            campaign_id: Set(task.campaign_id),
            task_type: Set(task.task_type.to_string()),
            status: Set(task.status.to_string()),
            payload: Set(serde_json::to_value(&task.payload).unwrap_or_default()),
            result: Set(task.result.clone()),
            error_message: Set(task.error_message.clone()),
            retry_count: Set(task.retry_count),
            max_retries: Set(task.max_retries),
            locked_by: Set(task.locked_by.clone()),
            locked_at: Set(task.locked_at),
            started_at: Set(task.started_at),
            completed_at: Set(task.completed_at),
            created_at: Set(task.created_at),
        }
    }
}

#[async_trait]
impl TaskRepository for TaskRepositoryImpl {
    async fn create(&self, task: &AutomationTask) -> Result<AutomationTask, RepositoryError> {
        let model: task_entity::ActiveModel = task.clone().into();

        model.insert(self.db.as_ref()).await?;
        counter!("linkrs_tasks_created_total").increment(1);
        Ok(task.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AutomationTask>, RepositoryError> {
        let model = task_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn list_pending(
        &self,
        task_type: Option<TaskType>,
        limit: u64,
    ) -> Result<Vec<AutomationTask>, RepositoryError> {
        let mut query = task_entity::Entity::find()
            .filter(task_entity::Column::Status.eq(TaskStatus::Pending.to_string()))
            .filter(task_entity::Column::LockedBy.is_null());

        if let Some(task_type) = task_type {
            query = query.filter(task_entity::Column::TaskType.eq(task_type.to_string()));
        }

        let models = query
            .order_by_asc(task_entity::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(AutomationTask::from).collect())
    }

    async fn lock(&self, id: Uuid, worker_id: &str) -> Result<LockOutcome, RepositoryError> {
        task_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        // 锁定必须是单条带条件的更新语句。先读再写会在两个工作器
        // 同时抢同一任务时产生双重分配。
        let result = task_entity::Entity::update_many()
            .col_expr(
                task_entity::Column::LockedBy,
                Expr::value(Some(worker_id.to_string())),
            )
            .col_expr(
                task_entity::Column::LockedAt,
                Expr::value::<Option<DateTime<FixedOffset>>>(Some(Utc::now().into())),
            )
            .filter(task_entity::Column::Id.eq(id))
            .filter(task_entity::Column::LockedBy.is_null())
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            counter!("linkrs_task_lock_conflicts_total").increment(1);
            return Ok(LockOutcome::Held);
        }

        let model = task_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        counter!("linkrs_task_locks_acquired_total").increment(1);
        Ok(LockOutcome::Acquired(model.into()))
    }

    async fn unlock(&self, id: Uuid) -> Result<AutomationTask, RepositoryError> {
        let model = task_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let mut active: task_entity::ActiveModel = model.into();
        active.locked_by = Set(None);
        active.locked_at = Set(None);

        let updated = active.update(self.db.as_ref()).await?;
        Ok(updated.into())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: TaskStatus,
        result: Option<serde_json::Value>,
        error_message: Option<String>,
    ) -> Result<AutomationTask, RepositoryError> {
        let model = task_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let task: AutomationTask = model.clone().into();
        task.ensure_transition(status)
            .map_err(|_| RepositoryError::InvalidTransition {
                from: task.status,
                to: status,
            })?;

        let now: DateTime<FixedOffset> = Utc::now().into();
        let mut active: task_entity::ActiveModel = model.into();

        match status {
            TaskStatus::Running => {
                active.status = Set(status.to_string());
                if task.started_at.is_none() {
                    active.started_at = Set(Some(now));
                }
            }
            TaskStatus::Success => {
                active.status = Set(status.to_string());
                active.completed_at = Set(Some(now));
            }
            TaskStatus::Failed => {
                let attempts = (task.retry_count + 1).min(task.max_retries);
                active.retry_count = Set(attempts);
                if attempts < task.max_retries {
                    // 未达重试上限，释放锁并重新入队
                    active.status = Set(TaskStatus::Pending.to_string());
                    active.locked_by = Set(None);
                    active.locked_at = Set(None);
                    active.started_at = Set(None);
                } else {
                    active.status = Set(TaskStatus::Failed.to_string());
                    active.completed_at = Set(Some(now));
                }
            }
            TaskStatus::Pending => {
                active.status = Set(status.to_string());
                active.locked_by = Set(None);
                active.locked_at = Set(None);
                active.started_at = Set(None);
            }
            TaskStatus::Cancelled => {
                active.status = Set(status.to_string());
                active.completed_at = Set(Some(now));
            }
        }

        if let Some(result) = result {
            active.result = Set(Some(result));
        }
        if let Some(message) = error_message {
            active.error_message = Set(Some(message));
        }

        let updated = active.update(self.db.as_ref()).await?;
        counter!("linkrs_task_status_transitions_total", "to" => status.to_string()).increment(1);
        Ok(updated.into())
    }

    async fn reset_stuck_tasks(
        &self,
        timeout: Duration,
    ) -> Result<Vec<StuckTaskReport>, RepositoryError> {
        let now = Utc::now();
        let cutoff: DateTime<FixedOffset> = (now - timeout).into();

        // 锁时间和开始时间必须同时早于阈值。刚被重新锁定但
        // 开始时间很旧的任务不算僵死。
        let stuck = task_entity::Entity::find()
            .filter(task_entity::Column::Status.eq(TaskStatus::Running.to_string()))
            .filter(
                Condition::any()
                    .add(task_entity::Column::LockedAt.is_null())
                    .add(task_entity::Column::LockedAt.lt(cutoff)),
            )
            .filter(
                Condition::any()
                    .add(task_entity::Column::StartedAt.is_null())
                    .add(task_entity::Column::StartedAt.lt(cutoff)),
            )
            .all(self.db.as_ref())
            .await?;

        let mut reports = Vec::with_capacity(stuck.len());
        for model in stuck {
            let task: AutomationTask = model.into();
            let reason = task.stuck_reason(now);

            // 单行重置带状态条件，期间被并发改动的任务跳过
            let result = task_entity::Entity::update_many()
                .col_expr(
                    task_entity::Column::Status,
                    Expr::value(TaskStatus::Pending.to_string()),
                )
                .col_expr(
                    task_entity::Column::LockedBy,
                    Expr::value(Option::<String>::None),
                )
                .col_expr(
                    task_entity::Column::LockedAt,
                    Expr::value(Option::<DateTime<FixedOffset>>::None),
                )
                .col_expr(
                    task_entity::Column::StartedAt,
                    Expr::value(Option::<DateTime<FixedOffset>>::None),
                )
                .col_expr(
                    task_entity::Column::ErrorMessage,
                    Expr::value(Some(reason.clone())),
                )
                .filter(task_entity::Column::Id.eq(task.id))
                .filter(task_entity::Column::Status.eq(TaskStatus::Running.to_string()))
                .exec(self.db.as_ref())
                .await?;

            if result.rows_affected == 0 {
                continue;
            }

            counter!("linkrs_stuck_tasks_reset_total").increment(1);
            reports.push(StuckTaskReport {
                task_id: task.id,
                campaign_id: task.campaign_id,
                reason,
            });
        }

        Ok(reports)
    }

    async fn count_resettable_by_campaign(
        &self,
        task_type: TaskType,
    ) -> Result<Vec<(Uuid, u64)>, RepositoryError> {
        let models = task_entity::Entity::find()
            .filter(task_entity::Column::TaskType.eq(task_type.to_string()))
            .filter(task_entity::Column::Status.is_in(vec![
                TaskStatus::Pending.to_string(),
                TaskStatus::Failed.to_string(),
                TaskStatus::Cancelled.to_string(),
            ]))
            .all(self.db.as_ref())
            .await?;

        let mut counts: BTreeMap<Uuid, u64> = BTreeMap::new();
        for model in models {
            *counts.entry(model.campaign_id).or_insert(0) += 1;
        }

        Ok(counts.into_iter().collect())
    }

    async fn replace_campaign_tasks(
        &self,
        campaign_id: Uuid,
        task_type: TaskType,
        targets: &[ReassignTarget],
    ) -> Result<ReplaceOutcome, RepositoryError> {
        if targets.is_empty() {
            return Ok(ReplaceOutcome {
                deleted: 0,
                created: 0,
            });
        }

        // 删除和重建在同一事务内，中途失败时活动的任务集保持原样
        let txn = self.db.begin().await?;

        let deleted = task_entity::Entity::delete_many()
            .filter(task_entity::Column::CampaignId.eq(campaign_id))
            .filter(task_entity::Column::TaskType.eq(task_type.to_string()))
            .filter(task_entity::Column::Status.is_in(vec![
                TaskStatus::Pending.to_string(),
                TaskStatus::Failed.to_string(),
                TaskStatus::Cancelled.to_string(),
            ]))
            .exec(&txn)
            .await?
            .rows_affected;

        let mut created = 0u64;
        for index in 0..deleted as usize {
            let target = &targets[index % targets.len()];
            let payload = TaskPayload::from_target(
                task_type,
                target.url.clone(),
                target.opportunity_id,
                target.keyword.clone(),
                target.anchor_text.clone(),
            );
            let task = AutomationTask::new(campaign_id, payload, self.default_max_retries);
            let active: task_entity::ActiveModel = task.into();
            active.insert(&txn).await?;
            created += 1;
        }

        txn.commit().await?;

        Ok(ReplaceOutcome { deleted, created })
    }
}
