// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::opportunity::ReassignTarget;
use crate::domain::models::task::{AutomationTask, TaskStatus, TaskType};
use async_trait::async_trait;
use chrono::Duration;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库操作错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// 未找到指定资源
    #[error("Not found")]
    NotFound,

    /// 状态转换不符合任务状态机
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    /// 该域名在当前活动下今日的外链配额已用尽
    #[error("Daily backlink quota already consumed for domain {domain}")]
    DailyQuotaConsumed { domain: String },
}

/// 加锁操作的结果
#[derive(Debug)]
pub enum LockOutcome {
    /// 加锁成功，携带更新后的任务
    Acquired(AutomationTask),
    /// 锁已被其他工作器持有
    Held,
}

/// 僵死任务重置报告
///
/// 清扫任务每重置一个任务生成一条，`reason`同时写入任务的
/// `error_message`列。
#[derive(Debug, Clone)]
pub struct StuckTaskReport {
    /// 被重置的任务ID
    pub task_id: Uuid,
    /// 所属活动ID
    pub campaign_id: Uuid,
    /// 重置原因诊断说明
    pub reason: String,
}

/// 批量替换操作的结果
#[derive(Debug, Clone, Copy)]
pub struct ReplaceOutcome {
    /// 删除的任务数
    pub deleted: u64,
    /// 新建的任务数
    pub created: u64,
}

/// 任务仓储接口
///
/// 定义自动化任务的持久化操作，包括创建、查询、
/// 工作器锁协议、状态流转和批量维护操作。
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// 创建新任务
    ///
    /// # 参数
    ///
    /// * `task` - 要创建的任务
    ///
    /// # 返回值
    ///
    /// 返回创建后的任务
    async fn create(&self, task: &AutomationTask) -> Result<AutomationTask, RepositoryError>;

    /// 根据ID查找任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AutomationTask>, RepositoryError>;

    /// 列出未锁定的待处理任务
    ///
    /// 按创建时间先进先出排序。
    ///
    /// # 参数
    ///
    /// * `task_type` - 按类型过滤，为空则不过滤
    /// * `limit` - 返回数量上限
    async fn list_pending(
        &self,
        task_type: Option<TaskType>,
        limit: u64,
    ) -> Result<Vec<AutomationTask>, RepositoryError>;

    /// 为指定工作器锁定任务
    ///
    /// 锁定通过对哨兵列的条件更新实现，同一任务并发加锁时
    /// 恰有一个调用者成功。
    ///
    /// # 参数
    ///
    /// * `id` - 任务ID
    /// * `worker_id` - 工作器标识
    ///
    /// # 返回值
    ///
    /// * `Ok(LockOutcome::Acquired)` - 加锁成功
    /// * `Ok(LockOutcome::Held)` - 锁已被持有
    /// * `Err(RepositoryError::NotFound)` - 任务不存在
    async fn lock(&self, id: Uuid, worker_id: &str) -> Result<LockOutcome, RepositoryError>;

    /// 释放任务锁
    ///
    /// 无条件清空锁列，对未锁定的任务调用是无害的空操作。
    async fn unlock(&self, id: Uuid) -> Result<AutomationTask, RepositoryError>;

    /// 更新任务状态
    ///
    /// 按任务状态机校验转换并维护时间戳与重试计数：
    /// 转入 running 补记开始时间；转入 success 记录完成时间和结果；
    /// 转入 failed 递增重试计数，未达上限时自动重新入队，
    /// 否则终结于失败状态。
    ///
    /// # 参数
    ///
    /// * `id` - 任务ID
    /// * `status` - 目标状态
    /// * `result` - 执行结果（若有）
    /// * `error_message` - 失败说明（若有）
    async fn update_status(
        &self,
        id: Uuid,
        status: TaskStatus,
        result: Option<serde_json::Value>,
        error_message: Option<String>,
    ) -> Result<AutomationTask, RepositoryError>;

    /// 重置僵死任务
    ///
    /// 将运行中但锁龄或运行时长超过`timeout`的任务重置回
    /// 待处理状态并清空锁。逐个任务的重置带状态条件，
    /// 已被并发修改的任务会被跳过，重复执行不会产生多余重置。
    ///
    /// # 参数
    ///
    /// * `timeout` - 超时阈值
    ///
    /// # 返回值
    ///
    /// 返回每个被重置任务的报告
    async fn reset_stuck_tasks(
        &self,
        timeout: Duration,
    ) -> Result<Vec<StuckTaskReport>, RepositoryError>;

    /// 统计各活动可重建的任务数
    ///
    /// 可重建指处于 pending、failed 或 cancelled 状态的指定类型任务。
    ///
    /// # 返回值
    ///
    /// 返回 (活动ID, 任务数) 列表
    async fn count_resettable_by_campaign(
        &self,
        task_type: TaskType,
    ) -> Result<Vec<(Uuid, u64)>, RepositoryError>;

    /// 原子替换活动的可重建任务
    ///
    /// 在单个事务内删除活动下指定类型的可重建任务，并按
    /// 候选目标循环补齐同等数量的新待处理任务。候选为空时
    /// 不做任何修改。
    ///
    /// # 参数
    ///
    /// * `campaign_id` - 活动ID
    /// * `task_type` - 任务类型
    /// * `targets` - 候选投放目标
    async fn replace_campaign_tasks(
        &self,
        campaign_id: Uuid,
        task_type: TaskType,
        targets: &[ReassignTarget],
    ) -> Result<ReplaceOutcome, RepositoryError>;
}
