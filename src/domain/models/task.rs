// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 锁龄超过该阈值时写入诊断说明（分钟）
const LOCK_AGE_NOTE_MINUTES: i64 = 30;
/// 运行时长超过该阈值时写入诊断说明（分钟）
const RUN_AGE_NOTE_MINUTES: i64 = 60;

/// 自动化任务实体
///
/// 表示分配给某个活动的一个待执行工作单元，由外部工作器
/// 通过分发接口拉取执行。任务具有状态机、重试机制和
/// 基于哨兵列的锁定机制等属性。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationTask {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 所属活动ID
    pub campaign_id: Uuid,
    /// 任务类型，决定任务的处理方式和负载结构
    pub task_type: TaskType,
    /// 任务状态，跟踪任务在其生命周期中的当前阶段
    pub status: TaskStatus,
    /// 任务负载，按类型区分的结构化数据
    pub payload: TaskPayload,
    /// 执行结果，任务完成时由工作器回报
    pub result: Option<serde_json::Value>,
    /// 错误信息，失败原因或僵死诊断说明
    pub error_message: Option<String>,
    /// 已重试次数
    pub retry_count: i32,
    /// 最大重试次数，达到后任务终结于失败状态
    pub max_retries: i32,
    /// 持锁工作器标识，非空即视为已锁定
    pub locked_by: Option<String>,
    /// 加锁时间
    pub locked_at: Option<DateTime<FixedOffset>>,
    /// 开始执行时间
    pub started_at: Option<DateTime<FixedOffset>>,
    /// 完成时间
    pub completed_at: Option<DateTime<FixedOffset>>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
}

/// 任务类型枚举
///
/// 每种类型对应一种外链投放方式，同时决定负载的具体结构。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// 博客评论外链
    #[default]
    Comment,
    /// 个人资料页外链
    Profile,
    /// 论坛帖子外链
    Forum,
    /// 客座文章外链
    Guestposting,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskType::Comment => write!(f, "comment"),
            TaskType::Profile => write!(f, "profile"),
            TaskType::Forum => write!(f, "forum"),
            TaskType::Guestposting => write!(f, "guestposting"),
        }
    }
}

impl FromStr for TaskType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "comment" => Ok(TaskType::Comment),
            "profile" => Ok(TaskType::Profile),
            "forum" => Ok(TaskType::Forum),
            "guestposting" => Ok(TaskType::Guestposting),
            _ => Err(()),
        }
    }
}

/// 任务状态枚举
///
/// 状态转换遵循以下流程：
/// Pending → Running → Success/Failed，Failed 在未达重试上限前
/// 可回到 Pending；Running 超时由清扫任务重置回 Pending。
/// Success 与 Cancelled 是终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// 待处理，任务已创建但尚未被工作器领取
    #[default]
    Pending,
    /// 运行中，任务正在被某个工作器执行
    Running,
    /// 已成功，任务执行完成
    Success,
    /// 已失败，执行出错；未达重试上限时可重新入队
    Failed,
    /// 已取消，管理操作将待处理任务作废
    Cancelled,
}

impl TaskStatus {
    /// 判断向目标状态的转换是否合法
    ///
    /// 转换表：pending → {running, failed, cancelled}；
    /// running → {pending, success, failed}；failed → pending。
    /// success 和 cancelled 不接受任何出边。
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Running, Pending)
                | (Running, Success)
                | (Running, Failed)
                | (Failed, Pending)
        )
    }

    /// 判断状态是否为终态
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Cancelled)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Success => write!(f, "success"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "running" => Ok(TaskStatus::Running),
            "success" => Ok(TaskStatus::Success),
            "failed" => Ok(TaskStatus::Failed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// 任务负载
///
/// 按任务类型区分的结构化负载，以`type`字段作为序列化标签，
/// 持久化为JSON列。每个变体只携带该投放方式需要的字段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskPayload {
    /// 博客评论投放
    Comment {
        target_url: String,
        #[serde(default)]
        opportunity_id: Option<Uuid>,
        #[serde(default)]
        keyword: Option<String>,
        #[serde(default)]
        anchor_text: Option<String>,
    },
    /// 个人资料页投放
    Profile {
        target_url: String,
        #[serde(default)]
        opportunity_id: Option<Uuid>,
        #[serde(default)]
        anchor_text: Option<String>,
    },
    /// 论坛帖子投放
    Forum {
        target_url: String,
        #[serde(default)]
        opportunity_id: Option<Uuid>,
        #[serde(default)]
        keyword: Option<String>,
        #[serde(default)]
        anchor_text: Option<String>,
    },
    /// 客座文章投放
    Guestposting {
        target_url: String,
        #[serde(default)]
        opportunity_id: Option<Uuid>,
        #[serde(default)]
        keyword: Option<String>,
        #[serde(default)]
        anchor_text: Option<String>,
        #[serde(default)]
        topic: Option<String>,
    },
}

impl Default for TaskPayload {
    fn default() -> Self {
        TaskPayload::Comment {
            target_url: String::new(),
            opportunity_id: None,
            keyword: None,
            anchor_text: None,
        }
    }
}

impl TaskPayload {
    /// 返回负载对应的任务类型
    pub fn task_type(&self) -> TaskType {
        match self {
            TaskPayload::Comment { .. } => TaskType::Comment,
            TaskPayload::Profile { .. } => TaskType::Profile,
            TaskPayload::Forum { .. } => TaskType::Forum,
            TaskPayload::Guestposting { .. } => TaskType::Guestposting,
        }
    }

    /// 返回投放目标URL
    pub fn target_url(&self) -> &str {
        match self {
            TaskPayload::Comment { target_url, .. }
            | TaskPayload::Profile { target_url, .. }
            | TaskPayload::Forum { target_url, .. }
            | TaskPayload::Guestposting { target_url, .. } => target_url,
        }
    }

    /// 返回关联的机会ID（若有）
    pub fn opportunity_id(&self) -> Option<Uuid> {
        match self {
            TaskPayload::Comment { opportunity_id, .. }
            | TaskPayload::Profile { opportunity_id, .. }
            | TaskPayload::Forum { opportunity_id, .. }
            | TaskPayload::Guestposting { opportunity_id, .. } => *opportunity_id,
        }
    }

    /// 为指定任务类型构建负载
    ///
    /// 用于批量重新分配时从候选目标生成任务负载；
    /// 目标未提供的字段留空。
    pub fn from_target(
        task_type: TaskType,
        target_url: String,
        opportunity_id: Option<Uuid>,
        keyword: Option<String>,
        anchor_text: Option<String>,
    ) -> Self {
        match task_type {
            TaskType::Comment => TaskPayload::Comment {
                target_url,
                opportunity_id,
                keyword,
                anchor_text,
            },
            TaskType::Profile => TaskPayload::Profile {
                target_url,
                opportunity_id,
                anchor_text,
            },
            TaskType::Forum => TaskPayload::Forum {
                target_url,
                opportunity_id,
                keyword,
                anchor_text,
            },
            TaskType::Guestposting => TaskPayload::Guestposting {
                target_url,
                opportunity_id,
                keyword,
                anchor_text,
                topic: None,
            },
        }
    }
}

/// 领域错误类型
///
/// 表示在领域层可能发生的各种错误情况，包括状态转换错误
/// 和验证失败。
#[derive(Error, Debug)]
pub enum DomainError {
    /// 无效的状态转换，当任务状态转换不符合业务规则时发生
    #[error("Invalid state transition")]
    InvalidStateTransition,

    /// 验证错误，当输入数据不符合领域规则时发生
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl AutomationTask {
    /// 创建一个新的待处理任务
    ///
    /// # 参数
    ///
    /// * `campaign_id` - 所属活动ID
    /// * `payload` - 任务负载，任务类型由负载变体推导
    /// * `max_retries` - 最大重试次数
    ///
    /// # 返回值
    ///
    /// 返回新创建的任务实例
    pub fn new(campaign_id: Uuid, payload: TaskPayload, max_retries: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            campaign_id,
            task_type: payload.task_type(),
            status: TaskStatus::Pending,
            payload,
            result: None,
            error_message: None,
            retry_count: 0,
            max_retries,
            locked_by: None,
            locked_at: None,
            started_at: None,
            completed_at: None,
            created_at: Utc::now().into(),
        }
    }

    /// 判断任务当前是否被锁定
    pub fn is_locked(&self) -> bool {
        self.locked_by.is_some()
    }

    /// 判断任务是否可以重试
    ///
    /// # 返回值
    ///
    /// 如果任务处于失败状态且未达到最大重试次数则返回true，否则返回false
    pub fn can_retry(&self) -> bool {
        self.status == TaskStatus::Failed && self.retry_count < self.max_retries
    }

    /// 校验向目标状态的转换
    ///
    /// 除转换表外，failed → pending 仅在任务仍可重试时允许。
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 转换合法
    /// * `Err(DomainError)` - 转换被拒绝
    pub fn ensure_transition(&self, next: TaskStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition);
        }
        if self.status == TaskStatus::Failed && next == TaskStatus::Pending && !self.can_retry() {
            return Err(DomainError::InvalidStateTransition);
        }
        Ok(())
    }

    /// 为僵死任务生成诊断说明
    ///
    /// 说明会持久化到`error_message`供运维排查：包含锁龄、
    /// 运行时长、最后持锁的工作器和目标URL。
    pub fn stuck_reason(&self, now: DateTime<Utc>) -> String {
        let mut parts = vec!["Reset by stuck-task sweep".to_string()];

        match self.locked_at {
            Some(locked_at) => {
                let minutes = now.signed_duration_since(locked_at).num_minutes();
                if minutes > LOCK_AGE_NOTE_MINUTES {
                    parts.push(format!("lock held {} min", minutes));
                }
            }
            None => parts.push("no lock timestamp".to_string()),
        }

        match self.started_at {
            Some(started_at) => {
                let minutes = now.signed_duration_since(started_at).num_minutes();
                if minutes > RUN_AGE_NOTE_MINUTES {
                    parts.push(format!("running {} min", minutes));
                }
            }
            None => parts.push("no start timestamp".to_string()),
        }

        if let Some(worker) = &self.locked_by {
            parts.push(format!("worker {}", worker));
        }

        let target = self.payload.target_url();
        if !target.is_empty() {
            parts.push(format!("target {}", target));
        }

        parts.join("; ")
    }
}
