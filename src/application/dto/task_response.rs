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

use crate::domain::models::task::AutomationTask;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 待处理任务响应项
///
/// 工作器轮询时看到的任务视图，只包含领取任务所需的字段
#[derive(Debug, Deserialize, Serialize)]
pub struct PendingTaskDto {
    /// 任务ID
    pub id: Uuid,
    /// 任务类型
    #[serde(rename = "type")]
    pub task_type: String,
    /// 所属活动ID
    pub campaign_id: Uuid,
    /// 任务负载
    pub payload: serde_json::Value,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
}

impl From<AutomationTask> for PendingTaskDto {
    fn from(task: AutomationTask) -> Self {
        Self {
            id: task.id,
            task_type: task.task_type.to_string(),
            campaign_id: task.campaign_id,
            payload: serde_json::to_value(&task.payload).unwrap_or_default(),
            created_at: task.created_at,
        }
    }
}

/// 任务完整视图
#[derive(Debug, Deserialize, Serialize)]
pub struct TaskDto {
    /// 任务ID
    pub id: Uuid,
    /// 所属活动ID
    pub campaign_id: Uuid,
    /// 任务类型
    #[serde(rename = "type")]
    pub task_type: String,
    /// 任务状态
    pub status: String,
    /// 任务负载
    pub payload: serde_json::Value,
    /// 执行结果
    pub result: Option<serde_json::Value>,
    /// 错误信息
    pub error_message: Option<String>,
    /// 已重试次数
    pub retry_count: i32,
    /// 最大重试次数
    pub max_retries: i32,
    /// 持锁工作器标识
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

impl From<AutomationTask> for TaskDto {
    fn from(task: AutomationTask) -> Self {
        Self {
            id: task.id,
            campaign_id: task.campaign_id,
            task_type: task.task_type.to_string(),
            status: task.status.to_string(),
            payload: serde_json::to_value(&task.payload).unwrap_or_default(),
            result: task.result,
            error_message: task.error_message,
            retry_count: task.retry_count,
            max_retries: task.max_retries,
            locked_by: task.locked_by,
            locked_at: task.locked_at,
            started_at: task.started_at,
            completed_at: task.completed_at,
            created_at: task.created_at,
        }
    }
}
