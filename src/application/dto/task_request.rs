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

use serde::{Deserialize, Serialize};

/// 待处理任务查询参数
///
/// 用于封装工作器轮询待处理任务时的查询条件
#[derive(Debug, Deserialize, Serialize)]
pub struct PendingTasksQuery {
    /// 返回数量上限，缺省为10，上限100
    pub limit: Option<u64>,
    /// 任务类型过滤
    #[serde(rename = "type")]
    pub task_type: Option<String>,
}

/// 任务加锁请求
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LockTaskRequestDto {
    /// 工作器标识，缺省时由服务端生成
    #[serde(default)]
    pub worker_id: Option<String>,
}

/// 任务状态更新请求
///
/// 工作器回报任务执行进度与结果
#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateTaskStatusRequestDto {
    /// 目标状态，取值为 pending、running、success 或 failed
    pub status: String,
    /// 执行结果
    pub result: Option<serde_json::Value>,
    /// 失败说明
    pub error_message: Option<String>,
}
