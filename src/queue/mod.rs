// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列维护模块
///
/// 该模块承载任务集的维护操作：
/// - 调度器（scheduler）：周期运行僵死任务清扫
/// - 重新分配（reassignment）：批量清除并重建活动的任务
pub mod reassignment;
pub mod scheduler;
