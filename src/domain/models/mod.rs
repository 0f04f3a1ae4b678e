// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 自动化任务（task）：外部工作器拉取执行的单个工作单元
/// - 外链机会（opportunity）：活动可投放的候选站点
/// - 外链记录（backlink）：已实际落地的链接事件
/// - 活动与套餐（campaign）：外链活动及其权威度边界
///
/// 这些模型构成了系统的数据基础，定义了业务概念的
/// 结构和行为，是领域驱动设计的核心组成部分。
pub mod backlink;
pub mod campaign;
pub mod opportunity;
pub mod task;
