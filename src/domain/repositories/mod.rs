// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 仓库接口定义了数据持久化的抽象契约，具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 外链记录仓库（backlink_repository）：管理外链记录及各维度配额计数
/// - 活动仓库（campaign_repository）：读取活动和套餐配置
/// - 机会仓库（opportunity_repository）：管理外链机会及候选查询
/// - 任务仓库（task_repository）：管理任务的分发、锁定和状态流转
///
/// 这些接口确保了领域层不依赖于具体的数据存储技术，
/// 提高了系统的可测试性和可维护性.
pub mod backlink_repository;
pub mod campaign_repository;
pub mod opportunity_repository;
pub mod task_repository;
