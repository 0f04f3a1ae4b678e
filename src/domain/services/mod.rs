// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块承载跨实体的业务规则：
/// - 机会选取（opportunity_selector）：在配额约束下为活动挑选投放目标
/// - 投放频率（rate_limit_service）：每活动每域名每日一条外链的检查
pub mod opportunity_selector;
pub mod rate_limit_service;
