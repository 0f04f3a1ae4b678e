// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 请求处理器模块
///
/// 提供各API端点的请求处理功能
/// 将HTTP请求转换为领域操作并组装响应
pub mod opportunity_handler;
pub mod task_handler;
