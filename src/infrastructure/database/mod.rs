// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据库模块
///
/// 连接池构建与任务、活动、机会、外链等实体定义
pub mod connection;
pub mod entities;
