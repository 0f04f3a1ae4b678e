// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::backlink_repository::BacklinkRepository;
use crate::domain::repositories::task_repository::RepositoryError;
use crate::utils::url_utils::extract_domain;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// 投放频率检查错误类型
#[derive(Error, Debug)]
pub enum RateLimitError {
    /// URL无法解析出域名
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// 仓储层错误
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// 外链投放频率服务
///
/// 落实每活动每域名每日最多一条外链的规则。此检查是
/// 快速失败路径，真正的原子保证来自外链表的唯一索引。
pub struct RateLimitService<B: BacklinkRepository> {
    backlink_repo: Arc<B>,
}

impl<B: BacklinkRepository> RateLimitService<B> {
    /// 创建频率服务实例
    pub fn new(backlink_repo: Arc<B>) -> Self {
        Self { backlink_repo }
    }

    /// 检查活动今日是否还能在该URL的域名下投放
    ///
    /// # 参数
    ///
    /// * `url` - 投放目标URL
    /// * `campaign_id` - 活动ID
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 今日尚未在该域名投放
    /// * `Ok(false)` - 今日配额已用
    /// * `Err(RateLimitError::InvalidUrl)` - URL不合法
    pub async fn check_domain_rate_limit(
        &self,
        url: &str,
        campaign_id: Uuid,
    ) -> Result<bool, RateLimitError> {
        let domain =
            extract_domain(url).ok_or_else(|| RateLimitError::InvalidUrl(url.to_string()))?;
        let today = Utc::now().date_naive();
        let count = self
            .backlink_repo
            .count_for_campaign_domain_on(campaign_id, &domain, today)
            .await?;
        Ok(count == 0)
    }
}

/// 计算距下一个UTC零点的秒数
///
/// 配额按UTC日期切分，拒绝请求时以此作为重试等待时间。
pub fn seconds_until_utc_midnight(now: DateTime<Utc>) -> u64 {
    let today = now.date_naive();
    match today.succ_opt().and_then(|d| d.and_hms_opt(0, 0, 0)) {
        Some(next_midnight) => next_midnight
            .and_utc()
            .signed_duration_since(now)
            .num_seconds()
            .max(0) as u64,
        None => 0,
    }
}
