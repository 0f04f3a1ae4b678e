// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::task_repository::TaskRepository;
use chrono::Duration;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration as TokioDuration};
use tracing::{error, info, warn};

/// 维护调度器
///
/// 周期性运行僵死任务清扫。清扫是运行中任务回到待处理状态的
/// 唯一自动路径：工作器崩溃后任务会一直停留在运行状态，
/// 直到下一轮清扫按超时阈值回收。
pub struct MaintenanceScheduler<R: TaskRepository + 'static> {
    /// 任务仓库
    repository: Arc<R>,
    /// 僵死判定超时
    stuck_timeout: Duration,
    /// 清扫间隔（秒）
    interval_secs: u64,
}

impl<R: TaskRepository + 'static> MaintenanceScheduler<R> {
    /// 创建新的维护调度器实例
    ///
    /// # 参数
    ///
    /// * `repository` - 任务仓库
    /// * `stuck_timeout` - 僵死判定超时
    /// * `interval_secs` - 清扫间隔（秒）
    ///
    /// # 返回值
    ///
    /// 返回新的维护调度器实例
    pub fn new(repository: Arc<R>, stuck_timeout: Duration, interval_secs: u64) -> Self {
        Self {
            repository,
            stuck_timeout,
            interval_secs,
        }
    }

    /// 启动调度器后台任务
    ///
    /// # 返回值
    ///
    /// 返回后台任务的句柄
    pub fn start(&self) -> JoinHandle<()> {
        let repository = self.repository.clone();
        let stuck_timeout = self.stuck_timeout;
        let period = TokioDuration::from_secs(self.interval_secs);

        tokio::spawn(async move {
            let mut interval = interval(period);

            loop {
                interval.tick().await;

                match repository.reset_stuck_tasks(stuck_timeout).await {
                    Ok(reports) => {
                        for report in &reports {
                            warn!(
                                task_id = %report.task_id,
                                campaign_id = %report.campaign_id,
                                reason = %report.reason,
                                "Stuck task reset to pending"
                            );
                        }
                        if !reports.is_empty() {
                            info!("Sweep reset {} stuck tasks", reports.len());
                        }
                    }
                    Err(e) => {
                        error!("Stuck-task sweep failed: {}", e);
                    }
                }
            }
        })
    }
}
