use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 加速僵死任务扫描: status + locked_at 组合过滤
        manager
            .create_index(
                Index::create()
                    .name("idx_automation_tasks_status_locked_at")
                    .table(AutomationTasks::Table)
                    .col(AutomationTasks::Status)
                    .col(AutomationTasks::LockedAt)
                    .to_owned(),
            )
            .await?;

        // 加速单站点当日配额统计
        manager
            .create_index(
                Index::create()
                    .name("idx_backlinks_opportunity_day")
                    .table(Backlinks::Table)
                    .col(Backlinks::BacklinkOpportunityId)
                    .col(Backlinks::LinkDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_automation_tasks_status_locked_at")
                    .table(AutomationTasks::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_backlinks_opportunity_day")
                    .table(Backlinks::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum AutomationTasks {
    Table,
    Status,
    LockedAt,
}

#[derive(DeriveIden)]
enum Backlinks {
    Table,
    BacklinkOpportunityId,
    LinkDate,
}
