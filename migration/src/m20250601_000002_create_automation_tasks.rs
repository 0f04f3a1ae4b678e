use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create automation_tasks table
        manager
            .create_table(
                Table::create()
                    .table(AutomationTasks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AutomationTasks::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AutomationTasks::CampaignId).uuid().not_null())
                    .col(ColumnDef::new(AutomationTasks::TaskType).string().not_null())
                    .col(ColumnDef::new(AutomationTasks::Status).string().not_null())
                    .col(ColumnDef::new(AutomationTasks::Payload).json().not_null())
                    .col(ColumnDef::new(AutomationTasks::Result).json())
                    .col(ColumnDef::new(AutomationTasks::ErrorMessage).string())
                    .col(
                        ColumnDef::new(AutomationTasks::RetryCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AutomationTasks::MaxRetries)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(ColumnDef::new(AutomationTasks::LockedBy).string())
                    .col(ColumnDef::new(AutomationTasks::LockedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(AutomationTasks::StartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(AutomationTasks::CompletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(AutomationTasks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index backing the worker poll query (status + type, FIFO on created_at)
        manager
            .create_index(
                Index::create()
                    .name("idx_automation_tasks_status_type_created")
                    .table(AutomationTasks::Table)
                    .col(AutomationTasks::Status)
                    .col(AutomationTasks::TaskType)
                    .col(AutomationTasks::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_automation_tasks_campaign_id")
                    .table(AutomationTasks::Table)
                    .col(AutomationTasks::CampaignId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AutomationTasks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AutomationTasks {
    Table,
    Id,
    CampaignId,
    TaskType,
    Status,
    Payload,
    Result,
    ErrorMessage,
    RetryCount,
    MaxRetries,
    LockedBy,
    LockedAt,
    StartedAt,
    CompletedAt,
    CreatedAt,
}
