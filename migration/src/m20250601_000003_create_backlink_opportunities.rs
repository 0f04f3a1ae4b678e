use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BacklinkOpportunities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BacklinkOpportunities::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BacklinkOpportunities::CampaignId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BacklinkOpportunities::BacklinkId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BacklinkOpportunities::Url).string())
                    .col(
                        ColumnDef::new(BacklinkOpportunities::SiteType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BacklinkOpportunities::Pa).integer())
                    .col(ColumnDef::new(BacklinkOpportunities::Da).integer())
                    .col(
                        ColumnDef::new(BacklinkOpportunities::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(BacklinkOpportunities::Keyword).string())
                    .col(ColumnDef::new(BacklinkOpportunities::AnchorText).string())
                    .col(ColumnDef::new(BacklinkOpportunities::SiteAccountId).uuid())
                    .col(ColumnDef::new(BacklinkOpportunities::ErrorMessage).string())
                    .col(ColumnDef::new(BacklinkOpportunities::DailySiteLimit).integer())
                    .col(ColumnDef::new(BacklinkOpportunities::CategoryId).uuid())
                    .col(
                        ColumnDef::new(BacklinkOpportunities::VerifiedAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(BacklinkOpportunities::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index backing the selector candidate query
        manager
            .create_index(
                Index::create()
                    .name("idx_backlink_opportunities_status_category")
                    .table(BacklinkOpportunities::Table)
                    .col(BacklinkOpportunities::Status)
                    .col(BacklinkOpportunities::CategoryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_backlink_opportunities_campaign_id")
                    .table(BacklinkOpportunities::Table)
                    .col(BacklinkOpportunities::CampaignId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BacklinkOpportunities::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum BacklinkOpportunities {
    Table,
    Id,
    CampaignId,
    BacklinkId,
    Url,
    SiteType,
    Pa,
    Da,
    Status,
    Keyword,
    AnchorText,
    SiteAccountId,
    ErrorMessage,
    DailySiteLimit,
    CategoryId,
    VerifiedAt,
    CreatedAt,
}
