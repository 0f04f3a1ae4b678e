use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Backlinks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Backlinks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Backlinks::CampaignId).uuid().not_null())
                    .col(ColumnDef::new(Backlinks::BacklinkOpportunityId).uuid())
                    .col(ColumnDef::new(Backlinks::Url).string().not_null())
                    .col(ColumnDef::new(Backlinks::Domain).string().not_null())
                    .col(ColumnDef::new(Backlinks::SiteType).string().not_null())
                    .col(ColumnDef::new(Backlinks::Pa).integer())
                    .col(ColumnDef::new(Backlinks::Da).integer())
                    .col(
                        ColumnDef::new(Backlinks::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Backlinks::LinkDate).date().not_null())
                    .col(
                        ColumnDef::new(Backlinks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // One backlink per campaign per domain per day, enforced at the store
        // level so the insert itself is the atomic check.
        manager
            .create_index(
                Index::create()
                    .name("uq_backlinks_campaign_domain_day")
                    .table(Backlinks::Table)
                    .col(Backlinks::CampaignId)
                    .col(Backlinks::Domain)
                    .col(Backlinks::LinkDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_backlinks_campaign_day")
                    .table(Backlinks::Table)
                    .col(Backlinks::CampaignId)
                    .col(Backlinks::LinkDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Backlinks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Backlinks {
    Table,
    Id,
    CampaignId,
    BacklinkOpportunityId,
    Url,
    Domain,
    SiteType,
    Pa,
    Da,
    Status,
    LinkDate,
    CreatedAt,
}
