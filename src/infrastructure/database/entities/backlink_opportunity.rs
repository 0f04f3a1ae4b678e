// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "backlink_opportunities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub backlink_id: Uuid,
    pub url: Option<String>,
    pub site_type: String,
    pub pa: Option<i32>,
    pub da: Option<i32>,
    pub status: String,
    pub keyword: Option<String>,
    pub anchor_text: Option<String>,
    pub site_account_id: Option<Uuid>,
    pub error_message: Option<String>,
    pub daily_site_limit: Option<i32>,
    pub category_id: Option<Uuid>,
    pub verified_at: Option<ChronoDateTimeWithTimeZone>,
    pub created_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
