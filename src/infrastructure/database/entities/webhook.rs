// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 事件类型的数据库映射
///
/// 与线上名称一致的字符串枚举，两张表共用。
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum SeaEventType {
    #[sea_orm(string_value = "user.created")]
    UserCreated,
    #[sea_orm(string_value = "payment.completed")]
    PaymentCompleted,
    #[sea_orm(string_value = "transaction.created")]
    TransactionCreated,
    #[sea_orm(string_value = "ticket.created")]
    TicketCreated,
    #[sea_orm(string_value = "ticket.status_changed")]
    TicketStatusChanged,
    #[sea_orm(string_value = "ticket.message_added")]
    TicketMessageAdded,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "webhooks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub event_type: SeaEventType,
    pub secret: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub success_count: i32,
    pub failure_count: i32,
    pub last_triggered_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
