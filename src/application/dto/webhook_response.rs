// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::event::EventType;
use crate::domain::models::webhook::Webhook;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Webhook响应DTO
///
/// 对外表示，签名密钥不出现在任何响应里
#[derive(Debug, Serialize)]
pub struct WebhookResponseDto {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub event_type: EventType,
    pub description: Option<String>,
    pub is_active: bool,
    pub success_count: i32,
    pub failure_count: i32,
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Webhook> for WebhookResponseDto {
    fn from(webhook: Webhook) -> Self {
        Self {
            id: webhook.id,
            name: webhook.name,
            url: webhook.url,
            event_type: webhook.event_type,
            description: webhook.description,
            is_active: webhook.is_active,
            success_count: webhook.success_count,
            failure_count: webhook.failure_count,
            last_triggered_at: webhook.last_triggered_at,
            created_at: webhook.created_at,
            updated_at: webhook.updated_at,
        }
    }
}

/// Webhook列表响应DTO
#[derive(Debug, Serialize)]
pub struct WebhookListResponseDto {
    pub items: Vec<WebhookResponseDto>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Webhook统计响应DTO
#[derive(Debug, Serialize)]
pub struct WebhookStatsResponseDto {
    pub total_webhooks: u64,
    pub active_webhooks: u64,
    pub total_deliveries: u64,
    pub successful_deliveries: u64,
    pub failed_deliveries: u64,
    /// 成功率，无投递记录时为0
    pub success_rate: f64,
}
