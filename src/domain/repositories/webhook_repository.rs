// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::event::EventType;
use crate::domain::models::webhook::Webhook;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
}

/// Webhook查询参数
#[derive(Debug, Default, Clone)]
pub struct WebhookQueryParams {
    pub event_type: Option<EventType>,
    pub is_active: Option<bool>,
    pub limit: u64,
    pub offset: u64,
}

/// Webhook部分更新
///
/// event_type 不在更新范围内，创建后不可变更。
/// secret 和 description 用双层 Option 区分"不改"和"清空"。
#[derive(Debug, Default, Clone)]
pub struct WebhookUpdate {
    pub name: Option<String>,
    pub url: Option<String>,
    pub secret: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// Webhook汇总统计
#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookStats {
    pub total_webhooks: u64,
    pub active_webhooks: u64,
}

/// Webhook仓库特质
///
/// 定义Webhook注册表数据访问接口
#[async_trait]
pub trait WebhookRepository: Send + Sync {
    /// 创建Webhook
    async fn create(&self, webhook: &Webhook) -> Result<Webhook, RepositoryError>;
    /// 根据ID查找Webhook
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Webhook>, RepositoryError>;
    /// 查找订阅指定事件类型的启用Webhook，按创建时间排序
    async fn find_active_by_event_type(
        &self,
        event_type: EventType,
    ) -> Result<Vec<Webhook>, RepositoryError>;
    /// 分页查询Webhook，返回当前页和总数
    async fn list(
        &self,
        params: WebhookQueryParams,
    ) -> Result<(Vec<Webhook>, u64), RepositoryError>;
    /// 部分更新Webhook，不存在时返回 NotFound
    async fn update(&self, id: Uuid, update: &WebhookUpdate) -> Result<Webhook, RepositoryError>;
    /// 删除Webhook，幂等；返回是否确有删除
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
    /// 记录一次终态投递结果
    ///
    /// 单条SQL原子自增成功或失败计数并刷新 last_triggered_at，
    /// 并发投递下不会丢更新。Webhook已删除时返回 NotFound。
    async fn record_outcome(
        &self,
        id: Uuid,
        success: bool,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
    /// 注册表汇总统计
    async fn stats(&self) -> Result<WebhookStats, RepositoryError>;
}
