// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::webhook_repository::RepositoryError;
use crate::domain::models::delivery::{Delivery, DeliveryStatus};
use async_trait::async_trait;
use uuid::Uuid;

/// 投递历史查询参数
#[derive(Debug, Default, Clone)]
pub struct DeliveryQueryParams {
    pub status: Option<DeliveryStatus>,
    pub limit: u64,
    pub offset: u64,
}

/// 投递历史汇总统计
#[derive(Debug, Clone, Copy, Default)]
pub struct DeliveryStats {
    pub total_deliveries: u64,
    pub successful_deliveries: u64,
    pub failed_deliveries: u64,
}

/// 投递历史仓库特质
///
/// 历史表只追加：记录写入后不修改、不删除，
/// 保留策略交由外部运维处理。
#[async_trait]
pub trait DeliveryRepository: Send + Sync {
    /// 追加一条投递记录
    async fn record(&self, delivery: &Delivery) -> Result<Delivery, RepositoryError>;
    /// 根据ID查找投递记录
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Delivery>, RepositoryError>;
    /// 按Webhook分页查询投递记录，最新在前，返回当前页和总数
    async fn list_for_webhook(
        &self,
        webhook_id: Uuid,
        params: DeliveryQueryParams,
    ) -> Result<(Vec<Delivery>, u64), RepositoryError>;
    /// 全局投递汇总统计
    async fn stats(&self) -> Result<DeliveryStats, RepositoryError>;
}
