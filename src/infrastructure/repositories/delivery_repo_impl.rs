// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::delivery::{Delivery, DeliveryStatus};
use crate::domain::repositories::delivery_repository::{
    DeliveryQueryParams, DeliveryRepository, DeliveryStats,
};
use crate::domain::repositories::webhook_repository::RepositoryError;
use crate::infrastructure::database::entities::webhook_delivery::{self, SeaDeliveryStatus};
use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 投递历史仓库实现
///
/// 基于SeaORM实现的只追加投递记录存储
#[derive(Clone)]
pub struct DeliveryRepoImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl DeliveryRepoImpl {
    /// 创建新的投递历史仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<DeliveryStatus> for SeaDeliveryStatus {
    fn from(status: DeliveryStatus) -> Self {
        match status {
            DeliveryStatus::Pending => SeaDeliveryStatus::Pending,
            DeliveryStatus::Success => SeaDeliveryStatus::Success,
            DeliveryStatus::Failed => SeaDeliveryStatus::Failed,
        }
    }
}

impl From<SeaDeliveryStatus> for DeliveryStatus {
    fn from(status: SeaDeliveryStatus) -> Self {
        match status {
            SeaDeliveryStatus::Pending => DeliveryStatus::Pending,
            SeaDeliveryStatus::Success => DeliveryStatus::Success,
            SeaDeliveryStatus::Failed => DeliveryStatus::Failed,
        }
    }
}

impl From<webhook_delivery::Model> for Delivery {
    fn from(model: webhook_delivery::Model) -> Self {
        Self {
            id: model.id,
            webhook_id: model.webhook_id,
            event_id: model.event_id,
            event_type: model.event_type.into(),
            payload: model.payload,
            attempt_number: model.attempt_number,
            status: model.status.into(),
            response_status: model.response_status,
            response_body: model.response_body,
            error_message: model.error_message,
            created_at: model.created_at.into(),
        }
    }
}

#[async_trait]
impl DeliveryRepository for DeliveryRepoImpl {
    async fn record(&self, delivery: &Delivery) -> Result<Delivery, RepositoryError> {
        let active_model = webhook_delivery::ActiveModel {
            id: Set(delivery.id),
            webhook_id: Set(delivery.webhook_id),
            event_id: Set(delivery.event_id),
            event_type: Set(delivery.event_type.into()),
            payload: Set(delivery.payload.clone()),
            attempt_number: Set(delivery.attempt_number),
            status: Set(delivery.status.into()),
            response_status: Set(delivery.response_status),
            response_body: Set(delivery.response_body.clone()),
            error_message: Set(delivery.error_message.clone()),
            created_at: Set(delivery.created_at.into()),
        };

        webhook_delivery::Entity::insert(active_model)
            .exec(self.db.as_ref())
            .await?;

        Ok(delivery.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Delivery>, RepositoryError> {
        let model = webhook_delivery::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn list_for_webhook(
        &self,
        webhook_id: Uuid,
        params: DeliveryQueryParams,
    ) -> Result<(Vec<Delivery>, u64), RepositoryError> {
        let mut query = webhook_delivery::Entity::find()
            .filter(webhook_delivery::Column::WebhookId.eq(webhook_id));

        if let Some(status) = params.status {
            query = query
                .filter(webhook_delivery::Column::Status.eq(SeaDeliveryStatus::from(status)));
        }

        let total = query.clone().count(self.db.as_ref()).await?;

        // 最新的记录在前
        let models = query
            .order_by_desc(webhook_delivery::Column::CreatedAt)
            .offset(params.offset)
            .limit(params.limit)
            .all(self.db.as_ref())
            .await?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    async fn stats(&self) -> Result<DeliveryStats, RepositoryError> {
        let total_deliveries = webhook_delivery::Entity::find()
            .count(self.db.as_ref())
            .await?;
        let successful_deliveries = webhook_delivery::Entity::find()
            .filter(webhook_delivery::Column::Status.eq(SeaDeliveryStatus::Success))
            .count(self.db.as_ref())
            .await?;
        let failed_deliveries = webhook_delivery::Entity::find()
            .filter(webhook_delivery::Column::Status.eq(SeaDeliveryStatus::Failed))
            .count(self.db.as_ref())
            .await?;

        Ok(DeliveryStats {
            total_deliveries,
            successful_deliveries,
            failed_deliveries,
        })
    }
}
