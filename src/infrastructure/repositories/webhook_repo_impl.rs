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

use crate::domain::models::event::EventType;
use crate::domain::models::webhook::Webhook;
use crate::domain::repositories::webhook_repository::{
    RepositoryError, WebhookQueryParams, WebhookRepository, WebhookStats, WebhookUpdate,
};
use crate::infrastructure::database::entities::webhook::{self, SeaEventType};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// Webhook仓库实现
///
/// 基于SeaORM实现的Webhook注册表数据访问层
#[derive(Clone)]
pub struct WebhookRepoImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl WebhookRepoImpl {
    /// 创建新的Webhook仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<EventType> for SeaEventType {
    fn from(event_type: EventType) -> Self {
        match event_type {
            EventType::UserCreated => SeaEventType::UserCreated,
            EventType::PaymentCompleted => SeaEventType::PaymentCompleted,
            EventType::TransactionCreated => SeaEventType::TransactionCreated,
            EventType::TicketCreated => SeaEventType::TicketCreated,
            EventType::TicketStatusChanged => SeaEventType::TicketStatusChanged,
            EventType::TicketMessageAdded => SeaEventType::TicketMessageAdded,
        }
    }
}

impl From<SeaEventType> for EventType {
    fn from(event_type: SeaEventType) -> Self {
        match event_type {
            SeaEventType::UserCreated => EventType::UserCreated,
            SeaEventType::PaymentCompleted => EventType::PaymentCompleted,
            SeaEventType::TransactionCreated => EventType::TransactionCreated,
            SeaEventType::TicketCreated => EventType::TicketCreated,
            SeaEventType::TicketStatusChanged => EventType::TicketStatusChanged,
            SeaEventType::TicketMessageAdded => EventType::TicketMessageAdded,
        }
    }
}

impl From<webhook::Model> for Webhook {
    fn from(model: webhook::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            url: model.url,
            event_type: model.event_type.into(),
            secret: model.secret,
            description: model.description,
            is_active: model.is_active,
            success_count: model.success_count,
            failure_count: model.failure_count,
            last_triggered_at: model.last_triggered_at.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

#[async_trait]
impl WebhookRepository for WebhookRepoImpl {
    async fn create(&self, w: &Webhook) -> Result<Webhook, RepositoryError> {
        let active_model = webhook::ActiveModel {
            id: Set(w.id),
            name: Set(w.name.clone()),
            url: Set(w.url.clone()),
            event_type: Set(w.event_type.into()),
            secret: Set(w.secret.clone()),
            description: Set(w.description.clone()),
            is_active: Set(w.is_active),
            success_count: Set(w.success_count),
            failure_count: Set(w.failure_count),
            last_triggered_at: Set(w.last_triggered_at.map(Into::into)),
            created_at: Set(w.created_at.into()),
            updated_at: Set(w.updated_at.into()),
        };

        webhook::Entity::insert(active_model)
            .exec(self.db.as_ref())
            .await?;

        Ok(w.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Webhook>, RepositoryError> {
        let model = webhook::Entity::find_by_id(id).one(self.db.as_ref()).await?;

        Ok(model.map(Into::into))
    }

    async fn find_active_by_event_type(
        &self,
        event_type: EventType,
    ) -> Result<Vec<Webhook>, RepositoryError> {
        let models = webhook::Entity::find()
            .filter(webhook::Column::EventType.eq(SeaEventType::from(event_type)))
            .filter(webhook::Column::IsActive.eq(true))
            .order_by_asc(webhook::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list(
        &self,
        params: WebhookQueryParams,
    ) -> Result<(Vec<Webhook>, u64), RepositoryError> {
        let mut query = webhook::Entity::find();

        if let Some(event_type) = params.event_type {
            query = query.filter(webhook::Column::EventType.eq(SeaEventType::from(event_type)));
        }
        if let Some(is_active) = params.is_active {
            query = query.filter(webhook::Column::IsActive.eq(is_active));
        }

        let total = query.clone().count(self.db.as_ref()).await?;

        let models = query
            .order_by_asc(webhook::Column::CreatedAt)
            .offset(params.offset)
            .limit(params.limit)
            .all(self.db.as_ref())
            .await?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    async fn update(&self, id: Uuid, update: &WebhookUpdate) -> Result<Webhook, RepositoryError> {
        let mut active: webhook::ActiveModel = webhook::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?
            .into();

        if let Some(name) = &update.name {
            active.name = Set(name.clone());
        }
        if let Some(url) = &update.url {
            active.url = Set(url.clone());
        }
        if let Some(secret) = &update.secret {
            active.secret = Set(secret.clone());
        }
        if let Some(description) = &update.description {
            active.description = Set(description.clone());
        }
        if let Some(is_active) = update.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());

        let updated_model = active.update(self.db.as_ref()).await?;

        Ok(updated_model.into())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = webhook::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn record_outcome(
        &self,
        id: Uuid,
        success: bool,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        // 单条UPDATE里自增计数，并发投递不会互相覆盖
        let counter_column = if success {
            webhook::Column::SuccessCount
        } else {
            webhook::Column::FailureCount
        };

        let result = webhook::Entity::update_many()
            .col_expr(counter_column, Expr::col(counter_column).add(1))
            .col_expr(
                webhook::Column::LastTriggeredAt,
                Expr::value(Some(DateTime::<FixedOffset>::from(at))),
            )
            .col_expr(
                webhook::Column::UpdatedAt,
                Expr::value(DateTime::<FixedOffset>::from(Utc::now())),
            )
            .filter(webhook::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn stats(&self) -> Result<WebhookStats, RepositoryError> {
        let total_webhooks = webhook::Entity::find().count(self.db.as_ref()).await?;
        let active_webhooks = webhook::Entity::find()
            .filter(webhook::Column::IsActive.eq(true))
            .count(self.db.as_ref())
            .await?;

        Ok(WebhookStats {
            total_webhooks,
            active_webhooks,
        })
    }
}
