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

use crate::application::dto::delivery_request::{DeliveryListResponseDto, ListDeliveriesQueryDto};
use crate::application::dto::webhook_request::{
    CreateWebhookRequestDto, ListWebhooksQueryDto, UpdateWebhookRequestDto,
};
use crate::application::dto::webhook_response::{
    WebhookListResponseDto, WebhookResponseDto, WebhookStatsResponseDto,
};
use crate::domain::models::event::EventType;
use crate::domain::repositories::delivery_repository::{DeliveryQueryParams, DeliveryRepository};
use crate::domain::repositories::webhook_repository::{
    RepositoryError, WebhookQueryParams, WebhookRepository, WebhookUpdate,
};
use crate::domain::use_cases::create_webhook::{CreateWebhookUseCase, NewWebhook};
use crate::presentation::errors::AppError;
use crate::utils::validators::validate_webhook_url;
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// 列表默认页大小
const DEFAULT_PAGE_SIZE: u64 = 100;
/// 列表分页上限
const MAX_PAGE_SIZE: u64 = 1000;

/// 创建Webhook
pub async fn create_webhook<R: WebhookRepository>(
    Extension(repo): Extension<Arc<R>>,
    Json(payload): Json<CreateWebhookRequestDto>,
) -> Result<(StatusCode, Json<WebhookResponseDto>), AppError> {
    // 验证请求参数
    if let Err(errors) = payload.validate() {
        return Err(AppError::from(anyhow::anyhow!(
            "validation failed: {:?}",
            errors
        )));
    }
    let event_type: EventType = payload.event_type.parse()?;
    validate_webhook_url(&payload.url)?;

    let use_case = CreateWebhookUseCase::new(repo);
    let webhook = use_case
        .execute(NewWebhook {
            name: payload.name,
            url: payload.url,
            event_type,
            secret: payload.secret,
            description: payload.description,
        })
        .await?;

    info!("Webhook {} created for {}", webhook.id, webhook.event_type);
    Ok((StatusCode::CREATED, Json(webhook.into())))
}

/// 查询单个Webhook
pub async fn get_webhook<R: WebhookRepository>(
    Extension(repo): Extension<Arc<R>>,
    Path(id): Path<Uuid>,
) -> Result<Json<WebhookResponseDto>, AppError> {
    let webhook = repo
        .find_by_id(id)
        .await?
        .ok_or(RepositoryError::NotFound)?;
    Ok(Json(webhook.into()))
}

/// 分页查询Webhook列表
pub async fn list_webhooks<R: WebhookRepository>(
    Extension(repo): Extension<Arc<R>>,
    Query(query): Query<ListWebhooksQueryDto>,
) -> Result<Json<WebhookListResponseDto>, AppError> {
    let event_type = match query.event_type.as_deref() {
        Some(raw) => Some(raw.parse::<EventType>()?),
        None => None,
    };
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    let (webhooks, total) = repo
        .list(WebhookQueryParams {
            event_type,
            is_active: query.is_active,
            limit,
            offset,
        })
        .await?;

    Ok(Json(WebhookListResponseDto {
        items: webhooks.into_iter().map(WebhookResponseDto::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// 部分更新Webhook
///
/// event_type 不可变更；url 给出时重新校验。
/// secret/description 的双层Option语义见请求DTO。
pub async fn update_webhook<R: WebhookRepository>(
    Extension(repo): Extension<Arc<R>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWebhookRequestDto>,
) -> Result<Json<WebhookResponseDto>, AppError> {
    if let Some(name) = payload.name.as_deref() {
        if name.trim().is_empty() {
            return Err(AppError::from(anyhow::anyhow!("name cannot be empty")));
        }
    }
    if let Some(url) = payload.url.as_deref() {
        validate_webhook_url(url)?;
    }

    let update = WebhookUpdate {
        name: payload.name,
        url: payload.url,
        secret: payload.secret,
        description: payload.description,
        is_active: payload.is_active,
    };
    let webhook = repo.update(id, &update).await?;
    Ok(Json(webhook.into()))
}

/// 删除Webhook
///
/// 幂等：不存在的ID也返回204。投递历史不随Webhook删除。
pub async fn delete_webhook<R: WebhookRepository>(
    Extension(repo): Extension<Arc<R>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let found = repo.delete(id).await?;
    if found {
        info!("Webhook {} deleted", id);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// 注册表与投递汇总统计
pub async fn webhook_stats<W: WebhookRepository, D: DeliveryRepository>(
    Extension(webhook_repo): Extension<Arc<W>>,
    Extension(delivery_repo): Extension<Arc<D>>,
) -> Result<Json<WebhookStatsResponseDto>, AppError> {
    let webhooks = webhook_repo.stats().await?;
    let deliveries = delivery_repo.stats().await?;

    let success_rate = if deliveries.total_deliveries == 0 {
        0.0
    } else {
        deliveries.successful_deliveries as f64 / deliveries.total_deliveries as f64
    };

    Ok(Json(WebhookStatsResponseDto {
        total_webhooks: webhooks.total_webhooks,
        active_webhooks: webhooks.active_webhooks,
        total_deliveries: deliveries.total_deliveries,
        successful_deliveries: deliveries.successful_deliveries,
        failed_deliveries: deliveries.failed_deliveries,
        success_rate,
    }))
}

/// 按Webhook分页查询投递历史，最新在前
pub async fn list_deliveries<W: WebhookRepository, D: DeliveryRepository>(
    Extension(webhook_repo): Extension<Arc<W>>,
    Extension(delivery_repo): Extension<Arc<D>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListDeliveriesQueryDto>,
) -> Result<Json<DeliveryListResponseDto>, AppError> {
    // 未知Webhook返回404，与单查保持一致
    webhook_repo
        .find_by_id(id)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    let (deliveries, total) = delivery_repo
        .list_for_webhook(
            id,
            DeliveryQueryParams {
                status: query.status,
                limit,
                offset,
            },
        )
        .await?;

    Ok(Json(DeliveryListResponseDto {
        items: deliveries,
        total,
        limit,
        offset,
    }))
}
