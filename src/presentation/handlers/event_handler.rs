// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::event_request::{PublishEventRequestDto, PublishEventResponseDto};
use crate::bus::event_bus::EventBus;
use crate::domain::models::event::{DomainEvent, EventType};
use crate::presentation::errors::AppError;
use axum::{http::StatusCode, Extension, Json};
use tracing::info;

/// 发布领域事件
///
/// 业务协作方的接入点：事件进入总线后由实时连接和投递引擎
/// 各自消费。接受即返回202，不等待任何投递结果。
///
/// # 参数
///
/// * `bus` - 事件总线
/// * `payload` - 事件发布请求
///
/// # 返回值
///
/// * `Ok` - 202，带事件ID和成功入队的订阅者数量
/// * `Err(AppError)` - 事件类型不在支持集合内时返回400
pub async fn publish_event(
    Extension(bus): Extension<EventBus>,
    Json(payload): Json<PublishEventRequestDto>,
) -> Result<(StatusCode, Json<PublishEventResponseDto>), AppError> {
    let event_type: EventType = payload.event_type.parse()?;
    let event = DomainEvent::new(event_type, payload.payload);

    let enqueued = bus.publish(&event);
    info!(
        "Event {} ({}) published, enqueued to {} subscribers",
        event.id, event.event_type, enqueued
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(PublishEventResponseDto {
            event_id: event.id,
            enqueued_subscribers: enqueued,
        }),
    ))
}
