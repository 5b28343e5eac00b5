// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 事件发布请求DTO
///
/// 业务侧通过此结构将一次业务事实交给事件总线
#[derive(Debug, Deserialize, Serialize)]
pub struct PublishEventRequestDto {
    /// 事件类型线上名称，如 "payment.completed"
    pub event_type: String,
    /// 事件负载，任意JSON
    pub payload: serde_json::Value,
}

/// 事件发布响应DTO
#[derive(Debug, Serialize)]
pub struct PublishEventResponseDto {
    /// 生成的事件ID，可用于关联投递记录
    pub event_id: Uuid,
    /// 成功入队的订阅者数量
    pub enqueued_subscribers: usize,
}
