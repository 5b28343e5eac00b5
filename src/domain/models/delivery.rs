// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::event::{DomainEvent, EventType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 投递记录状态枚举
///
/// 历史表只追加不修改，落库的记录只会是 Success 或 Failed；
/// Pending 是投递任务在内存中的初始状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// 待处理，尝试尚未出结果
    #[default]
    Pending,
    /// 投递成功，目标返回2xx
    Success,
    /// 投递失败，包括非2xx响应、网络错误和中途取消
    Failed,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStatus::Pending => write!(f, "pending"),
            DeliveryStatus::Success => write!(f, "success"),
            DeliveryStatus::Failed => write!(f, "failed"),
        }
    }
}

/// 投递记录实体
///
/// 表示对某个Webhook的一次投递尝试，每次尝试单独一条，
/// 同一事件的多次重试共享 event_id，attempt_number 递增。
/// 记录保存签名时使用的负载原文，便于事后审计。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    /// 记录唯一标识符
    pub id: Uuid,
    /// 目标Webhook ID，Webhook删除后记录保留
    pub webhook_id: Uuid,
    /// 来源事件ID，同一事件的重试共享此值
    pub event_id: Uuid,
    /// 事件类型
    pub event_type: EventType,
    /// 投递的负载数据
    pub payload: serde_json::Value,
    /// 尝试序号，从1开始
    pub attempt_number: i32,
    /// 尝试结果状态
    pub status: DeliveryStatus,
    /// 响应状态码，收到HTTP响应时记录
    pub response_status: Option<i32>,
    /// 响应体，超长时截断保存
    pub response_body: Option<String>,
    /// 错误信息，失败时的错误描述
    pub error_message: Option<String>,
    /// 记录创建时间
    pub created_at: DateTime<Utc>,
}

impl Delivery {
    /// 创建一条成功的投递记录
    ///
    /// # 参数
    ///
    /// * `webhook_id` - 目标Webhook ID
    /// * `event` - 来源事件
    /// * `attempt_number` - 尝试序号
    /// * `response_status` - 响应状态码
    /// * `response_body` - 响应体
    pub fn success(
        webhook_id: Uuid,
        event: &DomainEvent,
        attempt_number: i32,
        response_status: u16,
        response_body: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            webhook_id,
            event_id: event.id,
            event_type: event.event_type,
            payload: event.payload.clone(),
            attempt_number,
            status: DeliveryStatus::Success,
            response_status: Some(response_status as i32),
            response_body,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    /// 创建一条失败的投递记录
    ///
    /// # 参数
    ///
    /// * `webhook_id` - 目标Webhook ID
    /// * `event` - 来源事件
    /// * `attempt_number` - 尝试序号
    /// * `response_status` - 响应状态码，网络错误时为None
    /// * `response_body` - 响应体
    /// * `error_message` - 错误描述
    pub fn failure(
        webhook_id: Uuid,
        event: &DomainEvent,
        attempt_number: i32,
        response_status: Option<u16>,
        response_body: Option<String>,
        error_message: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            webhook_id,
            event_id: event.id,
            event_type: event.event_type,
            payload: event.payload.clone(),
            attempt_number,
            status: DeliveryStatus::Failed,
            response_status: response_status.map(|s| s as i32),
            response_body,
            error_message: Some(error_message),
            created_at: Utc::now(),
        }
    }
}
