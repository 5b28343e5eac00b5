// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::validators::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 领域事件类型枚举
///
/// 系统支持的事件类型是封闭集合，新增类型需要修改此枚举。
/// 线上名称采用 `<领域>.<动作>` 形式，与订阅过滤、
/// Webhook 的 event_type 字段及推送帧的 type 字段保持一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// 用户注册完成
    #[serde(rename = "user.created")]
    UserCreated,
    /// 支付成功
    #[serde(rename = "payment.completed")]
    PaymentCompleted,
    /// 交易记录创建
    #[serde(rename = "transaction.created")]
    TransactionCreated,
    /// 工单创建
    #[serde(rename = "ticket.created")]
    TicketCreated,
    /// 工单状态变更
    #[serde(rename = "ticket.status_changed")]
    TicketStatusChanged,
    /// 工单新增回复
    #[serde(rename = "ticket.message_added")]
    TicketMessageAdded,
}

impl EventType {
    /// 所有支持的事件类型
    pub const ALL: [EventType; 6] = [
        EventType::UserCreated,
        EventType::PaymentCompleted,
        EventType::TransactionCreated,
        EventType::TicketCreated,
        EventType::TicketStatusChanged,
        EventType::TicketMessageAdded,
    ];

    /// 事件类型的线上名称
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::UserCreated => "user.created",
            EventType::PaymentCompleted => "payment.completed",
            EventType::TransactionCreated => "transaction.created",
            EventType::TicketCreated => "ticket.created",
            EventType::TicketStatusChanged => "ticket.status_changed",
            EventType::TicketMessageAdded => "ticket.message_added",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user.created" => Ok(EventType::UserCreated),
            "payment.completed" => Ok(EventType::PaymentCompleted),
            "transaction.created" => Ok(EventType::TransactionCreated),
            "ticket.created" => Ok(EventType::TicketCreated),
            "ticket.status_changed" => Ok(EventType::TicketStatusChanged),
            "ticket.message_added" => Ok(EventType::TicketMessageAdded),
            other => Err(ValidationError::UnknownEventType(other.to_string())),
        }
    }
}

/// 领域事件实体
///
/// 表示系统中发生的一次业务事实，由业务侧发布到事件总线，
/// 再分发给实时连接和已注册的Webhook。事件本身不落库，
/// 投递历史按每次尝试单独记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// 事件唯一标识符，用于投递记录与日志关联
    pub id: Uuid,
    /// 事件类型
    pub event_type: EventType,
    /// 事件负载数据，任意JSON对象
    pub payload: serde_json::Value,
    /// 事件发生时间
    pub occurred_at: DateTime<Utc>,
}

impl DomainEvent {
    /// 创建一个新的领域事件
    ///
    /// # 参数
    ///
    /// * `event_type` - 事件类型
    /// * `payload` - 事件负载数据
    ///
    /// # 返回值
    ///
    /// 返回一个新的事件实例，包含生成的唯一ID和当前时间戳
    pub fn new(event_type: EventType, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            payload,
            occurred_at: Utc::now(),
        }
    }
}
