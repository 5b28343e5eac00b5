// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::event::EventType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Webhook实体
///
/// 表示一个已注册的Webhook端点配置。每个Webhook只订阅
/// 一种事件类型，类型在创建后不可变更；需要换类型时
/// 删除重建。投递结果通过成功/失败计数器累计。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    /// Webhook唯一标识符
    pub id: Uuid,
    /// 人类可读名称，便于管理界面辨识
    pub name: String,
    /// Webhook回调URL，接收通知的目标地址
    pub url: String,
    /// 订阅的事件类型，创建后不可变更
    pub event_type: EventType,
    /// 签名密钥，配置后每次投递附带HMAC签名头
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// 描述信息
    pub description: Option<String>,
    /// 是否启用，停用的Webhook在事件匹配时被跳过
    pub is_active: bool,
    /// 累计成功投递次数
    pub success_count: i32,
    /// 累计失败投递次数，一轮重试只计一次
    pub failure_count: i32,
    /// 最近一次投递出结果的时间
    pub last_triggered_at: Option<DateTime<Utc>>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl Webhook {
    /// 创建一个新的Webhook配置
    ///
    /// # 参数
    ///
    /// * `name` - 名称
    /// * `url` - 回调URL
    /// * `event_type` - 订阅的事件类型
    /// * `secret` - 可选的签名密钥
    /// * `description` - 可选的描述
    ///
    /// # 返回值
    ///
    /// 返回一个新的Webhook实例，初始为启用状态，计数器清零
    pub fn new(
        name: String,
        url: String,
        event_type: EventType,
        secret: Option<String>,
        description: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            url,
            event_type,
            secret,
            description,
            is_active: true,
            success_count: 0,
            failure_count: 0,
            last_triggered_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
