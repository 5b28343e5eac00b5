// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Webhook创建请求DTO
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateWebhookRequestDto {
    /// 人类可读名称
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    /// 回调URL，绝对 http/https 地址
    #[validate(length(min = 1, max = 2048))]
    pub url: String,

    /// 订阅的事件类型线上名称
    pub event_type: String,

    /// 签名密钥，配置后投递附带HMAC签名头
    pub secret: Option<String>,

    /// 描述信息
    pub description: Option<String>,
}

/// Webhook更新请求DTO
///
/// event_type 创建后不可变更，不在此结构内。
/// secret 和 description 用双层Option区分三种情形：
/// 字段缺席保持不变，显式null清空，给值则覆盖。
#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateWebhookRequestDto {
    pub name: Option<String>,

    pub url: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub secret: Option<Option<String>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub description: Option<Option<String>>,

    pub is_active: Option<bool>,
}

/// Webhook列表查询DTO
#[derive(Debug, Deserialize, Serialize)]
pub struct ListWebhooksQueryDto {
    /// 按订阅的事件类型过滤
    pub event_type: Option<String>,
    /// 按启用状态过滤
    pub is_active: Option<bool>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// 区分"字段缺席"与"显式null"
///
/// 缺席时serde走默认值取到None；字段出现时这里包一层Some，
/// 显式null因此得到 Some(None)。
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
