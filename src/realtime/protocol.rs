// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::event::DomainEvent;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// 连接确认帧的类型名
pub const FRAME_CONNECTION: &str = "connection";
/// 保活探测帧的类型名
pub const FRAME_PING: &str = "ping";
/// 保活应答帧的类型名
pub const FRAME_PONG: &str = "pong";

/// 实时通道帧
///
/// 上下行共用同一种结构：`type` 为事件名或控制帧名，
/// `payload` 为可选的JSON负载。控制帧（connection、
/// ping、pong）永远不会当作领域事件下发。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Frame {
    /// 帧类型，领域事件帧直接使用事件名
    #[serde(rename = "type")]
    pub frame_type: String,
    /// 帧负载
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl Frame {
    /// 构造领域事件帧
    ///
    /// # 参数
    ///
    /// * `event` - 待下发的领域事件
    pub fn event(event: &DomainEvent) -> Self {
        Self {
            frame_type: event.event_type.as_str().to_string(),
            payload: Some(event.payload.clone()),
        }
    }

    /// 构造连接确认帧
    ///
    /// 握手通过后服务端推送的第一帧
    pub fn connection_ack(connection_id: Uuid) -> Self {
        Self {
            frame_type: FRAME_CONNECTION.to_string(),
            payload: Some(json!({ "connection_id": connection_id })),
        }
    }

    /// 构造保活探测帧
    pub fn ping() -> Self {
        Self {
            frame_type: FRAME_PING.to_string(),
            payload: None,
        }
    }

    /// 构造保活应答帧
    pub fn pong() -> Self {
        Self {
            frame_type: FRAME_PONG.to_string(),
            payload: None,
        }
    }

    /// 是否为保活探测帧
    pub fn is_ping(&self) -> bool {
        self.frame_type == FRAME_PING
    }

    /// 是否为控制帧
    pub fn is_control(&self) -> bool {
        matches!(
            self.frame_type.as_str(),
            FRAME_CONNECTION | FRAME_PING | FRAME_PONG
        )
    }
}
