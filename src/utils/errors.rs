// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 传输层错误类型
///
/// 覆盖 Webhook 投递与实时推送通道上的网络失败。
/// 按重试策略可重试；校验与认证错误不属于此类。
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Connection closed: {0}")]
    ConnectionClosed(String),
}

/// 序列化错误类型
///
/// 入站帧或负载无法解析时产生，记录后忽略，不致命。
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl From<serde_json::Error> for SerializationError {
    fn from(e: serde_json::Error) -> Self {
        SerializationError::MalformedFrame(e.to_string())
    }
}
