// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 实时推送模块
///
/// 提供连接注册表、服务端连接会话、帧协议和带断线重连的
/// 推送客户端
pub mod client;
pub mod hub;
pub mod protocol;
pub mod session;

pub use client::{RealtimeClient, RealtimeConnection, RealtimeTransport, TungsteniteTransport};
pub use hub::ConnectionHub;
pub use protocol::Frame;
pub use session::RealtimeSession;
