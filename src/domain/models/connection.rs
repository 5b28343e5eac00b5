// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt;

/// 实时连接状态枚举
///
/// 服务端连接从 Connecting 进入 Open，关闭流程经过 Closing
/// 到 Closed；客户端断线重连时回到 Connecting，重连次数
/// 耗尽后停在 Closed。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// 握手进行中，认证尚未完成
    Connecting,
    /// 连接已建立，可收发帧
    Open,
    /// 关闭中，不再接受新帧
    Closing,
    /// 已关闭
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Open => write!(f, "open"),
            ConnectionState::Closing => write!(f, "closing"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}
