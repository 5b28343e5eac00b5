// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use dashmap::DashMap;
use metrics::{gauge, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use uuid::Uuid;

/// 注册表里的连接条目
struct ConnectionEntry {
    connected_at: Instant,
}

/// 连接注册句柄
///
/// 句柄释放时自动把连接从注册表摘除，会话无论以何种
/// 方式退出都不会留下残影。
pub struct ConnectionGuard {
    id: Uuid,
    connections: Arc<DashMap<Uuid, ConnectionEntry>>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some((_, entry)) = self.connections.remove(&self.id) {
            let lifetime = entry.connected_at.elapsed();
            gauge!("realtime_connections").decrement(1.0);
            histogram!("realtime_connection_duration_seconds").record(lifetime.as_secs_f64());
            debug!("Connection {} left the hub after {:?}", self.id, lifetime);
        }
    }
}

/// 实时连接注册表
///
/// 登记当前活跃的推送连接，供健康检查和指标观察在线数
#[derive(Clone, Default)]
pub struct ConnectionHub {
    connections: Arc<DashMap<Uuid, ConnectionEntry>>,
}

impl ConnectionHub {
    /// 创建新的连接注册表
    pub fn new() -> Self {
        Self {
            connections: Arc::new(DashMap::new()),
        }
    }

    /// 登记一条连接
    ///
    /// # 参数
    ///
    /// * `id` - 连接唯一标识符
    ///
    /// # 返回值
    ///
    /// 返回注册句柄，句柄释放时自动注销
    pub fn register(&self, id: Uuid) -> ConnectionGuard {
        self.connections.insert(
            id,
            ConnectionEntry {
                connected_at: Instant::now(),
            },
        );
        gauge!("realtime_connections").increment(1.0);
        debug!("Connection {} joined the hub", id);

        ConnectionGuard {
            id,
            connections: self.connections.clone(),
        }
    }

    /// 当前在线连接数
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// 是否没有在线连接
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
