// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含服务器、数据库、认证、实时连接、投递引擎和事件总线等所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 认证配置
    pub auth: AuthSettings,
    /// 实时连接配置
    pub realtime: RealtimeSettings,
    /// Webhook投递配置
    pub delivery: DeliverySettings,
    /// 事件总线配置
    pub bus: BusSettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
}

/// 服务器配置设置
#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 数据库配置设置
#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: u32,
    /// 最小连接数
    pub min_connections: u32,
    /// 连接超时时间（秒）
    pub connect_timeout: u64,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: u64,
}

/// 认证配置设置
#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    /// 允许访问管理API和实时连接的令牌列表
    pub api_tokens: Vec<String>,
}

/// 实时连接配置设置
#[derive(Debug, Deserialize)]
pub struct RealtimeSettings {
    /// 客户端保活探测间隔（秒）
    pub keepalive_interval_secs: u64,
    /// 服务端空闲判定超时（秒），应为探测间隔的2-3倍
    pub idle_timeout_secs: u64,
    /// 客户端重连最大尝试次数
    pub reconnect_max_attempts: u32,
    /// 客户端重连初始退避（毫秒）
    pub reconnect_base_delay_ms: u64,
}

impl RealtimeSettings {
    /// 保活探测间隔
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }

    /// 空闲判定超时
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// 重连初始退避
    pub fn reconnect_base_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_base_delay_ms)
    }
}

/// Webhook投递配置设置
#[derive(Debug, Deserialize)]
pub struct DeliverySettings {
    /// 单个事件的最大投递尝试次数
    pub max_attempts: u32,
    /// 重试退避基数（秒）
    pub backoff_base_secs: u64,
    /// 连接建立超时（秒）
    pub connect_timeout_secs: u64,
    /// 单次请求总超时（秒）
    pub request_timeout_secs: u64,
    /// 每个Webhook投递通道的缓冲容量
    pub lane_buffer: usize,
}

impl DeliverySettings {
    /// 重试退避基数
    pub fn backoff_base(&self) -> Duration {
        Duration::from_secs(self.backoff_base_secs)
    }

    /// 连接建立超时
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// 单次请求总超时
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 事件总线配置设置
#[derive(Debug, Deserialize)]
pub struct BusSettings {
    /// 每个订阅者的入队缓冲容量
    pub subscriber_buffer: usize,
}

/// 指标导出配置设置
#[derive(Debug, Deserialize)]
pub struct MetricsSettings {
    /// Prometheus导出器监听地址
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Start with default settings
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            // Default DB pool settings
            .set_default("database.url", "sqlite://eventrs.db?mode=rwc")?
            .set_default("database.max_connections", 100)?
            .set_default("database.min_connections", 10)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Default auth settings
            .set_default("auth.api_tokens", vec!["dev-token".to_string()])?
            // Default realtime settings
            .set_default("realtime.keepalive_interval_secs", 30)?
            .set_default("realtime.idle_timeout_secs", 90)?
            .set_default("realtime.reconnect_max_attempts", 5)?
            .set_default("realtime.reconnect_base_delay_ms", 1000)?
            // Default delivery settings
            .set_default("delivery.max_attempts", 3)?
            .set_default("delivery.backoff_base_secs", 2)?
            .set_default("delivery.connect_timeout_secs", 10)?
            .set_default("delivery.request_timeout_secs", 30)?
            .set_default("delivery.lane_buffer", 64)?
            // Default bus settings
            .set_default("bus.subscriber_buffer", 256)?
            // Default metrics settings
            .set_default("metrics.listen_addr", "0.0.0.0:9000")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("EVENTRS").separator("__"));

        builder.build()?.try_deserialize()
    }
}
