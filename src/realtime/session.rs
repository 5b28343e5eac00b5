// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::bus::{EventBus, EventFilter};
use crate::config::settings::RealtimeSettings;
use crate::realtime::hub::ConnectionHub;
use crate::realtime::protocol::Frame;
use crate::utils::errors::SerializationError;
use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use metrics::counter;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 实时连接会话
///
/// 一条WebSocket连接对应一个会话。会话在注册表登记、
/// 订阅事件总线，然后在入站帧、总线事件和空闲检查之间
/// 循环，直到对端断开、推送失败或空闲超时。
pub struct RealtimeSession {
    id: Uuid,
    bus: EventBus,
    hub: ConnectionHub,
    filter: EventFilter,
    keepalive_interval: Duration,
    idle_timeout: Duration,
}

impl RealtimeSession {
    /// 创建新的连接会话
    ///
    /// # 参数
    ///
    /// * `bus` - 事件总线
    /// * `hub` - 连接注册表
    /// * `filter` - 该连接的事件过滤器
    /// * `settings` - 实时连接配置
    pub fn new(
        bus: EventBus,
        hub: ConnectionHub,
        filter: EventFilter,
        settings: &RealtimeSettings,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            bus,
            hub,
            filter,
            keepalive_interval: settings.keepalive_interval(),
            idle_timeout: settings.idle_timeout(),
        }
    }

    /// 连接唯一标识符
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 运行会话直到连接结束
    ///
    /// 确认帧先行，客户端收到后才算连接建立。注册句柄和
    /// 总线订阅都在会话退出时自动释放。
    pub async fn run(self, mut socket: WebSocket) {
        let _guard = self.hub.register(self.id);
        let mut subscription = self.bus.subscribe("realtime", self.filter.clone());

        if send_frame(&mut socket, &Frame::connection_ack(self.id))
            .await
            .is_err()
        {
            debug!("Connection {} dropped during handshake", self.id);
            return;
        }

        info!("Realtime connection {} established", self.id);

        let mut last_seen = Instant::now();
        let mut idle_check = interval(self.keepalive_interval);

        loop {
            tokio::select! {
                inbound = socket.recv() => {
                    match inbound {
                        Some(Ok(Message::Close(_))) => {
                            debug!("Connection {} closed by peer", self.id);
                            break;
                        }
                        Some(Ok(message)) => {
                            // 任何入站帧都算一次活跃
                            last_seen = Instant::now();
                            if let Some(reply) = self.handle_message(message) {
                                if send_frame(&mut socket, &reply).await.is_err() {
                                    debug!("Connection {} reply failed", self.id);
                                    break;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            debug!("Connection {} socket error: {}", self.id, e);
                            break;
                        }
                        None => break,
                    }
                }
                event = subscription.recv() => {
                    match event {
                        Some(event) => {
                            counter!("realtime_events_pushed_total", "event_type" => event.event_type.as_str())
                                .increment(1);
                            if send_frame(&mut socket, &Frame::event(&event)).await.is_err() {
                                // 推送失败视为连接已死，立即撤下
                                info!("Connection {} unreachable, evicting", self.id);
                                break;
                            }
                        }
                        None => {
                            warn!("Connection {} lost its bus subscription", self.id);
                            break;
                        }
                    }
                }
                _ = idle_check.tick() => {
                    if last_seen.elapsed() > self.idle_timeout {
                        info!(
                            "Connection {} idle for {:?}, evicting",
                            self.id,
                            last_seen.elapsed()
                        );
                        let _ = socket
                            .send(Message::Close(Some(CloseFrame {
                                code: close_code::NORMAL,
                                reason: "idle timeout".into(),
                            })))
                            .await;
                        break;
                    }
                }
            }
        }

        info!("Realtime connection {} closed", self.id);
    }

    /// 处理一条入站消息
    ///
    /// 解析失败只记录，连接继续存活
    ///
    /// # 返回值
    ///
    /// 需要应答时返回应答帧
    fn handle_message(&self, message: Message) -> Option<Frame> {
        match message {
            Message::Text(text) => match serde_json::from_str::<Frame>(&text) {
                Ok(frame) if frame.is_ping() => Some(Frame::pong()),
                Ok(frame) => {
                    debug!(
                        "Connection {} sent frame type '{}', ignoring",
                        self.id, frame.frame_type
                    );
                    None
                }
                Err(e) => {
                    warn!(
                        "Connection {}: {}",
                        self.id,
                        SerializationError::from(e)
                    );
                    None
                }
            },
            // 协议层的ping/pong由框架应答，二进制帧不在协议内
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => None,
            Message::Close(_) => None,
        }
    }
}

/// 序列化并发送一帧
async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), axum::Error> {
    match serde_json::to_string(frame) {
        Ok(text) => socket.send(Message::Text(text.into())).await,
        Err(e) => {
            error!("Failed to encode outbound frame: {}", e);
            Ok(())
        }
    }
}
