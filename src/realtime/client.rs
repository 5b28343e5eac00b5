// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::RealtimeSettings;
use crate::domain::models::connection::ConnectionState;
use crate::realtime::protocol::{Frame, FRAME_CONNECTION, FRAME_PONG};
use crate::utils::errors::TransportError;
use crate::utils::retry_policy::RetryPolicy;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

/// 转发给消费方的事件缓冲容量
const EVENT_BUFFER: usize = 64;

/// 实时通道传输层特质
///
/// 为客户端屏蔽具体的WebSocket实现，测试中用脚本化
/// 传输替代真实网络。
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// 建立一条新连接
    async fn connect(&self, url: &str) -> Result<Box<dyn RealtimeConnection>, TransportError>;
}

/// 一条已建立的实时连接
#[async_trait]
pub trait RealtimeConnection: Send {
    /// 发送一帧
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError>;

    /// 接收下一帧
    ///
    /// 连接正常关闭时返回None
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>>;

    /// 主动关闭连接
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// 一次泵送循环的结束方式
enum PumpEnd {
    /// 连接断开，需要重连
    Lost,
    /// 消费方已放弃，客户端应整体停止
    ConsumerGone,
}

/// 实时推送客户端
///
/// 维护到服务端的一条实时连接：按配置间隔发送保活探测，
/// 把收到的领域事件帧转发给消费方，控制帧就地消化。连接
/// 意外断开后按 base × 2^(n-1) 的退避序列重连，每次重连
/// 都是全新握手；连续失败次数到达上限后停在 Closed 状态。
pub struct RealtimeClient<T: RealtimeTransport> {
    transport: T,
    url: String,
    reconnect: RetryPolicy,
    keepalive_interval: Duration,
    events: mpsc::Sender<Frame>,
    state: ConnectionState,
}

impl<T: RealtimeTransport> RealtimeClient<T> {
    /// 创建新的实时客户端
    ///
    /// # 参数
    ///
    /// * `transport` - 传输层实现
    /// * `url` - 服务端实时端点URL
    /// * `settings` - 实时连接配置
    ///
    /// # 返回值
    ///
    /// 返回客户端和领域事件帧的接收端
    pub fn new(
        transport: T,
        url: String,
        settings: &RealtimeSettings,
    ) -> (Self, mpsc::Receiver<Frame>) {
        let (events, receiver) = mpsc::channel(EVENT_BUFFER);
        (
            Self {
                transport,
                url,
                reconnect: RetryPolicy::reconnect(
                    settings.reconnect_base_delay(),
                    settings.reconnect_max_attempts,
                ),
                keepalive_interval: settings.keepalive_interval(),
                events,
                state: ConnectionState::Closed,
            },
            receiver,
        )
    }

    /// 当前连接状态
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// 运行客户端
    ///
    /// 连接、泵送、断线重连，直到重连次数耗尽或消费方
    /// 放弃接收为止
    pub async fn run(&mut self) {
        let mut attempts = 0u32;
        loop {
            self.set_state(ConnectionState::Connecting);
            match self.transport.connect(&self.url).await {
                Ok(connection) => {
                    info!("Realtime channel to {} established", self.url);
                    self.set_state(ConnectionState::Open);
                    // 连接成功即重置退避序列
                    attempts = 0;
                    match self.pump(connection).await {
                        PumpEnd::ConsumerGone => {
                            self.set_state(ConnectionState::Closed);
                            return;
                        }
                        PumpEnd::Lost => self.set_state(ConnectionState::Closed),
                    }
                }
                Err(e) => {
                    self.set_state(ConnectionState::Closed);
                    warn!("Realtime connect to {} failed: {}", self.url, e);
                }
            }

            attempts += 1;
            if attempts > self.reconnect.max_attempts {
                error!(
                    "Realtime channel lost, giving up after {} reconnect attempts",
                    self.reconnect.max_attempts
                );
                return;
            }
            let backoff = self.reconnect.calculate_backoff(attempts);
            debug!(
                "Reconnecting to {} in {:?} (attempt {}/{})",
                self.url, backoff, attempts, self.reconnect.max_attempts
            );
            sleep(backoff).await;
        }
    }

    /// 泵送一条已建立连接上的帧直到连接结束
    async fn pump(&mut self, mut connection: Box<dyn RealtimeConnection>) -> PumpEnd {
        let mut probe = interval(self.keepalive_interval);
        loop {
            tokio::select! {
                inbound = connection.recv() => {
                    match inbound {
                        Some(Ok(frame)) => {
                            if let Some(event_frame) = self.handle_frame(frame) {
                                if self.events.send(event_frame).await.is_err() {
                                    debug!("Realtime consumer dropped, closing channel");
                                    self.set_state(ConnectionState::Closing);
                                    let _ = connection.close().await;
                                    return PumpEnd::ConsumerGone;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            warn!("Realtime channel error: {}", e);
                            return PumpEnd::Lost;
                        }
                        None => {
                            info!("Realtime channel closed by server");
                            return PumpEnd::Lost;
                        }
                    }
                }
                _ = probe.tick() => {
                    if connection.send(Frame::ping()).await.is_err() {
                        warn!("Realtime keepalive probe failed");
                        return PumpEnd::Lost;
                    }
                }
            }
        }
    }

    /// 分流一条入站帧
    ///
    /// # 返回值
    ///
    /// 领域事件帧原样返回；控制帧就地消化，返回None
    fn handle_frame(&self, frame: Frame) -> Option<Frame> {
        if !frame.is_control() {
            return Some(frame);
        }
        match frame.frame_type.as_str() {
            FRAME_CONNECTION => info!("Realtime session acknowledged: {:?}", frame.payload),
            FRAME_PONG => debug!("Keepalive probe answered"),
            other => debug!("Unexpected control frame '{}' from server", other),
        }
        None
    }

    fn set_state(&mut self, next: ConnectionState) {
        if self.state != next {
            debug!("Realtime client state {} -> {}", self.state, next);
            self.state = next;
        }
    }
}

/// 基于 tokio-tungstenite 的生产传输实现
#[derive(Default)]
pub struct TungsteniteTransport;

#[async_trait]
impl RealtimeTransport for TungsteniteTransport {
    async fn connect(&self, url: &str) -> Result<Box<dyn RealtimeConnection>, TransportError> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        Ok(Box::new(TungsteniteConnection { stream }))
    }
}

struct TungsteniteConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl RealtimeConnection for TungsteniteConnection {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        let text = serde_json::to_string(&frame)
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        self.stream
            .send(WsMessage::text(text))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<Frame, TransportError>> {
        loop {
            return match self.stream.next().await? {
                Ok(WsMessage::Text(text)) => match serde_json::from_str(text.as_str()) {
                    Ok(frame) => Some(Ok(frame)),
                    Err(e) => {
                        // 无法解析的帧只记录，连接继续存活
                        warn!("Dropping malformed inbound frame: {}", e);
                        continue;
                    }
                },
                Ok(WsMessage::Close(_)) => None,
                // 协议层ping/pong与二进制帧不进入协议栈
                Ok(_) => continue,
                Err(e) => Some(Err(TransportError::ConnectionClosed(e.to_string()))),
            };
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.stream
            .close(None)
            .await
            .map_err(|e| TransportError::ConnectionClosed(e.to_string()))
    }
}
