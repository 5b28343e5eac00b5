// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::event::{DomainEvent, EventType};
use dashmap::DashMap;
use metrics::counter;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};
use uuid::Uuid;

/// 订阅过滤器
///
/// 订阅者只收到匹配的事件类型；不带过滤条件时收到全部。
#[derive(Debug, Clone)]
pub enum EventFilter {
    /// 订阅全部事件
    All,
    /// 只订阅指定的事件类型
    Types(HashSet<EventType>),
}

impl EventFilter {
    /// 判断事件类型是否匹配
    pub fn matches(&self, event_type: EventType) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Types(types) => types.contains(&event_type),
        }
    }
}

impl FromIterator<EventType> for EventFilter {
    fn from_iter<I: IntoIterator<Item = EventType>>(iter: I) -> Self {
        EventFilter::Types(iter.into_iter().collect())
    }
}

/// 总线内部的订阅者条目
struct Subscriber {
    /// 订阅者标签，用于日志和指标归类
    label: String,
    /// 订阅过滤器
    filter: EventFilter,
    /// 入队通道发送端
    sender: mpsc::Sender<DomainEvent>,
    /// 因队列满而丢弃的事件数
    dropped: Arc<AtomicU64>,
}

/// 事件订阅句柄
///
/// 持有接收端和丢弃计数；句柄释放时自动从总线注销。
pub struct Subscription {
    id: Uuid,
    receiver: mpsc::Receiver<DomainEvent>,
    dropped: Arc<AtomicU64>,
    subscribers: Arc<DashMap<Uuid, Subscriber>>,
}

impl Subscription {
    /// 订阅唯一标识符
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 接收下一个事件
    ///
    /// 总线关闭该订阅时返回None
    pub async fn recv(&mut self) -> Option<DomainEvent> {
        self.receiver.recv().await
    }

    /// 非阻塞接收
    pub fn try_recv(&mut self) -> Result<DomainEvent, mpsc::error::TryRecvError> {
        self.receiver.try_recv()
    }

    /// 该订阅累计丢弃的事件数
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.subscribers.remove(&self.id);
    }
}

/// 进程内事件总线
///
/// 业务侧发布领域事件，实时连接和投递引擎各自订阅。
/// 发布是同步非阻塞的：订阅者队列满时只丢弃该订阅者的
/// 这一条事件并计数，不影响发布方和其他订阅者。
/// 单个订阅者内部事件按发布顺序到达；跨订阅者无顺序保证。
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<DashMap<Uuid, Subscriber>>,
    /// 每个订阅者的队列容量
    buffer_size: usize,
}

impl EventBus {
    /// 创建新的事件总线
    ///
    /// # 参数
    ///
    /// * `buffer_size` - 每个订阅者的入队缓冲容量
    pub fn new(buffer_size: usize) -> Self {
        Self {
            subscribers: Arc::new(DashMap::new()),
            buffer_size: buffer_size.max(1),
        }
    }

    /// 注册订阅者
    ///
    /// # 参数
    ///
    /// * `label` - 订阅者标签，用于日志与指标归类，
    ///   应使用低基数的固定值（如 "realtime"、"delivery"）
    /// * `filter` - 订阅过滤器
    ///
    /// # 返回值
    ///
    /// 返回订阅句柄，句柄释放时自动注销
    pub fn subscribe(&self, label: &str, filter: EventFilter) -> Subscription {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::channel(self.buffer_size);
        let dropped = Arc::new(AtomicU64::new(0));

        self.subscribers.insert(
            id,
            Subscriber {
                label: label.to_string(),
                filter,
                sender,
                dropped: dropped.clone(),
            },
        );
        debug!("Subscriber {} registered on event bus ({})", id, label);

        Subscription {
            id,
            receiver,
            dropped,
            subscribers: self.subscribers.clone(),
        }
    }

    /// 发布事件
    ///
    /// 同步入队到所有匹配的订阅者，绝不等待。队列满的
    /// 订阅者丢这一条并累加丢弃计数；通道已关闭的订阅者
    /// 就地注销。
    ///
    /// # 参数
    ///
    /// * `event` - 待发布的领域事件
    ///
    /// # 返回值
    ///
    /// 返回成功入队的订阅者数量
    pub fn publish(&self, event: &DomainEvent) -> usize {
        counter!("events_published_total", "event_type" => event.event_type.as_str())
            .increment(1);

        let mut delivered = 0usize;
        let mut closed: Vec<Uuid> = Vec::new();

        for entry in self.subscribers.iter() {
            let subscriber = entry.value();
            if !subscriber.filter.matches(event.event_type) {
                continue;
            }

            match subscriber.sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    subscriber.dropped.fetch_add(1, Ordering::Relaxed);
                    counter!("event_bus_dropped_total", "subscriber" => subscriber.label.clone())
                        .increment(1);
                    warn!(
                        "Subscriber {} ({}) queue full, dropping event {}",
                        entry.key(),
                        subscriber.label,
                        event.id
                    );
                }
                Err(TrySendError::Closed(_)) => closed.push(*entry.key()),
            }
        }

        // 迭代结束后再清理，避免对同一分片的并发写
        for id in closed {
            self.subscribers.remove(&id);
            debug!("Subscriber {} channel closed, removed from event bus", id);
        }

        delivered
    }

    /// 当前订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
