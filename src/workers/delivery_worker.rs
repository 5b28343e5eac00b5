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

use crate::bus::Subscription;
use crate::config::settings::DeliverySettings;
use crate::domain::models::delivery::Delivery;
use crate::domain::models::event::DomainEvent;
use crate::domain::models::webhook::Webhook;
use crate::domain::repositories::delivery_repository::DeliveryRepository;
use crate::domain::repositories::webhook_repository::{RepositoryError, WebhookRepository};
use crate::utils::retry_policy::RetryPolicy;
use crate::utils::signature::sign_payload;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use metrics::{counter, histogram};
use reqwest::{header, Client};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, error, info};
use uuid::Uuid;

/// 响应体落库前的截断长度（字符数）
const RESPONSE_BODY_LIMIT: usize = 1_000;
/// 错误信息里响应体摘录的截断长度（字符数）
const ERROR_SNIPPET_LIMIT: usize = 500;

/// 投递任务
///
/// 一个事件对一个Webhook的完整投递序列。信封字节在
/// 分发时序列化一次，签名和发送使用同一份。
struct DeliveryJob {
    webhook_id: Uuid,
    event: Arc<DomainEvent>,
    body: Bytes,
}

/// Webhook投递引擎
///
/// 消费事件总线订阅，把每个事件分发给所有订阅该类型的
/// 启用Webhook。同一Webhook的任务走同一条串行通道，按
/// 事件到达顺序依次投递完重试再处理下一条；不同Webhook
/// 之间互不阻塞。每次尝试都落一条历史记录。
pub struct DeliveryEngine<W, D>
where
    W: WebhookRepository + 'static,
    D: DeliveryRepository + 'static,
{
    /// Webhook注册表仓库
    webhook_repo: Arc<W>,
    /// 投递历史仓库
    delivery_repo: Arc<D>,
    /// HTTP客户端
    client: Client,
    /// 重试策略
    retry: RetryPolicy,
    /// 单次请求总超时
    request_timeout: Duration,
    /// 每条投递通道的缓冲容量
    lane_buffer: usize,
    /// 按Webhook划分的串行投递通道
    lanes: DashMap<Uuid, mpsc::Sender<DeliveryJob>>,
}

impl<W, D> DeliveryEngine<W, D>
where
    W: WebhookRepository + 'static,
    D: DeliveryRepository + 'static,
{
    /// 创建新的投递引擎实例
    ///
    /// # 参数
    ///
    /// * `webhook_repo` - Webhook注册表仓库
    /// * `delivery_repo` - 投递历史仓库
    /// * `settings` - 投递配置
    ///
    /// # 返回值
    ///
    /// 返回新的投递引擎实例
    pub fn new(webhook_repo: Arc<W>, delivery_repo: Arc<D>, settings: &DeliverySettings) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("Eventrs-Webhook/0.1.0"),
        );
        Self {
            webhook_repo,
            delivery_repo,
            client: Client::builder()
                .default_headers(headers)
                .connect_timeout(settings.connect_timeout())
                .build()
                .unwrap(),
            retry: RetryPolicy::delivery(settings.backoff_base(), settings.max_attempts),
            request_timeout: settings.request_timeout(),
            lane_buffer: settings.lane_buffer.max(1),
            lanes: DashMap::new(),
        }
    }

    /// 运行投递引擎
    ///
    /// 持续消费总线订阅并分发投递任务，直到总线关闭该订阅
    pub async fn run(self: Arc<Self>, mut subscription: Subscription) {
        info!("Delivery engine started");
        while let Some(event) = subscription.recv().await {
            if let Err(e) = self.dispatch(event).await {
                error!("Error dispatching event for delivery: {}", e);
            }
        }
        info!("Delivery engine subscription closed, stopping");
    }

    /// 把事件分发到所有匹配的Webhook通道
    ///
    /// # 参数
    ///
    /// * `event` - 待投递的领域事件
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 分发完成
    /// * `Err(anyhow::Error)` - 查询注册表或序列化失败
    async fn dispatch(self: &Arc<Self>, event: DomainEvent) -> anyhow::Result<()> {
        let webhooks = self
            .webhook_repo
            .find_active_by_event_type(event.event_type)
            .await?;
        if webhooks.is_empty() {
            return Ok(());
        }

        debug!(
            "Dispatching event {} to {} webhook(s)",
            event.id,
            webhooks.len()
        );

        let body = Bytes::from(serde_json::to_vec(&event)?);
        let event = Arc::new(event);

        for webhook in webhooks {
            let job = DeliveryJob {
                webhook_id: webhook.id,
                event: event.clone(),
                body: body.clone(),
            };
            // 通道满时等待而不是丢弃：历史必须完整，反压沿
            // 订阅队列传导，由总线在入口侧丢弃并计数
            if self.lane(webhook.id).send(job).await.is_err() {
                error!("Delivery lane for webhook {} is gone, job lost", webhook.id);
            }
        }

        Ok(())
    }

    /// 取出指定Webhook的投递通道，没有则建立
    ///
    /// 通道任务持有引擎的引用，存活到进程关闭为止
    fn lane(self: &Arc<Self>, webhook_id: Uuid) -> mpsc::Sender<DeliveryJob> {
        self.lanes
            .entry(webhook_id)
            .or_insert_with(|| {
                let (sender, mut receiver) = mpsc::channel::<DeliveryJob>(self.lane_buffer);
                let engine = self.clone();
                tokio::spawn(async move {
                    while let Some(job) = receiver.recv().await {
                        engine.deliver_with_retry(job).await;
                    }
                });
                sender
            })
            .clone()
    }

    /// 执行一个投递任务的完整尝试序列
    ///
    /// 每次尝试前重新加载Webhook配置，停用、删除和改URL
    /// 在下一次尝试立即生效。序列以成功、重试耗尽或中途
    /// 取消三种方式之一收尾。
    async fn deliver_with_retry(&self, job: DeliveryJob) {
        let mut attempt = 1u32;
        loop {
            let webhook = match self.webhook_repo.find_by_id(job.webhook_id).await {
                Ok(Some(webhook)) => webhook,
                Ok(None) => {
                    self.cancel_sequence(&job, attempt, "webhook deleted during retry", false)
                        .await;
                    return;
                }
                Err(e) => {
                    error!(
                        "Failed to load webhook {} for delivery: {}",
                        job.webhook_id, e
                    );
                    return;
                }
            };
            if !webhook.is_active {
                self.cancel_sequence(&job, attempt, "webhook deactivated during retry", true)
                    .await;
                return;
            }

            if self.attempt_delivery(&webhook, &job, attempt).await {
                return;
            }

            if self.retry.should_retry(attempt) {
                let backoff = self.retry.calculate_backoff(attempt);
                info!(
                    "Webhook {} attempt {} failed, retrying in {:?}",
                    webhook.id, attempt, backoff
                );
                sleep(backoff).await;
                attempt += 1;
            } else {
                error!(
                    "Webhook {} delivery of event {} exhausted after {} attempts",
                    webhook.id, job.event.id, attempt
                );
                counter!("webhook_delivery_exhausted_total").increment(1);
                self.record_outcome(webhook.id, false).await;
                return;
            }
        }
    }

    /// 发起一次HTTP投递尝试并落历史记录
    ///
    /// # 参数
    ///
    /// * `webhook` - 本次尝试使用的Webhook配置
    /// * `job` - 投递任务
    /// * `attempt` - 尝试序号，从1开始
    ///
    /// # 返回值
    ///
    /// 目标返回2xx时为true，序列到此结束
    async fn attempt_delivery(&self, webhook: &Webhook, job: &DeliveryJob, attempt: u32) -> bool {
        info!(
            "Delivering event {} to {} (attempt {})",
            job.event.id, webhook.url, attempt
        );
        counter!("webhook_delivery_attempts_total", "event_type" => job.event.event_type.as_str())
            .increment(1);

        let start = std::time::Instant::now();

        let mut request = self
            .client
            .post(&webhook.url)
            .header(header::CONTENT_TYPE, "application/json")
            .header("X-Webhook-Event", job.event.event_type.as_str())
            .header("X-Webhook-Id", webhook.id.to_string())
            .timeout(self.request_timeout)
            .body(job.body.clone());

        // 配置了密钥才附带签名头
        if let Some(secret) = &webhook.secret {
            request = request.header("X-Webhook-Signature", sign_payload(secret, &job.body));
        }

        let response = request.send().await;

        let duration = start.elapsed();
        histogram!("webhook_delivery_duration_seconds").record(duration.as_secs_f64());

        let record = match response {
            Ok(resp) => {
                let status = resp.status();
                let body = truncate(
                    resp.text().await.unwrap_or_default(),
                    RESPONSE_BODY_LIMIT,
                );

                if status.is_success() {
                    info!(
                        "Webhook {} delivered event {} successfully",
                        webhook.id, job.event.id
                    );
                    counter!("webhook_delivery_success_total").increment(1);
                    let record = Delivery::success(
                        webhook.id,
                        &job.event,
                        attempt as i32,
                        status.as_u16(),
                        Some(body),
                    );
                    self.record_delivery(&record).await;
                    self.record_outcome(webhook.id, true).await;
                    return true;
                }

                error!(
                    "Webhook {} delivery failed with status: {}",
                    webhook.id, status
                );
                counter!("webhook_delivery_failed_total", "reason" => "http_error").increment(1);
                let snippet = truncate(body.clone(), ERROR_SNIPPET_LIMIT);
                Delivery::failure(
                    webhook.id,
                    &job.event,
                    attempt as i32,
                    Some(status.as_u16()),
                    Some(body),
                    format!("HTTP {}: {}", status.as_u16(), snippet),
                )
            }
            Err(e) => {
                error!("Webhook {} delivery failed with error: {}", webhook.id, e);
                counter!("webhook_delivery_failed_total", "reason" => "network_error").increment(1);
                Delivery::failure(
                    webhook.id,
                    &job.event,
                    attempt as i32,
                    None,
                    None,
                    e.to_string(),
                )
            }
        };

        self.record_delivery(&record).await;
        false
    }

    /// 终止投递序列
    ///
    /// 首次尝试前配置已变化时直接跳过；序列已有失败尝试
    /// 在途时补一条终态失败记录说明取消原因。
    async fn cancel_sequence(&self, job: &DeliveryJob, attempt: u32, reason: &str, count: bool) {
        if attempt == 1 {
            debug!(
                "Skipping delivery of event {} to webhook {}: {}",
                job.event.id, job.webhook_id, reason
            );
            return;
        }

        info!(
            "Cancelling delivery of event {} to webhook {}: {}",
            job.event.id, job.webhook_id, reason
        );
        counter!("webhook_delivery_cancelled_total").increment(1);

        let record = Delivery::failure(
            job.webhook_id,
            &job.event,
            attempt as i32,
            None,
            None,
            reason.to_string(),
        );
        self.record_delivery(&record).await;
        if count {
            self.record_outcome(job.webhook_id, false).await;
        }
    }

    /// 追加一条投递历史记录
    async fn record_delivery(&self, record: &Delivery) {
        if let Err(e) = self.delivery_repo.record(record).await {
            error!("Failed to record delivery {}: {}", record.id, e);
        }
    }

    /// 更新Webhook的终态计数器
    async fn record_outcome(&self, webhook_id: Uuid, success: bool) {
        match self
            .webhook_repo
            .record_outcome(webhook_id, success, Utc::now())
            .await
        {
            Ok(()) => {}
            // 计数更新前Webhook被删不影响已落的历史记录
            Err(RepositoryError::NotFound) => {
                debug!("Webhook {} gone before outcome update", webhook_id)
            }
            Err(e) => error!("Failed to update webhook {} counters: {}", webhook_id, e),
        }
    }
}

/// 按字符数截断过长的文本
fn truncate(text: String, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text;
    }
    text.chars().take(limit).collect()
}
