// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::bus::Subscription;
use crate::domain::repositories::delivery_repository::DeliveryRepository;
use crate::domain::repositories::webhook_repository::WebhookRepository;
use crate::workers::delivery_worker::DeliveryEngine;
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
///
/// 托管后台任务句柄，统一等待关闭信号并中止
pub struct WorkerManager {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerManager {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    /// 启动投递引擎
    ///
    /// 把投递引擎的消费循环挂到后台任务上
    ///
    /// # 参数
    ///
    /// * `engine` - 投递引擎
    /// * `subscription` - 引擎消费的总线订阅
    pub fn start_delivery_engine<W, D>(
        &mut self,
        engine: Arc<DeliveryEngine<W, D>>,
        subscription: Subscription,
    ) where
        W: WebhookRepository + 'static,
        D: DeliveryRepository + 'static,
    {
        let handle = tokio::spawn(async move {
            engine.run(subscription).await;
        });
        self.handles.push(handle);
    }

    /// 托管一个已经启动的后台任务
    pub fn register(&mut self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }

    /// 等待关闭信号并关闭后台任务
    ///
    /// 监听关闭信号并中止所有托管的任务
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }

        info!("Shutting down workers...");
        for handle in &self.handles {
            handle.abort();
        }

        info!("Workers shut down successfully");
    }
}

impl Default for WorkerManager {
    fn default() -> Self {
        Self::new()
    }
}
