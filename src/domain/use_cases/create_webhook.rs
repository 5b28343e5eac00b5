// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::event::EventType;
use crate::domain::models::webhook::Webhook;
use crate::domain::repositories::webhook_repository::{RepositoryError, WebhookRepository};
use std::sync::Arc;

/// 创建Webhook的输入
#[derive(Debug, Clone)]
pub struct NewWebhook {
    pub name: String,
    pub url: String,
    pub event_type: EventType,
    pub secret: Option<String>,
    pub description: Option<String>,
}

pub struct CreateWebhookUseCase<R: WebhookRepository> {
    repo: Arc<R>,
}

impl<R: WebhookRepository> CreateWebhookUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, input: NewWebhook) -> Result<Webhook, RepositoryError> {
        let webhook = Webhook::new(
            input.name,
            input.url,
            input.event_type,
            input.secret,
            input.description,
        );
        self.repo.create(&webhook).await?;
        Ok(webhook)
    }
}
