// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::bus::event_bus::EventBus;
use crate::config::settings::Settings;
use crate::domain::repositories::delivery_repository::DeliveryRepository;
use crate::domain::repositories::webhook_repository::WebhookRepository;
use crate::domain::services::token_verifier::TokenVerifier;
use crate::presentation::handlers::{event_handler, realtime_handler, webhook_handler};
use crate::presentation::middleware::auth_middleware::{auth_middleware, AuthState};
use crate::realtime::ConnectionHub;
use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// 管理API走Bearer头认证；WebSocket握手的令牌在查询参数里，
/// 升级完成后校验，因此实时路由不挂认证中间件。
///
/// # 参数
///
/// * `webhook_repo` - Webhook仓库
/// * `delivery_repo` - 投递历史仓库
/// * `bus` - 事件总线
/// * `hub` - 实时连接注册表
/// * `verifier` - 凭证校验器
/// * `settings` - 应用配置
///
/// # 返回值
///
/// 返回配置好的路由
pub fn app<W, D>(
    webhook_repo: Arc<W>,
    delivery_repo: Arc<D>,
    bus: EventBus,
    hub: ConnectionHub,
    verifier: Arc<dyn TokenVerifier>,
    settings: Arc<Settings>,
) -> Router
where
    W: WebhookRepository + 'static,
    D: DeliveryRepository + 'static,
{
    let auth_state = AuthState {
        verifier: verifier.clone(),
    };

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let realtime_routes =
        Router::new().route("/v1/realtime/ws", get(realtime_handler::realtime_ws));

    let protected_routes = Router::new()
        .route("/v1/events", post(event_handler::publish_event))
        .route("/v1/webhooks", post(webhook_handler::create_webhook::<W>))
        .route("/v1/webhooks", get(webhook_handler::list_webhooks::<W>))
        .route(
            "/v1/webhooks/stats",
            get(webhook_handler::webhook_stats::<W, D>),
        )
        .route("/v1/webhooks/{id}", get(webhook_handler::get_webhook::<W>))
        .route(
            "/v1/webhooks/{id}",
            patch(webhook_handler::update_webhook::<W>),
        )
        .route(
            "/v1/webhooks/{id}",
            delete(webhook_handler::delete_webhook::<W>),
        )
        .route(
            "/v1/webhooks/{id}/deliveries",
            get(webhook_handler::list_deliveries::<W, D>),
        )
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(realtime_routes)
        .merge(protected_routes)
        .layer(Extension(webhook_repo))
        .layer(Extension(delivery_repo))
        .layer(Extension(bus))
        .layer(Extension(hub))
        .layer(Extension(verifier))
        .layer(Extension(settings))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
