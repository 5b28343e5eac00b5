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

use eventrs::bus::event_bus::{EventBus, EventFilter};
use eventrs::config::settings::Settings;
use eventrs::domain::services::token_verifier::{StaticTokenVerifier, TokenVerifier};
use eventrs::infrastructure::database::connection;
use eventrs::infrastructure::repositories::delivery_repo_impl::DeliveryRepoImpl;
use eventrs::infrastructure::repositories::webhook_repo_impl::WebhookRepoImpl;
use eventrs::presentation::routes;
use eventrs::realtime::ConnectionHub;
use eventrs::workers::{DeliveryEngine, WorkerManager};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use eventrs::utils::telemetry;
use migration::{Migrator, MigratorTrait};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting eventrs...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // Initialize Prometheus Metrics
    eventrs::infrastructure::metrics::init_metrics(&settings.metrics);

    // 3. Connect to database
    let db = connection::create_pool(&settings.database).await?;
    let db = Arc::new(db);
    info!("Database connection established");

    // Run database migrations
    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Initialize Components
    let webhook_repo = Arc::new(WebhookRepoImpl::new(db.clone()));
    let delivery_repo = Arc::new(DeliveryRepoImpl::new(db.clone()));
    let bus = EventBus::new(settings.bus.subscriber_buffer);
    let hub = ConnectionHub::new();
    let verifier: Arc<dyn TokenVerifier> =
        Arc::new(StaticTokenVerifier::new(settings.auth.api_tokens.clone()));

    // 5. Start Workers
    let engine = Arc::new(DeliveryEngine::new(
        webhook_repo.clone(),
        delivery_repo.clone(),
        &settings.delivery,
    ));
    let mut worker_manager = WorkerManager::new();
    worker_manager.start_delivery_engine(engine, bus.subscribe("delivery", EventFilter::All));
    info!("Delivery engine started");

    // 6. Start HTTP server
    let app = routes::app(
        webhook_repo,
        delivery_repo,
        bus,
        hub,
        verifier,
        settings.clone(),
    );

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            worker_manager.wait_for_shutdown().await;
        })
        .await?;

    Ok(())
}
