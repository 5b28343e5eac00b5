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

use crate::bus::event_bus::{EventBus, EventFilter};
use crate::config::settings::Settings;
use crate::domain::models::event::EventType;
use crate::domain::services::token_verifier::TokenVerifier;
use crate::presentation::errors::AppError;
use crate::realtime::{ConnectionHub, RealtimeSession};
use crate::utils::validators::ValidationError;
use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message},
        Query, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// 实时连接查询参数
#[derive(Debug, Deserialize)]
pub struct RealtimeQuery {
    /// 认证令牌，浏览器WebSocket API无法定制请求头，
    /// 只能走查询参数
    pub token: Option<String>,
    /// 逗号分隔的事件类型过滤，缺席时订阅全部
    pub events: Option<String>,
}

/// WebSocket升级端点
///
/// 事件过滤参数在升级前校验，参数错误直接返回400；
/// 令牌校验放到升级完成之后，以1008关闭帧拒绝，
/// 浏览器端才观察得到拒绝原因。
pub async fn realtime_ws(
    ws: WebSocketUpgrade,
    Query(query): Query<RealtimeQuery>,
    Extension(bus): Extension<EventBus>,
    Extension(hub): Extension<ConnectionHub>,
    Extension(verifier): Extension<Arc<dyn TokenVerifier>>,
    Extension(settings): Extension<Arc<Settings>>,
) -> Result<Response, AppError> {
    let filter = parse_event_filter(query.events.as_deref())?;
    let token = query.token.unwrap_or_default();

    Ok(ws.on_upgrade(move |mut socket| async move {
        if let Err(e) = verifier.verify(&token).await {
            warn!("Realtime connection rejected: {}", e);
            let close = Message::Close(Some(CloseFrame {
                code: close_code::POLICY,
                reason: "unauthorized".into(),
            }));
            // 发送失败说明对端已经断开，无需补救
            let _ = socket.send(close).await;
            return;
        }

        let session = RealtimeSession::new(bus, hub, filter, &settings.realtime);
        info!("Realtime connection {} authenticated", session.id());
        session.run(socket).await;
    }))
}

/// 解析逗号分隔的事件过滤参数
fn parse_event_filter(events: Option<&str>) -> Result<EventFilter, ValidationError> {
    match events {
        None | Some("") => Ok(EventFilter::All),
        Some(raw) => raw
            .split(',')
            .map(|name| name.trim().parse::<EventType>())
            .collect(),
    }
}
