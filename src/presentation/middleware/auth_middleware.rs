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

use crate::domain::services::token_verifier::{AuthenticationError, TokenVerifier};
use crate::presentation::errors::AppError;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use std::sync::Arc;

/// 认证状态
#[derive(Clone)]
pub struct AuthState {
    /// 凭证校验器
    pub verifier: Arc<dyn TokenVerifier>,
}

/// 认证中间件
///
/// 验证请求中的Bearer令牌
///
/// # 参数
///
/// * `state` - 认证状态
/// * `req` - HTTP请求
/// * `next` - 下一个中间件
///
/// # 返回值
///
/// * `Ok(Response)` - 认证成功的响应
/// * `Err(AppError)` - 认证失败，映射为401的错误体
pub async fn auth_middleware(
    State(state): State<AuthState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Allow public endpoints
    let path = req.uri().path();
    debug!("AuthMiddleware processing path: {}", path);
    if path == "/health" || path == "/v1/version" {
        return Ok(next.run(req).await);
    }

    let token = {
        let auth_header = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .ok_or(AuthenticationError::MissingCredential)?;

        if !auth_header.starts_with("Bearer ") {
            return Err(AuthenticationError::MissingCredential.into());
        }

        auth_header[7..].to_string()
    };

    match state.verifier.verify(&token).await {
        Ok(()) => Ok(next.run(req).await),
        Err(e) => {
            warn!("Rejected credential for {}: {}", path, e);
            Err(e.into())
        }
    }
}
