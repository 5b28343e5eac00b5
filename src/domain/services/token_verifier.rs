// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

/// 认证错误类型
///
/// 凭证无效时产生，对当次连接尝试是终态：
/// 不触发重试，也不进入投递重试路径。
#[derive(Error, Debug)]
pub enum AuthenticationError {
    #[error("Missing credential")]
    MissingCredential,
    #[error("Invalid credential")]
    InvalidCredential,
}

/// 凭证校验特质
///
/// 实时连接握手和管理API共用的认证接口。身份体系是
/// 外部协作方，这里只定义校验契约；生产实现基于配置的
/// 令牌集合，测试可注入桩实现。
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// 校验凭证
    ///
    /// # 参数
    ///
    /// * `token` - 客户端出示的凭证
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 凭证有效
    /// * `Err(AuthenticationError)` - 凭证缺失或无效
    async fn verify(&self, token: &str) -> Result<(), AuthenticationError>;
}

/// 基于静态令牌集合的凭证校验实现
pub struct StaticTokenVerifier {
    tokens: Vec<String>,
}

impl StaticTokenVerifier {
    /// 创建新的校验器实例
    ///
    /// # 参数
    ///
    /// * `tokens` - 配置中允许的令牌列表
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<(), AuthenticationError> {
        if token.is_empty() {
            return Err(AuthenticationError::MissingCredential);
        }
        if self.tokens.iter().any(|t| t == token) {
            Ok(())
        } else {
            Err(AuthenticationError::InvalidCredential)
        }
    }
}
