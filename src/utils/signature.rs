// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// 计算Webhook签名
///
/// 对即将发送的请求体字节计算 HMAC-SHA256，
/// 返回 `sha256=<hex>` 格式的签名头值。
/// 接收方用同一密钥对收到的原始请求体重算即可校验。
///
/// # 参数
///
/// * `secret` - Webhook 密钥
/// * `body` - 请求体字节
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    let signature = mac.finalize().into_bytes();
    format!("sha256={}", hex::encode(signature))
}

/// 校验Webhook签名
///
/// # 参数
///
/// * `secret` - Webhook 密钥
/// * `body` - 收到的原始请求体字节
/// * `signature` - 请求头中的签名值 (`sha256=<hex>`)
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Some(hex_part) = signature.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_part) else {
        return false;
    };

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
