// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::delivery::{Delivery, DeliveryStatus};
use serde::{Deserialize, Serialize};

/// 投递历史查询DTO
#[derive(Debug, Deserialize, Serialize)]
pub struct ListDeliveriesQueryDto {
    /// 按结果状态过滤（success / failed）
    pub status: Option<DeliveryStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// 投递历史响应DTO
///
/// 投递记录本身就是审计视图，整条返回
#[derive(Debug, Serialize)]
pub struct DeliveryListResponseDto {
    pub items: Vec<Delivery>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}
