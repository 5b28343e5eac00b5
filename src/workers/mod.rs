// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供Webhook投递引擎和后台任务生命周期管理
pub mod delivery_worker;
pub mod manager;

pub use delivery_worker::DeliveryEngine;
pub use manager::WorkerManager;
