// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 事件总线模块
///
/// 提供进程内的事件发布与订阅功能
/// 负责把领域事件扇出到实时连接和Webhook投递引擎
pub mod event_bus;

pub use event_bus::{EventBus, EventFilter, Subscription};
