// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 领域事件（event）：业务侧发布的实时事实
/// - 网络钩子（webhook）：订阅单一事件类型的回调端点
/// - 投递记录（delivery）：每次Webhook投递尝试的审计记录
/// - 连接状态（connection）：实时连接的生命周期状态
///
/// 这些模型构成了系统的数据基础，定义了业务概念的
/// 结构和行为，是领域驱动设计的核心组成部分。
pub mod connection;
pub mod delivery;
pub mod event;
pub mod webhook;
