// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{spawn_live_app, spawn_live_app_with_settings, test_settings, TEST_TOKEN};
use eventrs::domain::models::event::{DomainEvent, EventType};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 建立WebSocket连接，升级失败直接panic
async fn connect(url: &str) -> WsClient {
    let (socket, _) = connect_async(url)
        .await
        .expect("WebSocket handshake failed");
    socket
}

/// 读取下一条消息，超时视为测试失败
async fn next_message(socket: &mut WsClient) -> Message {
    timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("Timed out waiting for websocket message")
        .expect("Websocket stream ended unexpectedly")
        .expect("Websocket read failed")
}

/// 读取下一条文本帧并解析为JSON，跳过协议层的ping/pong
async fn next_json(socket: &mut WsClient) -> serde_json::Value {
    loop {
        match next_message(socket).await {
            Message::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("Frame is not valid JSON")
            }
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("Unexpected websocket message: {:?}", other),
        }
    }
}

/// 消费连接确认帧并返回服务端分配的连接ID
async fn read_ack(socket: &mut WsClient) -> Uuid {
    let ack = next_json(socket).await;
    assert_eq!(ack["type"], "connection");
    let connection_id = ack["payload"]["connection_id"]
        .as_str()
        .expect("Ack frame missing connection_id");
    Uuid::parse_str(connection_id).expect("connection_id is not a UUID")
}

/// 测试握手确认与事件推送顺序
///
/// 验证确认帧先于一切事件到达，同一连接上的事件
/// 按发布顺序推送。
#[tokio::test]
async fn test_handshake_ack_then_ordered_events() {
    let app = spawn_live_app().await;
    let mut socket = connect(&app.ws_url(&format!("token={}", TEST_TOKEN))).await;
    read_ack(&mut socket).await;

    // 确认帧已到达，订阅必然生效
    let first = DomainEvent::new(EventType::TicketCreated, json!({ "seq": 1 }));
    let second = DomainEvent::new(EventType::TicketCreated, json!({ "seq": 2 }));
    assert_eq!(app.bus.publish(&first), 1);
    assert_eq!(app.bus.publish(&second), 1);

    let frame = next_json(&mut socket).await;
    assert_eq!(frame["type"], "ticket.created");
    assert_eq!(frame["payload"]["seq"], 1);

    let frame = next_json(&mut socket).await;
    assert_eq!(frame["payload"]["seq"], 2);
}

/// 测试应用层保活
///
/// 验证ping帧得到pong应答，应答不携带payload字段。
#[tokio::test]
async fn test_ping_gets_pong_reply() {
    let app = spawn_live_app().await;
    let mut socket = connect(&app.ws_url(&format!("token={}", TEST_TOKEN))).await;
    read_ack(&mut socket).await;

    socket
        .send(Message::text(r#"{"type":"ping"}"#))
        .await
        .expect("Failed to send ping frame");

    let reply = next_json(&mut socket).await;
    assert_eq!(reply["type"], "pong");
    assert!(reply.get("payload").is_none());
}

/// 测试按事件类型过滤订阅
///
/// 验证过滤之外的事件不占用该连接的投递计数，
/// 过滤之内的事件正常推送。
#[tokio::test]
async fn test_events_query_filters_subscription() {
    let app = spawn_live_app().await;
    let query = format!(
        "token={}&events=ticket.created,ticket.status_changed",
        TEST_TOKEN
    );
    let mut socket = connect(&app.ws_url(&query)).await;
    read_ack(&mut socket).await;

    // 唯一的订阅者过滤掉了user.created
    let ignored = DomainEvent::new(EventType::UserCreated, json!({ "name": "alice" }));
    assert_eq!(app.bus.publish(&ignored), 0);

    let wanted = DomainEvent::new(
        EventType::TicketStatusChanged,
        json!({ "ticket_id": 42, "status": "closed" }),
    );
    assert_eq!(app.bus.publish(&wanted), 1);

    let frame = next_json(&mut socket).await;
    assert_eq!(frame["type"], "ticket.status_changed");
    assert_eq!(frame["payload"]["ticket_id"], 42);
}

/// 测试非法过滤参数在升级前被拒绝
///
/// 验证未知事件类型直接得到HTTP 400，连接根本不会升级。
#[tokio::test]
async fn test_invalid_event_filter_rejected_before_upgrade() {
    let app = spawn_live_app().await;
    let url = app.ws_url(&format!("token={}&events=order.shipped", TEST_TOKEN));

    let error = connect_async(&url)
        .await
        .expect_err("Handshake should have been rejected");
    match error {
        WsError::Http(response) => {
            assert_eq!(response.status().as_u16(), 400);
            if let Some(body) = response.body() {
                assert!(String::from_utf8_lossy(body).contains("Unknown event type"));
            }
        }
        other => panic!("Expected HTTP rejection, got {:?}", other),
    }
}

/// 测试令牌校验失败的关闭语义
///
/// 验证升级本身成功，随后以1008策略违规关闭帧拒绝，
/// 缺失令牌与错误令牌走同一条路径。
#[tokio::test]
async fn test_bad_token_closed_with_policy_violation() {
    let app = spawn_live_app().await;

    let mut socket = connect(&app.ws_url("token=wrong-token")).await;
    match next_message(&mut socket).await {
        Message::Close(Some(frame)) => {
            assert_eq!(frame.code, CloseCode::Policy);
            assert_eq!(frame.reason.as_str(), "unauthorized");
        }
        other => panic!("Expected policy close frame, got {:?}", other),
    }

    let mut socket = connect(&app.ws_url("")).await;
    match next_message(&mut socket).await {
        Message::Close(Some(frame)) => {
            assert_eq!(frame.code, CloseCode::Policy);
            assert_eq!(frame.reason.as_str(), "unauthorized");
        }
        other => panic!("Expected policy close frame, got {:?}", other),
    }
}

/// 测试连接注册表的生命周期
///
/// 验证确认帧到达时连接已登记，对端关闭后登记随之清除。
#[tokio::test]
async fn test_hub_tracks_connection_lifecycle() {
    let app = spawn_live_app().await;
    assert!(app.hub.is_empty());

    let mut socket = connect(&app.ws_url(&format!("token={}", TEST_TOKEN))).await;
    read_ack(&mut socket).await;
    assert_eq!(app.hub.len(), 1);

    socket.close(None).await.expect("Failed to close socket");

    // 会话退出是异步的，轮询等待注销
    for _ in 0..100 {
        if app.hub.is_empty() {
            return;
        }
        sleep(Duration::from_millis(50)).await;
    }
    panic!("Connection was not removed from the hub");
}

/// 测试空闲连接回收
///
/// 验证超过空闲时限的静默连接被服务端以1000正常关闭帧
/// 撤下，原因标明空闲超时。
#[tokio::test]
async fn test_idle_connection_is_evicted() {
    let mut settings = test_settings();
    settings.realtime.keepalive_interval_secs = 1;
    settings.realtime.idle_timeout_secs = 1;
    let app = spawn_live_app_with_settings(settings).await;

    let mut socket = connect(&app.ws_url(&format!("token={}", TEST_TOKEN))).await;
    read_ack(&mut socket).await;

    // 不发送任何帧，等待服务端主动关闭
    match next_message(&mut socket).await {
        Message::Close(Some(frame)) => {
            assert_eq!(frame.code, CloseCode::Normal);
            assert_eq!(frame.reason.as_str(), "idle timeout");
        }
        other => panic!("Expected idle-timeout close frame, got {:?}", other),
    }

    for _ in 0..100 {
        if app.hub.is_empty() {
            return;
        }
        sleep(Duration::from_millis(50)).await;
    }
    panic!("Evicted connection was not removed from the hub");
}
