// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_test_app, TestApp, TEST_TOKEN};
use axum::http::StatusCode;
use eventrs::domain::repositories::webhook_repository::WebhookRepository;
use serde_json::json;
use uuid::Uuid;

/// 通过管理API注册一个Webhook并返回其ID
async fn register_webhook(app: &TestApp, body: serde_json::Value) -> Uuid {
    let response = app
        .server
        .post("/v1/webhooks")
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&body)
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let created: serde_json::Value = response.json();
    Uuid::parse_str(created["id"].as_str().unwrap()).unwrap()
}

/// 测试健康检查与版本端点
///
/// 验证/health和/v1/version不需要认证即可访问。
#[tokio::test]
async fn test_health_and_version_bypass_auth() {
    let app = create_test_app().await;

    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "OK");

    let response = app.server.get("/v1/version").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), env!("CARGO_PKG_VERSION"));
}

/// 测试认证失败
///
/// 验证缺失、格式错误和无效令牌都被拒绝并返回统一的错误格式。
#[tokio::test]
async fn test_management_api_rejects_bad_credentials() {
    let app = create_test_app().await;

    // 缺少认证头
    let response = app.server.get("/v1/webhooks").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let error: serde_json::Value = response.json();
    assert_eq!(error["error"], "Missing credential");

    // 非Bearer格式
    let response = app
        .server
        .get("/v1/webhooks")
        .add_header("Authorization", format!("Token {}", TEST_TOKEN))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    // 未配置的令牌
    let response = app
        .server
        .get("/v1/webhooks")
        .add_header("Authorization", "Bearer nope")
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let error: serde_json::Value = response.json();
    assert_eq!(error["error"], "Invalid credential");
}

/// 测试成功创建Webhook
///
/// 验证有效请求返回201，响应携带完整配置且永远不回显密钥。
#[tokio::test]
async fn test_create_webhook_success() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/v1/webhooks")
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({
            "name": "billing",
            "url": "https://example.com/hooks/billing",
            "event_type": "payment.completed",
            "secret": "s3cr3t",
            "description": "billing notifications"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let created: serde_json::Value = response.json();
    assert_eq!(created["name"], "billing");
    assert_eq!(created["url"], "https://example.com/hooks/billing");
    assert_eq!(created["event_type"], "payment.completed");
    assert_eq!(created["description"], "billing notifications");
    assert_eq!(created["is_active"], true);
    assert_eq!(created["success_count"], 0);
    assert_eq!(created["failure_count"], 0);
    assert!(created["last_triggered_at"].is_null());
    assert!(created.get("secret").is_none());

    // 密钥落库但不出现在任何响应里
    let id = Uuid::parse_str(created["id"].as_str().unwrap()).unwrap();
    let stored = app.webhook_repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.secret.as_deref(), Some("s3cr3t"));
}

/// 测试创建Webhook时的参数验证
///
/// 验证空名称、未知事件类型和非法URL都返回400。
#[tokio::test]
async fn test_create_webhook_validation() {
    let app = create_test_app().await;

    // 空名称
    let response = app
        .server
        .post("/v1/webhooks")
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({
            "name": "",
            "url": "https://example.com/hook",
            "event_type": "user.created"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let error: serde_json::Value = response.json();
    assert!(error["error"].as_str().unwrap().contains("validation failed"));

    // 未知事件类型
    let response = app
        .server
        .post("/v1/webhooks")
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({
            "name": "orders",
            "url": "https://example.com/hook",
            "event_type": "order.shipped"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let error: serde_json::Value = response.json();
    assert!(error["error"]
        .as_str()
        .unwrap()
        .contains("Unknown event type"));

    // 无法解析的URL
    let response = app
        .server
        .post("/v1/webhooks")
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({
            "name": "orders",
            "url": "not a url",
            "event_type": "user.created"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    // 不支持的协议
    let response = app
        .server
        .post("/v1/webhooks")
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({
            "name": "orders",
            "url": "ftp://example.com/hook",
            "event_type": "user.created"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

/// 测试单个Webhook查询
///
/// 验证按ID查询返回配置，未知ID返回404。
#[tokio::test]
async fn test_get_webhook_by_id() {
    let app = create_test_app().await;
    let id = register_webhook(
        &app,
        json!({
            "name": "support",
            "url": "https://example.com/hooks/support",
            "event_type": "ticket.created"
        }),
    )
    .await;

    let response = app
        .server
        .get(&format!("/v1/webhooks/{}", id))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let webhook: serde_json::Value = response.json();
    assert_eq!(webhook["id"].as_str().unwrap(), id.to_string());
    assert_eq!(webhook["event_type"], "ticket.created");

    let response = app
        .server
        .get(&format!("/v1/webhooks/{}", Uuid::new_v4()))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let error: serde_json::Value = response.json();
    assert_eq!(error["error"], "Record not found");
}

/// 测试Webhook列表的过滤与分页
///
/// 验证按事件类型与启用状态过滤、分页截取以及超限limit的收敛。
#[tokio::test]
async fn test_list_webhooks_filters_and_pagination() {
    let app = create_test_app().await;

    let first = register_webhook(
        &app,
        json!({
            "name": "billing-a",
            "url": "https://example.com/hooks/a",
            "event_type": "payment.completed"
        }),
    )
    .await;
    let second = register_webhook(
        &app,
        json!({
            "name": "billing-b",
            "url": "https://example.com/hooks/b",
            "event_type": "payment.completed"
        }),
    )
    .await;
    let _third = register_webhook(
        &app,
        json!({
            "name": "support",
            "url": "https://example.com/hooks/c",
            "event_type": "ticket.created"
        }),
    )
    .await;

    // 停用第二个
    let response = app
        .server
        .patch(&format!("/v1/webhooks/{}", second))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({ "is_active": false }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    // 无过滤条件返回全部
    let response = app
        .server
        .get("/v1/webhooks")
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let list: serde_json::Value = response.json();
    assert_eq!(list["total"], 3);
    assert_eq!(list["items"].as_array().unwrap().len(), 3);

    // 按事件类型过滤
    let response = app
        .server
        .get("/v1/webhooks?event_type=payment.completed")
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .await;
    let list: serde_json::Value = response.json();
    assert_eq!(list["total"], 2);

    // 按启用状态过滤
    let response = app
        .server
        .get("/v1/webhooks?is_active=false")
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .await;
    let list: serde_json::Value = response.json();
    assert_eq!(list["total"], 1);
    assert_eq!(
        list["items"][0]["id"].as_str().unwrap(),
        second.to_string()
    );

    // 分页截取，创建时间升序
    let response = app
        .server
        .get("/v1/webhooks?limit=1&offset=0")
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .await;
    let list: serde_json::Value = response.json();
    assert_eq!(list["total"], 3);
    assert_eq!(list["items"].as_array().unwrap().len(), 1);
    assert_eq!(list["items"][0]["id"].as_str().unwrap(), first.to_string());
    assert_eq!(list["limit"], 1);
    assert_eq!(list["offset"], 0);

    // 超出上限的limit被收敛
    let response = app
        .server
        .get("/v1/webhooks?limit=5000")
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .await;
    let list: serde_json::Value = response.json();
    assert_eq!(list["limit"], 1000);

    // 未知事件类型的过滤参数返回400
    let response = app
        .server
        .get("/v1/webhooks?event_type=order.shipped")
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

/// 测试Webhook部分更新
///
/// 验证缺席字段保持不变、显式null清空、给值覆盖，
/// 以及event_type创建后不可变更。
#[tokio::test]
async fn test_update_webhook_partial_semantics() {
    let app = create_test_app().await;
    let id = register_webhook(
        &app,
        json!({
            "name": "billing",
            "url": "https://example.com/hooks/billing",
            "event_type": "payment.completed",
            "secret": "s3cr3t",
            "description": "original"
        }),
    )
    .await;

    // 只改名称，其余字段不动
    let response = app
        .server
        .patch(&format!("/v1/webhooks/{}", id))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({ "name": "billing-v2" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated: serde_json::Value = response.json();
    assert_eq!(updated["name"], "billing-v2");
    assert_eq!(updated["description"], "original");

    let stored = app.webhook_repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.secret.as_deref(), Some("s3cr3t"));

    // 显式null清空描述
    let response = app
        .server
        .patch(&format!("/v1/webhooks/{}", id))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({ "description": null }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated: serde_json::Value = response.json();
    assert!(updated["description"].is_null());

    // 轮换密钥后再显式清空
    let response = app
        .server
        .patch(&format!("/v1/webhooks/{}", id))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({ "secret": "next-key" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let stored = app.webhook_repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.secret.as_deref(), Some("next-key"));

    let response = app
        .server
        .patch(&format!("/v1/webhooks/{}", id))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({ "secret": null }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let stored = app.webhook_repo.find_by_id(id).await.unwrap().unwrap();
    assert!(stored.secret.is_none());

    // event_type不在更新范围内，未知字段被忽略
    let response = app
        .server
        .patch(&format!("/v1/webhooks/{}", id))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({ "event_type": "ticket.created" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated: serde_json::Value = response.json();
    assert_eq!(updated["event_type"], "payment.completed");
}

/// 测试更新Webhook时的参数验证
///
/// 验证空白名称和非法URL返回400，未知ID返回404。
#[tokio::test]
async fn test_update_webhook_validation() {
    let app = create_test_app().await;
    let id = register_webhook(
        &app,
        json!({
            "name": "support",
            "url": "https://example.com/hooks/support",
            "event_type": "ticket.created"
        }),
    )
    .await;

    let response = app
        .server
        .patch(&format!("/v1/webhooks/{}", id))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({ "name": "   " }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app
        .server
        .patch(&format!("/v1/webhooks/{}", id))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({ "url": "ftp://example.com/x" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app
        .server
        .patch(&format!("/v1/webhooks/{}", Uuid::new_v4()))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({ "name": "renamed" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

/// 测试Webhook删除的幂等性
///
/// 验证删除返回204，再次删除同一ID仍返回204。
#[tokio::test]
async fn test_delete_webhook_is_idempotent() {
    let app = create_test_app().await;
    let id = register_webhook(
        &app,
        json!({
            "name": "to-remove",
            "url": "https://example.com/hooks/gone",
            "event_type": "user.created"
        }),
    )
    .await;

    let response = app
        .server
        .delete(&format!("/v1/webhooks/{}", id))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let response = app
        .server
        .get(&format!("/v1/webhooks/{}", id))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    // 重复删除同样成功
    let response = app
        .server
        .delete(&format!("/v1/webhooks/{}", id))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
}

/// 测试汇总统计端点
///
/// 验证注册表计数与投递计数的聚合，无投递时成功率为0。
#[tokio::test]
async fn test_webhook_stats_aggregation() {
    let app = create_test_app().await;

    let _active = register_webhook(
        &app,
        json!({
            "name": "active",
            "url": "https://example.com/hooks/active",
            "event_type": "payment.completed"
        }),
    )
    .await;
    let inactive = register_webhook(
        &app,
        json!({
            "name": "inactive",
            "url": "https://example.com/hooks/inactive",
            "event_type": "payment.completed"
        }),
    )
    .await;
    app.server
        .patch(&format!("/v1/webhooks/{}", inactive))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({ "is_active": false }))
        .await;

    let response = app
        .server
        .get("/v1/webhooks/stats")
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let stats: serde_json::Value = response.json();
    assert_eq!(stats["total_webhooks"], 2);
    assert_eq!(stats["active_webhooks"], 1);
    assert_eq!(stats["total_deliveries"], 0);
    assert_eq!(stats["successful_deliveries"], 0);
    assert_eq!(stats["failed_deliveries"], 0);
    assert_eq!(stats["success_rate"], 0.0);
}

/// 测试事件发布端点
///
/// 验证有效事件返回202和入队订阅者数量，未知类型返回400，
/// 缺少负载字段返回422。
#[tokio::test]
async fn test_publish_event() {
    let app = create_test_app().await;

    // 投递引擎是此时唯一的订阅者
    let response = app
        .server
        .post("/v1/events")
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({
            "event_type": "user.created",
            "payload": { "user_id": 42 }
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::ACCEPTED);
    let accepted: serde_json::Value = response.json();
    assert!(Uuid::parse_str(accepted["event_id"].as_str().unwrap()).is_ok());
    assert_eq!(accepted["enqueued_subscribers"], 1);

    let response = app
        .server
        .post("/v1/events")
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({
            "event_type": "order.shipped",
            "payload": {}
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app
        .server
        .post("/v1/events")
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({ "event_type": "user.created" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

/// 测试未知Webhook的投递历史查询
///
/// 验证与单查保持一致返回404。
#[tokio::test]
async fn test_list_deliveries_unknown_webhook() {
    let app = create_test_app().await;

    let response = app
        .server
        .get(&format!("/v1/webhooks/{}/deliveries", Uuid::new_v4()))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
