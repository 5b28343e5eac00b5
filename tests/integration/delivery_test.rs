// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_test_app, create_test_app_with_settings, test_settings, TestApp, TEST_TOKEN};
use axum::http::StatusCode;
use eventrs::domain::models::delivery::{Delivery, DeliveryStatus};
use eventrs::domain::models::webhook::Webhook;
use eventrs::domain::repositories::delivery_repository::{DeliveryQueryParams, DeliveryRepository};
use eventrs::domain::repositories::webhook_repository::WebhookRepository;
use eventrs::utils::signature::verify_signature;
use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 注册一个指向测试服务器的Webhook并返回其ID
async fn register_webhook(app: &TestApp, url: &str, secret: Option<&str>) -> Uuid {
    let mut payload = json!({
        "name": "delivery-target",
        "url": url,
        "event_type": "payment.completed",
    });
    if let Some(secret) = secret {
        payload["secret"] = json!(secret);
    }

    let response = app
        .server
        .post("/v1/webhooks")
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&payload)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let created: serde_json::Value = response.json();
    Uuid::parse_str(created["id"].as_str().unwrap()).unwrap()
}

/// 通过API发布一个事件并返回其ID
async fn publish_event(app: &TestApp, event_type: &str, payload: serde_json::Value) -> Uuid {
    let response = app
        .server
        .post("/v1/events")
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({ "event_type": event_type, "payload": payload }))
        .await;
    assert_eq!(response.status_code(), StatusCode::ACCEPTED);
    let accepted: serde_json::Value = response.json();
    Uuid::parse_str(accepted["event_id"].as_str().unwrap()).unwrap()
}

/// 轮询投递历史直到出现预期数量的记录
async fn wait_for_deliveries(app: &TestApp, webhook_id: Uuid, expected: usize) -> Vec<Delivery> {
    for _ in 0..100 {
        let (deliveries, _) = app
            .delivery_repo
            .list_for_webhook(
                webhook_id,
                DeliveryQueryParams {
                    status: None,
                    limit: 50,
                    offset: 0,
                },
            )
            .await
            .expect("Failed to list deliveries");
        if deliveries.len() >= expected {
            return deliveries;
        }
        sleep(Duration::from_millis(50)).await;
    }
    panic!("Timed out waiting for {} delivery record(s)", expected);
}

/// 轮询Webhook直到投递序列落下终态计数
async fn wait_for_outcome(app: &TestApp, webhook_id: Uuid) -> Webhook {
    for _ in 0..100 {
        let webhook = app
            .webhook_repo
            .find_by_id(webhook_id)
            .await
            .expect("Failed to load webhook")
            .expect("Webhook missing");
        if webhook.last_triggered_at.is_some() {
            return webhook;
        }
        sleep(Duration::from_millis(50)).await;
    }
    panic!("Timed out waiting for delivery outcome");
}

/// 测试签名投递的完整链路
///
/// 验证事件经总线到达投递引擎后，目标收到带签名头的信封，
/// 历史记录和成功计数随之落库。
#[tokio::test]
async fn test_delivery_success_with_signature() {
    let app = create_test_app().await;
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let webhook_id =
        register_webhook(&app, &format!("{}/hook", mock_server.uri()), Some("s3cr3t")).await;
    let event_id = publish_event(&app, "payment.completed", json!({ "amount": 500 })).await;

    let deliveries = wait_for_deliveries(&app, webhook_id, 1).await;
    assert_eq!(deliveries.len(), 1);
    let record = &deliveries[0];
    assert_eq!(record.status, DeliveryStatus::Success);
    assert_eq!(record.attempt_number, 1);
    assert_eq!(record.response_status, Some(200));
    assert_eq!(record.response_body.as_deref(), Some("ok"));
    assert_eq!(record.event_id, event_id);
    assert!(record.error_message.is_none());

    // 目标收到的请求携带事件头和可校验的签名
    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let request = &received[0];
    assert_eq!(
        request.headers.get("content-type").unwrap().to_str().unwrap(),
        "application/json"
    );
    assert_eq!(
        request
            .headers
            .get("X-Webhook-Event")
            .unwrap()
            .to_str()
            .unwrap(),
        "payment.completed"
    );
    assert_eq!(
        request.headers.get("X-Webhook-Id").unwrap().to_str().unwrap(),
        webhook_id.to_string()
    );
    let signature = request
        .headers
        .get("X-Webhook-Signature")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(verify_signature("s3cr3t", &request.body, signature));

    // 信封与发布的事件一致
    let envelope: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(envelope["id"].as_str().unwrap(), event_id.to_string());
    assert_eq!(envelope["event_type"], "payment.completed");
    assert_eq!(envelope["payload"]["amount"], 500);

    let webhook = wait_for_outcome(&app, webhook_id).await;
    assert_eq!(webhook.success_count, 1);
    assert_eq!(webhook.failure_count, 0);
}

/// 测试未配置密钥的投递
///
/// 验证没有密钥的Webhook不携带签名头。
#[tokio::test]
async fn test_delivery_without_secret_omits_signature() {
    let app = create_test_app().await;
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let webhook_id = register_webhook(&app, &format!("{}/hook", mock_server.uri()), None).await;
    publish_event(&app, "payment.completed", json!({ "amount": 10 })).await;

    let deliveries = wait_for_deliveries(&app, webhook_id, 1).await;
    assert_eq!(deliveries[0].status, DeliveryStatus::Success);

    let received = mock_server.received_requests().await.unwrap();
    assert!(received[0].headers.get("X-Webhook-Signature").is_none());
    assert!(received[0].headers.get("X-Webhook-Event").is_some());
}

/// 测试重试耗尽
///
/// 验证持续失败的目标产生完整的尝试历史，
/// 整个序列只累计一次失败。
#[tokio::test]
async fn test_delivery_retries_until_exhausted() {
    let app = create_test_app().await;
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let webhook_id = register_webhook(&app, &format!("{}/hook", mock_server.uri()), None).await;
    let event_id = publish_event(&app, "payment.completed", json!({ "amount": 7 })).await;

    // 退避为零，三次尝试全部即时发生
    let mut deliveries = wait_for_deliveries(&app, webhook_id, 3).await;
    deliveries.sort_by_key(|d| d.attempt_number);
    assert_eq!(
        deliveries.iter().map(|d| d.attempt_number).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    for record in &deliveries {
        assert_eq!(record.status, DeliveryStatus::Failed);
        assert_eq!(record.response_status, Some(500));
        assert_eq!(record.event_id, event_id);
        assert_eq!(
            record.error_message.as_deref(),
            Some("HTTP 500: upstream exploded")
        );
    }

    let webhook = wait_for_outcome(&app, webhook_id).await;
    assert_eq!(webhook.failure_count, 1);
    assert_eq!(webhook.success_count, 0);
}

/// 测试停用Webhook不参与投递
///
/// 验证事件分发时直接跳过停用的Webhook，不留任何记录。
#[tokio::test]
async fn test_inactive_webhook_is_skipped() {
    let app = create_test_app().await;
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let webhook_id = register_webhook(&app, &format!("{}/hook", mock_server.uri()), None).await;
    let response = app
        .server
        .patch(&format!("/v1/webhooks/{}", webhook_id))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({ "is_active": false }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    publish_event(&app, "payment.completed", json!({ "amount": 1 })).await;
    sleep(Duration::from_millis(300)).await;

    assert!(mock_server.received_requests().await.unwrap().is_empty());
    let (deliveries, total) = app
        .delivery_repo
        .list_for_webhook(
            webhook_id,
            DeliveryQueryParams {
                status: None,
                limit: 50,
                offset: 0,
            },
        )
        .await
        .unwrap();
    assert!(deliveries.is_empty());
    assert_eq!(total, 0);
}

/// 测试重试途中停用Webhook
///
/// 验证序列在下一次尝试前被取消，补一条终态记录说明原因，
/// 且整个序列只累计一次失败。
#[tokio::test]
async fn test_deactivation_cancels_retry_sequence() {
    // 非零退避留出停用窗口
    let mut settings = test_settings();
    settings.delivery.backoff_base_secs = 1;
    let app = create_test_app_with_settings(settings).await;

    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let webhook_id = register_webhook(&app, &format!("{}/hook", mock_server.uri()), None).await;
    publish_event(&app, "payment.completed", json!({ "amount": 3 })).await;

    // 第一次尝试失败后引擎进入退避，窗口内停用
    wait_for_deliveries(&app, webhook_id, 1).await;
    let response = app
        .server
        .patch(&format!("/v1/webhooks/{}", webhook_id))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .json(&json!({ "is_active": false }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let mut deliveries = wait_for_deliveries(&app, webhook_id, 2).await;
    deliveries.sort_by_key(|d| d.attempt_number);
    assert_eq!(deliveries.len(), 2);

    let first = &deliveries[0];
    assert_eq!(first.attempt_number, 1);
    assert_eq!(first.response_status, Some(500));

    let cancelled = &deliveries[1];
    assert_eq!(cancelled.attempt_number, 2);
    assert_eq!(cancelled.status, DeliveryStatus::Failed);
    assert!(cancelled.response_status.is_none());
    assert_eq!(
        cancelled.error_message.as_deref(),
        Some("webhook deactivated during retry")
    );

    let webhook = wait_for_outcome(&app, webhook_id).await;
    assert_eq!(webhook.failure_count, 1);
    assert_eq!(webhook.success_count, 0);
}

/// 测试投递历史查询端点
///
/// 验证历史最新在前、按状态过滤和分页计数。
#[tokio::test]
async fn test_deliveries_endpoint_filters_by_status() {
    let app = create_test_app().await;
    let mock_server = MockServer::start().await;
    // 第一次投递成功，之后的事件全部失败
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let webhook_id = register_webhook(&app, &format!("{}/hook", mock_server.uri()), None).await;
    let success_event = publish_event(&app, "payment.completed", json!({ "seq": 1 })).await;
    wait_for_deliveries(&app, webhook_id, 1).await;

    let failed_event = publish_event(&app, "payment.completed", json!({ "seq": 2 })).await;
    wait_for_deliveries(&app, webhook_id, 4).await;

    let response = app
        .server
        .get(&format!("/v1/webhooks/{}/deliveries", webhook_id))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let list: serde_json::Value = response.json();
    assert_eq!(list["total"], 4);
    assert_eq!(list["items"].as_array().unwrap().len(), 4);

    let response = app
        .server
        .get(&format!(
            "/v1/webhooks/{}/deliveries?status=success",
            webhook_id
        ))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .await;
    let list: serde_json::Value = response.json();
    assert_eq!(list["total"], 1);
    assert_eq!(
        list["items"][0]["event_id"].as_str().unwrap(),
        success_event.to_string()
    );
    assert_eq!(list["items"][0]["status"], "success");

    let response = app
        .server
        .get(&format!(
            "/v1/webhooks/{}/deliveries?status=failed&limit=2",
            webhook_id
        ))
        .add_header("Authorization", format!("Bearer {}", TEST_TOKEN))
        .await;
    let list: serde_json::Value = response.json();
    assert_eq!(list["total"], 3);
    assert_eq!(list["items"].as_array().unwrap().len(), 2);
    assert_eq!(list["limit"], 2);
    for item in list["items"].as_array().unwrap() {
        assert_eq!(item["event_id"].as_str().unwrap(), failed_event.to_string());
        assert_eq!(item["status"], "failed");
    }
}
