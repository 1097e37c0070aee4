use actix_web::{http::StatusCode, test::TestRequest};
use bean_engine::{
    db_types::{Order, OrderStatusType, UserId},
    helpers::{sign_payload, SIGNATURE_HEADER},
    traits::{CartManagement, OrderManagement},
    SqliteDatabase,
};
use chrono::Utc;
use serde_json::Value;

use super::helpers::{
    bearer,
    configure_api,
    issue_token,
    seed_beans,
    send,
    setup_db,
    tear_down,
    ALICE,
    BOB,
    WEBHOOK_SECRET,
};
use crate::data_objects::JsonResponse;

fn payment_event(event_id: &str, event_type: &str, intent: &str, amount: i64, user: Option<&str>) -> String {
    let metadata = match user {
        Some(u) => format!(r#"{{"user_id":"{u}"}}"#),
        None => "{}".to_string(),
    };
    format!(
        r#"{{"id":"{event_id}","object":"event","type":"{event_type}","data":{{"object":{{"id":"{intent}",
        "object":"payment_intent","amount":{amount},"currency":"jpy","metadata":{metadata},
        "payment_method_types":["card"]}}}}}}"#
    )
}

fn signed(body: &str, timestamp: i64) -> TestRequest {
    let signature = sign_payload(body.as_bytes(), WEBHOOK_SECRET, timestamp).unwrap();
    TestRequest::post()
        .uri("/webhooks/payments")
        .insert_header(("Content-Type", "application/json"))
        .insert_header((SIGNATURE_HEADER, signature))
        .set_payload(body.to_string())
}

async fn deliver(db: &SqliteDatabase, body: &str) -> (StatusCode, String) {
    send(signed(body, Utc::now().timestamp()), configure_api(db.clone())).await
}

async fn fill_cart(db: &SqliteDatabase, user: &str) {
    let (a, b) = seed_beans(db).await;
    db.add_or_merge_item(&UserId::from(user), a.id, 2).await.unwrap();
    db.add_or_merge_item(&UserId::from(user), b.id, 3).await.unwrap();
}

#[actix_web::test]
async fn successful_payment_creates_an_order() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    fill_cart(&db, ALICE).await;
    let body = payment_event("evt_1", "payment_intent.succeeded", "pi_1", 3500, Some(ALICE));

    let (status, response) = deliver(&db, &body).await;
    assert_eq!(status, StatusCode::OK);
    let response: JsonResponse = serde_json::from_str(&response).unwrap();
    assert!(response.success);
    assert!(response.message.starts_with("Order #"), "{}", response.message);

    let alice = UserId::from(ALICE);
    assert!(db.fetch_cart_items(&alice).await.unwrap().is_empty());
    let order = db.fetch_succeeded_order("pi_1").await.unwrap().unwrap();
    assert_eq!(order.total_amount.value(), 3500);
    assert_eq!(db.fetch_order_items(order.id).await.unwrap().len(), 2);

    // The order shows up in the user's history, and only theirs
    let req = TestRequest::get().uri("/orders").insert_header(bearer(&issue_token(ALICE)));
    let (status, body) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Vec<Order> = serde_json::from_str(&body).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatusType::Succeeded);
    let req = TestRequest::get().uri("/orders").insert_header(bearer(&issue_token(BOB)));
    let (_, body) = send(req, configure_api(db.clone())).await;
    assert_eq!(body, "[]");
    tear_down(db).await;
}

#[actix_web::test]
async fn redelivered_notifications_are_acknowledged_once() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    fill_cart(&db, ALICE).await;
    let body = payment_event("evt_2", "payment_intent.succeeded", "pi_2", 3500, Some(ALICE));
    let (status, _) = deliver(&db, &body).await;
    assert_eq!(status, StatusCode::OK);

    let (status, response) = deliver(&db, &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, r#"{"success":true,"message":"Event already processed"}"#);
    assert_eq!(db.fetch_orders_for_user(&UserId::from(ALICE)).await.unwrap().len(), 1);
    tear_down(db).await;
}

#[actix_web::test]
async fn empty_cart_and_unknown_events_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    let body = payment_event("evt_3", "payment_intent.succeeded", "pi_3", 1000, Some(BOB));
    let (status, response) = deliver(&db, &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, r#"{"success":true,"message":"Cart is empty. No order was created"}"#);

    let body = r#"{"id":"evt_4","type":"charge.refunded","data":{"object":{"id":"ch_1"}}}"#;
    let (status, response) = deliver(&db, body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, r#"{"success":true,"message":"Event type charge.refunded ignored"}"#);
    assert!(db.fetch_orders_for_user(&UserId::from(BOB)).await.unwrap().is_empty());
    tear_down(db).await;
}

#[actix_web::test]
async fn failed_payment_keeps_the_cart() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    fill_cart(&db, ALICE).await;
    let body = payment_event("evt_5", "payment_intent.payment_failed", "pi_5", 3500, Some(ALICE));
    let (status, _) = deliver(&db, &body).await;
    assert_eq!(status, StatusCode::OK);

    let alice = UserId::from(ALICE);
    assert_eq!(db.fetch_cart_items(&alice).await.unwrap().len(), 2);
    let orders = db.fetch_orders_for_user(&alice).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatusType::Failed);
    tear_down(db).await;
}

#[actix_web::test]
async fn unsigned_and_forged_notifications_are_rejected() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    fill_cart(&db, ALICE).await;
    let body = payment_event("evt_6", "payment_intent.succeeded", "pi_6", 3500, Some(ALICE));

    let req = TestRequest::post().uri("/webhooks/payments").set_payload(body.clone());
    let (status, response) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response, r#"{"error":"Invalid webhook signature. No signature header was provided"}"#);

    // Signed correctly, but the body was changed on the way
    let now = Utc::now().timestamp();
    let signature = sign_payload(body.as_bytes(), WEBHOOK_SECRET, now).unwrap();
    let tampered = body.replace("3500", "3501");
    let req = TestRequest::post()
        .uri("/webhooks/payments")
        .insert_header((SIGNATURE_HEADER, signature))
        .set_payload(tampered);
    let (status, response) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response, r#"{"error":"Invalid webhook signature. No signature in the header matches the payload"}"#);

    // Signed with the wrong secret
    let signature = sign_payload(body.as_bytes(), "whsec_someone_else", now).unwrap();
    let req =
        TestRequest::post().uri("/webhooks/payments").insert_header((SIGNATURE_HEADER, signature)).set_payload(body);
    let (status, _) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(db.fetch_cart_items(&UserId::from(ALICE)).await.unwrap().len(), 2);
    assert!(db.fetch_orders_for_user(&UserId::from(ALICE)).await.unwrap().is_empty());
    tear_down(db).await;
}

#[actix_web::test]
async fn stale_notifications_are_rejected() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    let body = payment_event("evt_7", "payment_intent.succeeded", "pi_7", 3500, Some(ALICE));
    let an_hour_ago = Utc::now().timestamp() - 3600;
    let (status, response) = send(signed(&body, an_hour_ago), configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(response.contains("outside the tolerance window"), "{response}");

    let req = TestRequest::post()
        .uri("/webhooks/payments")
        .insert_header((SIGNATURE_HEADER, format!("t={},v1=00", i64::MIN)))
        .set_payload(body);
    let (status, _) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    tear_down(db).await;
}

#[actix_web::test]
async fn malformed_notifications_are_bad_requests() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    fill_cart(&db, ALICE).await;

    let (status, _) = deliver(&db, "this is not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = r#"{"id":"evt_8","type":"payment_intent.succeeded","data":{"object":{"id":"pi_8"}}}"#;
    let (status, _) = deliver(&db, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = payment_event("evt_9", "payment_intent.succeeded", "pi_9", 3500, None);
    let (status, response) = deliver(&db, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let response: Value = serde_json::from_str(&response).unwrap();
    assert!(response["error"].as_str().unwrap().contains("evt_9"));

    assert_eq!(db.fetch_cart_items(&UserId::from(ALICE)).await.unwrap().len(), 2);
    tear_down(db).await;
}

#[actix_web::test]
async fn oversized_notifications_are_refused() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    let padding = "x".repeat(70 * 1024);
    let body = format!(r#"{{"id":"evt_big","type":"charge.refunded","padding":"{padding}"}}"#);
    let (status, _) = deliver(&db, &body).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    tear_down(db).await;
}
