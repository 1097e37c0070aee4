use actix_web::{http::StatusCode, test::TestRequest};
use bean_engine::db_types::{Amount, CartItem, CartItemDetail};
use serde_json::json;

use super::helpers::{bearer, configure_api, issue_token, seed_beans, send, setup_db, tear_down, ALICE, BOB};

#[actix_web::test]
async fn adding_a_bean_twice_merges_the_line() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    let (a, b) = seed_beans(&db).await;
    let token = issue_token(ALICE);

    let req = TestRequest::post().uri("/cart/items").insert_header(bearer(&token)).set_json(json!({"bean_id": a.id}));
    let (status, body) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let first: CartItem = serde_json::from_str(&body).unwrap();
    assert_eq!(first.quantity, 1);

    let req = TestRequest::post()
        .uri("/cart/items")
        .insert_header(bearer(&token))
        .set_json(json!({"bean_id": a.id, "quantity": 2}));
    let (_, body) = send(req, configure_api(db.clone())).await;
    let merged: CartItem = serde_json::from_str(&body).unwrap();
    assert_eq!(merged.id, first.id);
    assert_eq!(merged.quantity, 3);

    let req = TestRequest::post()
        .uri("/cart/items")
        .insert_header(bearer(&token))
        .set_json(json!({"bean_id": b.id, "quantity": 3}));
    let (status, _) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let req = TestRequest::get().uri("/cart").insert_header(bearer(&token));
    let (status, body) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let items: Vec<CartItemDetail> = serde_json::from_str(&body).unwrap();
    assert_eq!(items.len(), 2);
    let total = Amount::checked_sum(items.iter().filter_map(CartItemDetail::line_total));
    assert_eq!(total, Some(Amount::from(4500)));
    tear_down(db).await;
}

#[actix_web::test]
async fn bad_cart_requests() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    let (a, _) = seed_beans(&db).await;
    let token = issue_token(ALICE);

    let req = TestRequest::post()
        .uri("/cart/items")
        .insert_header(bearer(&token))
        .set_json(json!({"bean_id": a.id, "quantity": 0}));
    let (status, body) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Quantity must be a positive number, but was 0"}"#);

    let req = TestRequest::post()
        .uri("/cart/items")
        .insert_header(bearer(&token))
        .set_json(json!({"bean_id": a.id, "quantity": 92_233_720_368_547_758i64}));
    let (status, body) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"A cart line cannot hold more than 10000 of a bean"}"#);

    let req =
        TestRequest::post().uri("/cart/items").insert_header(bearer(&token)).set_json(json!({"bean_id": 9999}));
    let (status, _) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let req = TestRequest::post().uri("/cart/items").insert_header(bearer(&token)).set_json(json!({"quantity": 2}));
    let (status, _) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    tear_down(db).await;
}

#[actix_web::test]
async fn cart_lines_are_private() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    let (a, _) = seed_beans(&db).await;
    let alice = issue_token(ALICE);
    let bob = issue_token(BOB);

    let req = TestRequest::post().uri("/cart/items").insert_header(bearer(&alice)).set_json(json!({"bean_id": a.id}));
    let (_, body) = send(req, configure_api(db.clone())).await;
    let item: CartItem = serde_json::from_str(&body).unwrap();
    let uri = format!("/cart/items/{}", item.id);

    // Someone else's line looks exactly like a line that does not exist
    let req = TestRequest::put().uri(&uri).insert_header(bearer(&bob)).set_json(json!({"quantity": 50}));
    let (status, not_mine) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let req = TestRequest::put().uri("/cart/items/9999").insert_header(bearer(&bob)).set_json(json!({"quantity": 50}));
    let (status, missing) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(not_mine, missing);

    let req = TestRequest::delete().uri(&uri).insert_header(bearer(&bob));
    let (status, _) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let req = TestRequest::get().uri("/cart").insert_header(bearer(&bob));
    let (_, body) = send(req, configure_api(db.clone())).await;
    assert_eq!(body, "[]");

    let req = TestRequest::put().uri(&uri).insert_header(bearer(&alice)).set_json(json!({"quantity": 4}));
    let (status, body) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let item: CartItem = serde_json::from_str(&body).unwrap();
    assert_eq!(item.quantity, 4);

    let req = TestRequest::delete().uri(&uri).insert_header(bearer(&alice));
    let (status, _) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let req = TestRequest::get().uri("/cart").insert_header(bearer(&alice));
    let (_, body) = send(req, configure_api(db.clone())).await;
    assert_eq!(body, "[]");
    tear_down(db).await;
}
