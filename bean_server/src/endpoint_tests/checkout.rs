use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use bean_engine::{
    db_types::{Amount, UserId},
    traits::CartManagement,
    CartApi,
    SqliteDatabase,
};

use super::{
    helpers::{auth_config, bearer, issue_token, seed_beans, send, setup_db, tear_down, ALICE},
    mocks::MockProcessor,
};
use crate::{
    auth::TokenIssuer,
    config::ProcessorConfig,
    data_objects::CheckoutResponse,
    processor::{PaymentIntent, ProcessorError},
    routes::CheckoutRoute,
};

fn configure(db: SqliteDatabase, processor: MockProcessor) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(TokenIssuer::new(&auth_config())))
            .app_data(web::Data::new(CartApi::new(db)))
            .app_data(web::Data::new(processor))
            .app_data(web::Data::new(ProcessorConfig::default()))
            .service(CheckoutRoute::<SqliteDatabase, MockProcessor>::new());
    }
}

#[actix_web::test]
async fn checkout_creates_a_payment_intent_for_the_cart_total() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    let (a, b) = seed_beans(&db).await;
    let alice = UserId::from(ALICE);
    db.add_or_merge_item(&alice, a.id, 2).await.unwrap();
    db.add_or_merge_item(&alice, b.id, 3).await.unwrap();

    let mut processor = MockProcessor::new();
    processor
        .expect_create_payment_intent()
        .withf(|amount, currency, user_id| {
            *amount == Amount::from(3500) && currency == "jpy" && user_id.as_str() == ALICE
        })
        .times(1)
        .returning(|_, _, _| Ok(PaymentIntent { id: "pi_123".into(), client_secret: "pi_123_secret_456".into() }));

    let req = TestRequest::post().uri("/checkout").insert_header(bearer(&issue_token(ALICE)));
    let (status, body) = send(req, configure(db.clone(), processor)).await;
    assert_eq!(status, StatusCode::OK);
    let response: CheckoutResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.client_secret, "pi_123_secret_456");
    assert_eq!(response.payment_intent_id, "pi_123");
    assert_eq!(response.amount, Amount::from(3500));
    assert_eq!(response.currency, "jpy");

    // The cart is only emptied once the payment succeeds
    assert_eq!(db.fetch_cart_items(&alice).await.unwrap().len(), 2);
    tear_down(db).await;
}

#[actix_web::test]
async fn empty_carts_cannot_be_checked_out() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    let mut processor = MockProcessor::new();
    processor.expect_create_payment_intent().never();

    let req = TestRequest::post().uri("/checkout").insert_header(bearer(&issue_token(ALICE)));
    let (status, body) = send(req, configure(db.clone(), processor)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"The cart is empty"}"#);
    tear_down(db).await;
}

#[actix_web::test]
async fn processor_failures_are_bad_gateway() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    let (a, _) = seed_beans(&db).await;
    db.add_or_merge_item(&UserId::from(ALICE), a.id, 1).await.unwrap();
    let mut processor = MockProcessor::new();
    processor.expect_create_payment_intent().returning(|_, _, _| {
        Err(ProcessorError::QueryError { status: 402, message: "card_declined".into() })
    });

    let req = TestRequest::post().uri("/checkout").insert_header(bearer(&issue_token(ALICE)));
    let (status, _) = send(req, configure(db.clone(), processor)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    tear_down(db).await;
}

#[actix_web::test]
async fn checkout_requires_a_token() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    let mut processor = MockProcessor::new();
    processor.expect_create_payment_intent().never();
    let (status, _) = send(TestRequest::post().uri("/checkout"), configure(db.clone(), processor)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    tear_down(db).await;
}
