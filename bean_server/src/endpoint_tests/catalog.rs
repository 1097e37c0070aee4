use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use bean_engine::{
    db_types::{Amount, Bean, UserId},
    traits::CatalogError,
    CatalogApi,
};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use super::{
    helpers::{bearer, configure_api, issue_token, seed_beans, send, setup_db, tear_down, BOB, ROASTER},
    mocks::MockCatalog,
};
use crate::routes::{GetBeanRoute, ListBeansRoute};

#[actix_web::test]
async fn list_beans_from_mock() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send(TestRequest::get().uri("/beans"), configure_mock).await;
    assert_eq!(status, StatusCode::OK);
    let beans: Vec<Bean> = serde_json::from_str(&body).unwrap();
    assert_eq!(beans.len(), 1);
    assert_eq!(beans[0].name, "Kona");
    assert_eq!(beans[0].price, Amount::from(4200));
}

#[actix_web::test]
async fn database_errors_are_server_errors() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send(TestRequest::get().uri("/beans/13"), configure_mock).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"An error occurred on the backend of the server. Database error: disk I/O error"}"#);
}

#[actix_web::test]
async fn fetch_bean() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    let (a, _) = seed_beans(&db).await;
    let (status, body) = send(TestRequest::get().uri(&format!("/beans/{}", a.id)), configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let bean: Bean = serde_json::from_str(&body).unwrap();
    assert_eq!(bean, a);

    let (status, body) = send(TestRequest::get().uri("/beans/9999"), configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Bean not found"}"#);

    let (status, _) = send(TestRequest::get().uri("/beans/not-a-number"), configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    tear_down(db).await;
}

#[actix_web::test]
async fn create_bean_belongs_to_caller() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    let listing = json!({"name": "Tarrazu", "origin": "Costa Rica", "price": 1800, "process": "honey"});

    let req = TestRequest::post().uri("/beans").set_json(&listing);
    let (status, _) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // An owner field in the body has no effect
    let mut spoofed = listing.clone();
    spoofed["user_id"] = json!(BOB);
    let req = TestRequest::post().uri("/beans").insert_header(bearer(&issue_token(ROASTER))).set_json(&spoofed);
    let (status, body) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let bean: Bean = serde_json::from_str(&body).unwrap();
    assert_eq!(bean.user_id, UserId::from(ROASTER));
    assert_eq!(bean.process, "honey");

    let req = TestRequest::get().uri("/my/beans").insert_header(bearer(&issue_token(ROASTER)));
    let (status, body) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let mine: Vec<Bean> = serde_json::from_str(&body).unwrap();
    assert_eq!(mine, vec![bean]);

    let req = TestRequest::get().uri("/my/beans").insert_header(bearer(&issue_token(BOB)));
    let (_, body) = send(req, configure_api(db.clone())).await;
    assert_eq!(body, "[]");
    tear_down(db).await;
}

#[actix_web::test]
async fn invalid_listings_are_bad_requests() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    let token = issue_token(ROASTER);
    let req = TestRequest::post()
        .uri("/beans")
        .insert_header(bearer(&token))
        .set_json(json!({"name": "", "origin": "Kenya", "price": 100}));
    let (status, _) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri("/beans")
        .insert_header(bearer(&token))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{ not json");
    let (status, body) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("Could not read request body"));
    tear_down(db).await;
}

#[actix_web::test]
async fn only_the_owner_can_change_a_listing() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    let (a, _) = seed_beans(&db).await;
    let uri = format!("/beans/{}", a.id);

    let req = TestRequest::put().uri(&uri).insert_header(bearer(&issue_token(BOB))).set_json(json!({"price": 1}));
    let (status, body) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Bean not found"}"#);

    let req = TestRequest::delete().uri(&uri).insert_header(bearer(&issue_token(BOB)));
    let (status, _) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let req =
        TestRequest::put().uri(&uri).insert_header(bearer(&issue_token(ROASTER))).set_json(json!({"price": 1200}));
    let (status, body) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let bean: Bean = serde_json::from_str(&body).unwrap();
    assert_eq!(bean.price, Amount::from(1200));
    assert_eq!(bean.name, a.name);

    let req = TestRequest::delete().uri(&uri).insert_header(bearer(&issue_token(ROASTER)));
    let (status, body) = send(req, configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, _) = send(TestRequest::get().uri(&uri), configure_api(db.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    tear_down(db).await;
}

fn kona() -> Bean {
    let ts = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    Bean {
        id: 1,
        name: "Kona".into(),
        origin: "Hawaii".into(),
        price: Amount::from(4200),
        process: "washed".into(),
        roast_profile: "medium".into(),
        user_id: UserId::from(ROASTER),
        created_at: ts,
        updated_at: ts,
    }
}

fn configure_mock(cfg: &mut ServiceConfig) {
    let mut catalog = MockCatalog::new();
    catalog.expect_fetch_all_beans().returning(|| Ok(vec![kona()]));
    catalog.expect_fetch_bean().returning(|_| Err(CatalogError::DatabaseError("disk I/O error".into())));
    cfg.app_data(web::Data::new(CatalogApi::new(catalog)))
        .service(ListBeansRoute::<MockCatalog>::new())
        .service(GetBeanRoute::<MockCatalog>::new());
}
