use actix_web::{
    body::to_bytes,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use bean_engine::{
    db_types::{Amount, Bean, NewBean, UserId},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{CatalogManagement, FulfilmentDatabase},
    CartApi,
    CatalogApi,
    OrderFlowApi,
    ProfileApi,
    SqliteDatabase,
};
use chrono::Duration;
use log::*;

use crate::{
    auth::TokenIssuer,
    config::{AuthConfig, ProcessorConfig, WebhookConfig},
    helpers::{json_error_handler, path_error_handler},
    middleware::SignatureMiddlewareFactory,
};

pub const ALICE: &str = "auth0|alice-0000-1111";
pub const BOB: &str = "auth0|bob-2222-3333";
pub const ROASTER: &str = "auth0|roaster-4444";

pub const WEBHOOK_SECRET: &str = "whsec_endpoint_tests";
// DO NOT re-use this secret anywhere.
const JWT_SECRET: &str = "endpoint-test-jwt-secret-a8f3c1e94b7d";

pub fn auth_config() -> AuthConfig {
    AuthConfig::new(JWT_SECRET)
}

pub fn webhook_config() -> WebhookConfig {
    WebhookConfig::new(WEBHOOK_SECRET, Some(300))
}

pub fn issue_token(user: &str) -> String {
    TokenIssuer::new(&auth_config()).issue_token(&UserId::from(user), None).expect("Failed to sign token")
}

pub fn expired_token(user: &str) -> String {
    TokenIssuer::new(&auth_config())
        .issue_token(&UserId::from(user), Some(Duration::seconds(-60)))
        .expect("Failed to sign token")
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

pub async fn setup_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

pub async fn tear_down(mut db: SqliteDatabase) {
    let path = db.url().trim_start_matches("sqlite://").to_string();
    if let Err(e) = db.close().await {
        error!("Failed to close database: {e}");
    }
    if let Err(e) = std::fs::remove_file(&path) {
        warn!("Could not remove test database {path}: {e}");
    }
}

/// Lists two beans owned by [`ROASTER`]: one at 1000 and one at 500.
pub async fn seed_beans(db: &SqliteDatabase) -> (Bean, Bean) {
    let roaster = UserId::from(ROASTER);
    let sidamo = NewBean::new("Sidamo", "Ethiopia", Amount::from(1000)).with_process("natural");
    let santos = NewBean::new("Santos", "Brazil", Amount::from(500)).with_roast_profile("dark");
    let a = db.insert_bean(&roaster, sidamo).await.expect("Error inserting bean");
    let b = db.insert_bean(&roaster, santos).await.expect("Error inserting bean");
    (a, b)
}

/// Registers the full API (everything except checkout) on top of `db`, with the same extractor settings as the
/// production server.
pub fn configure_api(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    use crate::routes::*;
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .app_data(web::Data::new(TokenIssuer::new(&auth_config())))
            .app_data(web::Data::new(CatalogApi::new(db.clone())))
            .app_data(web::Data::new(CartApi::new(db.clone())))
            .app_data(web::Data::new(ProfileApi::new(db.clone())))
            .app_data(web::Data::new(OrderFlowApi::new(db)))
            .app_data(web::Data::new(ProcessorConfig::default()))
            .service(ListBeansRoute::<SqliteDatabase>::new())
            .service(MyBeansRoute::<SqliteDatabase>::new())
            .service(GetBeanRoute::<SqliteDatabase>::new())
            .service(CreateBeanRoute::<SqliteDatabase>::new())
            .service(UpdateBeanRoute::<SqliteDatabase>::new())
            .service(DeleteBeanRoute::<SqliteDatabase>::new())
            .service(MyCartRoute::<SqliteDatabase>::new())
            .service(AddCartItemRoute::<SqliteDatabase>::new())
            .service(SetCartItemQuantityRoute::<SqliteDatabase>::new())
            .service(RemoveCartItemRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(MyProfileRoute::<SqliteDatabase>::new())
            .service(CreateProfileRoute::<SqliteDatabase>::new())
            .service(UpdateProfileRoute::<SqliteDatabase>::new())
            .service(
                web::scope("/webhooks")
                    .wrap(SignatureMiddlewareFactory::new(&webhook_config()))
                    .service(PaymentWebhookRoute::<SqliteDatabase>::new()),
            );
    }
}

/// Sends `req` to an app set up by `configure` and returns the status and body of the response. Errors raised by
/// middleware are rendered the same way the server would render them.
pub async fn send<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = test::init_service(App::new().configure(configure)).await;
    debug!("Making request");
    let res = match test::try_call_service(&app, req.to_request()).await {
        Ok(res) => res.into_parts().1.map_into_boxed_body(),
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let body = to_bytes(res.into_body()).await.expect("Could not read response body");
    (status, String::from_utf8_lossy(&body).into_owned())
}
