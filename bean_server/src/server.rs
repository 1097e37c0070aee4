use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use bean_engine::{CartApi, CatalogApi, OrderFlowApi, ProfileApi, SqliteDatabase};
use log::*;

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    helpers::{json_error_handler, path_error_handler},
    middleware::{SignatureMiddlewareFactory, MAX_WEBHOOK_BODY_SIZE},
    processor::StripeClient,
    routes::{
        health,
        AddCartItemRoute,
        CheckoutRoute,
        CreateBeanRoute,
        CreateProfileRoute,
        DeleteBeanRoute,
        GetBeanRoute,
        ListBeansRoute,
        MyBeansRoute,
        MyCartRoute,
        MyOrdersRoute,
        MyProfileRoute,
        PaymentWebhookRoute,
        RemoveCartItemRoute,
        SetCartItemQuantityRoute,
        UpdateBeanRoute,
        UpdateProfileRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    if config.auth.jwt_secret.is_unset() {
        return Err(ServerError::ConfigurationError("BM_JWT_SECRET must be set before the server can start".into()));
    }
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_db_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        info!("🚀️ Running database migrations");
        db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    let processor = StripeClient::new(&config.processor).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db, processor)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    processor: StripeClient,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let catalog_api = CatalogApi::new(db.clone());
        let cart_api = CartApi::new(db.clone());
        let profile_api = ProfileApi::new(db.clone());
        let orders_api = OrderFlowApi::new(db.clone()).with_tx_timeout(config.db_tx_timeout);
        let token_issuer = TokenIssuer::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("bm::access_log"))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(cart_api))
            .app_data(web::Data::new(profile_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(token_issuer))
            .app_data(web::Data::new(processor.clone()))
            .app_data(web::Data::new(config.processor.clone()));
        // Routes that act on behalf of a user check the bearer token in their handlers
        let api_scope = web::scope("/api")
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
            .service(CheckoutRoute::<SqliteDatabase, StripeClient>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(MyProfileRoute::<SqliteDatabase>::new())
            .service(CreateProfileRoute::<SqliteDatabase>::new())
            .service(UpdateProfileRoute::<SqliteDatabase>::new());
        let webhook_scope = web::scope("/webhooks")
            .app_data(web::PayloadConfig::new(MAX_WEBHOOK_BODY_SIZE))
            .wrap(SignatureMiddlewareFactory::new(&config.webhook))
            .service(PaymentWebhookRoute::<SqliteDatabase>::new());
        app.service(health).service(api_scope).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
