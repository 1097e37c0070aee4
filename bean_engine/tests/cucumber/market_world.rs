use std::collections::HashMap;

use bean_engine::{
    db_types::UserId,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    CartApi,
    CatalogApi,
    EventAck,
    OrderFlowApi,
    OrderFlowError,
    SqliteDatabase,
};
use cucumber::World;
use log::*;

#[derive(Default, Debug, World)]
pub struct MarketWorld {
    pub system: Option<MarketSystem>,
    /// Bean ids by listing name
    pub beans: HashMap<String, i64>,
    pub last_result: Option<Result<EventAck, OrderFlowError>>,
}

#[derive(Debug)]
pub struct MarketSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub catalog: CatalogApi<SqliteDatabase>,
    pub carts: CartApi<SqliteDatabase>,
    pub orders: OrderFlowApi<SqliteDatabase>,
}

impl MarketWorld {
    pub fn system(&self) -> &MarketSystem {
        self.system.as_ref().expect("Market not initialised")
    }

    pub fn bean_id(&self, name: &str) -> i64 {
        *self.beans.get(name).unwrap_or_else(|| panic!("No bean called {name} has been listed"))
    }
}

impl MarketSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        Self {
            db_path: url,
            catalog: CatalogApi::new(db.clone()),
            carts: CartApi::new(db.clone()),
            orders: OrderFlowApi::new(db.clone()),
            db,
        }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}

pub fn user(name: &str) -> UserId {
    UserId::from(format!("auth0|{}", name.to_lowercase()))
}
