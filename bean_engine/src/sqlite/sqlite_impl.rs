//! `SqliteDatabase` is a concrete implementation of a Bean Market backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{beans, carts, db_url, new_pool, orders, profiles};
use crate::{
    db_types::{
        Bean,
        BeanUpdate,
        CartItem,
        CartItemDetail,
        NewBean,
        NewProfile,
        Order,
        OrderItem,
        OrderStatusType,
        Profile,
        UserId,
    },
    traits::{
        validate_quantity,
        CartError,
        CartManagement,
        CatalogError,
        CatalogManagement,
        FulfilmentDatabase,
        FulfilmentError,
        InsertOrderResult,
        MaterializeResult,
        OrderManagement,
        OrderWithItems,
        PaymentOutcome,
        ProfileError,
        ProfileManagement,
        MAX_ITEM_QUANTITY,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl FulfilmentDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn materialize_order(&self, payment: &PaymentOutcome) -> Result<MaterializeResult, FulfilmentError> {
        let mut tx = self.pool.begin().await?;
        let new_order = payment.to_new_order(OrderStatusType::Succeeded);
        // The order row goes in first. This takes the write lock, and the unique index on the payment reference
        // turns every concurrent or repeated delivery after the first into a no-op.
        let Some(order) = orders::idempotent_insert(&new_order, &mut tx).await? else {
            tx.rollback().await?;
            debug!("🗃️ Payment {} has already been fulfilled", payment.payment_reference);
            return Ok(MaterializeResult::AlreadyProcessed);
        };
        let lines = carts::fetch_cart_items(&payment.user_id, &mut tx).await?;
        if lines.is_empty() {
            tx.rollback().await?;
            warn!(
                "🗃️ Payment {} succeeded, but the cart for {} is empty. No order was created.",
                payment.payment_reference,
                payment.user_id.short()
            );
            return Ok(MaterializeResult::CartEmpty);
        }
        let items = orders::insert_order_items(order.id, &lines, &mut tx).await?;
        let removed = carts::clear_cart(&payment.user_id, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Order #{} created for payment {} with {} items. {removed} cart lines removed.",
            order.id,
            payment.payment_reference,
            items.len()
        );
        Ok(MaterializeResult::Created(OrderWithItems { order, items }))
    }

    async fn record_failed_order(&self, payment: &PaymentOutcome) -> Result<InsertOrderResult, FulfilmentError> {
        let mut tx = self.pool.begin().await?;
        let new_order = payment.to_new_order(OrderStatusType::Failed);
        let Some(order) = orders::idempotent_insert(&new_order, &mut tx).await? else {
            tx.rollback().await?;
            debug!("🗃️ Failure event {} has already been recorded", payment.event_id);
            return Ok(InsertOrderResult::AlreadyExists);
        };
        let lines = carts::fetch_cart_items(&payment.user_id, &mut tx).await?;
        let items = orders::insert_order_items(order.id, &lines, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Failed payment {} recorded as order #{}", payment.payment_reference, order.id);
        Ok(InsertOrderResult::Inserted(OrderWithItems { order, items }))
    }

    async fn close(&mut self) -> Result<(), FulfilmentError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_succeeded_order(&self, payment_reference: &str) -> Result<Option<Order>, FulfilmentError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_succeeded_order(payment_reference, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, FulfilmentError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, FulfilmentError> {
        let mut conn = self.pool.acquire().await?;
        if !orders::order_exists(order_id, &mut conn).await? {
            return Err(FulfilmentError::OrderNotFound(order_id));
        }
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }
}

impl CartManagement for SqliteDatabase {
    async fn add_or_merge_item(&self, user_id: &UserId, bean_id: i64, quantity: i64) -> Result<CartItem, CartError> {
        validate_quantity(quantity)?;
        let mut tx = self.pool.begin().await?;
        let cart_id = carts::fetch_or_create_cart_id(user_id, &mut tx).await?;
        let item = carts::upsert_item(cart_id, bean_id, quantity, MAX_ITEM_QUANTITY, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn fetch_cart_items(&self, user_id: &UserId) -> Result<Vec<CartItemDetail>, CartError> {
        let mut conn = self.pool.acquire().await?;
        let items = carts::fetch_cart_items(user_id, &mut conn).await?;
        Ok(items)
    }

    async fn set_item_quantity(&self, item_id: i64, user_id: &UserId, quantity: i64) -> Result<CartItem, CartError> {
        validate_quantity(quantity)?;
        let mut conn = self.pool.acquire().await?;
        carts::update_item_quantity(item_id, user_id, quantity, &mut conn)
            .await?
            .ok_or(CartError::CartItemNotFound(item_id))
    }

    async fn remove_item(&self, item_id: i64, user_id: &UserId) -> Result<(), CartError> {
        let mut conn = self.pool.acquire().await?;
        match carts::delete_item(item_id, user_id, &mut conn).await? {
            0 => Err(CartError::CartItemNotFound(item_id)),
            _ => Ok(()),
        }
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_all_beans(&self) -> Result<Vec<Bean>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let beans = beans::fetch_all_beans(&mut conn).await?;
        Ok(beans)
    }

    async fn fetch_bean(&self, id: i64) -> Result<Option<Bean>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let bean = beans::fetch_bean(id, &mut conn).await?;
        Ok(bean)
    }

    async fn fetch_beans_for_user(&self, user_id: &UserId) -> Result<Vec<Bean>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let beans = beans::fetch_beans_for_user(user_id, &mut conn).await?;
        Ok(beans)
    }

    async fn insert_bean(&self, user_id: &UserId, bean: NewBean) -> Result<Bean, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        beans::insert_bean(user_id, bean, &mut conn).await
    }

    async fn update_bean(&self, id: i64, user_id: &UserId, update: BeanUpdate) -> Result<Bean, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        beans::update_bean(id, user_id, update, &mut conn).await?.ok_or(CatalogError::BeanNotFound(id))
    }

    async fn delete_bean(&self, id: i64, user_id: &UserId) -> Result<(), CatalogError> {
        let mut conn = self.pool.acquire().await?;
        match beans::delete_bean(id, user_id, &mut conn).await? {
            0 => Err(CatalogError::BeanNotFound(id)),
            _ => {
                debug!("🗃️ Bean #{id} deleted by its owner");
                Ok(())
            },
        }
    }
}

impl ProfileManagement for SqliteDatabase {
    async fn fetch_profile(&self, user_id: &UserId) -> Result<Option<Profile>, ProfileError> {
        let mut conn = self.pool.acquire().await?;
        let profile = profiles::fetch_profile(user_id, &mut conn).await?;
        Ok(profile)
    }

    async fn insert_profile(&self, user_id: &UserId, profile: NewProfile) -> Result<Profile, ProfileError> {
        let mut conn = self.pool.acquire().await?;
        profiles::insert_profile(user_id, profile, &mut conn).await
    }

    async fn update_profile(&self, user_id: &UserId, profile: NewProfile) -> Result<Profile, ProfileError> {
        let mut conn = self.pool.acquire().await?;
        profiles::update_profile(user_id, profile, &mut conn).await?.ok_or(ProfileError::ProfileNotFound)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Applies any outstanding schema migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
