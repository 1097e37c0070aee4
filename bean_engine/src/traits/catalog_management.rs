use thiserror::Error;

use crate::db_types::{Bean, BeanUpdate, NewBean, UserId};

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Bean #{0} does not exist")]
    BeanNotFound(i64),
    #[error("Invalid bean listing. {0}")]
    InvalidBean(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

/// The catalog of beans on offer.
///
/// Reads are public. Writes are scoped to the owner of the listing: the owner check is part of the write statement
/// itself, so a listing that belongs to someone else is indistinguishable from one that does not exist. Both result in
/// [`CatalogError::BeanNotFound`].
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    /// Fetches every listing, newest first.
    async fn fetch_all_beans(&self) -> Result<Vec<Bean>, CatalogError>;

    async fn fetch_bean(&self, id: i64) -> Result<Option<Bean>, CatalogError>;

    /// Fetches the listings owned by `user_id`, newest first.
    async fn fetch_beans_for_user(&self, user_id: &UserId) -> Result<Vec<Bean>, CatalogError>;

    /// Stores a new listing owned by `user_id`. The caller is responsible for validating the listing.
    async fn insert_bean(&self, user_id: &UserId, bean: NewBean) -> Result<Bean, CatalogError>;

    /// Applies `update` to bean `id`, if and only if it is owned by `user_id`.
    async fn update_bean(&self, id: i64, user_id: &UserId, update: BeanUpdate) -> Result<Bean, CatalogError>;

    /// Hard-deletes bean `id`, if and only if it is owned by `user_id`.
    async fn delete_bean(&self, id: i64, user_id: &UserId) -> Result<(), CatalogError>;
}
