use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Bean, BeanUpdate, NewBean, UserId},
    traits::CatalogError,
};

pub async fn fetch_all_beans(conn: &mut SqliteConnection) -> Result<Vec<Bean>, sqlx::Error> {
    let beans = sqlx::query_as("SELECT * FROM beans ORDER BY created_at DESC, id DESC").fetch_all(conn).await?;
    Ok(beans)
}

pub async fn fetch_bean(id: i64, conn: &mut SqliteConnection) -> Result<Option<Bean>, sqlx::Error> {
    let bean = sqlx::query_as("SELECT * FROM beans WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(bean)
}

pub async fn fetch_beans_for_user(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Vec<Bean>, sqlx::Error> {
    let beans = sqlx::query_as("SELECT * FROM beans WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(user_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(beans)
}

pub async fn insert_bean(user_id: &UserId, bean: NewBean, conn: &mut SqliteConnection) -> Result<Bean, CatalogError> {
    let bean: Bean = sqlx::query_as(
        r#"
            INSERT INTO beans (name, origin, price, process, roast_profile, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(bean.name)
    .bind(bean.origin)
    .bind(bean.price.value())
    .bind(bean.process)
    .bind(bean.roast_profile)
    .bind(user_id.as_str())
    .fetch_one(conn)
    .await?;
    debug!("📝️ Bean #{} listed by {}", bean.id, user_id.short());
    Ok(bean)
}

/// Updates the bean, but only if `user_id` owns it. `None` fields in `update` are left unchanged.
pub async fn update_bean(
    id: i64,
    user_id: &UserId,
    update: BeanUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Bean>, sqlx::Error> {
    let bean = sqlx::query_as(
        r#"
            UPDATE beans SET
                name = COALESCE($1, name),
                origin = COALESCE($2, origin),
                price = COALESCE($3, price),
                process = COALESCE($4, process),
                roast_profile = COALESCE($5, roast_profile),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $6 AND user_id = $7
            RETURNING *;
        "#,
    )
    .bind(update.name)
    .bind(update.origin)
    .bind(update.price.map(|p| p.value()))
    .bind(update.process)
    .bind(update.roast_profile)
    .bind(id)
    .bind(user_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(bean)
}

/// Deletes the bean, but only if `user_id` owns it. Returns the number of rows deleted (0 or 1).
pub async fn delete_bean(id: i64, user_id: &UserId, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM beans WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
