use sqlx::SqliteConnection;

use super::is_unique_violation;
use crate::{
    db_types::{NewProfile, Profile, UserId},
    traits::ProfileError,
};

pub async fn fetch_profile(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Option<Profile>, sqlx::Error> {
    let profile =
        sqlx::query_as("SELECT * FROM profiles WHERE user_id = $1").bind(user_id.as_str()).fetch_optional(conn).await?;
    Ok(profile)
}

pub async fn insert_profile(
    user_id: &UserId,
    profile: NewProfile,
    conn: &mut SqliteConnection,
) -> Result<Profile, ProfileError> {
    sqlx::query_as(
        r#"
            INSERT INTO profiles (user_id, display_name, icon_url, post_code, address, about_me)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(user_id.as_str())
    .bind(profile.display_name)
    .bind(profile.icon_url)
    .bind(profile.post_code)
    .bind(profile.address)
    .bind(profile.about_me)
    .fetch_one(conn)
    .await
    .map_err(|e| if is_unique_violation(&e) { ProfileError::ProfileAlreadyExists } else { ProfileError::from(e) })
}

pub async fn update_profile(
    user_id: &UserId,
    profile: NewProfile,
    conn: &mut SqliteConnection,
) -> Result<Option<Profile>, sqlx::Error> {
    let profile = sqlx::query_as(
        r#"
            UPDATE profiles SET
                display_name = $1,
                icon_url = $2,
                post_code = $3,
                address = $4,
                about_me = $5,
                updated_at = CURRENT_TIMESTAMP
            WHERE user_id = $6
            RETURNING *;
        "#,
    )
    .bind(profile.display_name)
    .bind(profile.icon_url)
    .bind(profile.post_code)
    .bind(profile.address)
    .bind(profile.about_me)
    .bind(user_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(profile)
}
