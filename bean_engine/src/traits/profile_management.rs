use thiserror::Error;

use crate::db_types::{NewProfile, Profile, UserId};

#[derive(Debug, Clone, Error)]
pub enum ProfileError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("A profile already exists for this user")]
    ProfileAlreadyExists,
    #[error("No profile exists for this user")]
    ProfileNotFound,
    #[error("Invalid profile. {0}")]
    InvalidProfile(String),
}

impl From<sqlx::Error> for ProfileError {
    fn from(e: sqlx::Error) -> Self {
        ProfileError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait ProfileManagement {
    async fn fetch_profile(&self, user_id: &UserId) -> Result<Option<Profile>, ProfileError>;

    /// Creates the user's profile. Each user can only have one.
    async fn insert_profile(&self, user_id: &UserId, profile: NewProfile) -> Result<Profile, ProfileError>;

    /// Replaces the contents of the user's existing profile.
    async fn update_profile(&self, user_id: &UserId, profile: NewProfile) -> Result<Profile, ProfileError>;
}
