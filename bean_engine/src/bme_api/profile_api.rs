use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewProfile, Profile, UserId},
    traits::{ProfileError, ProfileManagement},
};

pub struct ProfileApi<B> {
    db: B,
}

impl<B: Debug> Debug for ProfileApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProfileApi ({:?})", self.db)
    }
}

impl<B> ProfileApi<B>
where B: ProfileManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn profile(&self, user_id: &UserId) -> Result<Profile, ProfileError> {
        self.db.fetch_profile(user_id).await?.ok_or(ProfileError::ProfileNotFound)
    }

    pub async fn create_profile(&self, user_id: &UserId, profile: NewProfile) -> Result<Profile, ProfileError> {
        let profile = validate(profile)?;
        let profile = self.db.insert_profile(user_id, profile).await?;
        debug!("👤️ Profile created for {}", user_id.short());
        Ok(profile)
    }

    pub async fn update_profile(&self, user_id: &UserId, profile: NewProfile) -> Result<Profile, ProfileError> {
        let profile = validate(profile)?;
        self.db.update_profile(user_id, profile).await
    }
}

fn validate(mut profile: NewProfile) -> Result<NewProfile, ProfileError> {
    profile.display_name = profile.display_name.trim().to_string();
    if profile.display_name.is_empty() {
        return Err(ProfileError::InvalidProfile("display_name is required".into()));
    }
    Ok(profile)
}
