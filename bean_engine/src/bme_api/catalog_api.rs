use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Bean, BeanUpdate, NewBean, UserId},
    traits::{CatalogError, CatalogManagement},
};

/// `CatalogApi` manages the bean listings.
///
/// Listings are validated and normalised here before being stored: names and origins are trimmed and required, prices
/// may not be negative, and the process and roast profile are stored in lower case.
pub struct CatalogApi<B> {
    db: B,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub async fn beans(&self) -> Result<Vec<Bean>, CatalogError> {
        self.db.fetch_all_beans().await
    }

    pub async fn bean(&self, id: i64) -> Result<Bean, CatalogError> {
        self.db.fetch_bean(id).await?.ok_or(CatalogError::BeanNotFound(id))
    }

    pub async fn beans_for_user(&self, user_id: &UserId) -> Result<Vec<Bean>, CatalogError> {
        self.db.fetch_beans_for_user(user_id).await
    }

    pub async fn create_bean(&self, user_id: &UserId, bean: NewBean) -> Result<Bean, CatalogError> {
        let bean = normalize_new_bean(bean)?;
        let bean = self.db.insert_bean(user_id, bean).await?;
        info!("🫘️ Bean #{} ({}) listed by {}", bean.id, bean.name, user_id.short());
        Ok(bean)
    }

    pub async fn update_bean(&self, id: i64, user_id: &UserId, update: BeanUpdate) -> Result<Bean, CatalogError> {
        let update = normalize_update(update)?;
        let bean = self.db.update_bean(id, user_id, update).await?;
        debug!("🫘️ Bean #{id} updated by {}", user_id.short());
        Ok(bean)
    }

    pub async fn delete_bean(&self, id: i64, user_id: &UserId) -> Result<(), CatalogError> {
        self.db.delete_bean(id, user_id).await?;
        info!("🫘️ Bean #{id} deleted by {}", user_id.short());
        Ok(())
    }
}

fn required(field: &str, value: String) -> Result<String, CatalogError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        Err(CatalogError::InvalidBean(format!("{field} is required")))
    } else {
        Ok(value)
    }
}

fn normalize_new_bean(bean: NewBean) -> Result<NewBean, CatalogError> {
    if bean.price.is_negative() {
        return Err(CatalogError::InvalidBean("price cannot be negative".into()));
    }
    Ok(NewBean {
        name: required("name", bean.name)?,
        origin: required("origin", bean.origin)?,
        price: bean.price,
        process: bean.process.trim().to_lowercase(),
        roast_profile: bean.roast_profile.trim().to_lowercase(),
    })
}

fn normalize_update(update: BeanUpdate) -> Result<BeanUpdate, CatalogError> {
    if update.is_empty() {
        return Err(CatalogError::InvalidBean("the update does not change anything".into()));
    }
    if update.price.is_some_and(|p| p.is_negative()) {
        return Err(CatalogError::InvalidBean("price cannot be negative".into()));
    }
    Ok(BeanUpdate {
        name: update.name.map(|n| required("name", n)).transpose()?,
        origin: update.origin.map(|o| required("origin", o)).transpose()?,
        price: update.price,
        process: update.process.map(|p| p.trim().to_lowercase()),
        roast_profile: update.roast_profile.map(|r| r.trim().to_lowercase()),
    })
}
