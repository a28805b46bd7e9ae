//! Startup seeding: category vocabulary and the optional admin account

use anyhow::{Context, Result};
use knowledgeout_config::BootstrapConfig;
use knowledgeout_core::store::{CategoryStore, MemberStore};
use knowledgeout_core::{NewMember, Role};
use knowledgeout_sqlite::SqliteStores;
use knowledgeout_web::hash_password;
use tracing::{debug, info};

/// Idempotent: categories are created if missing, the admin account only on
/// first start while its email is free.
pub async fn seed(stores: &SqliteStores, config: &BootstrapConfig) -> Result<()> {
    stores
        .categories
        .ensure(&config.categories)
        .await
        .context("seeding categories")?;
    debug!(count = config.categories.len(), "categories ensured");

    if let Some(admin) = &config.admin {
        let existing = stores
            .members
            .find_active_by_email(&admin.email)
            .await
            .context("looking up admin account")?;

        if existing.is_none() {
            let profile = stores
                .members
                .create(NewMember {
                    email: admin.email.clone(),
                    password_hash: hash_password(&admin.password)
                        .map_err(|e| anyhow::anyhow!("hashing admin password: {e}"))?,
                    nickname: admin.nickname.clone(),
                })
                .await
                .context("creating admin account")?;
            stores
                .members
                .set_role(profile.id, Role::Admin)
                .await
                .context("promoting admin account")?;
            info!(email = %admin.email, "admin account created");
        }
    }

    Ok(())
}
