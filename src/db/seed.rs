use crate::config::AdminSeed;
use crate::domain::models::{EmployeeProfile, UserRole};
use crate::identity::hash_password;
use crate::store::{normalize_email, Stores};
use anyhow::Result;
use uuid::Uuid;

/// Creates the bootstrap admin account and its directory profile when they
/// do not exist yet. Existing rows are left alone.
pub async fn seed_all(stores: &Stores, admin: Option<&AdminSeed>) -> Result<()> {
    let Some(admin) = admin else {
        tracing::debug!("No ADMIN_EMAIL/ADMIN_PASSWORD set, skipping admin seed");
        return Ok(());
    };
    seed_admin(stores, admin).await
}

async fn seed_admin(stores: &Stores, admin: &AdminSeed) -> Result<()> {
    let email = normalize_email(&admin.email);

    if stores.accounts.find_account_by_email(&email).await?.is_none() {
        let hash = hash_password(&admin.password)?;
        let account = stores
            .accounts
            .insert_account(&email, &hash, UserRole::Admin)
            .await?;
        tracing::info!("Seeded admin account {} ({})", account.id, email);
    }

    if stores.directory.find_profile_by_email(&email).await?.is_none() {
        let next_id = stores
            .directory
            .list_profiles()
            .await?
            .iter()
            .map(|p| p.employee_id)
            .max()
            .unwrap_or(0)
            + 1;
        stores
            .directory
            .upsert_profile(&EmployeeProfile {
                id: Uuid::new_v4(),
                employee_email: email.clone(),
                employee_id: next_id,
                name: admin.name.clone(),
                designation: "Administrator".to_string(),
            })
            .await?;
        tracing::info!("Seeded directory profile for {}", email);
    }

    Ok(())
}
