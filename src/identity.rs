use crate::domain::models::{Account, UserRole};
use crate::error::IdentityError;
use crate::store::AccountStore;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use rand_core::OsRng;
use std::sync::Arc;
use uuid::Uuid;

/// Email/password identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Account, IdentityError>;
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<Account, IdentityError>;
    async fn update_password(&self, account_id: Uuid, new_password: &str) -> Result<(), IdentityError>;
    async fn find_account(&self, account_id: Uuid) -> Result<Option<Account>, IdentityError>;
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, IdentityError>;
}

pub fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| IdentityError::Hash)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Argon2 accounts kept in one of our own stores.
#[derive(Clone)]
pub struct LocalIdentity {
    accounts: Arc<dyn AccountStore>,
}

impl LocalIdentity {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Account, IdentityError> {
        let account = self
            .accounts
            .find_account_by_email(email)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;
        if !verify_password(password, &account.hash) {
            return Err(IdentityError::InvalidCredentials);
        }
        Ok(account)
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<Account, IdentityError> {
        let hash = hash_password(password)?;
        match self.accounts.insert_account(email, &hash, role).await {
            Ok(account) => Ok(account),
            Err(crate::error::StoreError::Conflict(_)) => Err(IdentityError::AccountExists),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_password(&self, account_id: Uuid, new_password: &str) -> Result<(), IdentityError> {
        let hash = hash_password(new_password)?;
        if !self.accounts.update_password_hash(account_id, &hash).await? {
            return Err(IdentityError::InvalidCredentials);
        }
        Ok(())
    }

    async fn find_account(&self, account_id: Uuid) -> Result<Option<Account>, IdentityError> {
        Ok(self.accounts.find_account_by_id(account_id).await?)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, IdentityError> {
        Ok(self.accounts.find_account_by_email(email).await?)
    }
}
