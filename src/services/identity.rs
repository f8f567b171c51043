use crate::config::RolePolicy;
use crate::domain::models::{Account, UserRole};
use crate::error::{AppError, AppResult};
use crate::identity::IdentityProvider;
use crate::services::session_hub::{SessionEvent, SessionHub};
use crate::services::sessions::{SessionRecord, SessionRegistry};
use crate::store::normalize_email;
use crate::web::session;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 6;
/// Wrong guesses a reset code survives before it is discarded.
const MAX_RESET_ATTEMPTS: u32 = 5;

/// Out-of-band transport for password reset codes.
#[async_trait]
pub trait CodeDelivery: Send + Sync {
    async fn deliver(&self, email: &str, code: &str) -> anyhow::Result<()>;
}

/// Writes codes to the log. Development transport only.
pub struct LogDelivery;

#[async_trait]
impl CodeDelivery for LogDelivery {
    async fn deliver(&self, email: &str, code: &str) -> anyhow::Result<()> {
        tracing::info!("Password reset code for {}: {}", email, code);
        Ok(())
    }
}

#[derive(Clone)]
struct PendingReset {
    code: String,
    expires_at: DateTime<Utc>,
    failures: u32,
}

/// Token plus the registry entry it refers to.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub record: SessionRecord,
}

pub struct IdentitySettings {
    pub role_policy: RolePolicy,
    pub session_key: Vec<u8>,
    pub session_ttl: Duration,
    pub reset_code_ttl: Duration,
}

pub struct IdentityGate {
    provider: Arc<dyn IdentityProvider>,
    delivery: Arc<dyn CodeDelivery>,
    sessions: SessionRegistry,
    hub: SessionHub,
    resets: RwLock<HashMap<String, PendingReset>>,
    settings: IdentitySettings,
}

/// Checks a new password pair before anything reaches the provider.
pub fn validate_new_password(new_password: &str, confirm_password: &str) -> AppResult<()> {
    if new_password.is_empty() || confirm_password.is_empty() {
        return Err(AppError::validation("please fill in both password fields"));
    }
    if new_password != confirm_password {
        return Err(AppError::validation("passwords do not match"));
    }
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

impl IdentityGate {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        delivery: Arc<dyn CodeDelivery>,
        hub: SessionHub,
        settings: IdentitySettings,
    ) -> Self {
        if settings.role_policy == RolePolicy::Claimed {
            tracing::warn!(
                "ROLE_POLICY=claimed: admin sessions are granted on the client's word, without checking the account role"
            );
        }
        Self {
            provider,
            delivery,
            sessions: SessionRegistry::new(),
            hub,
            resets: RwLock::new(HashMap::new()),
            settings,
        }
    }

    pub fn hub(&self) -> &SessionHub {
        &self.hub
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        claimed_role: UserRole,
    ) -> AppResult<IssuedSession> {
        let (account, role) = self.check_credentials(email, password, claimed_role).await?;
        self.open_session(&account, role).await
    }

    /// First half of a login: verifies the password and settles the role
    /// without registering anything.
    pub async fn check_credentials(
        &self,
        email: &str,
        password: &str,
        claimed_role: UserRole,
    ) -> AppResult<(Account, UserRole)> {
        let account = self.provider.sign_in(email, password).await.map_err(|e| {
            tracing::warn!("Login failed for {}: {}", normalize_email(email), e);
            AppError::Auth
        })?;
        let role = self.grant_role(&account, claimed_role)?;
        Ok((account, role))
    }

    fn grant_role(&self, account: &Account, claimed_role: UserRole) -> AppResult<UserRole> {
        match (claimed_role, self.settings.role_policy) {
            (UserRole::Employee, _) => Ok(UserRole::Employee),
            (UserRole::Admin, _) if account.role == UserRole::Admin => Ok(UserRole::Admin),
            (UserRole::Admin, RolePolicy::Claimed) => {
                tracing::warn!(
                    "Granting unverified admin session to account {} ({})",
                    account.id,
                    account.email
                );
                Ok(UserRole::Admin)
            }
            (UserRole::Admin, RolePolicy::Verified) => {
                tracing::warn!("Account {} claimed admin without the admin role", account.id);
                Err(AppError::Forbidden)
            }
        }
    }

    /// Registers a session for an already verified account and announces it.
    pub async fn open_session(&self, account: &Account, role: UserRole) -> AppResult<IssuedSession> {
        let record = SessionRecord {
            session_id: Uuid::new_v4(),
            account_id: account.id,
            email: account.email.clone(),
            role,
            expires_at: Utc::now() + self.settings.session_ttl,
        };
        let token = session::sign_session(&record, &self.settings.session_key).map_err(|e| {
            tracing::error!("Failed to sign session: {}", e);
            AppError::Internal
        })?;
        self.sessions.insert(record.clone()).await;
        self.hub.publish(SessionEvent::SignedIn {
            account_id: account.id,
            role,
        });
        tracing::info!("Account {} signed in as {}", account.id, role.as_str());
        Ok(IssuedSession { token, record })
    }

    /// Resolves a bearer token to its live session.
    pub async fn authenticate(&self, token: &str) -> AppResult<SessionRecord> {
        let claims = session::verify_session(token, &self.settings.session_key).map_err(|e| {
            tracing::warn!("Session verification failed: {}", e);
            AppError::Unauthorized
        })?;
        let record = self
            .sessions
            .get(claims.session_id)
            .await
            .ok_or(AppError::Unauthorized)?;
        if record.account_id != claims.account_id || record.role != claims.role {
            return Err(AppError::Unauthorized);
        }
        Ok(record)
    }

    /// The stored account behind a session; a deleted account ends it.
    pub async fn current_account(&self, record: &SessionRecord) -> AppResult<Account> {
        match self.provider.find_account(record.account_id).await? {
            Some(account) => Ok(account),
            None => {
                self.sessions.revoke(record.session_id).await;
                Err(AppError::Unauthorized)
            }
        }
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> AppResult<Account> {
        let email = normalize_email(email);
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::validation("a valid email is required"));
        }
        validate_new_password(password, confirm_password)?;
        let account = self
            .provider
            .create_account(&email, password, UserRole::Employee)
            .await?;
        tracing::info!("Employee account {} created", account.id);
        Ok(account)
    }

    pub async fn logout(&self, record: &SessionRecord) {
        if self.sessions.revoke(record.session_id).await.is_some() {
            self.hub.publish(SessionEvent::SignedOut {
                account_id: record.account_id,
            });
            tracing::info!("Account {} signed out", record.account_id);
        }
    }

    /// Re-authenticates with `current_password` before replacing it. Every
    /// session of the account is revoked afterwards.
    pub async fn change_password(
        &self,
        record: &SessionRecord,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> AppResult<()> {
        if current_password.is_empty() {
            return Err(AppError::validation("please enter your current password"));
        }
        validate_new_password(new_password, confirm_password)?;

        let account = self
            .provider
            .sign_in(&record.email, current_password)
            .await
            .map_err(|_| AppError::Auth)?;
        if account.id != record.account_id {
            return Err(AppError::Auth);
        }

        self.provider.update_password(account.id, new_password).await?;
        self.end_all_sessions(account.id).await;
        tracing::info!("Password changed for account {}", account.id);
        Ok(())
    }

    /// Issues a reset code. Unknown emails are accepted without a trace so
    /// the endpoint does not reveal which accounts exist.
    pub async fn request_reset(&self, email: &str) -> AppResult<()> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AppError::validation("email is required"));
        }
        let Some(account) = self.provider.find_account_by_email(&email).await? else {
            tracing::debug!("Reset requested for unknown email");
            return Ok(());
        };

        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        self.resets.write().await.insert(
            account.email.clone(),
            PendingReset {
                code: code.clone(),
                expires_at: Utc::now() + self.settings.reset_code_ttl,
                failures: 0,
            },
        );
        self.delivery.deliver(&account.email, &code).await.map_err(|e| {
            tracing::error!("Failed to deliver reset code: {}", e);
            AppError::Internal
        })?;
        Ok(())
    }

    pub async fn confirm_reset(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> AppResult<()> {
        validate_new_password(new_password, confirm_password)?;
        let email = normalize_email(email);

        {
            let mut resets = self.resets.write().await;
            let accepted = match resets.get_mut(&email) {
                None => return Err(AppError::Auth),
                Some(pending) if pending.expires_at <= Utc::now() => return Err(AppError::Auth),
                Some(pending) if pending.code == code.trim() => true,
                Some(pending) => {
                    pending.failures += 1;
                    if pending.failures < MAX_RESET_ATTEMPTS {
                        return Err(AppError::Auth);
                    }
                    tracing::warn!("Reset code for {} discarded after {} wrong guesses", email, pending.failures);
                    false
                }
            };
            resets.remove(&email);
            if !accepted {
                return Err(AppError::Auth);
            }
        }

        let account = self
            .provider
            .find_account_by_email(&email)
            .await?
            .ok_or(AppError::Auth)?;
        self.provider.update_password(account.id, new_password).await?;
        self.end_all_sessions(account.id).await;
        tracing::info!("Password reset for account {}", account.id);
        Ok(())
    }

    async fn end_all_sessions(&self, account_id: Uuid) {
        let revoked = self.sessions.revoke_account(account_id).await;
        if revoked > 0 {
            tracing::info!("Revoked {} sessions of account {}", revoked, account_id);
        }
        self.hub.publish(SessionEvent::PasswordChanged { account_id });
    }

    pub async fn purge_expired_resets(&self) -> usize {
        let now = Utc::now();
        let mut resets = self.resets.write().await;
        let before = resets.len();
        resets.retain(|_, r| r.expires_at > now);
        before - resets.len()
    }
}
