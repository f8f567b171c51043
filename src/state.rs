use crate::config::AppConfig;
use crate::identity::LocalIdentity;
use crate::middleware::RateLimiter;
use crate::services::directory::DirectoryService;
use crate::services::events::EventService;
use crate::services::identity::{CodeDelivery, IdentityGate, IdentitySettings};
use crate::services::session_hub::SessionHub;
use crate::services::tasks::TaskService;
use crate::store::Stores;
use std::sync::Arc;

pub struct AppState {
    pub identity: IdentityGate,
    pub directory: DirectoryService,
    pub tasks: TaskService,
    pub events: EventService,
    pub login_limiter: RateLimiter,
    pub secure_cookies: bool,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn build(config: &AppConfig, stores: Stores, delivery: Arc<dyn CodeDelivery>) -> SharedState {
        let identity = IdentityGate::new(
            Arc::new(LocalIdentity::new(stores.accounts.clone())),
            delivery,
            SessionHub::default(),
            IdentitySettings {
                role_policy: config.role_policy,
                session_key: config.session_key.clone(),
                session_ttl: config.session_ttl,
                reset_code_ttl: config.reset_code_ttl,
            },
        );
        let directory = DirectoryService::new(stores.directory.clone());
        let tasks = TaskService::new(stores.tasks.clone(), directory.clone());
        let events = EventService::new(stores.events.clone(), stores.directory.clone());

        Arc::new(AppState {
            identity,
            directory,
            tasks,
            events,
            login_limiter: RateLimiter::new(config.login_rate_limit, config.login_rate_window_secs),
            secure_cookies: config.secure_cookies,
        })
    }

    /// Periodic housekeeping: expired sessions, delete requests left behind
    /// by those sessions, stale reset codes and idle rate-limit keys.
    pub async fn sweep(&self) {
        let sessions = self.identity.sessions().purge_expired().await;
        let live = self.identity.sessions().live_ids().await;
        let deletions = self.events.deletions().retain_sessions(&live).await;
        let resets = self.identity.purge_expired_resets().await;
        self.login_limiter.cleanup().await;

        if sessions + deletions + resets > 0 {
            tracing::info!(
                "Sweep removed {} sessions, {} pending deletes, {} reset codes",
                sessions,
                deletions,
                resets
            );
        }
    }
}
