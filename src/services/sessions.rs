use crate::domain::models::UserRole;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionRecord {
    pub session_id: Uuid,
    pub account_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub expires_at: DateTime<Utc>,
}

/// Live sessions. A signed token is only honoured while its record is here.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SessionRecord>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: SessionRecord) {
        self.sessions.write().await.insert(record.session_id, record);
    }

    /// Unexpired record for `session_id`.
    pub async fn get(&self, session_id: Uuid) -> Option<SessionRecord> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&session_id)
            .filter(|r| r.expires_at > Utc::now())
            .cloned()
    }

    pub async fn revoke(&self, session_id: Uuid) -> Option<SessionRecord> {
        self.sessions.write().await.remove(&session_id)
    }

    /// Revokes every session of an account, returning how many were dropped.
    pub async fn revoke_account(&self, account_id: Uuid) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, r| r.account_id != account_id);
        before - sessions.len()
    }

    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, r| r.expires_at > now);
        before - sessions.len()
    }

    pub async fn live_ids(&self) -> HashSet<Uuid> {
        self.sessions.read().await.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(account_id: Uuid, ttl: Duration) -> SessionRecord {
        SessionRecord {
            session_id: Uuid::new_v4(),
            account_id,
            email: "ali@berc.org".into(),
            role: UserRole::Employee,
            expires_at: Utc::now() + ttl,
        }
    }

    #[tokio::test]
    async fn test_revoke_account_drops_all_sessions() {
        let registry = SessionRegistry::new();
        let account = Uuid::new_v4();
        let other = record(Uuid::new_v4(), Duration::hours(1));
        registry.insert(record(account, Duration::hours(1))).await;
        registry.insert(record(account, Duration::hours(1))).await;
        registry.insert(other.clone()).await;

        assert_eq!(registry.revoke_account(account).await, 2);
        assert_eq!(registry.get(other.session_id).await, Some(other));
    }

    #[tokio::test]
    async fn test_expired_sessions_are_invisible_and_purged() {
        let registry = SessionRegistry::new();
        let stale = record(Uuid::new_v4(), Duration::seconds(-5));
        registry.insert(stale.clone()).await;

        assert!(registry.get(stale.session_id).await.is_none());
        assert_eq!(registry.purge_expired().await, 1);
        assert!(registry.live_ids().await.is_empty());
    }
}
