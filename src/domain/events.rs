use crate::domain::models::EmployeeProfile;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Drops repeated ids, keeping first occurrences in order.
pub fn dedupe_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Maps participant ids to the profile names current at write time.
/// Returns the first id with no profile as the error.
pub fn resolve_participants(
    ids: &[Uuid],
    profiles: &HashMap<Uuid, EmployeeProfile>,
) -> Result<Vec<String>, Uuid> {
    dedupe_ids(ids)
        .into_iter()
        .map(|id| profiles.get(&id).map(|p| p.name.clone()).ok_or(id))
        .collect()
}

/// Pending delete requests, one per session.
#[derive(Clone, Default)]
pub struct DeletionGate {
    pending: Arc<RwLock<HashMap<Uuid, Uuid>>>, // session_id -> event_id
}

impl DeletionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any earlier pending request of the same session.
    pub async fn request(&self, session_id: Uuid, event_id: Uuid) {
        self.pending.write().await.insert(session_id, event_id);
    }

    pub async fn pending(&self, session_id: Uuid) -> Option<Uuid> {
        self.pending.read().await.get(&session_id).copied()
    }

    pub async fn take(&self, session_id: Uuid) -> Option<Uuid> {
        self.pending.write().await.remove(&session_id)
    }

    /// Drops requests belonging to sessions that no longer exist.
    pub async fn retain_sessions(&self, live: &HashSet<Uuid>) -> usize {
        let mut pending = self.pending.write().await;
        let before = pending.len();
        pending.retain(|session_id, _| live.contains(session_id));
        before - pending.len()
    }
}
