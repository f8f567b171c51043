use crate::domain::events::{dedupe_ids, resolve_participants, DeletionGate};
use crate::domain::models::{EmployeeProfile, Event, NewEvent};
use crate::error::{AppError, AppResult};
use crate::store::{DirectoryStore, EventStore};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct EventDraft {
    pub date: DateTime<Utc>,
    pub event_name: String,
    #[serde(default)]
    pub participant_ids: Vec<Uuid>,
}

#[derive(Clone)]
pub struct EventService {
    events: Arc<dyn EventStore>,
    directory: Arc<dyn DirectoryStore>,
    deletions: DeletionGate,
}

impl EventService {
    pub fn new(events: Arc<dyn EventStore>, directory: Arc<dyn DirectoryStore>) -> Self {
        Self {
            events,
            directory,
            deletions: DeletionGate::new(),
        }
    }

    pub fn deletions(&self) -> &DeletionGate {
        &self.deletions
    }

    /// Participant names are copied from the directory now and never
    /// refreshed afterwards.
    pub async fn create_event(&self, draft: EventDraft) -> AppResult<Event> {
        let event_name = draft.event_name.trim().to_string();
        if event_name.is_empty() {
            return Err(AppError::validation("event name is required"));
        }

        let mut profiles: HashMap<Uuid, EmployeeProfile> = HashMap::new();
        for id in dedupe_ids(&draft.participant_ids) {
            if let Some(profile) = self.directory.find_profile_by_id(id).await? {
                profiles.insert(id, profile);
            }
        }
        let participants = resolve_participants(&draft.participant_ids, &profiles)
            .map_err(|id| AppError::not_found(format!("participant {id}")))?;

        let event = self
            .events
            .insert_event(NewEvent {
                date: draft.date,
                event_name,
                participants,
            })
            .await?;
        tracing::info!(
            "Event {} '{}' scheduled for {} with {} participants",
            event.id,
            event.event_name,
            event.date,
            event.participants.len()
        );
        Ok(event)
    }

    pub async fn list_events(&self) -> AppResult<Vec<Event>> {
        let mut events = self.events.list_events().await?;
        events.sort_by_key(|e| (e.date, e.created_at));
        Ok(events)
    }

    pub async fn delete_event(&self, id: Uuid) -> AppResult<()> {
        if !self.events.delete_event(id).await? {
            return Err(AppError::not_found("event"));
        }
        tracing::info!("Event {} deleted", id);
        Ok(())
    }

    /// First phase of a delete: remember which event this session wants gone.
    pub async fn request_delete(&self, session_id: Uuid, event_id: Uuid) -> AppResult<Event> {
        let event = self
            .events
            .find_event(event_id)
            .await?
            .ok_or_else(|| AppError::not_found("event"))?;
        if let Some(previous) = self.deletions.pending(session_id).await {
            tracing::debug!("Session {} replaces pending delete of {}", session_id, previous);
        }
        self.deletions.request(session_id, event_id).await;
        Ok(event)
    }

    /// Second phase: delete whatever this session asked for.
    pub async fn confirm_delete(&self, session_id: Uuid) -> AppResult<Uuid> {
        let event_id = self
            .deletions
            .take(session_id)
            .await
            .ok_or_else(|| AppError::validation("no delete pending confirmation"))?;
        self.delete_event(event_id).await?;
        Ok(event_id)
    }

    pub async fn cancel_delete(&self, session_id: Uuid) -> Option<Uuid> {
        self.deletions.take(session_id).await
    }
}
