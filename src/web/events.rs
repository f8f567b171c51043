use crate::domain::models::Event;
use crate::error::AppResult;
use crate::services::events::EventDraft;
use crate::state::SharedState;
use crate::web::extract::{JsonBody, PathParam};
use crate::web::session::{AdminSession, AuthSession};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Serialize)]
pub struct DeletionStatus {
    pub event_id: Option<Uuid>,
    pub state: &'static str,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/:id/delete-request", post(request_delete))
        .route("/delete-confirm", post(confirm_delete))
        .route("/delete-cancel", post(cancel_delete))
        .with_state(state)
}

async fn list_events(
    State(state): State<SharedState>,
    AuthSession(_session): AuthSession,
) -> AppResult<Json<Vec<Event>>> {
    Ok(Json(state.events.list_events().await?))
}

async fn create_event(
    State(state): State<SharedState>,
    AdminSession(_admin): AdminSession,
    JsonBody(draft): JsonBody<EventDraft>,
) -> AppResult<impl IntoResponse> {
    let event = state.events.create_event(draft).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Returns the event so the client can show it in the confirmation prompt.
async fn request_delete(
    State(state): State<SharedState>,
    AdminSession(admin): AdminSession,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<Event>> {
    Ok(Json(state.events.request_delete(admin.session_id, id).await?))
}

async fn confirm_delete(
    State(state): State<SharedState>,
    AdminSession(admin): AdminSession,
) -> AppResult<Json<DeletionStatus>> {
    let event_id = state.events.confirm_delete(admin.session_id).await?;
    Ok(Json(DeletionStatus {
        event_id: Some(event_id),
        state: "deleted",
    }))
}

async fn cancel_delete(
    State(state): State<SharedState>,
    AdminSession(admin): AdminSession,
) -> Json<DeletionStatus> {
    let event_id = state.events.cancel_delete(admin.session_id).await;
    Json(DeletionStatus {
        event_id,
        state: "cancelled",
    })
}
