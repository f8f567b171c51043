pub mod auth;
pub mod directory;
pub mod events;
pub mod extract;
pub mod session;
pub mod tasks;

use crate::state::SharedState;
use axum::{routing::get, Router};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth::router(state.clone()))
        .nest("/directory", directory::router(state.clone()))
        .nest("/tasks", tasks::router(state.clone()))
        .nest("/events", events::router(state))
}
