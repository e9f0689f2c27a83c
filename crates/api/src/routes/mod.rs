//! Route definitions, one module per resource.

use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod downloads;
pub mod events;
pub mod health;
pub mod profile;

/// All routes mounted under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/events", events::router())
        .nest("/downloads", downloads::router())
        .nest("/profile", profile::router())
}
