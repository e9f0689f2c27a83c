//! Route definitions for the `/events` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{downloads, events, photos, selections};
use crate::state::AppState;

/// Routes mounted at `/events`.
///
/// ```text
/// POST /                                  -> create_event      (photographer)
/// GET  /                                  -> list_my_events    (photographer)
/// GET  /{id}                              -> get_event         (owner or client)
/// POST /{id}/photos                       -> upload_photos     (photographer)
/// GET  /{id}/gallery                      -> get_gallery       (owner or client)
/// POST /{id}/photos/{photo_id}/toggle     -> toggle            (client)
/// POST /{id}/selections/submit            -> submit            (client)
/// POST /{id}/finals                       -> upload_finals     (photographer)
/// GET  /{id}/finals                       -> get_finals        (owner or client)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(events::create_event).get(events::list_my_events))
        .route("/{id}", get(events::get_event))
        .route("/{id}/photos", post(events::upload_photos))
        .route("/{id}/gallery", get(photos::get_gallery))
        .route(
            "/{id}/photos/{photo_id}/toggle",
            post(selections::toggle),
        )
        .route("/{id}/selections/submit", post(selections::submit))
        .route(
            "/{id}/finals",
            post(events::upload_finals).get(downloads::get_finals),
        )
}
