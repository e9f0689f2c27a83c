//! Handlers for final-photo downloads.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use proofroom_core::error::CoreError;
use proofroom_core::types::{DbId, Timestamp};
use proofroom_db::repositories::EventRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::{ensure_event_access, events::find_event};
use crate::middleware::{RequireAuth, RequireClient};
use crate::response::DataResponse;
use crate::state::AppState;

/// One downloadable delivery in the client's list.
#[derive(Debug, Serialize)]
pub struct DeliveryItem {
    pub event_id: DbId,
    pub name: String,
    pub delivered_at: Option<Timestamp>,
    pub final_count: usize,
}

/// The ordered final URLs for one event. The caller fetches each URL
/// itself, one at a time, with whatever pacing its user agent needs.
#[derive(Debug, Serialize)]
pub struct FinalsResponse {
    pub event_id: DbId,
    pub name: String,
    pub final_photos: Vec<String>,
}

/// GET /api/v1/downloads
///
/// List the calling client's delivered events.
pub async fn list_deliveries(
    State(state): State<AppState>,
    RequireClient(user): RequireClient,
) -> AppResult<Json<DataResponse<Vec<DeliveryItem>>>> {
    let events = EventRepo::list_for_client(&state.pool, &user.email).await?;
    let deliveries = events
        .into_iter()
        .filter(|event| event.final_photos_ready)
        .map(|event| DeliveryItem {
            event_id: event.id,
            name: event.name,
            delivered_at: event.delivered_at,
            final_count: event.final_photos.len(),
        })
        .collect();
    Ok(Json(DataResponse { data: deliveries }))
}

/// GET /api/v1/events/{id}/finals
///
/// The ordered final asset URLs for a delivered event.
pub async fn get_finals(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(event_id): Path<DbId>,
) -> AppResult<Json<FinalsResponse>> {
    let event = find_event(&state, event_id).await?;
    ensure_event_access(&event, &user)?;

    if !event.final_photos_ready {
        return Err(AppError::Core(CoreError::Conflict(
            "Final photos are not ready yet".into(),
        )));
    }

    Ok(Json(FinalsResponse {
        event_id: event.id,
        name: event.name,
        final_photos: event.final_photos,
    }))
}
