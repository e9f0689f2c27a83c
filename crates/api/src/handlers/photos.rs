//! Handlers for the event gallery.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use proofroom_core::types::DbId;
use proofroom_db::models::event::EventResponse;
use proofroom_db::models::photo::GalleryPhoto;
use proofroom_db::repositories::PhotoRepo;

use crate::error::AppResult;
use crate::handlers::{ensure_event_access, events::find_event};
use crate::middleware::{AuthUser, RequireAuth};
use crate::state::AppState;

/// The gallery as seen by one caller: photos plus that caller's selection
/// marks and the running count against the budget.
#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    pub event: EventResponse,
    pub photos: Vec<GalleryPhoto>,
    pub selected_count: u32,
    pub max_selections: i32,
}

/// GET /api/v1/events/{id}/gallery
///
/// List an event's proofs with per-caller selection marks. Before
/// submission a client sees their own tentative picks; after submission
/// everyone sees the frozen selection.
pub async fn get_gallery(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(event_id): Path<DbId>,
) -> AppResult<Json<GalleryResponse>> {
    let event = find_event(&state, event_id).await?;
    ensure_event_access(&event, &user)?;

    let photos = PhotoRepo::list_for_event(&state.pool, event_id).await?;
    let gallery: Vec<GalleryPhoto> = photos
        .into_iter()
        .map(|photo| {
            let selected = if event.selections_submitted {
                event.selected_photos.contains(&photo.id)
            } else {
                is_tentatively_picked(&photo.selected_by, &user)
            };
            GalleryPhoto {
                id: photo.id,
                url: photo.url,
                file_name: photo.file_name,
                width: photo.width,
                height: photo.height,
                selected,
            }
        })
        .collect();

    let selected_count = gallery.iter().filter(|p| p.selected).count() as u32;
    let max_selections = event.max_selections;

    Ok(Json(GalleryResponse {
        event: event.into(),
        photos: gallery,
        selected_count,
        max_selections,
    }))
}

/// Pre-submission marks are personal: a client sees their own, the
/// photographer sees none (picks are not final until submitted).
fn is_tentatively_picked(selected_by: &[String], user: &AuthUser) -> bool {
    user.role == proofroom_core::roles::ROLE_CLIENT
        && selected_by
            .iter()
            .any(|email| email.eq_ignore_ascii_case(&user.email))
}
