//! Handlers for the selection workflow: toggling tentative picks and the
//! single atomic submit.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use proofroom_core::error::CoreError;
use proofroom_core::lifecycle::LifecycleError;
use proofroom_core::selection::{SelectionSession, Toggle};
use proofroom_core::types::DbId;
use proofroom_db::models::event::{Event, EventResponse};
use proofroom_db::repositories::{EventRepo, PhotoRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::events::find_event;
use crate::middleware::{AuthUser, RequireClient};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    /// Whether the photo is picked after this toggle.
    pub selected: bool,
    /// The client's tentative count after this toggle.
    pub selected_count: u32,
}

/// POST /api/v1/events/{id}/photos/{photo_id}/toggle
///
/// Flip the calling client's tentative pick on a photo. Rejected with 409
/// once selections are submitted or when the budget is full, never a
/// silent no-op, so the UI can tell the difference.
pub async fn toggle(
    State(state): State<AppState>,
    RequireClient(user): RequireClient,
    Path((event_id, photo_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<ToggleResponse>> {
    let event = find_event(&state, event_id).await?;
    ensure_event_client(&event, &user)?;

    let photo = PhotoRepo::find_by_id(&state.pool, photo_id)
        .await?
        .filter(|photo| photo.event_id == event_id)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Photo",
            id: photo_id,
        }))?;

    let mut session = load_session(&state, &event, &user).await?;
    let outcome = session.toggle(photo.id)?;

    // Mirror the in-memory toggle into the photo row so other tabs of the
    // same client converge on the same tentative set.
    match outcome {
        Toggle::Added => {
            PhotoRepo::add_selected_by(&state.pool, photo.id, &user.email).await?;
        }
        Toggle::Removed => {
            PhotoRepo::remove_selected_by(&state.pool, photo.id, &user.email).await?;
        }
    }

    Ok(Json(ToggleResponse {
        selected: outcome == Toggle::Added,
        selected_count: session.count(),
    }))
}

/// POST /api/v1/events/{id}/selections/submit
///
/// The one and only Open -> Selected transition. The tentative set must
/// match the budget exactly; the guarded UPDATE makes the submit effective
/// at most once even under a duplicate click or network retry, and the
/// photographer is notified by email on success.
pub async fn submit(
    State(state): State<AppState>,
    RequireClient(user): RequireClient,
    Path(event_id): Path<DbId>,
) -> AppResult<Json<EventResponse>> {
    let event = find_event(&state, event_id).await?;
    ensure_event_client(&event, &user)?;

    let session = load_session(&state, &event, &user).await?;
    let snapshot = session.submit()?;

    let updated = EventRepo::submit_selections(&state.pool, event_id, &snapshot)
        .await?
        // The guard lost the race: someone already submitted.
        .ok_or(LifecycleError::AlreadySubmitted)?;

    tracing::info!(
        event_id,
        client = %user.email,
        selected = snapshot.len(),
        "Selections submitted"
    );
    notify_photographer(&state, &updated, &user, snapshot.len()).await;

    Ok(Json(updated.into()))
}

// ── Private helpers ──────────────────────────────────────────────────────

/// Only the client the event is addressed to may select. The photographer
/// does not get to pick on the client's behalf.
fn ensure_event_client(event: &Event, user: &AuthUser) -> Result<(), AppError> {
    if event.client_email.eq_ignore_ascii_case(&user.email) {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "This event is not addressed to you".into(),
        )))
    }
}

/// Rebuild the client's selection session from the persisted tentative
/// marks. The session carries the event's current stage, so a submit that
/// already happened surfaces as `AlreadySubmitted` before any write.
async fn load_session(
    state: &AppState,
    event: &Event,
    user: &AuthUser,
) -> Result<SelectionSession, AppError> {
    let already_picked =
        PhotoRepo::ids_selected_by(&state.pool, event.id, &user.email).await?;
    Ok(SelectionSession::new(
        user.email.clone(),
        event.max_selections.max(0) as u32,
        event.stage(),
        already_picked,
    ))
}

/// Best-effort email to the event's photographer. A mail failure is logged
/// and swallowed; the submit already happened and must not be rolled back
/// or reported as failed because of SMTP.
async fn notify_photographer(state: &AppState, event: &Event, client: &AuthUser, count: usize) {
    let Some(mailer) = &state.mailer else {
        return;
    };
    let photographer = match UserRepo::find_by_id(&state.pool, event.photographer_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(error = %e, "Could not load photographer for notification");
            return;
        }
    };
    if let Err(e) = mailer
        .send_selection_submitted(&photographer.email, &event.name, &client.email, count)
        .await
    {
        tracing::warn!(error = %e, "Selection notification email failed");
    }
}
