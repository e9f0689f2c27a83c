//! Handlers for the `/events` resource: creation, listing, proof uploads,
//! and finals delivery.

use std::io::Cursor;
use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use proofroom_core::error::CoreError;
use proofroom_core::lifecycle::Stage;
use proofroom_core::types::DbId;
use proofroom_core::validation::NewEvent;
use proofroom_db::models::event::{CreateEvent, EventResponse};
use proofroom_db::models::photo::{CreatePhoto, Photo};
use proofroom_db::repositories::{EventRepo, PhotoRepo};
use proofroom_storage::{final_key, proof_key, AssetStore};

use crate::error::{AppError, AppResult};
use crate::handlers::{ensure_event_access, ensure_event_owner};
use crate::middleware::{RequireAuth, RequirePhotographer};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub client_email: String,
    pub event_date: chrono::NaiveDate,
    pub delivery_date: chrono::NaiveDate,
    pub max_selections: i32,
}

/// Outcome of a proof upload batch. Items that failed (CDN or row insert)
/// are counted, not fatal; the caller re-sends just the missing files.
#[derive(Debug, Serialize)]
pub struct ProofUploadResponse {
    pub uploaded: u32,
    pub failed: u32,
    pub photos: Vec<Photo>,
}

/// Outcome of a finals upload batch. `delivered` only flips when every
/// file landed, since the Selected -> Delivered transition requires the
/// complete set.
#[derive(Debug, Serialize)]
pub struct FinalsUploadResponse {
    pub uploaded: u32,
    pub failed: u32,
    pub delivered: bool,
    pub event: Option<EventResponse>,
}

/// POST /api/v1/events
///
/// Create an event in the `open` stage. All validation happens before the
/// insert; a rejected payload changes nothing.
pub async fn create_event(
    State(state): State<AppState>,
    RequirePhotographer(user): RequirePhotographer,
    Json(payload): Json<CreateEventRequest>,
) -> AppResult<(StatusCode, Json<EventResponse>)> {
    let new_event = NewEvent {
        name: payload.name.trim().to_string(),
        client_email: payload.client_email.trim().to_lowercase(),
        event_date: payload.event_date,
        delivery_date: payload.delivery_date,
        max_selections: payload.max_selections,
    };
    new_event.check()?;

    let event = EventRepo::create(
        &state.pool,
        &CreateEvent {
            photographer_id: user.user_id,
            client_email: new_event.client_email,
            name: new_event.name,
            event_date: new_event.event_date,
            delivery_date: new_event.delivery_date,
            max_selections: new_event.max_selections,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(event.into())))
}

/// GET /api/v1/events
///
/// List the calling photographer's events, newest first.
pub async fn list_my_events(
    State(state): State<AppState>,
    RequirePhotographer(user): RequirePhotographer,
) -> AppResult<Json<DataResponse<Vec<EventResponse>>>> {
    let events = EventRepo::list_for_photographer(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse {
        data: events.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/v1/events/{id}
///
/// Fetch one event. Visible to its photographer and its client only.
pub async fn get_event(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(event_id): Path<DbId>,
) -> AppResult<Json<EventResponse>> {
    let event = find_event(&state, event_id).await?;
    ensure_event_access(&event, &user)?;
    Ok(Json(event.into()))
}

/// POST /api/v1/events/{id}/photos
///
/// Upload proof photos (multipart, one part per file). Files are processed
/// strictly in order; a failed file is counted and skipped, never fatal.
pub async fn upload_photos(
    State(state): State<AppState>,
    RequirePhotographer(user): RequirePhotographer,
    Path(event_id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<Json<ProofUploadResponse>> {
    let event = find_event(&state, event_id).await?;
    ensure_event_owner(&event, &user)?;
    if event.stage() != Stage::Open {
        return Err(AppError::Core(CoreError::Conflict(
            "Proof uploads are closed once selections are submitted".into(),
        )));
    }

    let mut uploaded = 0u32;
    let mut failed = 0u32;
    let mut photos = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let file_name = field
            .file_name()
            .unwrap_or("photo.jpg")
            .to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                tracing::warn!(file = %file_name, error = %e, "Failed to read upload part");
                failed += 1;
                continue;
            }
        };

        let key = proof_key(event_id, &Uuid::new_v4().to_string());
        match store_proof(
            state.pool.clone(),
            Arc::clone(&state.assets),
            event_id,
            key,
            file_name.clone(),
            bytes,
        )
        .await
        {
            Ok(photo) => {
                uploaded += 1;
                photos.push(photo);
            }
            Err(e) => {
                tracing::warn!(file = %file_name, error = %e, "Proof upload failed");
                failed += 1;
            }
        }
    }

    tracing::info!(event_id, uploaded, failed, "Proof upload batch finished");
    Ok(Json(ProofUploadResponse {
        uploaded,
        failed,
        photos,
    }))
}

/// POST /api/v1/events/{id}/finals
///
/// Upload the edited finals (multipart). When, and only when, every file
/// lands, the event transitions Selected -> Delivered with the complete
/// ordered URL list. Any failure leaves the event in `selected` so the
/// photographer can retry the whole batch.
pub async fn upload_finals(
    State(state): State<AppState>,
    RequirePhotographer(user): RequirePhotographer,
    Path(event_id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<Json<FinalsUploadResponse>> {
    let event = find_event(&state, event_id).await?;
    ensure_event_owner(&event, &user)?;
    // Surface the precise reason (not selected yet / already delivered)
    // before any upload work happens.
    event.stage().check_transition(Stage::Delivered)?;

    let mut uploaded = 0u32;
    let mut failed = 0u32;
    let mut urls = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let file_name = field.file_name().unwrap_or("final.jpg").to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                tracing::warn!(file = %file_name, error = %e, "Failed to read upload part");
                failed += 1;
                continue;
            }
        };

        let key = final_key(event_id, &Uuid::new_v4().to_string());
        match state.assets.upload(&key, &file_name, bytes).await {
            Ok(asset) => {
                uploaded += 1;
                urls.push(asset.url);
            }
            Err(e) => {
                tracing::warn!(file = %file_name, error = %e, "Final upload failed");
                failed += 1;
            }
        }
    }

    if failed > 0 || urls.is_empty() {
        tracing::warn!(event_id, uploaded, failed, "Finals batch incomplete; not delivering");
        return Ok(Json(FinalsUploadResponse {
            uploaded,
            failed,
            delivered: false,
            event: None,
        }));
    }

    let delivered = EventRepo::deliver_finals(&state.pool, event_id, &urls)
        .await?
        .ok_or(proofroom_core::lifecycle::LifecycleError::AlreadyDelivered)?;

    tracing::info!(event_id, finals = urls.len(), "Event delivered");
    Ok(Json(FinalsUploadResponse {
        uploaded,
        failed: 0,
        delivered: true,
        event: Some(delivered.into()),
    }))
}

// ── Private helpers ──────────────────────────────────────────────────────

pub(crate) async fn find_event(
    state: &AppState,
    event_id: DbId,
) -> Result<proofroom_db::models::event::Event, AppError> {
    EventRepo::find_by_id(&state.pool, event_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Event",
            id: event_id,
        }))
}

/// Upload one proof asset and insert its row.
///
/// Runs on a detached task: if the photographer disconnects mid-request,
/// the pair still completes, so an uploaded asset is never left without the
/// row that makes it findable.
async fn store_proof(
    pool: proofroom_db::DbPool,
    assets: Arc<dyn AssetStore>,
    event_id: DbId,
    key: String,
    file_name: String,
    bytes: Vec<u8>,
) -> Result<Photo, AppError> {
    let (width, height) = read_dimensions(&bytes);
    let handle = tokio::spawn(async move {
        let asset = assets.upload(&key, &file_name, bytes).await?;
        let photo = PhotoRepo::create(
            &pool,
            &CreatePhoto {
                event_id,
                url: asset.url,
                asset_key: asset.key,
                file_name,
                width,
                height,
            },
        )
        .await?;
        Ok::<_, AppError>(photo)
    });
    handle
        .await
        .map_err(|e| AppError::InternalError(format!("Upload task failed: {e}")))?
}

/// Best-effort image dimensions from the file header. Unreadable or exotic
/// formats simply store no dimensions.
fn read_dimensions(bytes: &[u8]) -> (Option<i32>, Option<i32>) {
    let reader = match image::ImageReader::new(Cursor::new(bytes)).with_guessed_format() {
        Ok(reader) => reader,
        Err(_) => return (None, None),
    };
    match reader.into_dimensions() {
        Ok((width, height)) => (Some(width as i32), Some(height as i32)),
        Err(_) => (None, None),
    }
}
