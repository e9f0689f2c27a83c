//! Photo entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use proofroom_core::types::{DbId, Timestamp};

/// A row from the `photos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Photo {
    pub id: DbId,
    pub event_id: DbId,
    /// Durable CDN reference URL.
    pub url: String,
    /// Asset-store key (`events/{event_id}/{photo_id}` scheme) used for
    /// signed deletes.
    pub asset_key: String,
    pub file_name: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    /// Client emails that have tentatively picked this photo. Collapses into
    /// the event's `selected_photos` at submission.
    pub selected_by: Vec<String>,
    pub created_at: Timestamp,
}

/// DTO for inserting a photo after its asset upload succeeded.
#[derive(Debug, Deserialize)]
pub struct CreatePhoto {
    pub event_id: DbId,
    pub url: String,
    pub asset_key: String,
    pub file_name: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

/// Photo representation for the client gallery: the raw `selected_by` list
/// is other clients' business, so it is reduced to a flag for the caller.
#[derive(Debug, Clone, Serialize)]
pub struct GalleryPhoto {
    pub id: DbId,
    pub url: String,
    pub file_name: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    /// Whether the requesting client has tentatively picked this photo (or,
    /// once submitted, whether it is part of the final selection).
    pub selected: bool,
}
