//! Event entity model and DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use proofroom_core::lifecycle::{LifecycleFlags, Stage};
use proofroom_core::types::{DbId, Timestamp};

/// A row from the `events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub photographer_id: DbId,
    pub client_email: String,
    pub name: String,
    pub event_date: NaiveDate,
    pub delivery_date: NaiveDate,
    /// Selection budget fixed at creation; `0` means no cap (legacy rows).
    pub max_selections: i32,
    /// Empty until submission; exactly `max_selections` ids afterwards when
    /// a cap is set.
    pub selected_photos: Vec<DbId>,
    pub selections_submitted: bool,
    pub submitted_at: Option<Timestamp>,
    /// Ordered final asset URLs, set exactly once at delivery.
    pub final_photos: Vec<String>,
    pub final_photos_ready: bool,
    pub delivered_at: Option<Timestamp>,
    pub archived: bool,
    pub photos_deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Event {
    /// The persisted lifecycle flags of this row.
    pub fn flags(&self) -> LifecycleFlags {
        LifecycleFlags {
            selections_submitted: self.selections_submitted,
            final_photos_ready: self.final_photos_ready,
            archived: self.archived,
        }
    }

    /// Current lifecycle stage, derived from the flags.
    pub fn stage(&self) -> Stage {
        Stage::from_flags(self.flags())
    }
}

/// DTO for inserting a new event (already validated by
/// `proofroom_core::validation::NewEvent`).
#[derive(Debug, Deserialize)]
pub struct CreateEvent {
    pub photographer_id: DbId,
    pub client_email: String,
    pub name: String,
    pub event_date: NaiveDate,
    pub delivery_date: NaiveDate,
    pub max_selections: i32,
}

/// Event representation for API responses, with the derived stage attached
/// so clients never re-derive it from the raw flags.
#[derive(Debug, Clone, Serialize)]
pub struct EventResponse {
    #[serde(flatten)]
    pub event: Event,
    pub stage: Stage,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        let stage = event.stage();
        Self { event, stage }
    }
}
