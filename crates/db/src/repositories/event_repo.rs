//! Repository for the `events` table.
//!
//! Every lifecycle transition here is a conditional UPDATE whose WHERE
//! clause restates the precondition. The database's per-row atomicity is the
//! only concurrency primitive relied upon: when two submits race, exactly
//! one UPDATE matches and the loser gets `None` back.

use sqlx::PgPool;

use proofroom_core::types::{DbId, Timestamp};

use crate::models::event::{CreateEvent, Event};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, photographer_id, client_email, name, event_date, delivery_date, \
                        max_selections, selected_photos, selections_submitted, submitted_at, \
                        final_photos, final_photos_ready, delivered_at, archived, \
                        photos_deleted_at, created_at, updated_at";

/// Provides CRUD and lifecycle operations for events.
pub struct EventRepo;

impl EventRepo {
    /// Insert a new event in the `open` stage, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateEvent) -> Result<Event, sqlx::Error> {
        let query = format!(
            "INSERT INTO events
                (photographer_id, client_email, name, event_date, delivery_date, max_selections)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(input.photographer_id)
            .bind(&input.client_email)
            .bind(&input.name)
            .bind(input.event_date)
            .bind(input.delivery_date)
            .bind(input.max_selections)
            .fetch_one(pool)
            .await
    }

    /// Find an event by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE id = $1");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a photographer's events, newest first.
    pub async fn list_for_photographer(
        pool: &PgPool,
        photographer_id: DbId,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events WHERE photographer_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(photographer_id)
            .fetch_all(pool)
            .await
    }

    /// List the events addressed to a client email, newest first.
    pub async fn list_for_client(pool: &PgPool, email: &str) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events
             WHERE LOWER(client_email) = LOWER($1)
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(email)
            .fetch_all(pool)
            .await
    }

    /// Open -> Selected: persist the selection snapshot exactly once.
    ///
    /// The `selections_submitted = FALSE` guard makes this at-most-once
    /// under duplicate submits (double click, network retry, second tab):
    /// the first writer wins and every later call returns `None` without
    /// touching the stored snapshot or `submitted_at`.
    pub async fn submit_selections(
        pool: &PgPool,
        id: DbId,
        selected_photos: &[DbId],
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!(
            "UPDATE events
             SET selected_photos = $2,
                 selections_submitted = TRUE,
                 submitted_at = NOW(),
                 updated_at = NOW()
             WHERE id = $1 AND selections_submitted = FALSE
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(selected_photos)
            .fetch_optional(pool)
            .await
    }

    /// Selected -> Delivered: record the final asset URLs exactly once.
    ///
    /// Guarded on both flanks: a delivery cannot precede the submit and
    /// cannot happen twice. Returns `None` when the guard does not match.
    pub async fn deliver_finals(
        pool: &PgPool,
        id: DbId,
        final_photos: &[String],
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!(
            "UPDATE events
             SET final_photos = $2,
                 final_photos_ready = TRUE,
                 delivered_at = NOW(),
                 updated_at = NOW()
             WHERE id = $1 AND selections_submitted = TRUE AND final_photos_ready = FALSE
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(final_photos)
            .fetch_optional(pool)
            .await
    }

    /// Delivered -> Archived: sweeper-only terminal transition.
    ///
    /// Monotonic: re-archiving matches zero rows, which is what makes a
    /// rerun of the sweeper converge instead of erroring.
    pub async fn mark_archived(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE events
             SET archived = TRUE, photos_deleted_at = NOW(), updated_at = NOW()
             WHERE id = $1 AND final_photos_ready = TRUE AND archived = FALSE",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The sweep query: delivered, not archived, and the client finished
    /// selecting at or before the cutoff. Oldest first so reruns after an
    /// interrupt make progress on the same events.
    pub async fn list_expired(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events
             WHERE final_photos_ready = TRUE
               AND archived = FALSE
               AND submitted_at <= $1
             ORDER BY submitted_at ASC"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }
}
