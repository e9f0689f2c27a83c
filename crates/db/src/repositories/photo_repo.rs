//! Repository for the `photos` table.

use sqlx::PgPool;

use proofroom_core::types::DbId;

use crate::models::photo::{CreatePhoto, Photo};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, event_id, url, asset_key, file_name, width, height, selected_by, created_at";

/// Provides CRUD and tentative-selection operations for photos.
pub struct PhotoRepo;

impl PhotoRepo {
    /// Insert a photo row after its asset upload succeeded.
    pub async fn create(pool: &PgPool, input: &CreatePhoto) -> Result<Photo, sqlx::Error> {
        let query = format!(
            "INSERT INTO photos (event_id, url, asset_key, file_name, width, height)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Photo>(&query)
            .bind(input.event_id)
            .bind(&input.url)
            .bind(&input.asset_key)
            .bind(&input.file_name)
            .bind(input.width)
            .bind(input.height)
            .fetch_one(pool)
            .await
    }

    /// Find a photo by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Photo>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM photos WHERE id = $1");
        sqlx::query_as::<_, Photo>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List an event's photos ordered by file name, the order galleries
    /// display them in.
    pub async fn list_for_event(pool: &PgPool, event_id: DbId) -> Result<Vec<Photo>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM photos WHERE event_id = $1 ORDER BY file_name, id");
        sqlx::query_as::<_, Photo>(&query)
            .bind(event_id)
            .fetch_all(pool)
            .await
    }

    /// Number of photos attached to an event.
    pub async fn count_for_event(pool: &PgPool, event_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM photos WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(pool)
            .await
    }

    /// Array-union: add a client to a photo's tentative pickers.
    ///
    /// Returns `false` when the client was already present, so a duplicate
    /// toggle from a second tab converges instead of double-appending.
    pub async fn add_selected_by(
        pool: &PgPool,
        photo_id: DbId,
        client_email: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE photos
             SET selected_by = array_append(selected_by, $2)
             WHERE id = $1 AND NOT ($2 = ANY(selected_by))",
        )
        .bind(photo_id)
        .bind(client_email)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Array-remove: drop a client from a photo's tentative pickers.
    ///
    /// Returns `false` when the client was not present.
    pub async fn remove_selected_by(
        pool: &PgPool,
        photo_id: DbId,
        client_email: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE photos
             SET selected_by = array_remove(selected_by, $2)
             WHERE id = $1 AND $2 = ANY(selected_by)",
        )
        .bind(photo_id)
        .bind(client_email)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The photo ids a client has tentatively picked within an event, in
    /// gallery order. Seeds a resumed selection session.
    pub async fn ids_selected_by(
        pool: &PgPool,
        event_id: DbId,
        client_email: &str,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT id FROM photos
             WHERE event_id = $1 AND $2 = ANY(selected_by)
             ORDER BY file_name, id",
        )
        .bind(event_id)
        .bind(client_email)
        .fetch_all(pool)
        .await
    }

    /// Delete a photo row. The caller is responsible for having already
    /// attempted the remote asset delete; the sweeper relies on this
    /// ordering to stay re-runnable.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM photos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
