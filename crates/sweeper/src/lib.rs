//! Cleanup sweep for expired delivered events.
//!
//! The sweeper reclaims CDN storage once a delivered event ages past the
//! retention window: for every matching event it deletes each photo's remote
//! asset, then the photo row, then archives the event. The asset goes first
//! on purpose: a crash mid-photo leaves an orphaned row that the next run
//! retries, never an unreferenced asset with no row to find it by.
//!
//! Per-item failures are logged and counted, and the sweep moves on; only a
//! failure of the initial expired-events query is fatal. Reruns converge:
//! deletes tolerate "already gone", archiving is a guarded monotonic flag.

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use proofroom_core::retention::RetentionPolicy;
use proofroom_db::models::event::Event;
use proofroom_db::repositories::{EventRepo, PhotoRepo};
use proofroom_storage::{AssetStore, DeleteOutcome};

/// Aggregate result of one sweep run.
#[derive(Debug, Default, Serialize)]
pub struct SweepReport {
    /// Expired events the query returned.
    pub events_scanned: u32,
    /// Events fully torn down and archived this run.
    pub events_archived: u32,
    /// Photo rows deleted.
    pub photos_deleted: u32,
    /// Assets the CDN confirmed deleting.
    pub assets_deleted: u32,
    /// Assets that were already gone (prior partial run); counted as
    /// success.
    pub assets_missing: u32,
    /// Per-item failures. Non-empty does not fail the run.
    pub errors: Vec<String>,
}

impl SweepReport {
    /// Whether every item processed cleanly.
    pub fn fully_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run one sweep over all expired delivered events.
///
/// Returns `Err` only when the expired-events query itself fails; the
/// caller should treat that as fatal and exit non-zero so the scheduler's
/// alerting notices. Everything after the query is per-item accounted in
/// the returned [`SweepReport`].
pub async fn run_sweep(
    pool: &PgPool,
    store: &dyn AssetStore,
    policy: RetentionPolicy,
    cancel: &CancellationToken,
) -> Result<SweepReport, sqlx::Error> {
    let cutoff = policy.cutoff(Utc::now());
    tracing::info!(retention_days = policy.days, %cutoff, "Sweep starting");

    let expired = EventRepo::list_expired(pool, cutoff).await?;
    if expired.is_empty() {
        tracing::info!("No expired events found");
        return Ok(SweepReport::default());
    }

    let mut report = SweepReport::default();
    for event in expired {
        if cancel.is_cancelled() {
            tracing::warn!(event_id = event.id, "Sweep cancelled, stopping before next event");
            break;
        }
        report.events_scanned += 1;
        sweep_event(pool, store, &event, cancel, &mut report).await;
    }

    tracing::info!(
        events_scanned = report.events_scanned,
        events_archived = report.events_archived,
        photos_deleted = report.photos_deleted,
        assets_deleted = report.assets_deleted,
        assets_missing = report.assets_missing,
        failures = report.errors.len(),
        "Sweep finished"
    );
    Ok(report)
}

/// Tear down a single expired event: assets, then rows, then the archive
/// flag. The event is archived only when every photo came down cleanly this
/// run; otherwise it stays eligible and the next run retries the leftovers.
async fn sweep_event(
    pool: &PgPool,
    store: &dyn AssetStore,
    event: &Event,
    cancel: &CancellationToken,
    report: &mut SweepReport,
) {
    let photos = match PhotoRepo::list_for_event(pool, event.id).await {
        Ok(photos) => photos,
        Err(e) => {
            tracing::error!(event_id = event.id, error = %e, "Failed to list photos");
            report.errors.push(format!("event {}: list photos: {e}", event.id));
            return;
        }
    };

    tracing::info!(event_id = event.id, photos = photos.len(), "Sweeping expired event");

    let mut event_clean = true;
    for photo in photos {
        // Cancellation is only honored between photos, never between the
        // asset delete and the row delete.
        if cancel.is_cancelled() {
            event_clean = false;
            break;
        }

        match store.delete(&photo.asset_key).await {
            Ok(DeleteOutcome::Deleted) => {
                report.assets_deleted += 1;
            }
            Ok(DeleteOutcome::NotFound) => {
                tracing::warn!(key = %photo.asset_key, "Asset already gone, continuing");
                report.assets_missing += 1;
            }
            Err(e) => {
                tracing::error!(key = %photo.asset_key, error = %e, "Asset delete failed");
                report
                    .errors
                    .push(format!("photo {}: asset delete: {e}", photo.id));
                // Keep the row so the next run finds and retries this asset.
                event_clean = false;
                continue;
            }
        }

        match PhotoRepo::delete(pool, photo.id).await {
            Ok(_) => report.photos_deleted += 1,
            Err(e) => {
                tracing::error!(photo_id = photo.id, error = %e, "Photo row delete failed");
                report.errors.push(format!("photo {}: row delete: {e}", photo.id));
                event_clean = false;
            }
        }
    }

    if !event_clean {
        tracing::warn!(event_id = event.id, "Event left unarchived for the next run");
        return;
    }

    match EventRepo::mark_archived(pool, event.id).await {
        Ok(true) => {
            tracing::info!(event_id = event.id, "Event archived");
            report.events_archived += 1;
        }
        // Guard did not match: a concurrent run got there first. Converged.
        Ok(false) => {
            tracing::debug!(event_id = event.id, "Event was already archived");
        }
        Err(e) => {
            tracing::error!(event_id = event.id, error = %e, "Failed to archive event");
            report.errors.push(format!("event {}: archive: {e}", event.id));
        }
    }
}
