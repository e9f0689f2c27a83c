//! Retention policy for the cleanup sweeper.
//!
//! Delivered events are kept for a retention window (default 90 days) and
//! then swept: photo assets deleted remotely, photo rows removed, the event
//! archived. The window is anchored on `submitted_at`, the moment the
//! client finished selecting, not on the delivery timestamp, so the clock
//! starts when the photographer owes nothing further from the client's side.

use crate::lifecycle::LifecycleFlags;
use crate::types::Timestamp;

/// Default retention window in days.
pub const DEFAULT_RETENTION_DAYS: i64 = 90;

/// Retention window configuration.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    pub days: i64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl RetentionPolicy {
    /// Build a policy from a day count, falling back to the default for
    /// non-positive values.
    pub fn from_days(days: i64) -> Self {
        if days > 0 {
            Self { days }
        } else {
            Self::default()
        }
    }

    /// The cutoff instant for a sweep starting at `now`: events submitted at
    /// or before this are eligible.
    pub fn cutoff(&self, now: Timestamp) -> Timestamp {
        now - chrono::Duration::days(self.days)
    }
}

/// Whether an event is due for the sweep.
///
/// Exactly the sweep query predicate: finals delivered, not yet archived,
/// and submitted at or before the cutoff. Events that never recorded a
/// submit timestamp are never swept regardless of their flags.
pub fn is_sweep_candidate(
    flags: LifecycleFlags,
    submitted_at: Option<Timestamp>,
    cutoff: Timestamp,
) -> bool {
    flags.final_photos_ready
        && !flags.archived
        && submitted_at.is_some_and(|at| at <= cutoff)
}
