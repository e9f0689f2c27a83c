//! Per-client selection session.
//!
//! A [`SelectionSession`] accumulates one client's tentative photo picks for
//! a single event against a fixed budget, then produces the snapshot that is
//! submitted exactly once. The session itself is plain in-memory state; the
//! caller mirrors each toggle into the photo rows (`selected_by` array
//! union/remove) so independent sessions for the same client converge, and
//! persists the submit through a guarded UPDATE so only one snapshot ever
//! lands (see `EventRepo::submit_selections`).
//!
//! The limit policy is strict equality: with a positive cap the client must
//! submit exactly `max_selections` photos, not fewer. A cap of `0` means no
//! cap, and any count submits.

use crate::lifecycle::Stage;
use crate::types::DbId;

/// Errors surfaced by selection operations.
///
/// Callers must be able to distinguish "nothing happened because the event
/// is frozen" from a successful toggle, so frozen-event attempts are hard
/// errors, never silent no-ops.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// Adding another pick would exceed the cap. Untoggle one first.
    #[error("Selection limit of {limit} reached")]
    LimitReached { limit: u32 },

    /// The event has left `Open`; selections are immutable.
    #[error("Selections have already been submitted")]
    AlreadySubmitted,

    /// Submit called with a count that does not equal the cap.
    #[error("Exactly {expected} photos must be selected, got {actual}")]
    CountMismatch { expected: u32, actual: u32 },
}

/// Result of a successful toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// The photo is now tentatively picked.
    Added,
    /// The photo was picked and is no longer.
    Removed,
}

/// One client's tentative picks for one event.
#[derive(Debug, Clone)]
pub struct SelectionSession {
    /// The client identity this session belongs to. Threaded in explicitly
    /// by the caller; the session never consults ambient state.
    client_email: String,
    /// Selection budget. `0` means no cap.
    max_selections: u32,
    /// Lifecycle stage of the event at session load time, refreshed by the
    /// caller before mutating operations.
    stage: Stage,
    /// Tentative picks in toggle order.
    picked: Vec<DbId>,
}

impl SelectionSession {
    /// Start a session from the event's current state and the client's
    /// existing tentative marks (the photos whose `selected_by` already
    /// contains this client).
    pub fn new(
        client_email: impl Into<String>,
        max_selections: u32,
        stage: Stage,
        already_picked: Vec<DbId>,
    ) -> Self {
        Self {
            client_email: client_email.into(),
            max_selections,
            stage,
            picked: already_picked,
        }
    }

    /// The client identity this session operates for.
    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Number of tentative picks.
    pub fn count(&self) -> u32 {
        self.picked.len() as u32
    }

    /// Tentative picks in toggle order.
    pub fn picked(&self) -> &[DbId] {
        &self.picked
    }

    /// Whether `photo_id` is currently picked.
    pub fn is_picked(&self, photo_id: DbId) -> bool {
        self.picked.contains(&photo_id)
    }

    /// Whether the cap is met exactly (always false when uncapped, since an
    /// uncapped event has no "complete" count for the UI to light up on).
    pub fn exact_limit_reached(&self) -> bool {
        self.max_selections > 0 && self.count() == self.max_selections
    }

    /// Flip tentative membership for a photo.
    ///
    /// Rejects with [`SelectionError::AlreadySubmitted`] once the event has
    /// left `Open`, and with [`SelectionError::LimitReached`] when adding
    /// would exceed a positive cap. Removing is always allowed pre-submit.
    pub fn toggle(&mut self, photo_id: DbId) -> Result<Toggle, SelectionError> {
        if !self.stage.selections_mutable() {
            return Err(SelectionError::AlreadySubmitted);
        }

        if let Some(pos) = self.picked.iter().position(|&id| id == photo_id) {
            self.picked.remove(pos);
            return Ok(Toggle::Removed);
        }

        if self.max_selections > 0 && self.count() >= self.max_selections {
            return Err(SelectionError::LimitReached {
                limit: self.max_selections,
            });
        }

        self.picked.push(photo_id);
        Ok(Toggle::Added)
    }

    /// Validate the session for submission and return the snapshot to
    /// persist.
    ///
    /// Succeeds iff the event is still `Open` and the tentative count equals
    /// the cap exactly (any count when uncapped). The returned ids are the
    /// sole input to the guarded Open -> Selected transition; this method
    /// does not mutate the session, so the caller may retry after a
    /// transient persistence failure.
    pub fn submit(&self) -> Result<Vec<DbId>, SelectionError> {
        if !self.stage.selections_mutable() {
            return Err(SelectionError::AlreadySubmitted);
        }
        if self.max_selections > 0 && self.count() != self.max_selections {
            return Err(SelectionError::CountMismatch {
                expected: self.max_selections,
                actual: self.count(),
            });
        }
        Ok(self.picked.clone())
    }

    /// Refresh the lifecycle stage (after a re-read of the event row).
    pub fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_session(cap: u32) -> SelectionSession {
        SelectionSession::new("client@example.com", cap, Stage::Open, Vec::new())
    }

    #[test]
    fn test_toggle_add_and_remove() {
        let mut session = open_session(5);
        assert_eq!(session.toggle(1), Ok(Toggle::Added));
        assert_eq!(session.toggle(2), Ok(Toggle::Added));
        assert!(session.is_picked(1));
        assert_eq!(session.toggle(1), Ok(Toggle::Removed));
        assert!(!session.is_picked(1));
        assert_eq!(session.count(), 1);
    }

    #[test]
    fn test_limit_reached_rejects_add_but_not_remove() {
        let mut session = open_session(2);
        session.toggle(1).unwrap();
        session.toggle(2).unwrap();
        assert_eq!(session.toggle(3), Err(SelectionError::LimitReached { limit: 2 }));
        // Removing at the limit is fine.
        assert_eq!(session.toggle(2), Ok(Toggle::Removed));
        assert_eq!(session.toggle(3), Ok(Toggle::Added));
    }

    #[test]
    fn test_uncapped_session_never_hits_limit() {
        let mut session = open_session(0);
        for id in 0..100 {
            assert_eq!(session.toggle(id), Ok(Toggle::Added));
        }
        assert!(!session.exact_limit_reached());
        assert_eq!(session.submit().unwrap().len(), 100);
    }

    #[test]
    fn test_submit_requires_exact_count() {
        let mut session = open_session(3);
        session.toggle(1).unwrap();
        session.toggle(2).unwrap();
        // Fewer than the cap: "up to" is not enough.
        assert_eq!(
            session.submit(),
            Err(SelectionError::CountMismatch { expected: 3, actual: 2 })
        );
        session.toggle(3).unwrap();
        assert_eq!(session.submit().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_uncapped_submit_accepts_any_count() {
        let session = open_session(0);
        assert_eq!(session.submit().unwrap(), Vec::<DbId>::new());
    }

    #[test]
    fn test_frozen_event_rejects_toggle_and_submit() {
        for stage in [Stage::Selected, Stage::Delivered, Stage::Archived] {
            let mut session =
                SelectionSession::new("client@example.com", 3, stage, vec![1, 2, 3]);
            // Rejected, not silently ignored: the caller can tell this apart
            // from a successful toggle.
            assert_eq!(session.toggle(1), Err(SelectionError::AlreadySubmitted));
            assert_eq!(session.submit(), Err(SelectionError::AlreadySubmitted));
        }
    }

    #[test]
    fn test_session_resumes_existing_marks() {
        let session =
            SelectionSession::new("client@example.com", 3, Stage::Open, vec![7, 9]);
        assert_eq!(session.count(), 2);
        assert!(session.is_picked(9));
        assert!(!session.exact_limit_reached());
    }

    /// The full walkthrough: cap 3, pick A B C, D bounces off the limit,
    /// swap C for D, submit, then everything is frozen.
    #[test]
    fn test_selection_walkthrough() {
        let (a, b, c, d) = (10, 11, 12, 13);
        let mut session = open_session(3);

        session.toggle(a).unwrap();
        session.toggle(b).unwrap();
        session.toggle(c).unwrap();
        assert_eq!(session.toggle(d), Err(SelectionError::LimitReached { limit: 3 }));

        assert_eq!(session.toggle(c), Ok(Toggle::Removed));
        assert_eq!(session.toggle(d), Ok(Toggle::Added));
        assert!(session.exact_limit_reached());

        let snapshot = session.submit().unwrap();
        assert_eq!(snapshot, vec![a, b, d]);

        // The persisted transition flips the event to Selected; a second
        // submit through the refreshed session is rejected and the snapshot
        // is untouched.
        session.set_stage(Stage::Selected);
        assert_eq!(session.submit(), Err(SelectionError::AlreadySubmitted));
        assert_eq!(session.picked(), &[a, b, d]);
    }
}
