//! Event lifecycle state machine.
//!
//! An event moves through four stages:
//!
//! ```text
//! Open -> Selected -> Delivered -> Archived
//! ```
//!
//! The database stores the lifecycle as independent boolean/timestamp columns
//! (`selections_submitted`, `final_photos_ready`, `archived`) so existing
//! rows stay readable, but all decision logic goes through [`Stage`], a
//! single tagged value recomputed from those flags. Each flag is monotonic:
//! once set it never reverts, and every transition is guarded both here and
//! by a conditional UPDATE in the repository layer so a stale caller cannot
//! move an event backwards.

use serde::Serialize;

/// Errors produced by lifecycle transition checks.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// The requested transition would move the event backwards or skip a
    /// stage.
    #[error("Invalid lifecycle transition: {from} -> {to}")]
    InvalidTransition { from: Stage, to: Stage },

    /// A selection submit was attempted on an event that already has one.
    #[error("Selections have already been submitted for this event")]
    AlreadySubmitted,

    /// A finals delivery was attempted before the client submitted.
    #[error("Cannot deliver finals before selections are submitted")]
    NotYetSelected,

    /// A finals delivery was attempted twice.
    #[error("Final photos have already been delivered for this event")]
    AlreadyDelivered,

    /// An archive was attempted on an event that is not yet delivered.
    #[error("Cannot archive an event whose finals are not delivered")]
    NotYetDelivered,
}

/// Lifecycle stage of an event, derived from the persisted flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Client is still picking proofs.
    Open,
    /// Selections submitted, photographer is editing finals.
    Selected,
    /// Finals uploaded and downloadable by the client.
    Delivered,
    /// Swept: photos and assets deleted, terminal.
    Archived,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Open => "open",
            Stage::Selected => "selected",
            Stage::Delivered => "delivered",
            Stage::Archived => "archived",
        };
        f.write_str(name)
    }
}

/// The persisted lifecycle flags of an event row.
///
/// Kept as a separate struct so the derivation logic can be exercised
/// without constructing a full event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecycleFlags {
    pub selections_submitted: bool,
    pub final_photos_ready: bool,
    pub archived: bool,
}

impl Stage {
    /// Derive the stage from the persisted flags.
    ///
    /// Derivation is total: an inconsistent combination (e.g. finals marked
    /// ready on a row that never recorded a submit) resolves to the furthest
    /// stage the flags support, since the later flag could only have been
    /// set by a transition that already checked the earlier one.
    pub fn from_flags(flags: LifecycleFlags) -> Self {
        if flags.archived {
            Stage::Archived
        } else if flags.final_photos_ready {
            Stage::Delivered
        } else if flags.selections_submitted {
            Stage::Selected
        } else {
            Stage::Open
        }
    }

    /// The stage that follows this one, or `None` for the terminal stage.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Open => Some(Stage::Selected),
            Stage::Selected => Some(Stage::Delivered),
            Stage::Delivered => Some(Stage::Archived),
            Stage::Archived => None,
        }
    }

    /// Whether a transition from `self` to `to` is a legal single forward
    /// step. Backward moves and stage-skips are always rejected.
    pub fn can_transition_to(self, to: Stage) -> bool {
        self.next() == Some(to)
    }

    /// Validate a transition, returning the specific error a caller should
    /// surface when it is not allowed.
    pub fn check_transition(self, to: Stage) -> Result<(), LifecycleError> {
        if self.can_transition_to(to) {
            return Ok(());
        }
        match (self, to) {
            // Duplicate submit: the guard the selection workflow relies on.
            (from, Stage::Selected) if from >= Stage::Selected => {
                Err(LifecycleError::AlreadySubmitted)
            }
            (Stage::Open, Stage::Delivered) => Err(LifecycleError::NotYetSelected),
            (from, Stage::Delivered) if from >= Stage::Delivered => {
                Err(LifecycleError::AlreadyDelivered)
            }
            (_, Stage::Archived) => Err(LifecycleError::NotYetDelivered),
            (from, to) => Err(LifecycleError::InvalidTransition { from, to }),
        }
    }

    /// Whether the client's selection is still mutable. Selections freeze
    /// permanently the moment the event leaves `Open`.
    pub fn selections_mutable(self) -> bool {
        self == Stage::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(submitted: bool, ready: bool, archived: bool) -> LifecycleFlags {
        LifecycleFlags {
            selections_submitted: submitted,
            final_photos_ready: ready,
            archived,
        }
    }

    #[test]
    fn test_stage_derivation() {
        assert_eq!(Stage::from_flags(flags(false, false, false)), Stage::Open);
        assert_eq!(Stage::from_flags(flags(true, false, false)), Stage::Selected);
        assert_eq!(Stage::from_flags(flags(true, true, false)), Stage::Delivered);
        assert_eq!(Stage::from_flags(flags(true, true, true)), Stage::Archived);
    }

    #[test]
    fn test_inconsistent_flags_resolve_to_furthest_stage() {
        // Finals ready without a recorded submit: still Delivered.
        assert_eq!(Stage::from_flags(flags(false, true, false)), Stage::Delivered);
        // Archived always wins.
        assert_eq!(Stage::from_flags(flags(false, false, true)), Stage::Archived);
    }

    #[test]
    fn test_forward_steps_allowed() {
        assert!(Stage::Open.can_transition_to(Stage::Selected));
        assert!(Stage::Selected.can_transition_to(Stage::Delivered));
        assert!(Stage::Delivered.can_transition_to(Stage::Archived));
    }

    #[test]
    fn test_backward_and_skipping_moves_rejected() {
        // No transition may move a state backward.
        assert!(!Stage::Selected.can_transition_to(Stage::Open));
        assert!(!Stage::Delivered.can_transition_to(Stage::Selected));
        assert!(!Stage::Archived.can_transition_to(Stage::Delivered));
        // Stage skips are equally invalid.
        assert!(!Stage::Open.can_transition_to(Stage::Delivered));
        assert!(!Stage::Open.can_transition_to(Stage::Archived));
        assert!(!Stage::Selected.can_transition_to(Stage::Archived));
    }

    #[test]
    fn test_terminal_stage_has_no_successor() {
        assert_eq!(Stage::Archived.next(), None);
        assert!(!Stage::Archived.can_transition_to(Stage::Archived));
    }

    #[test]
    fn test_duplicate_submit_is_already_submitted() {
        assert_eq!(
            Stage::Selected.check_transition(Stage::Selected),
            Err(LifecycleError::AlreadySubmitted)
        );
        assert_eq!(
            Stage::Delivered.check_transition(Stage::Selected),
            Err(LifecycleError::AlreadySubmitted)
        );
    }

    #[test]
    fn test_deliver_guards() {
        assert_eq!(
            Stage::Open.check_transition(Stage::Delivered),
            Err(LifecycleError::NotYetSelected)
        );
        assert_eq!(
            Stage::Delivered.check_transition(Stage::Delivered),
            Err(LifecycleError::AlreadyDelivered)
        );
        assert!(Stage::Selected.check_transition(Stage::Delivered).is_ok());
    }

    #[test]
    fn test_archive_guards() {
        assert_eq!(
            Stage::Open.check_transition(Stage::Archived),
            Err(LifecycleError::NotYetDelivered)
        );
        assert_eq!(
            Stage::Selected.check_transition(Stage::Archived),
            Err(LifecycleError::NotYetDelivered)
        );
        assert!(Stage::Delivered.check_transition(Stage::Archived).is_ok());
    }

    #[test]
    fn test_selections_freeze_after_open() {
        assert!(Stage::Open.selections_mutable());
        assert!(!Stage::Selected.selections_mutable());
        assert!(!Stage::Delivered.selections_mutable());
        assert!(!Stage::Archived.selections_mutable());
    }

    /// Monotonicity expressed over the flag encoding: replaying any sequence
    /// of legal transitions never clears a previously set flag.
    #[test]
    fn test_flags_are_monotonic_across_legal_transitions() {
        let mut flags = LifecycleFlags::default();
        let mut stage = Stage::from_flags(flags);

        let apply = |stage: Stage, flags: &mut LifecycleFlags| match stage {
            Stage::Selected => flags.selections_submitted = true,
            Stage::Delivered => flags.final_photos_ready = true,
            Stage::Archived => flags.archived = true,
            Stage::Open => {}
        };

        while let Some(next) = stage.next() {
            assert!(stage.check_transition(next).is_ok());
            let before = flags;
            apply(next, &mut flags);
            assert!(flags.selections_submitted >= before.selections_submitted);
            assert!(flags.final_photos_ready >= before.final_photos_ready);
            assert!(flags.archived >= before.archived);
            stage = Stage::from_flags(flags);
            assert_eq!(stage, next);
        }
        assert_eq!(stage, Stage::Archived);
    }
}
