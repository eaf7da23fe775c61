//! Reconcile state machine shared by both control loops.
//!
//! Pure: no async, no IO.

use std::fmt;

/// Where a parent stands relative to its owned child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    /// The owned child does not exist.
    Absent,
    /// Creation of the child has been issued.
    PendingCreate,
    /// Child exists and the parent's recorded readiness matches it.
    Converged,
    /// Child exists but its readiness differs from the parent's record.
    StatusDrift { observed: bool },
    /// Deletion was requested. Terminal.
    Deleting,
}

impl ReconcileState {
    /// Classifies a live parent.
    ///
    /// `child_ready` is `None` when the child is missing; `recorded` is the
    /// readiness currently stored in the parent's status.
    pub fn observe(child_ready: Option<bool>, recorded: bool) -> Self {
        match child_ready {
            None => ReconcileState::Absent,
            Some(observed) if observed != recorded => ReconcileState::StatusDrift { observed },
            Some(_) => ReconcileState::Converged,
        }
    }

    pub fn begin_create(self) -> Self {
        match self {
            ReconcileState::Absent => ReconcileState::PendingCreate,
            other => other,
        }
    }

    /// State after the guarded mutation (create or status update) succeeded.
    pub fn complete(self) -> Self {
        match self {
            ReconcileState::PendingCreate | ReconcileState::StatusDrift { .. } => {
                ReconcileState::Converged
            }
            other => other,
        }
    }
}

impl fmt::Display for ReconcileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileState::Absent => f.write_str("Absent"),
            ReconcileState::PendingCreate => f.write_str("PendingCreate"),
            ReconcileState::Converged => f.write_str("Converged"),
            ReconcileState::StatusDrift { observed } => write!(f, "StatusDrift({observed})"),
            ReconcileState::Deleting => f.write_str("Deleting"),
        }
    }
}

/// Result of one reconcile pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The reconciled object no longer exists.
    NotFound,
    /// The reconciled object is being deleted; nothing was touched.
    Deleting,
    /// The owned child was created.
    Created,
    /// The parent's readiness was rewritten.
    StatusUpdated { ready: bool },
    /// Nothing to do.
    Converged,
}

impl Outcome {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Outcome::Created | Outcome::StatusUpdated { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_child_is_absent() {
        assert_eq!(ReconcileState::observe(None, true), ReconcileState::Absent);
        assert_eq!(ReconcileState::observe(None, false), ReconcileState::Absent);
    }

    #[test]
    fn differing_readiness_is_drift() {
        assert_eq!(
            ReconcileState::observe(Some(true), false),
            ReconcileState::StatusDrift { observed: true }
        );
        assert_eq!(
            ReconcileState::observe(Some(false), true),
            ReconcileState::StatusDrift { observed: false }
        );
    }

    #[test]
    fn create_path_reaches_converged() {
        let state = ReconcileState::Absent.begin_create();
        assert_eq!(state, ReconcileState::PendingCreate);
        assert_eq!(state.complete(), ReconcileState::Converged);
    }

    #[test]
    fn deleting_is_terminal() {
        let state = ReconcileState::Deleting;
        assert_eq!(state.begin_create(), ReconcileState::Deleting);
        assert_eq!(state.complete(), ReconcileState::Deleting);
    }

    #[test]
    fn only_writes_count_as_mutations() {
        assert!(Outcome::Created.is_mutation());
        assert!(Outcome::StatusUpdated { ready: false }.is_mutation());
        assert!(!Outcome::Converged.is_mutation());
        assert!(!Outcome::NotFound.is_mutation());
        assert!(!Outcome::Deleting.is_mutation());
    }
}
