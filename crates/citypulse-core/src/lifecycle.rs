//! Status lifecycle.
//!
//! ```text
//! reported ──► accepted ──► in-progress ──► completed
//!     │            │
//!     └────────────┴──► rejected
//! ```
//!
//! `completed` and `rejected` are terminal. Completing requires resolution
//! notes; that guard fails with [`Error::MissingResolution`], every other
//! illegal request with [`Error::InvalidTransition`].

use crate::{
  Error, Result,
  issue::{IssueId, Status},
};

/// Guard attached to a legal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
  None,
  ResolutionNotes,
}

/// The complete table of legal transitions.
pub const TRANSITIONS: &[(Status, Status, Guard)] = &[
  (Status::Reported, Status::Accepted, Guard::None),
  (Status::Reported, Status::Rejected, Guard::None),
  (Status::Accepted, Status::InProgress, Guard::None),
  (Status::Accepted, Status::Rejected, Guard::None),
  (Status::InProgress, Status::Completed, Guard::ResolutionNotes),
];

/// Statuses reachable in one step from `from`, in table order. Empty for
/// terminal states.
pub fn allowed_transitions(from: Status) -> Vec<Status> {
  TRANSITIONS
    .iter()
    .filter(|(f, _, _)| *f == from)
    .map(|(_, to, _)| *to)
    .collect()
}

/// Validate a transition request for issue `id`.
///
/// `notes` are the resolution notes that would be on the issue after the
/// transition; blank notes do not satisfy the guard.
pub fn check(
  id: IssueId,
  from: Status,
  to: Status,
  notes: Option<&str>,
) -> Result<()> {
  let guard = TRANSITIONS
    .iter()
    .find(|(f, t, _)| *f == from && *t == to)
    .map(|(_, _, guard)| *guard)
    .ok_or(Error::InvalidTransition { from, to })?;

  match guard {
    Guard::None => Ok(()),
    Guard::ResolutionNotes => {
      if notes.is_some_and(|n| !n.trim().is_empty()) {
        Ok(())
      } else {
        Err(Error::MissingResolution(id))
      }
    }
  }
}
