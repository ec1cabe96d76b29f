//! Error types for `citypulse-core`.

use thiserror::Error;

use crate::issue::{IssueId, Status};

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid {field}: {reason}")]
  Validation { field: &'static str, reason: String },

  #[error("issue not found: {0}")]
  NotFound(IssueId),

  #[error("cannot move an issue from {from} to {to}")]
  InvalidTransition { from: Status, to: Status },

  #[error("issue {0} cannot be completed without resolution notes")]
  MissingResolution(IssueId),

  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Field-free discriminant of [`Error`], for callers that only need to branch
/// on the failure kind (e.g. to pick a toast message).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  NotFound,
  InvalidTransition,
  MissingResolution,
  Persistence,
}

impl Error {
  pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
    Self::Validation { field, reason: reason.into() }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation { .. } => ErrorKind::Validation,
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
      Self::MissingResolution(_) => ErrorKind::MissingResolution,
      Self::Persistence(_) => ErrorKind::Persistence,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
