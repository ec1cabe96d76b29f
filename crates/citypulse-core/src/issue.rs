//! Issue types: the central entity of the triage engine.
//!
//! An [`Issue`] is only ever constructed and mutated by
//! [`crate::store::IssueStore`]. Views receive `&Issue` snapshots; derived
//! fields (`urgency_score`, `priority_tier`, `severity_keywords`) and `status`
//! have no public setters.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// `reported_by` value used when a draft does not name its reporter.
pub const ANONYMOUS_REPORTER: &str = "Anonymous";

// ─── Identity ────────────────────────────────────────────────────────────────

/// Opaque, immutable issue identifier.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IssueId(Uuid);

impl IssueId {
  pub(crate) fn generate() -> Self { Self(Uuid::new_v4()) }

  pub fn as_uuid(&self) -> Uuid { self.0 }

  /// Short human-facing reference, e.g. `CP-1A2B3C4D`, shown to the reporter
  /// as an acknowledgement code.
  pub fn reference(&self) -> String {
    let hex = self.0.simple().to_string();
    format!("CP-{}", hex[..8].to_ascii_uppercase())
  }
}

impl From<Uuid> for IssueId {
  fn from(value: Uuid) -> Self { Self(value) }
}

impl fmt::Display for IssueId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.0, f)
  }
}

// ─── Enumerations ────────────────────────────────────────────────────────────

/// The fixed set of issue categories.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Category {
  Infrastructure,
  Utilities,
  #[serde(rename = "Public Safety", alias = "public_safety")]
  #[strum(
    to_string = "Public Safety",
    serialize = "public_safety",
    serialize = "public-safety"
  )]
  PublicSafety,
  Vandalism,
  Environment,
  Transportation,
  Noise,
  Other,
}

impl Category {
  /// Parse a user-supplied category label. Empty and unknown labels are
  /// validation failures; there is no fallback category.
  pub fn parse(label: &str) -> Result<Self> {
    let label = label.trim();
    if label.is_empty() {
      return Err(Error::validation("category", "must not be empty"));
    }
    Self::from_str(label).map_err(|_| {
      Error::validation("category", format!("unknown category {label:?}"))
    })
  }
}

/// Discrete urgency bucket. Ordered from least to most urgent.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PriorityTier {
  Low,
  Medium,
  High,
  Urgent,
}

/// Lifecycle state of an issue. Transitions are governed by
/// [`crate::lifecycle`].
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Status {
  #[default]
  Reported,
  Accepted,
  InProgress,
  Completed,
  Rejected,
}

impl Status {
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Completed | Self::Rejected)
  }
}

// ─── Signals ─────────────────────────────────────────────────────────────────

/// Caller-controlled inputs to the urgency scorer. Category weight and
/// severity keywords come from the issue's own fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrgencySignals {
  /// Urgency as perceived by the reporter, if they gave one.
  pub reporter_priority: Option<PriorityTier>,
  /// Hours the issue has been waiting, relative to a caller-supplied "now".
  pub age_hours:         u32,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::IssueStore::create`].
///
/// `id`, `created_at`, the derived urgency fields and `status` are always set
/// by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueDraft {
  pub title:             String,
  pub description:       String,
  /// Category label; must name one of [`Category`].
  pub category:          String,
  pub location:          String,
  /// Ward or zone tag used by location filters.
  pub ward:              Option<String>,
  pub reported_by:       Option<String>,
  pub reporter_priority: Option<PriorityTier>,
  /// Opaque to the core; carried through unchanged.
  pub contact_info:      Option<String>,
}

impl IssueDraft {
  /// Convenience constructor with all optional fields left empty.
  pub fn new(
    title: impl Into<String>,
    category: impl Into<String>,
    location: impl Into<String>,
  ) -> Self {
    Self {
      title: title.into(),
      category: category.into(),
      location: location.into(),
      ..Self::default()
    }
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = description.into();
    self
  }

  pub fn with_reporter_priority(mut self, tier: PriorityTier) -> Self {
    self.reporter_priority = Some(tier);
    self
  }
}

/// Input to [`crate::store::IssueStore::update`]. Only these fields are
/// mutable after creation; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct IssuePatch {
  pub description:      Option<String>,
  pub signals:          Option<UrgencySignals>,
  pub resolution_notes: Option<String>,
}

impl IssuePatch {
  pub fn is_empty(&self) -> bool {
    self.description.is_none()
      && self.signals.is_none()
      && self.resolution_notes.is_none()
  }

  /// Whether applying this patch can change the urgency score.
  pub(crate) fn affects_urgency(&self) -> bool {
    self.description.is_some() || self.signals.is_some()
  }
}

// ─── History ─────────────────────────────────────────────────────────────────

/// One successful lifecycle transition, kept for the progress timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
  pub from:  Status,
  pub to:    Status,
  pub at:    DateTime<Utc>,
  pub notes: Option<String>,
}

// ─── Issue ───────────────────────────────────────────────────────────────────

/// A reported civic problem, as held by the record store. Serialise-only:
/// an `Issue` is built by the store, never decoded from outside.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
  id:                IssueId,
  title:             String,
  description:       String,
  category:          Category,
  location:          String,
  ward:              Option<String>,
  reported_by:       String,
  contact_info:      Option<String>,
  created_at:        DateTime<Utc>,
  signals:           UrgencySignals,
  urgency_score:     u8,
  priority_tier:     PriorityTier,
  severity_keywords: Vec<String>,
  status:            Status,
  resolution_notes:  Option<String>,
  history:           Vec<StatusChange>,
}

impl Issue {
  /// Build a freshly reported issue. The derived urgency fields are zeroed
  /// until the store runs the scorer.
  pub(crate) fn new(
    id: IssueId,
    draft: IssueDraft,
    category: Category,
    created_at: DateTime<Utc>,
  ) -> Self {
    let reported_by = draft
      .reported_by
      .map(|r| r.trim().to_owned())
      .filter(|r| !r.is_empty())
      .unwrap_or_else(|| ANONYMOUS_REPORTER.to_owned());

    Self {
      id,
      title: draft.title.trim().to_owned(),
      description: draft.description,
      category,
      location: draft.location.trim().to_owned(),
      ward: draft.ward.filter(|w| !w.trim().is_empty()),
      reported_by,
      contact_info: draft.contact_info,
      created_at,
      signals: UrgencySignals {
        reporter_priority: draft.reporter_priority,
        age_hours:         0,
      },
      urgency_score: 0,
      priority_tier: PriorityTier::Low,
      severity_keywords: Vec::new(),
      status: Status::Reported,
      resolution_notes: None,
      history: Vec::new(),
    }
  }

  pub fn id(&self) -> IssueId { self.id }
  pub fn title(&self) -> &str { &self.title }
  pub fn description(&self) -> &str { &self.description }
  pub fn category(&self) -> Category { self.category }
  pub fn location(&self) -> &str { &self.location }
  pub fn ward(&self) -> Option<&str> { self.ward.as_deref() }
  pub fn reported_by(&self) -> &str { &self.reported_by }
  pub fn contact_info(&self) -> Option<&str> { self.contact_info.as_deref() }
  pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
  pub fn signals(&self) -> UrgencySignals { self.signals }
  pub fn urgency_score(&self) -> u8 { self.urgency_score }
  pub fn priority_tier(&self) -> PriorityTier { self.priority_tier }
  /// Distinct severity keywords found in the title or description at the
  /// last scoring.
  pub fn severity_keywords(&self) -> &[String] { &self.severity_keywords }
  pub fn status(&self) -> Status { self.status }
  pub fn resolution_notes(&self) -> Option<&str> {
    self.resolution_notes.as_deref()
  }
  /// Every successful transition, oldest first.
  pub fn history(&self) -> &[StatusChange] { &self.history }

  pub fn is_anonymous(&self) -> bool {
    self.reported_by.eq_ignore_ascii_case(ANONYMOUS_REPORTER)
  }

  // ── Store-only mutation ─────────────────────────────────────────────────

  pub(crate) fn set_description(&mut self, description: String) {
    self.description = description;
  }

  pub(crate) fn set_signals(&mut self, signals: UrgencySignals) {
    self.signals = signals;
  }

  pub(crate) fn set_resolution_notes(&mut self, notes: String) {
    self.resolution_notes = Some(notes);
  }

  /// Store the scorer's output. The tier always arrives together with the
  /// score it was derived from.
  pub(crate) fn apply_assessment(
    &mut self,
    assessment: crate::urgency::UrgencyAssessment,
  ) {
    self.urgency_score = assessment.score;
    self.priority_tier = assessment.tier;
    self.severity_keywords = assessment.matched_keywords;
  }

  /// Record a transition already approved by [`crate::lifecycle::check`].
  /// Notes on the closing transition become the resolution notes; notes on
  /// any other transition live only in the history.
  pub(crate) fn apply_transition(&mut self, change: StatusChange) {
    self.status = change.to;
    if let Some(notes) = change.notes.as_ref().filter(|_| change.to.is_terminal()) {
      self.resolution_notes = Some(notes.clone());
    }
    self.history.push(change);
  }
}
