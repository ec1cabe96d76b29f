//! [`IssueStore`]: the single source of truth for issues in a session.
//!
//! Every mutation runs on a working copy of the affected issue, hands the
//! result to the optional [`Persistence`] delegate and only then commits, so
//! a failed operation leaves the store exactly as it was.
//!
//! Reads hand out `&Issue` borrows. Any filtered subset derived from them is
//! stale after the next mutation; the borrow checker enforces that callers
//! re-read.

use std::collections::HashMap;

use crate::{
  Error, Result,
  clock::Clock,
  issue::{Category, Issue, IssueDraft, IssueId, IssuePatch, Status, StatusChange},
  lifecycle,
  urgency::{self, ScoringConfig, ScoringInput},
};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Durability collaborator. Called with the post-mutation snapshot before the
/// store commits; an error aborts the mutation.
pub trait Persistence: Send {
  fn persist(&mut self, issue: &Issue) -> Result<(), BoxError>;

  fn remove(&mut self, id: IssueId) -> Result<(), BoxError>;
}

/// Existence check used by the selection coordinator.
pub trait IssueLookup {
  fn contains(&self, id: IssueId) -> bool;
}

// ─── Store ───────────────────────────────────────────────────────────────────

pub struct IssueStore {
  issues:      HashMap<IssueId, Issue>,
  /// Insertion order, for deterministic listing.
  order:       Vec<IssueId>,
  scoring:     ScoringConfig,
  clock:       Box<dyn Clock>,
  persistence: Option<Box<dyn Persistence>>,
}

impl IssueStore {
  /// An empty store. Fails if `scoring` is invalid.
  pub fn new(scoring: ScoringConfig, clock: impl Clock + 'static) -> Result<Self> {
    scoring.validate()?;
    Ok(Self {
      issues: HashMap::new(),
      order: Vec::new(),
      scoring,
      clock: Box::new(clock),
      persistence: None,
    })
  }

  pub fn with_persistence(mut self, persistence: impl Persistence + 'static) -> Self {
    self.persistence = Some(Box::new(persistence));
    self
  }

  pub fn scoring(&self) -> &ScoringConfig { &self.scoring }

  /// The store's notion of "now".
  pub fn now(&self) -> chrono::DateTime<chrono::Utc> { self.clock.now() }

  // ── Reads ───────────────────────────────────────────────────────────────

  pub fn get(&self, id: IssueId) -> Result<&Issue> {
    self.issues.get(&id).ok_or(Error::NotFound(id))
  }

  /// All issues in insertion order.
  pub fn list(&self) -> impl ExactSizeIterator<Item = &Issue> + '_ {
    self.order.iter().map(|id| &self.issues[id])
  }

  pub fn len(&self) -> usize { self.order.len() }

  pub fn is_empty(&self) -> bool { self.order.is_empty() }

  // ── Writes ──────────────────────────────────────────────────────────────

  /// Validate `draft`, score it and add it with status `reported`.
  pub fn create(&mut self, draft: IssueDraft) -> Result<&Issue> {
    let issue = self.build(draft)?;
    let id = issue.id();
    self.persist(&issue)?;

    tracing::debug!(
      issue = %id,
      reference = %id.reference(),
      score = issue.urgency_score(),
      tier = %issue.priority_tier(),
      "issue created"
    );
    self.order.push(id);
    Ok(&*self.issues.entry(id).or_insert(issue))
  }

  /// Apply `patch` to the mutable fields of an issue, rescoring if the
  /// description or urgency signals changed.
  pub fn update(&mut self, id: IssueId, patch: IssuePatch) -> Result<&Issue> {
    if patch.resolution_notes.as_deref().is_some_and(|n| n.trim().is_empty()) {
      return Err(Error::validation("resolution_notes", "must not be blank"));
    }

    let mut issue = self.get(id)?.clone();
    if patch.is_empty() {
      return self.get(id);
    }

    let rescore = patch.affects_urgency();
    if let Some(description) = patch.description {
      issue.set_description(description);
    }
    if let Some(signals) = patch.signals {
      issue.set_signals(signals);
    }
    if let Some(notes) = patch.resolution_notes {
      issue.set_resolution_notes(notes);
    }
    if rescore {
      self.rescore(&mut issue);
    }

    self.persist(&issue)?;
    tracing::debug!(
      issue = %id,
      score = issue.urgency_score(),
      tier = %issue.priority_tier(),
      "issue updated"
    );
    Ok(self.commit(issue))
  }

  /// Move an issue to `to` if the lifecycle allows it.
  ///
  /// Non-blank `notes` are attached as the resolution notes. When `notes` is
  /// blank or absent, notes already on the issue satisfy the completion
  /// guard.
  pub fn set_status(
    &mut self,
    id: IssueId,
    to: Status,
    notes: Option<&str>,
  ) -> Result<&Issue> {
    let current = self.get(id)?;
    let from = current.status();
    let notes = notes.map(str::trim).filter(|n| !n.is_empty());

    if let Err(e) =
      lifecycle::check(id, from, to, notes.or(current.resolution_notes()))
    {
      tracing::debug!(issue = %id, %from, %to, error = %e, "transition refused");
      return Err(e);
    }

    let mut issue = current.clone();
    issue.apply_transition(StatusChange {
      from,
      to,
      at: self.clock.now(),
      notes: notes.map(str::to_owned),
    });

    self.persist(&issue)?;
    tracing::info!(issue = %id, %from, %to, "status changed");
    Ok(self.commit(issue))
  }

  /// Remove an issue, returning its final snapshot.
  pub fn remove(&mut self, id: IssueId) -> Result<Issue> {
    if !self.issues.contains_key(&id) {
      return Err(Error::NotFound(id));
    }
    if let Some(p) = self.persistence.as_mut() {
      p.remove(id).map_err(Error::Persistence)?;
    }
    self.order.retain(|other| *other != id);
    tracing::debug!(issue = %id, "issue removed");
    self.issues.remove(&id).ok_or(Error::NotFound(id))
  }

  /// Replace the whole issue set. Every draft is validated before anything
  /// changes; one invalid draft leaves the current set in place.
  pub fn replace_all(
    &mut self,
    drafts: impl IntoIterator<Item = IssueDraft>,
  ) -> Result<Vec<IssueId>> {
    let fresh = drafts
      .into_iter()
      .map(|d| self.build(d))
      .collect::<Result<Vec<_>>>()?;

    if let Some(p) = self.persistence.as_mut() {
      for issue in &fresh {
        p.persist(issue).map_err(Error::Persistence)?;
      }
      for id in &self.order {
        p.remove(*id).map_err(Error::Persistence)?;
      }
    }

    self.order = fresh.iter().map(Issue::id).collect();
    self.issues = fresh.into_iter().map(|i| (i.id(), i)).collect();
    tracing::info!(count = self.order.len(), "issue set replaced");
    Ok(self.order.clone())
  }

  /// Recompute every issue's age signal from its `created_at` and the store
  /// clock, rescoring the ones whose age changed. Returns how many changed.
  ///
  /// Every rescored issue is persisted before any is committed, so a failure
  /// leaves all ages as they were.
  pub fn refresh_ages(&mut self) -> Result<usize> {
    let now = self.clock.now();

    let mut aged = Vec::new();
    for issue in self.list() {
      let hours = (now - issue.created_at()).num_hours().clamp(0, i64::from(u32::MAX));
      let hours = hours as u32;
      if issue.signals().age_hours == hours {
        continue;
      }

      let mut issue = issue.clone();
      let mut signals = issue.signals();
      signals.age_hours = hours;
      issue.set_signals(signals);
      self.rescore(&mut issue);
      aged.push(issue);
    }

    for issue in &aged {
      self.persist(issue)?;
    }

    let changed = aged.len();
    for issue in aged {
      self.commit(issue);
    }
    if changed > 0 {
      tracing::debug!(changed, "issue ages refreshed");
    }
    Ok(changed)
  }

  // ── Internals ───────────────────────────────────────────────────────────

  fn build(&self, draft: IssueDraft) -> Result<Issue> {
    if draft.title.trim().is_empty() {
      return Err(Error::validation("title", "must not be empty"));
    }
    if draft.location.trim().is_empty() {
      return Err(Error::validation("location", "must not be empty"));
    }
    let category = Category::parse(&draft.category)?;

    let mut issue = Issue::new(IssueId::generate(), draft, category, self.clock.now());
    self.rescore(&mut issue);
    Ok(issue)
  }

  fn rescore(&self, issue: &mut Issue) {
    let assessment = urgency::assess(ScoringInput::from(&*issue), &self.scoring);
    issue.apply_assessment(assessment);
  }

  fn persist(&mut self, issue: &Issue) -> Result<()> {
    match self.persistence.as_mut() {
      Some(p) => p.persist(issue).map_err(Error::Persistence),
      None => Ok(()),
    }
  }

  fn commit(&mut self, issue: Issue) -> &Issue {
    let id = issue.id();
    self.issues.insert(id, issue);
    &self.issues[&id]
  }
}

impl IssueLookup for IssueStore {
  fn contains(&self, id: IssueId) -> bool { self.issues.contains_key(&id) }
}

impl std::fmt::Debug for IssueStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("IssueStore").field("len", &self.len()).finish_non_exhaustive()
  }
}
