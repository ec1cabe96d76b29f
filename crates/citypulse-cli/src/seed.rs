//! Seed-file loading.
//!
//! A seed file is a JSON array of issue drafts. Each entry may also carry an
//! `age_hours` and a list of operator transitions. Entries are replayed on a
//! [`ManualClock`]: each issue is created `age_hours` before the load time,
//! its transitions are applied at the load time, and ages are then derived
//! from `created_at`.
//!
//! ```json
//! [{
//!   "title": "Broken streetlight",
//!   "category": "Utilities",
//!   "location": "Park Avenue",
//!   "age_hours": 72,
//!   "transitions": [{ "to": "accepted" }]
//! }]
//! ```

use anyhow::{Context as _, Result};
use chrono::TimeDelta;
use citypulse_core::{
  IssueStore,
  clock::{Clock, ManualClock},
  issue::{IssueDraft, Status},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SeedIssue {
  #[serde(flatten)]
  draft:       IssueDraft,
  age_hours:   Option<u32>,
  #[serde(default)]
  transitions: Vec<SeedTransition>,
}

#[derive(Debug, Deserialize)]
struct SeedTransition {
  to:    Status,
  notes: Option<String>,
}

/// Parse `raw` and add every entry to `store`, which must read its time from
/// `clock`. Leaves `clock` at the time it showed on entry. Returns the number
/// of issues created.
pub fn load(store: &mut IssueStore, clock: &ManualClock, raw: &str) -> Result<usize> {
  let entries: Vec<SeedIssue> = serde_json::from_str(raw).context("parsing seed JSON")?;
  let count = entries.len();
  let now = clock.now();

  for (n, entry) in entries.into_iter().enumerate() {
    let title = entry.draft.title.clone();
    let age = TimeDelta::hours(i64::from(entry.age_hours.unwrap_or(0)));

    clock.set(now - age);
    let created = store.create(entry.draft).map(|issue| issue.id());
    clock.set(now);
    let id = created.with_context(|| format!("seed entry {n} ({title:?})"))?;

    for t in entry.transitions {
      store
        .set_status(id, t.to, t.notes.as_deref())
        .with_context(|| format!("seed entry {n} ({title:?}): transition to {}", t.to))?;
    }
  }

  store.refresh_ages().context("ageing seed issues")?;
  Ok(count)
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use chrono::{DateTime, TimeZone, Utc};
  use citypulse_core::{
    ErrorKind,
    filter::{self, DateWindow, FilterCriteria},
    issue::PriorityTier,
    urgency::ScoringConfig,
  };

  use super::*;

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() }

  fn store() -> (IssueStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(now()));
    let store =
      IssueStore::new(ScoringConfig::default(), clock.clone()).expect("default scoring");
    (store, clock)
  }

  #[test]
  fn loads_drafts_ages_and_transitions() {
    let raw = r#"[
      {
        "title": "Fallen tree across sidewalk",
        "description": "Branches are dangerous for pedestrians",
        "category": "Public Safety",
        "location": "Oak Street",
        "reporter_priority": "high",
        "age_hours": 72,
        "transitions": [
          { "to": "accepted" },
          { "to": "in-progress" },
          { "to": "completed", "notes": "Tree removed" }
        ]
      },
      { "title": "Graffiti", "category": "Vandalism", "location": "City Hall" }
    ]"#;

    let (mut s, clock) = store();
    assert_eq!(load(&mut s, &clock, raw).unwrap(), 2);
    assert_eq!(clock.now(), now());

    let issues: Vec<_> = s.list().collect();
    assert_eq!(issues[0].created_at(), now() - TimeDelta::hours(72));
    assert_eq!(issues[0].history()[2].at, now());
    assert_eq!(issues[0].signals().age_hours, 72);
    assert_eq!(issues[0].signals().reporter_priority, Some(PriorityTier::High));
    assert_eq!(issues[0].urgency_score(), 78);
    assert_eq!(issues[0].status(), Status::Completed);
    assert_eq!(issues[0].resolution_notes(), Some("Tree removed"));
    assert_eq!(issues[1].status(), Status::Reported);
    assert!(issues[1].is_anonymous());
  }

  #[test]
  fn illegal_transition_aborts_with_typed_error() {
    let raw = r#"[{
      "title": "Pothole",
      "category": "Infrastructure",
      "location": "Main St",
      "transitions": [{ "to": "completed", "notes": "filled" }]
    }]"#;

    let (mut s, clock) = store();
    let err = load(&mut s, &clock, raw).unwrap_err();
    let core = err
      .downcast_ref::<citypulse_core::Error>()
      .expect("core error in chain");
    assert_eq!(core.kind(), ErrorKind::InvalidTransition);
  }

  #[test]
  fn unknown_category_is_rejected() {
    let raw = r#"[{ "title": "Hmm", "category": "Potholes", "location": "Main St" }]"#;
    let (mut s, clock) = store();
    let err = load(&mut s, &clock, raw).unwrap_err();
    let core = err.downcast_ref::<citypulse_core::Error>().unwrap();
    assert_eq!(core.kind(), ErrorKind::Validation);
    assert_eq!(clock.now(), now());
  }

  #[test]
  fn seeded_age_matches_created_at() {
    let raw = r#"[
      { "title": "Old pothole", "category": "Infrastructure", "location": "Main St", "age_hours": 72 },
      { "title": "New pothole", "category": "Infrastructure", "location": "Main St" }
    ]"#;
    let (mut s, clock) = store();
    load(&mut s, &clock, raw).unwrap();

    let today = FilterCriteria { date_range: Some(DateWindow::Today), ..Default::default() };
    let titles: Vec<_> = filter::apply(s.list(), &today, clock.now())
      .iter()
      .map(|i| i.title())
      .collect();
    assert_eq!(titles, ["New pothole"]);

    assert_eq!(s.refresh_ages().unwrap(), 0);
    assert_eq!(s.list().next().unwrap().signals().age_hours, 72);
  }
}
