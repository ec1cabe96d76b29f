//! Aggregate statistics for the dashboard header and analytics cards.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::issue::{Category, Issue, PriorityTier, Status};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueStats {
  pub total:             usize,
  /// Issues not yet completed or rejected.
  pub open:              usize,
  /// Every tier, category and status appears, with zero counts included.
  pub by_tier:           BTreeMap<PriorityTier, usize>,
  pub by_category:       BTreeMap<Category, usize>,
  pub by_status:         BTreeMap<Status, usize>,
  /// `None` for an empty set.
  pub mean_score:        Option<f64>,
  /// Completed within the 24 hours before "now".
  pub resolved_last_day: usize,
  /// Completed share of closed issues; `None` until something is closed.
  pub resolution_rate:   Option<f64>,
}

impl IssueStats {
  pub fn compute<'a>(
    issues: impl IntoIterator<Item = &'a Issue>,
    now: DateTime<Utc>,
  ) -> Self {
    let mut by_tier: BTreeMap<_, _> = PriorityTier::iter().map(|t| (t, 0)).collect();
    let mut by_category: BTreeMap<_, _> = Category::iter().map(|c| (c, 0)).collect();
    let mut by_status: BTreeMap<_, _> = Status::iter().map(|s| (s, 0)).collect();

    let mut total = 0;
    let mut score_sum = 0u64;
    let mut resolved_last_day = 0;
    for issue in issues {
      total += 1;
      score_sum += u64::from(issue.urgency_score());
      *by_tier.entry(issue.priority_tier()).or_default() += 1;
      *by_category.entry(issue.category()).or_default() += 1;
      *by_status.entry(issue.status()).or_default() += 1;
      if completed_within(issue, now, Duration::hours(24)) {
        resolved_last_day += 1;
      }
    }

    let count = |s: Status| by_status.get(&s).copied().unwrap_or(0);
    let completed = count(Status::Completed);
    let closed = completed + count(Status::Rejected);

    Self {
      total,
      open: total - closed,
      mean_score: (total > 0).then(|| score_sum as f64 / total as f64),
      resolved_last_day,
      resolution_rate: (closed > 0).then(|| completed as f64 / closed as f64),
      by_tier,
      by_category,
      by_status,
    }
  }
}

fn completed_within(issue: &Issue, now: DateTime<Utc>, span: Duration) -> bool {
  issue
    .history()
    .iter()
    .rev()
    .find(|change| change.to == Status::Completed)
    .is_some_and(|change| change.at <= now && now - change.at <= span)
}
