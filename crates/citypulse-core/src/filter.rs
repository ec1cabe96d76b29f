//! Facet filtering over the issue set.
//!
//! Every facet is an independent predicate and [`matches`] is their plain
//! conjunction, so narrowing one facet at a time yields the same subset as
//! applying all of them at once. Filtered subsets are snapshots: any store
//! mutation makes them stale and callers must re-run [`apply`].

use std::{cmp::Reverse, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
  Error, Result,
  issue::{Category, Issue, PriorityTier, Status},
};

/// Relative date window, measured back from a caller-supplied "now".
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DateWindow {
  /// Same UTC calendar day as "now".
  Today,
  /// The last 7 days.
  Week,
  /// The last 30 days.
  Month,
  /// The last 90 days.
  Quarter,
}

impl DateWindow {
  /// Whether `at` falls inside the window ending at `now`. Timestamps after
  /// `now` are outside every window.
  pub fn contains(self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    if at > now {
      return false;
    }
    let span = match self {
      Self::Today => return at.date_naive() == now.date_naive(),
      Self::Week => Duration::days(7),
      Self::Month => Duration::days(30),
      Self::Quarter => Duration::days(90),
    };
    now - at <= span
  }
}

// ─── Criteria ────────────────────────────────────────────────────────────────

/// Filter criteria owned by the view layer. `None` (or an empty search
/// string) is the "no constraint" sentinel for a facet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
  /// Case-insensitive substring of title, description or location.
  pub search_text:   String,
  pub category:      Option<Category>,
  pub priority_tier: Option<PriorityTier>,
  pub status:        Option<Status>,
  /// Substring of the location descriptor or ward tag; partial ward names
  /// match.
  pub location_tag:  Option<String>,
  pub date_range:    Option<DateWindow>,
}

impl FilterCriteria {
  /// Number of constrained facets, as shown on the filter badge.
  pub fn active_facets(&self) -> usize {
    [
      !self.search_text.trim().is_empty(),
      self.category.is_some(),
      self.priority_tier.is_some(),
      self.status.is_some(),
      self.location_tag.as_deref().is_some_and(|t| !t.trim().is_empty()),
      self.date_range.is_some(),
    ]
    .into_iter()
    .filter(|active| *active)
    .count()
  }

  pub fn is_unconstrained(&self) -> bool { self.active_facets() == 0 }
}

/// Filter values exactly as typed or selected in the UI. `"all"` and `""`
/// mean "no constraint".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterParams {
  pub search:     String,
  pub category:   String,
  pub priority:   String,
  pub status:     String,
  pub location:   String,
  pub date_range: String,
}

impl TryFrom<FilterParams> for FilterCriteria {
  type Error = Error;

  fn try_from(p: FilterParams) -> Result<Self> {
    Ok(Self {
      search_text:   p.search,
      category:      facet(&p.category, "category", Category::parse)?,
      priority_tier: facet(&p.priority, "priority", parse_enum)?,
      status:        facet(&p.status, "status", parse_enum)?,
      location_tag:  facet(&p.location, "location", |s| Ok(s.to_owned()))?,
      date_range:    facet(&p.date_range, "date_range", parse_enum)?,
    })
  }
}

/// Parse one UI facet value, mapping the sentinel to `None`.
fn facet<T>(
  raw: &str,
  field: &'static str,
  parse: impl FnOnce(&str) -> Result<T>,
) -> Result<Option<T>> {
  let raw = raw.trim();
  if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
    return Ok(None);
  }
  parse(raw).map(Some).map_err(|e| match e {
    Error::Validation { reason, .. } => Error::Validation { field, reason },
    other => other,
  })
}

fn parse_enum<T: FromStr>(raw: &str) -> Result<T> {
  T::from_str(raw)
    .map_err(|_| Error::validation("facet", format!("unknown value {raw:?}")))
}

// ─── Evaluation ──────────────────────────────────────────────────────────────

/// Whether `issue` satisfies every facet of `criteria`.
pub fn matches(issue: &Issue, criteria: &FilterCriteria, now: DateTime<Utc>) -> bool {
  matches_search(issue, &criteria.search_text)
    && criteria.category.is_none_or(|c| issue.category() == c)
    && criteria.priority_tier.is_none_or(|t| issue.priority_tier() == t)
    && criteria.status.is_none_or(|s| issue.status() == s)
    && criteria
      .location_tag
      .as_deref()
      .is_none_or(|tag| matches_location(issue, tag))
    && criteria
      .date_range
      .is_none_or(|w| w.contains(issue.created_at(), now))
}

fn matches_search(issue: &Issue, text: &str) -> bool {
  let needle = text.trim().to_lowercase();
  if needle.is_empty() {
    return true;
  }
  [issue.title(), issue.description(), issue.location()]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

fn matches_location(issue: &Issue, tag: &str) -> bool {
  let tag = tag.trim();
  tag.is_empty()
    || issue.location().contains(tag)
    || issue.ward().is_some_and(|w| w.contains(tag))
}

/// The issues matching `criteria`, in input order.
pub fn apply<'a, I>(
  issues: I,
  criteria: &FilterCriteria,
  now: DateTime<Utc>,
) -> Vec<&'a Issue>
where
  I: IntoIterator<Item = &'a Issue>,
{
  issues
    .into_iter()
    .filter(|issue| matches(issue, criteria, now))
    .collect()
}

/// Order a subset most urgent first; ties go to the longest-waiting issue,
/// then to the id so the order is total.
pub fn rank(issues: &mut [&Issue]) {
  issues.sort_by_key(|i| (Reverse(i.urgency_score()), i.created_at(), i.id()));
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap() }

  #[test]
  fn today_is_the_calendar_day() {
    let now = now();
    let morning = Utc.with_ymd_and_hms(2024, 3, 15, 0, 5, 0).unwrap();
    let yesterday = Utc.with_ymd_and_hms(2024, 3, 14, 23, 55, 0).unwrap();
    assert!(DateWindow::Today.contains(morning, now));
    assert!(!DateWindow::Today.contains(yesterday, now));
    assert!(DateWindow::Week.contains(yesterday, now));
  }

  #[test]
  fn windows_are_nested() {
    let now = now();
    let cases = [
      (Duration::days(3), [false, true, true, true]),
      (Duration::days(20), [false, false, true, true]),
      (Duration::days(60), [false, false, false, true]),
      (Duration::days(200), [false, false, false, false]),
    ];
    let windows =
      [DateWindow::Today, DateWindow::Week, DateWindow::Month, DateWindow::Quarter];
    for (ago, expected) in cases {
      for (window, want) in windows.iter().zip(expected) {
        assert_eq!(window.contains(now - ago, now), want, "{window} {ago}");
      }
    }
  }

  #[test]
  fn future_timestamps_never_match() {
    let now = now();
    assert!(!DateWindow::Quarter.contains(now + Duration::minutes(1), now));
    assert!(!DateWindow::Today.contains(now + Duration::minutes(1), now));
  }

  #[test]
  fn params_sentinels_map_to_none() {
    let criteria = FilterCriteria::try_from(FilterParams {
      category: "all".into(),
      priority: "ALL".into(),
      status: String::new(),
      location: "all".into(),
      date_range: " ".into(),
      ..Default::default()
    })
    .unwrap();
    assert!(criteria.is_unconstrained());
  }

  #[test]
  fn params_parse_values() {
    let criteria = FilterCriteria::try_from(FilterParams {
      search: "pothole".into(),
      category: "Public Safety".into(),
      priority: "urgent".into(),
      status: "in-progress".into(),
      location: "North".into(),
      date_range: "week".into(),
    })
    .unwrap();
    assert_eq!(criteria.category, Some(Category::PublicSafety));
    assert_eq!(criteria.priority_tier, Some(PriorityTier::Urgent));
    assert_eq!(criteria.status, Some(Status::InProgress));
    assert_eq!(criteria.location_tag.as_deref(), Some("North"));
    assert_eq!(criteria.date_range, Some(DateWindow::Week));
    assert_eq!(criteria.active_facets(), 6);
  }

  #[test]
  fn params_reject_unknown_values() {
    let err = FilterCriteria::try_from(FilterParams {
      date_range: "fortnight".into(),
      ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, Error::Validation { field: "date_range", .. }));

    let err = FilterCriteria::try_from(FilterParams {
      category: "Potholes".into(),
      ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, Error::Validation { field: "category", .. }));
  }
}
