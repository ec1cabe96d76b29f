//! Urgency scoring.
//!
//! `score = clamp(base(category) + reporter(priority) + keywords(text) +
//! age(hours), 0, 100)`, then bucketed into a [`PriorityTier`] by the fixed
//! thresholds in [`TIER_THRESHOLDS`]. Scoring is pure: the age signal is
//! supplied by the caller and no clock is read here.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  issue::{Category, Issue, PriorityTier, UrgencySignals},
};

/// Upper bound of every urgency score.
pub const MAX_SCORE: u8 = 100;

/// Minimum score for each tier above [`PriorityTier::Low`], most urgent
/// first. Shared by the scorer and every legend.
pub const TIER_THRESHOLDS: [(PriorityTier, u8); 3] = [
  (PriorityTier::Urgent, 85),
  (PriorityTier::High, 60),
  (PriorityTier::Medium, 30),
];

impl PriorityTier {
  /// The tier a score falls into.
  pub fn from_score(score: u8) -> Self {
    TIER_THRESHOLDS
      .iter()
      .find(|(_, min)| score >= *min)
      .map(|(tier, _)| *tier)
      .unwrap_or(PriorityTier::Low)
  }
}

/// One row of a tier legend: the inclusive score range a tier covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
  pub tier: PriorityTier,
  pub min:  u8,
  pub max:  u8,
}

/// The tier legend, most urgent first, derived from [`TIER_THRESHOLDS`].
pub fn legend() -> Vec<LegendEntry> {
  let mut entries = Vec::with_capacity(TIER_THRESHOLDS.len() + 1);
  let mut upper = MAX_SCORE;
  for (tier, min) in TIER_THRESHOLDS {
    entries.push(LegendEntry { tier, min, max: upper });
    upper = min - 1;
  }
  entries.push(LegendEntry { tier: PriorityTier::Low, min: 0, max: upper });
  entries
}

// ─── Configuration ───────────────────────────────────────────────────────────

/// Base weight contributed by each category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryWeights {
  pub public_safety:  u8,
  pub infrastructure: u8,
  pub utilities:      u8,
  pub transportation: u8,
  pub environment:    u8,
  pub vandalism:      u8,
  pub noise:          u8,
  pub other:          u8,
}

impl Default for CategoryWeights {
  fn default() -> Self {
    Self {
      public_safety:  40,
      infrastructure: 30,
      utilities:      28,
      transportation: 25,
      environment:    20,
      vandalism:      15,
      noise:          10,
      other:          10,
    }
  }
}

impl CategoryWeights {
  pub fn weight(&self, category: Category) -> u8 {
    match category {
      Category::PublicSafety => self.public_safety,
      Category::Infrastructure => self.infrastructure,
      Category::Utilities => self.utilities,
      Category::Transportation => self.transportation,
      Category::Environment => self.environment,
      Category::Vandalism => self.vandalism,
      Category::Noise => self.noise,
      Category::Other => self.other,
    }
  }
}

/// Bonus for the reporter's own perception of urgency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterBonus {
  pub urgent: u8,
  pub high:   u8,
  pub medium: u8,
  pub low:    u8,
}

impl Default for ReporterBonus {
  fn default() -> Self {
    Self { urgent: 20, high: 12, medium: 6, low: 0 }
  }
}

impl ReporterBonus {
  pub fn bonus(&self, priority: Option<PriorityTier>) -> u8 {
    match priority {
      Some(PriorityTier::Urgent) => self.urgent,
      Some(PriorityTier::High) => self.high,
      Some(PriorityTier::Medium) => self.medium,
      Some(PriorityTier::Low) | None => self.low,
    }
  }
}

/// Tunable constants of the scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
  pub category_weights:    CategoryWeights,
  pub reporter_bonus:      ReporterBonus,
  /// Matched case-insensitively as substrings of title and description.
  pub severity_keywords:   Vec<String>,
  /// Added once per distinct matched keyword.
  pub keyword_bonus:       u8,
  /// Waiting time that earns one point of age bonus.
  pub hours_per_age_point: u32,
  pub max_age_bonus:       u8,
}

impl Default for ScoringConfig {
  fn default() -> Self {
    let severity_keywords = [
      "dangerous",
      "hazard",
      "unsafe",
      "injury",
      "emergency",
      "fire",
      "flood",
      "gas leak",
      "collapse",
      "exposed wire",
      "blocked",
      "accident",
    ];
    Self {
      category_weights:    CategoryWeights::default(),
      reporter_bonus:      ReporterBonus::default(),
      severity_keywords:   severity_keywords.into_iter().map(String::from).collect(),
      keyword_bonus:       8,
      hours_per_age_point: 4,
      max_age_bonus:       20,
    }
  }
}

impl ScoringConfig {
  pub fn validate(&self) -> Result<()> {
    if self.hours_per_age_point == 0 {
      return Err(Error::validation(
        "scoring.hours_per_age_point",
        "must be at least 1",
      ));
    }
    if self.severity_keywords.iter().any(|k| k.trim().is_empty()) {
      return Err(Error::validation(
        "scoring.severity_keywords",
        "keywords must not be blank",
      ));
    }
    Ok(())
  }
}

// ─── Scoring ─────────────────────────────────────────────────────────────────

/// The issue attributes the scorer reads.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
  pub category:    Category,
  pub title:       &'a str,
  pub description: &'a str,
  pub signals:     UrgencySignals,
}

impl<'a> From<&'a Issue> for ScoringInput<'a> {
  fn from(issue: &'a Issue) -> Self {
    Self {
      category:    issue.category(),
      title:       issue.title(),
      description: issue.description(),
      signals:     issue.signals(),
    }
  }
}

/// Scorer output: the score, its tier, and the keywords that contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrgencyAssessment {
  pub score:            u8,
  pub tier:             PriorityTier,
  pub matched_keywords: Vec<String>,
}

/// Score an issue under `config`.
pub fn assess(input: ScoringInput<'_>, config: &ScoringConfig) -> UrgencyAssessment {
  let matched_keywords = matched_keywords(input.title, input.description, config);

  let keyword_bonus = u32::from(config.keyword_bonus) * matched_keywords.len() as u32;
  let raw = u32::from(config.category_weights.weight(input.category))
    + u32::from(config.reporter_bonus.bonus(input.signals.reporter_priority))
    + keyword_bonus
    + u32::from(age_bonus(input.signals.age_hours, config));

  let score = raw.min(u32::from(MAX_SCORE)) as u8;
  UrgencyAssessment {
    score,
    tier: PriorityTier::from_score(score),
    matched_keywords,
  }
}

/// Non-decreasing in `age_hours`, capped at `max_age_bonus`.
pub fn age_bonus(age_hours: u32, config: &ScoringConfig) -> u8 {
  let points = age_hours / config.hours_per_age_point.max(1);
  points.min(u32::from(config.max_age_bonus)) as u8
}

/// Distinct configured keywords present in either text, in configuration
/// order.
fn matched_keywords(
  title: &str,
  description: &str,
  config: &ScoringConfig,
) -> Vec<String> {
  let haystack = format!("{}\n{}", title, description).to_lowercase();
  let mut seen = BTreeSet::new();
  config
    .severity_keywords
    .iter()
    .map(|k| k.trim().to_lowercase())
    .filter(|k| !k.is_empty() && haystack.contains(k.as_str()))
    .filter(|k| seen.insert(k.clone()))
    .collect()
}
