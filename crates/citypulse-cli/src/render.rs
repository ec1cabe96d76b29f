//! Plain-text rendering for terminal output.

use std::fmt::Write as _;

use citypulse_core::{
  issue::Issue,
  stats::IssueStats,
  urgency::{LegendEntry, UrgencyAssessment},
};

pub fn issue_table(issues: &[&Issue]) -> String {
  let mut out = String::new();
  for issue in issues {
    let _ = writeln!(
      out,
      "{reference:<11}  {tier:<6} {score:>3}  {status:<11}  {category:<15}  {title} @ {location}",
      reference = issue.id().reference(),
      tier = issue.priority_tier().to_string(),
      score = issue.urgency_score(),
      status = issue.status().to_string(),
      category = issue.category().to_string(),
      title = issue.title(),
      location = issue.location(),
    );
  }
  let _ = writeln!(out, "{} issue(s)", issues.len());
  out
}

pub fn stats(stats: &IssueStats) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "total:             {}", stats.total);
  let _ = writeln!(out, "open:              {}", stats.open);
  let _ = writeln!(out, "resolved (24h):    {}", stats.resolved_last_day);
  if let Some(mean) = stats.mean_score {
    let _ = writeln!(out, "mean score:        {mean:.1}");
  }
  if let Some(rate) = stats.resolution_rate {
    let _ = writeln!(out, "resolution rate:   {:.1}%", rate * 100.0);
  }

  let _ = writeln!(out, "\nby tier:");
  for (tier, n) in stats.by_tier.iter().rev() {
    let _ = writeln!(out, "  {:<16} {n}", tier.to_string());
  }
  let _ = writeln!(out, "\nby status:");
  for (status, n) in &stats.by_status {
    let _ = writeln!(out, "  {:<16} {n}", status.to_string());
  }
  let _ = writeln!(out, "\nby category:");
  for (category, n) in &stats.by_category {
    let _ = writeln!(out, "  {:<16} {n}", category.to_string());
  }
  out
}

pub fn assessment(a: &UrgencyAssessment) -> String {
  let keywords = if a.matched_keywords.is_empty() {
    "none".to_owned()
  } else {
    a.matched_keywords.join(", ")
  };
  format!("score {} ({})  keywords: {keywords}", a.score, a.tier)
}

pub fn legend(entries: &[LegendEntry]) -> String {
  let mut out = String::new();
  for e in entries {
    let _ = writeln!(out, "{:<7} {:>3}-{}", e.tier.to_string(), e.min, e.max);
  }
  out
}
