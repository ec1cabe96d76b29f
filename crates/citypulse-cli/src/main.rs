//! `citypulse`: command-line triage over a seeded issue set.
//!
//! # Usage
//!
//! ```text
//! citypulse --seed issues.json list --priority urgent --location "North Ward"
//! citypulse --config citypulse.toml stats --json
//! citypulse score --title "Exposed wires" --category "Public Safety" --age-hours 48
//! ```

mod render;
mod seed;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, Result, bail};
use citypulse_core::{
  Dashboard, IssueStore,
  clock::{Clock, ManualClock, SystemClock},
  filter::{FilterCriteria, FilterParams},
  issue::{Category, PriorityTier, UrgencySignals},
  urgency::{self, ScoringConfig, ScoringInput},
};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "Issue triage for the CityPulse dashboard")]
struct Cli {
  /// Path to a TOML configuration file.
  #[arg(short, long, default_value = "citypulse.toml")]
  config: PathBuf,

  /// JSON file of seed issues; overrides `seed_path` from the config.
  #[arg(long, env = "CITYPULSE_SEED")]
  seed: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List issues matching the given facets, most urgent first.
  List {
    #[command(flatten)]
    facets: FacetArgs,
    /// Print JSON instead of a table.
    #[arg(long)]
    json:   bool,
  },
  /// Aggregate statistics over issues matching the given facets.
  Stats {
    #[command(flatten)]
    facets: FacetArgs,
    #[arg(long)]
    json:   bool,
  },
  /// Score a hypothetical issue without storing it.
  Score {
    #[arg(long)]
    title:       String,
    #[arg(long)]
    category:    String,
    #[arg(long, default_value = "")]
    description: String,
    /// Reporter-perceived priority: urgent, high, medium or low.
    #[arg(long)]
    priority:    Option<PriorityTier>,
    #[arg(long, default_value_t = 0)]
    age_hours:   u32,
  },
  /// Print the score range of each priority tier.
  Legend,
}

/// Filter facets as typed on the command line. `all` means no constraint.
#[derive(Args, Debug, Default)]
struct FacetArgs {
  /// Case-insensitive text searched in title, description and location.
  #[arg(long, default_value = "")]
  search:   String,
  #[arg(long, default_value = "all")]
  category: String,
  #[arg(long, default_value = "all")]
  priority: String,
  #[arg(long, default_value = "all")]
  status:   String,
  /// Location or ward substring.
  #[arg(long, default_value = "all")]
  location: String,
  /// today, week, month or quarter.
  #[arg(long, default_value = "all")]
  since:    String,
}

impl TryFrom<FacetArgs> for FilterCriteria {
  type Error = citypulse_core::Error;

  fn try_from(args: FacetArgs) -> Result<Self, Self::Error> {
    FilterCriteria::try_from(FilterParams {
      search:     args.search,
      category:   args.category,
      priority:   args.priority,
      status:     args.status,
      location:   args.location,
      date_range: args.since,
    })
  }
}

// ─── Configuration ────────────────────────────────────────────────────────────

/// Layered settings: config file, then `CITYPULSE_*` environment variables.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Settings {
  seed_path: Option<PathBuf>,
  scoring:   ScoringConfig,
}

fn load_settings(path: PathBuf) -> Result<Settings> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("CITYPULSE")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("scoring.severity_keywords"),
    )
    .build()
    .context("failed to read configuration")?
    .try_deserialize()
    .context("failed to deserialise settings")
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = load_settings(cli.config)?;
  settings.scoring.validate().context("invalid scoring configuration")?;

  match cli.command {
    Command::List { facets, json } => {
      let dashboard = open_dashboard(cli.seed.or(settings.seed_path), settings.scoring)?;
      let criteria = FilterCriteria::try_from(facets)?;
      let visible = dashboard.visible(&criteria);
      tracing::debug!(
        facets = criteria.active_facets(),
        shown = visible.len(),
        total = dashboard.store().len(),
        "filtered"
      );
      if json {
        println!("{}", serde_json::to_string_pretty(&visible)?);
      } else {
        print!("{}", render::issue_table(&visible));
      }
    }
    Command::Stats { facets, json } => {
      let dashboard = open_dashboard(cli.seed.or(settings.seed_path), settings.scoring)?;
      let criteria = FilterCriteria::try_from(facets)?;
      let stats = citypulse_core::stats::IssueStats::compute(
        dashboard.visible(&criteria),
        dashboard.store().now(),
      );
      if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
      } else {
        print!("{}", render::stats(&stats));
      }
    }
    Command::Score { title, category, description, priority, age_hours } => {
      let assessment = urgency::assess(
        ScoringInput {
          category: Category::parse(&category)?,
          title: &title,
          description: &description,
          signals: UrgencySignals { reporter_priority: priority, age_hours },
        },
        &settings.scoring,
      );
      println!("{}", render::assessment(&assessment));
    }
    Command::Legend => print!("{}", render::legend(&urgency::legend())),
  }

  Ok(())
}

fn open_dashboard(seed: Option<PathBuf>, scoring: ScoringConfig) -> Result<Dashboard> {
  let Some(path) = seed else {
    bail!("no seed file; pass --seed or set seed_path in the config");
  };
  let raw = std::fs::read_to_string(&path)
    .with_context(|| format!("reading seed file {}", path.display()))?;

  // Frozen at start-up so every command sees one consistent "now".
  let clock = Arc::new(ManualClock::new(SystemClock.now()));
  let mut store = IssueStore::new(scoring, clock.clone())?;
  let count = seed::load(&mut store, &clock, &raw)
    .with_context(|| format!("loading seed file {}", path.display()))?;
  tracing::info!(count, path = %path.display(), "seed issues loaded");
  Ok(Dashboard::new(store))
}
