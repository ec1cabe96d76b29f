//! Issue triage and view-synchronisation engine for the CityPulse dashboard.
//!
//! The crate is synchronous and free of I/O. Hosts supply a [`clock::Clock`]
//! and, optionally, a [`store::Persistence`] delegate; everything else is
//! in-memory.

pub mod clock;
pub mod error;
pub mod filter;
pub mod issue;
pub mod lifecycle;
pub mod selection;
pub mod session;
pub mod stats;
pub mod store;
pub mod urgency;

pub use error::{Error, ErrorKind, Result};
pub use session::Dashboard;
pub use store::IssueStore;
