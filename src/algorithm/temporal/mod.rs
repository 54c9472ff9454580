//! Nearest-visit temporal matching
//!
//! This module pairs longitudinal imaging observations with clinical visits.
//! It includes:
//!
//! 1. Typed extraction and validation of the two input tables
//! 2. Removal of average-of-sessions rows and field strength deduplication
//! 3. A per-subject visit index with a deterministic nearest-date lookup
//! 4. Assembly of the merged table in canonical column order
//!
//! Equidistant visits resolve to the earlier visit date, and visits sharing
//! a date resolve to the earliest clinical row.

pub mod config;
pub mod extraction;
pub mod layout;
pub mod matcher;
pub mod preparation;
pub mod types;
pub mod visits;

// Re-export key types
pub use config::{MatcherConfig, MatcherConfigBuilder};
pub use layout::{ColumnSource, OutputColumn, OutputLayout};
pub use matcher::{TemporalMatcher, nearest_match};
pub use preparation::{deduplicate, filter_averages};
pub use types::{MergeResult, MergeStats, Observation, SubjectId, Visit, VisitMatch};
pub use visits::VisitIndex;
