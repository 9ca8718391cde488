//! sweepmap - convergence tables from training-session logs
//!
//! Turns captured screen-session output and per-run JSON result files into
//! two reports: a run summary sorted by iterations, and a convergence grid
//! showing, per (solver, perturbations, scale), the fewest iterations any
//! hyperparameter setting needed to finish.
//!
//! # Architecture
//!
//! ```text
//! session log ──→ SessionParser ──┐
//!                  (rule pipeline) ├──→ RunRecord ──→ GridAggregator ──→ GridTable ──→ render
//! results/*.json ─→ ResultStore ───┘        │           (merge policy,
//!                                           │            reduction)
//!                                           └──→ RunTable ──→ render
//! ```
//!
//! Data flows one way. Parsing, loading from text, aggregation and rendering
//! are pure; only [`ResultStore::load_dir`] and the binary touch the
//! filesystem.

pub mod config;
pub mod discovery;
pub mod extraction;
pub mod grid;
pub mod rendering;
pub mod results;
pub mod types;

pub use config::Config;
pub use extraction::SessionParser;
pub use grid::{CellSelection, Contribution, GridAggregator, GridTable, MergePolicy};
pub use rendering::{Palette, RunTable};
pub use results::ResultStore;
pub use types::{GridKey, LearningRate, RunRecord, RunStatus, ScaleInfo, SCALES};
