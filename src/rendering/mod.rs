//! Report rendering - from records and grid selections to terminal text.
//!
//! Two reports:
//! - Run summary: flat table of parsed sessions plus status counts
//! - Convergence grid: fixed solver × scale grid plus the best-config listing

mod colors;
mod grid;
mod table;

pub use colors::{status_style, Palette};
pub use grid::{render_best_configs, render_grid};
pub use table::{RunRow, RunTable, COUNTED_STATUSES};
