//! Convergence grid: bucket runs by (solver, perturbations, scale), pick one
//! representative per bucket, and lay the result out in a fixed grid.

mod aggregate;
mod layout;

pub use aggregate::{reduce, CellSelection, Contribution, GridAggregator, MergePolicy};
pub use layout::{GridCell, GridRow, GridTable, BPTT, BPTT_PERTURBATION_FALLBACKS, GRID_ROWS};
