//! Fixed row/column layout of the convergence grid.
//!
//! Rows are (solver, perturbations) pairs, columns are the model scales of
//! [`SCALES`]. BPTT has no perturbations, so its row ignores them: the lookup
//! tries a fixed list of perturbation values and takes the first bucket that
//! exists.

use super::aggregate::{CellSelection, GridAggregator};
use crate::types::{GridKey, SCALES};

/// One grid row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRow {
    pub solver: &'static str,
    /// `None` for solvers that take no perturbations.
    pub perturbations: Option<u32>,
}

pub const BPTT: &str = "BPTT";

/// Perturbation values tried, in order, for the BPTT row.
pub const BPTT_PERTURBATION_FALLBACKS: [Option<u32>; 4] = [None, Some(1), Some(8), Some(96)];

/// Row order of the rendered grid.
pub const GRID_ROWS: [GridRow; 9] = [
    GridRow { solver: BPTT, perturbations: None },
    GridRow { solver: "1SPSA", perturbations: Some(8) },
    GridRow { solver: "1SPSA", perturbations: Some(96) },
    GridRow { solver: "1SPSA", perturbations: Some(512) },
    GridRow { solver: "1SPSA", perturbations: Some(1024) },
    GridRow { solver: "1.5-SPSA", perturbations: Some(8) },
    GridRow { solver: "1.5-SPSA", perturbations: Some(96) },
    GridRow { solver: "1.5-SPSA", perturbations: Some(512) },
    GridRow { solver: "1.5-SPSA", perturbations: Some(1024) },
];

impl GridRow {
    pub fn label(&self) -> String {
        match self.perturbations {
            Some(n) => format!("{} (n={})", self.solver, n),
            None => self.solver.to_string(),
        }
    }

    /// Bucket keys to try for this row at `scale`, in priority order.
    pub fn candidate_keys(&self, scale: u32) -> Vec<GridKey> {
        if self.solver == BPTT {
            BPTT_PERTURBATION_FALLBACKS
                .iter()
                .map(|&n| GridKey::new(self.solver, n, scale))
                .collect()
        } else {
            vec![GridKey::new(self.solver, self.perturbations, scale)]
        }
    }

    /// Representative for this row at `scale`: first candidate bucket present.
    pub fn lookup<'a>(&self, grid: &'a GridAggregator, scale: u32) -> Option<CellSelection<'a>> {
        self.candidate_keys(scale)
            .iter()
            .find(|key| grid.contains(key))
            .and_then(|key| grid.select(key))
    }
}

/// One filled grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCell {
    pub label: String,
    /// The representative converged or completed.
    pub terminal: bool,
}

impl From<CellSelection<'_>> for GridCell {
    fn from(sel: CellSelection<'_>) -> Self {
        Self {
            label: sel.label(),
            terminal: sel.terminal,
        }
    }
}

/// The grid resolved to cells, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridTable {
    /// Column headers (parameter-count labels).
    pub columns: Vec<&'static str>,
    /// Row label with one cell per column; `None` renders as `-`.
    pub rows: Vec<(String, Vec<Option<GridCell>>)>,
}

impl GridTable {
    pub fn build(grid: &GridAggregator) -> Self {
        let columns = SCALES.iter().map(|s| s.label).collect();
        let rows = GRID_ROWS
            .iter()
            .map(|row| {
                let cells = SCALES
                    .iter()
                    .map(|s| row.lookup(grid, s.scale).map(GridCell::from))
                    .collect();
                (row.label(), cells)
            })
            .collect();

        Self { columns, rows }
    }

    /// Cell at (row index, scale), if that cell is filled.
    pub fn grid_cell(&self, row: usize, scale: u32) -> Option<&GridCell> {
        let col = SCALES.iter().position(|s| s.scale == scale)?;
        self.rows.get(row)?.1.get(col)?.as_ref()
    }

    /// Cell label at (row index, scale), if that cell is filled.
    pub fn cell(&self, row: usize, scale: u32) -> Option<&str> {
        self.grid_cell(row, scale).map(|c| c.label.as_str())
    }
}
