//! Run summary table: every parsed session, fewest iterations first.
//!
//! ```text
//! iters   solver    lr       final_loss  train_time  status          screen
//! 0       BPTT      binlr    -           -           still_training  412.SOLV_BPTT_binlr_
//! 400     1SPSA     0.01     0.023       55.2        converged       123.SOLV_1SPSA_lr0.01
//!
//! completed: 0  converged: 1  diverged: 0  still_training: 1  total: 2
//! ```

use super::colors::Palette;
use crate::types::{RunRecord, RunStatus};

/// Statuses counted in the footer, in display order.
pub const COUNTED_STATUSES: [RunStatus; 4] = [
    RunStatus::Completed,
    RunStatus::Converged,
    RunStatus::Diverged,
    RunStatus::StillTraining,
];

const HEADERS: [&str; 7] = [
    "iters",
    "solver",
    "lr",
    "final_loss",
    "train_time",
    "status",
    "screen",
];

/// One rendered row, all cells as display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRow {
    pub iterations: String,
    pub solver: String,
    pub learning_rate: String,
    pub final_loss: String,
    pub train_time: String,
    pub status: RunStatus,
    pub screen_name: String,
}

impl RunRow {
    fn from_record(record: &RunRecord) -> Self {
        Self {
            iterations: record.effective_iterations().to_string(),
            solver: record.solver.clone(),
            learning_rate: record.learning_rate.to_string(),
            final_loss: record.final_loss.clone().unwrap_or_else(|| "-".into()),
            train_time: record.train_time.clone().unwrap_or_else(|| "-".into()),
            status: record.status,
            screen_name: record.screen_name.clone(),
        }
    }

    fn cells(&self) -> [&str; 7] {
        [
            self.iterations.as_str(),
            self.solver.as_str(),
            self.learning_rate.as_str(),
            self.final_loss.as_str(),
            self.train_time.as_str(),
            self.status.as_str(),
            self.screen_name.as_str(),
        ]
    }
}

/// Sorted rows plus per-status counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTable {
    pub rows: Vec<RunRow>,
    /// Count per entry of [`COUNTED_STATUSES`].
    pub counts: [(RunStatus, usize); 4],
    pub total: usize,
}

impl RunTable {
    /// Stable sort by iterations, so equal counts keep input order.
    pub fn build(records: &[RunRecord]) -> Self {
        let mut sorted: Vec<&RunRecord> = records.iter().collect();
        sorted.sort_by_key(|r| r.effective_iterations());

        let counts = COUNTED_STATUSES
            .map(|status| (status, records.iter().filter(|r| r.status == status).count()));

        Self {
            rows: sorted.into_iter().map(RunRow::from_record).collect(),
            counts,
            total: records.len(),
        }
    }

    pub fn count(&self, status: RunStatus) -> usize {
        self.counts
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    /// Render as aligned columns with a counts footer.
    pub fn render(&self, palette: &Palette) -> String {
        let mut widths = HEADERS.map(str::len);
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row.cells()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut output = String::new();

        let header: Vec<String> = HEADERS
            .iter()
            .zip(widths)
            .map(|(h, w)| palette.header(&format!("{h:<w$}")))
            .collect();
        output.push_str(header.join("  ").trim_end());
        output.push('\n');

        for row in &self.rows {
            let cells: Vec<String> = row
                .cells()
                .iter()
                .zip(widths)
                .enumerate()
                .map(|(i, (cell, w))| {
                    let padded = format!("{cell:<w$}");
                    match i {
                        5 => palette.status(&padded, row.status),
                        6 => palette.dim(&padded),
                        _ => padded,
                    }
                })
                .collect();
            output.push_str(cells.join("  ").trim_end());
            output.push('\n');
        }

        output.push('\n');
        let footer: Vec<String> = self
            .counts
            .iter()
            .map(|(status, n)| format!("{status}: {n}"))
            .collect();
        output.push_str(&footer.join("  "));
        output.push_str(&format!("  total: {}\n", self.total));
        output
    }
}
