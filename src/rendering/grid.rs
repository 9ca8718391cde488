//! Convergence grid and best-config listing.
//!
//! ```text
//! solver            304K  1.1M  4.4M  17M  68M  270M  1.1B  4.3B
//! BPTT              120   -     88    -    -    -     -     -
//! 1SPSA (n=8)       -     410*  -     -    -    -     -     -
//! ...
//!
//! Best configs:
//! 1SPSA n=8 scale=2     iters=410*  lr=0.01    sat_alpha=?    status=still_training  loss=0.7
//! ```

use super::colors::Palette;
use crate::grid::{GridAggregator, GridTable};

const ROW_HEADER: &str = "solver";
const MISSING: &str = "-";

/// Render the fixed grid. Missing cells show as `-`.
pub fn render_grid(table: &GridTable, palette: &Palette) -> String {
    let label_width = table
        .rows
        .iter()
        .map(|(label, _)| label.chars().count())
        .chain(std::iter::once(ROW_HEADER.len()))
        .max()
        .unwrap_or(0);

    let col_widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(col, header)| {
            table
                .rows
                .iter()
                .filter_map(|(_, cells)| cells.get(col)?.as_ref())
                .map(|cell| cell.label.len())
                .chain([header.len(), MISSING.len()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut output = String::new();

    let mut header = palette.header(&format!("{ROW_HEADER:<label_width$}"));
    for (name, w) in table.columns.iter().zip(&col_widths) {
        header.push_str("  ");
        header.push_str(&palette.header(&format!("{name:<w$}", w = *w)));
    }
    output.push_str(header.trim_end());
    output.push('\n');

    for (label, cells) in &table.rows {
        let mut line = format!("{label:<label_width$}");
        for (cell, w) in cells.iter().zip(&col_widths) {
            line.push_str("  ");
            match cell {
                Some(cell) => {
                    let padded = format!("{:<w$}", cell.label, w = *w);
                    line.push_str(&palette.cell(&padded, cell.terminal));
                }
                None => line.push_str(&palette.dim(&format!("{MISSING:<w$}", w = *w))),
            }
        }
        output.push_str(line.trim_end());
        output.push('\n');
    }

    output
}

/// Every bucket with its representative, sorted by key.
pub fn render_best_configs(grid: &GridAggregator, palette: &Palette) -> String {
    let selections = grid.selections();
    let keys: Vec<String> = selections.iter().map(|(key, _)| key.to_string()).collect();
    let key_width = keys.iter().map(String::len).max().unwrap_or(0);

    let mut output = palette.header("Best configs:");
    output.push('\n');

    for (key, (_, sel)) in keys.iter().zip(&selections) {
        let r = sel.record;
        let status = format!("status={:<14}", r.status.as_str());
        let line = format!(
            "{key:<key_width$}  iters={:<7} lr={:<9} sat_alpha={:<6} {}  loss={}",
            sel.label(),
            r.learning_rate.as_str(),
            r.saturating_alpha.as_deref().unwrap_or("?"),
            palette.status(&status, r.status),
            r.final_loss.as_deref().unwrap_or("-"),
        );
        output.push_str(&line);
        output.push('\n');
    }

    output
}
