//! Core types for sweepmap - run records and the model-size table.
//!
//! Key design decisions:
//! - Every field that can be missing is an `Option`; sentinels like `-` and
//!   `?` only appear at render time
//! - `iterations` keeps its "unknown sorts as zero" ordering through
//!   [`RunRecord::effective_iterations`]
//! - Records are immutable once built; aggregation only selects among them

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Converged,
    Diverged,
    /// Ran to its iteration budget without a convergence marker.
    Completed,
    /// Log shows progress markers below the iteration budget.
    StillTraining,
    /// Reported by a result file for a run that has not finished.
    Training,
}

impl RunStatus {
    /// All statuses in report order.
    pub const ALL: [RunStatus; 5] = [
        RunStatus::Completed,
        RunStatus::Converged,
        RunStatus::Diverged,
        RunStatus::StillTraining,
        RunStatus::Training,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Converged => "converged",
            RunStatus::Diverged => "diverged",
            RunStatus::Completed => "completed",
            RunStatus::StillTraining => "still_training",
            RunStatus::Training => "training",
        }
    }

    /// Converged or completed: the run reached the end of its budget.
    pub fn is_terminal_success(&self) -> bool {
        matches!(self, RunStatus::Converged | RunStatus::Completed)
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, RunStatus::StillTraining | RunStatus::Training)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "converged" => Ok(RunStatus::Converged),
            "diverged" => Ok(RunStatus::Diverged),
            "completed" => Ok(RunStatus::Completed),
            "still_training" => Ok(RunStatus::StillTraining),
            "training" => Ok(RunStatus::Training),
            other => Err(format!("unknown run status: {other}")),
        }
    }
}

/// Learning rate as it appeared in the source, or the binary-search marker.
///
/// Serializes as its display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearningRate {
    /// Text kept verbatim (or reformatted from a body assignment).
    Literal(String),
    /// Found by a binary learning-rate search; rendered as `binlr`.
    BinarySearch,
}

impl LearningRate {
    pub const BINARY_SEARCH_LABEL: &'static str = "binlr";

    pub fn as_str(&self) -> &str {
        match self {
            LearningRate::Literal(text) => text,
            LearningRate::BinarySearch => Self::BINARY_SEARCH_LABEL,
        }
    }
}

impl fmt::Display for LearningRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LearningRate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// One row of the model-size table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleInfo {
    pub scale: u32,
    pub hidden_size: u32,
    pub label: &'static str,
    pub parameters: u64,
}

/// Model sizes in grid column order.
pub const SCALES: [ScaleInfo; 8] = [
    ScaleInfo { scale: 1, hidden_size: 128, label: "304K", parameters: 304_128 },
    ScaleInfo { scale: 2, hidden_size: 256, label: "1.1M", parameters: 1_132_544 },
    ScaleInfo { scale: 4, hidden_size: 512, label: "4.4M", parameters: 4_362_240 },
    ScaleInfo { scale: 8, hidden_size: 1024, label: "17M", parameters: 17_113_088 },
    ScaleInfo { scale: 16, hidden_size: 2048, label: "68M", parameters: 67_780_608 },
    ScaleInfo { scale: 32, hidden_size: 4096, label: "270M", parameters: 269_778_944 },
    ScaleInfo { scale: 64, hidden_size: 8192, label: "1.1B", parameters: 1_076_428_800 },
    ScaleInfo { scale: 128, hidden_size: 16384, label: "4.3B", parameters: 4_300_341_248 },
];

/// Look up a known scale multiplier.
pub fn scale_info(scale: u32) -> Option<&'static ScaleInfo> {
    SCALES.iter().find(|info| info.scale == scale)
}

/// Map a hidden size to its scale multiplier.
pub fn scale_for_hidden_size(hidden_size: u64) -> Option<u32> {
    SCALES
        .iter()
        .find(|info| u64::from(info.hidden_size) == hidden_size)
        .map(|info| info.scale)
}

/// A single training run, from either a session log or a result file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunRecord {
    /// Session or artifact identifier. Opaque.
    pub screen_name: String,
    /// Solver family token, always non-empty.
    pub solver: String,
    pub perturbations: Option<u32>,
    /// Scale multiplier; only values from [`SCALES`] are ever stored.
    pub scale: Option<u32>,
    pub learning_rate: LearningRate,
    pub saturating_alpha: Option<String>,
    pub iterations: Option<u64>,
    pub final_loss: Option<String>,
    pub train_time: Option<String>,
    pub status: RunStatus,
}

impl RunRecord {
    /// Iteration count used for ordering; unknown counts as zero.
    pub fn effective_iterations(&self) -> u64 {
        self.iterations.unwrap_or(0)
    }

    /// Grid coordinates, if the scale is known.
    pub fn grid_key(&self) -> Option<GridKey> {
        let scale = self.scale?;
        Some(GridKey {
            solver: self.solver.clone(),
            perturbations: self.perturbations,
            scale,
        })
    }
}

/// Bucket identity in the convergence grid.
///
/// Ordering is solver, then perturbations (unknown first), then scale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridKey {
    pub solver: String,
    pub perturbations: Option<u32>,
    pub scale: u32,
}

impl GridKey {
    pub fn new(solver: impl Into<String>, perturbations: Option<u32>, scale: u32) -> Self {
        Self {
            solver: solver.into(),
            perturbations,
            scale,
        }
    }
}

impl fmt::Display for GridKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.perturbations {
            Some(n) => write!(f, "{} n={} scale={}", self.solver, n, self.scale),
            None => write!(f, "{} n=- scale={}", self.solver, self.scale),
        }
    }
}

#[cfg(test)]
pub(crate) fn record(solver: &str, status: RunStatus, iterations: u64) -> RunRecord {
    RunRecord {
        screen_name: format!("{solver}-{iterations}"),
        solver: solver.to_string(),
        perturbations: None,
        scale: Some(1),
        learning_rate: LearningRate::Literal("0.01".into()),
        saturating_alpha: None,
        iterations: Some(iterations),
        final_loss: None,
        train_time: None,
        status,
    }
}
