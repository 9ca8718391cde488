//! Result-file loader: one JSON artifact per run.
//!
//! Artifact layout:
//!
//! ```json
//! {
//!   "args": {"solver": "1SPSA", "num_perturbations": 8, "hidden_size": 512,
//!            "learning_rate": 0.001, "saturating_alpha": null},
//!   "status": "converged",
//!   "iters": 420,
//!   "final_loss": 0.012
//! }
//! ```
//!
//! Extraction is best-effort: numbers and strings are accepted
//! interchangeably, and anything that does not fit is treated as missing.
//! Files that fail to parse, runs still marked `training`, and runs whose
//! hidden size is not in the scale table are skipped, never reported as errors.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::discovery::find_result_files;
use crate::types::{scale_for_hidden_size, LearningRate, RunRecord, RunStatus};

/// Top-level artifact object.
#[derive(Debug, Deserialize)]
struct RawArtifact {
    #[serde(default)]
    args: Option<RawArgs>,
    #[serde(default)]
    status: Value,
    #[serde(default)]
    iters: Value,
    #[serde(default)]
    final_loss: Value,
    #[serde(default)]
    train_time: Value,
}

/// The `args` object: the command-line arguments the run was started with.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawArgs {
    solver: Value,
    num_perturbations: Value,
    hidden_size: Value,
    learning_rate: Value,
    saturating_alpha: Value,
}

/// Render a scalar as text; null, arrays and objects count as missing.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Non-negative integer from a number or numeric string.
fn integer(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Map an artifact status onto [`RunStatus`]; `None` means "exclude".
///
/// Unfinished runs are only ever sourced from session logs.
fn normalize_status(status: Option<&str>) -> Option<RunStatus> {
    match status {
        Some("training") => None,
        Some("success" | "converged") => Some(RunStatus::Converged),
        Some("diverged") => Some(RunStatus::Diverged),
        _ => Some(RunStatus::Completed),
    }
}

/// Convert one artifact document into a record.
///
/// `name` becomes the record's screen name (the file stem, by convention).
pub fn parse_artifact(name: &str, document: &str) -> Option<RunRecord> {
    let raw: RawArtifact = match serde_json::from_str(document) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!(artifact = name, error = %e, "skipping unparseable result file");
            return None;
        }
    };

    let status = normalize_status(raw.status.as_str())?;
    let args = raw.args.unwrap_or_default();

    let solver = text(&args.solver).filter(|s| !s.is_empty())?;
    let Some(scale) = integer(&args.hidden_size).and_then(scale_for_hidden_size) else {
        tracing::debug!(artifact = name, hidden_size = %args.hidden_size, "skipping unmapped hidden size");
        return None;
    };

    Some(RunRecord {
        screen_name: name.to_string(),
        solver,
        perturbations: integer(&args.num_perturbations).and_then(|n| u32::try_from(n).ok()),
        scale: Some(scale),
        learning_rate: text(&args.learning_rate)
            .map(LearningRate::Literal)
            .unwrap_or(LearningRate::BinarySearch),
        saturating_alpha: text(&args.saturating_alpha),
        iterations: integer(&raw.iters),
        final_loss: text(&raw.final_loss),
        train_time: text(&raw.train_time),
        status,
    })
}

/// Records loaded from a set of result files.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    records: Vec<RunRecord>,
    skipped: usize,
}

impl ResultStore {
    /// Build from `(name, document)` pairs already read into memory.
    pub fn from_documents<I, N, D>(documents: I) -> Self
    where
        I: IntoIterator<Item = (N, D)>,
        N: AsRef<str>,
        D: AsRef<str>,
    {
        let mut store = Self::default();
        for (name, document) in documents {
            match parse_artifact(name.as_ref(), document.as_ref()) {
                Some(record) => store.records.push(record),
                None => store.skipped += 1,
            }
        }
        store
    }

    /// Read every result file under `directory` that the config includes.
    ///
    /// Returns an error only if the directory itself cannot be walked;
    /// unreadable files are skipped like unparseable ones.
    pub fn load_dir(directory: &Path, config: &Config) -> Result<Self> {
        let files = find_result_files(directory, config)
            .with_context(|| format!("Failed to list result files in {}", directory.display()))?;

        let mut documents = Vec::with_capacity(files.len());
        let mut unreadable = 0usize;
        for path in &files {
            match std::fs::read_to_string(path) {
                Ok(content) => {
                    let name = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    documents.push((name, content));
                }
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "skipping unreadable result file");
                    unreadable += 1;
                }
            }
        }

        let mut store = Self::from_documents(documents);
        store.skipped += unreadable;

        tracing::info!(
            files = files.len(),
            records = store.records.len(),
            skipped = store.skipped,
            "loaded result files"
        );
        Ok(store)
    }

    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<RunRecord> {
        self.records
    }

    /// Documents that produced no record.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
