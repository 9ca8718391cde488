//! Bucketing and per-cell reduction.
//!
//! ## Source precedence
//!
//! Result files are authoritative for finished runs; session logs only
//! contribute runs that are still in progress. [`MergePolicy::admits`] is the
//! single place that decides this, so the outcome does not depend on which
//! source is fed first.
//!
//! ## Reduction
//!
//! | Bucket contents                      | Representative                | Label  |
//! |--------------------------------------|-------------------------------|--------|
//! | any converged/completed record       | fewest iterations among them  | `80`   |
//! | otherwise                            | most iterations overall       | `130*` |
//!
//! Ties go to the earliest contributed record.

use std::collections::BTreeMap;

use crate::types::{GridKey, RunRecord};

/// A record tagged with the source it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contribution {
    /// From a JSON result file.
    Artifact(RunRecord),
    /// From a captured session log.
    Session(RunRecord),
}

impl Contribution {
    pub fn into_record(self) -> RunRecord {
        match self {
            Contribution::Artifact(r) | Contribution::Session(r) => r,
        }
    }
}

/// Decides which contributions reach the grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergePolicy;

impl MergePolicy {
    pub fn admits(&self, contribution: &Contribution) -> bool {
        match contribution {
            Contribution::Artifact(_) => true,
            Contribution::Session(r) => r.status.is_in_progress(),
        }
    }
}

/// The record chosen to represent one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSelection<'a> {
    pub record: &'a RunRecord,
    /// Chosen from converged/completed records.
    pub terminal: bool,
}

impl CellSelection<'_> {
    /// Iteration count, suffixed with `*` when the run has not finished.
    pub fn label(&self) -> String {
        let iterations = self.record.effective_iterations();
        if self.terminal {
            iterations.to_string()
        } else {
            format!("{iterations}*")
        }
    }
}

/// Pick the representative of a bucket. `None` only for an empty slice.
pub fn reduce(bucket: &[RunRecord]) -> Option<CellSelection<'_>> {
    let fewest_terminal = bucket
        .iter()
        .filter(|r| r.status.is_terminal_success())
        .min_by_key(|r| r.effective_iterations());

    if let Some(record) = fewest_terminal {
        return Some(CellSelection {
            record,
            terminal: true,
        });
    }

    // max_by_key keeps the last maximum; fold keeps the first
    let furthest = bucket.iter().fold(None::<&RunRecord>, |best, r| match best {
        Some(b) if b.effective_iterations() >= r.effective_iterations() => Some(b),
        _ => Some(r),
    })?;

    Some(CellSelection {
        record: furthest,
        terminal: false,
    })
}

/// Records bucketed by (solver, perturbations, scale).
#[derive(Debug, Clone, Default)]
pub struct GridAggregator {
    policy: MergePolicy,
    buckets: BTreeMap<GridKey, Vec<RunRecord>>,
}

impl GridAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket result-file records, then in-progress session records.
    pub fn from_sources<A, S>(artifacts: A, sessions: S) -> Self
    where
        A: IntoIterator<Item = RunRecord>,
        S: IntoIterator<Item = RunRecord>,
    {
        let mut grid = Self::new();
        let contributions = artifacts
            .into_iter()
            .map(Contribution::Artifact)
            .chain(sessions.into_iter().map(Contribution::Session));

        let mut admitted = 0usize;
        for contribution in contributions {
            if grid.contribute(contribution) {
                admitted += 1;
            }
        }
        tracing::info!(admitted, cells = grid.buckets.len(), "aggregated grid contributions");
        grid
    }

    /// Add one contribution. Returns whether it landed in a bucket.
    ///
    /// Rejected when the policy refuses it or the record has no known scale.
    pub fn contribute(&mut self, contribution: Contribution) -> bool {
        if !self.policy.admits(&contribution) {
            return false;
        }

        let record = contribution.into_record();
        let Some(key) = record.grid_key() else {
            tracing::debug!(run = %record.screen_name, "record has no scale, not bucketed");
            return false;
        };
        self.buckets.entry(key).or_default().push(record);
        true
    }

    pub fn bucket(&self, key: &GridKey) -> Option<&[RunRecord]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &GridKey) -> bool {
        self.buckets.contains_key(key)
    }

    /// Representative of the bucket at `key`, if it exists.
    pub fn select(&self, key: &GridKey) -> Option<CellSelection<'_>> {
        self.bucket(key).and_then(reduce)
    }

    /// Every bucket with its representative, in key order.
    pub fn selections(&self) -> Vec<(&GridKey, CellSelection<'_>)> {
        self.buckets
            .iter()
            .filter_map(|(key, bucket)| reduce(bucket).map(|sel| (key, sel)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{record, RunStatus};

    #[test]
    fn test_fewest_terminal_iterations_win() {
        let bucket = vec![
            record("BPTT", RunStatus::Converged, 120),
            record("BPTT", RunStatus::Converged, 80),
            record("BPTT", RunStatus::StillTraining, 200),
        ];
        let sel = reduce(&bucket).unwrap();
        assert_eq!(sel.record.effective_iterations(), 80);
        assert_eq!(sel.record.status, RunStatus::Converged);
        assert_eq!(sel.label(), "80");
    }

    #[test]
    fn test_completed_counts_as_terminal() {
        let bucket = vec![
            record("BPTT", RunStatus::Converged, 300),
            record("BPTT", RunStatus::Completed, 250),
        ];
        assert_eq!(reduce(&bucket).unwrap().label(), "250");
    }

    #[test]
    fn test_all_in_progress_takes_furthest() {
        let bucket = vec![
            record("BPTT", RunStatus::StillTraining, 50),
            record("BPTT", RunStatus::Training, 130),
        ];
        let sel = reduce(&bucket).unwrap();
        assert!(!sel.terminal);
        assert_eq!(sel.label(), "130*");
    }

    #[test]
    fn test_diverged_is_not_terminal_success() {
        let bucket = vec![
            record("BPTT", RunStatus::Diverged, 10),
            record("BPTT", RunStatus::StillTraining, 40),
        ];
        assert_eq!(reduce(&bucket).unwrap().label(), "40*");
    }

    #[test]
    fn test_ties_keep_first_contribution() {
        let mut a = record("BPTT", RunStatus::StillTraining, 60);
        a.screen_name = "first".into();
        let mut b = record("BPTT", RunStatus::StillTraining, 60);
        b.screen_name = "second".into();
        let bucket = vec![a.clone(), b.clone()];
        assert_eq!(reduce(&bucket).unwrap().record.screen_name, "first");

        a.status = RunStatus::Converged;
        b.status = RunStatus::Converged;
        let bucket = vec![a, b];
        assert_eq!(reduce(&bucket).unwrap().record.screen_name, "first");
    }

    #[test]
    fn test_unknown_iterations_compete_as_zero() {
        let mut unknown = record("BPTT", RunStatus::Completed, 0);
        unknown.iterations = None;
        let bucket = vec![record("BPTT", RunStatus::Converged, 90), unknown];
        assert_eq!(reduce(&bucket).unwrap().label(), "0");
    }

    #[test]
    fn test_empty_bucket_has_no_selection() {
        assert!(reduce(&[]).is_none());
    }

    #[test]
    fn test_policy_filters_finished_sessions() {
        let policy = MergePolicy;
        let finished = record("BPTT", RunStatus::Converged, 10);
        let running = record("BPTT", RunStatus::StillTraining, 10);

        assert!(policy.admits(&Contribution::Artifact(finished.clone())));
        assert!(policy.admits(&Contribution::Session(running.clone())));
        assert!(policy.admits(&Contribution::Session(
            record("BPTT", RunStatus::Training, 1)
        )));
        assert!(!policy.admits(&Contribution::Session(finished)));
        assert!(!policy.admits(&Contribution::Session(record("BPTT", RunStatus::Completed, 1))));
    }

    #[test]
    fn test_artifact_beats_longer_running_session() {
        let artifact = record("1SPSA", RunStatus::Completed, 300);
        let session = record("1SPSA", RunStatus::StillTraining, 500);

        let grid = GridAggregator::from_sources(vec![artifact], vec![session]);
        let key = GridKey::new("1SPSA", None, 1);
        assert_eq!(grid.bucket(&key).map(<[_]>::len), Some(2));
        assert_eq!(grid.select(&key).unwrap().label(), "300");
    }

    #[test]
    fn test_records_without_scale_are_not_bucketed() {
        let mut r = record("BPTT", RunStatus::Converged, 10);
        r.scale = None;
        let mut grid = GridAggregator::new();
        assert!(!grid.contribute(Contribution::Artifact(r)));
        assert!(grid.is_empty());
    }

    #[test]
    fn test_selections_in_key_order() {
        let mut a = record("BPTT", RunStatus::Converged, 10);
        a.scale = Some(4);
        let b = record("1SPSA", RunStatus::Converged, 20);
        let c = record("BPTT", RunStatus::Converged, 30);

        let grid = GridAggregator::from_sources(vec![a, b, c], vec![]);
        assert_eq!(grid.len(), 3);
        let keys: Vec<_> = grid.selections().into_iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(
            keys,
            vec![
                GridKey::new("1SPSA", None, 1),
                GridKey::new("BPTT", None, 1),
                GridKey::new("BPTT", None, 4),
            ]
        );
    }
}
