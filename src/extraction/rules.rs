//! Named extraction rules and the record builder they feed.
//!
//! Each rule is an independent probe over a [`SessionBlock`] that returns an
//! optional [`Extraction`]. Rules run left to right in [`RULES`] order. The
//! rule's [`Merge`] policy decides what happens when its slot already holds a
//! value:
//!
//! - `FirstWins` expresses a fallback chain: later alternatives only fill an
//!   empty slot (learning rate, saturating alpha, diverged before converged).
//! - `Overwrite` replaces whatever an earlier rule wrote. The progress probe
//!   is the only such rule: a block with iteration markers reports progress
//!   even when it also carries a terminal status line.

use super::patterns;
use super::session::SessionBlock;
use crate::types::{scale_for_hidden_size, scale_info, LearningRate, RunRecord, RunStatus};

/// What a rule does when its slot is already filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    FirstWins,
    Overwrite,
}

/// Builder slot a rule writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    ScreenName,
    Solver,
    LearningRate,
    SaturatingAlpha,
    Perturbations,
    Scale,
    /// Status plus the iteration/loss/time fields resolved with it.
    Status,
}

/// A value recovered by one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    ScreenName(String),
    Solver(String),
    LearningRate(LearningRate),
    SaturatingAlpha(String),
    Perturbations(u32),
    Scale(u32),
    /// `status diverged|converged|success iters N` with the optional
    /// end-of-training summary lines.
    Terminal {
        status: RunStatus,
        iterations: u64,
        final_loss: Option<String>,
        train_time: Option<String>,
    },
    /// Last `Iteration n/max ... Train Loss: x` marker.
    Progress {
        iterations: u64,
        max_iterations: u64,
        train_loss: String,
    },
}

impl Extraction {
    pub fn slot(&self) -> Slot {
        match self {
            Extraction::ScreenName(_) => Slot::ScreenName,
            Extraction::Solver(_) => Slot::Solver,
            Extraction::LearningRate(_) => Slot::LearningRate,
            Extraction::SaturatingAlpha(_) => Slot::SaturatingAlpha,
            Extraction::Perturbations(_) => Slot::Perturbations,
            Extraction::Scale(_) => Slot::Scale,
            Extraction::Terminal { .. } | Extraction::Progress { .. } => Slot::Status,
        }
    }
}

type Probe = fn(&SessionBlock<'_>) -> Option<Extraction>;

/// A named probe with its merge policy.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub merge: Merge,
    pub probe: Probe,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("merge", &self.merge)
            .finish()
    }
}

/// The extraction pipeline, in application order.
pub const RULES: &[Rule] = &[
    Rule { name: "screen_name", merge: Merge::FirstWins, probe: screen_name },
    Rule { name: "solver", merge: Merge::FirstWins, probe: solver },
    Rule { name: "lr_from_name", merge: Merge::FirstWins, probe: lr_from_name },
    Rule { name: "lr_from_body", merge: Merge::FirstWins, probe: lr_from_body },
    Rule { name: "lr_binary_search", merge: Merge::FirstWins, probe: lr_binary_search },
    Rule { name: "saturating_alpha", merge: Merge::FirstWins, probe: saturating_alpha },
    Rule { name: "saturating_alpha_label", merge: Merge::FirstWins, probe: saturating_alpha_label },
    Rule { name: "perturbations_from_body", merge: Merge::FirstWins, probe: perturbations_from_body },
    Rule { name: "perturbations_from_name", merge: Merge::FirstWins, probe: perturbations_from_name },
    Rule { name: "scale_from_body", merge: Merge::FirstWins, probe: scale_from_body },
    Rule { name: "scale_from_name", merge: Merge::FirstWins, probe: scale_from_name },
    Rule { name: "status_diverged", merge: Merge::FirstWins, probe: status_diverged },
    Rule { name: "status_converged", merge: Merge::FirstWins, probe: status_converged },
    Rule { name: "progress", merge: Merge::Overwrite, probe: progress },
];

// ============================================================================
// PROBES
// ============================================================================

fn screen_name(block: &SessionBlock<'_>) -> Option<Extraction> {
    block
        .name_line()
        .split_whitespace()
        .next()
        .map(|token| Extraction::ScreenName(token.to_string()))
}

fn solver(block: &SessionBlock<'_>) -> Option<Extraction> {
    let caps = patterns::SOLVER.captures(block.text())?;
    Some(Extraction::Solver(caps[1].to_string()))
}

fn lr_from_name(block: &SessionBlock<'_>) -> Option<Extraction> {
    let caps = patterns::NAME_LEARNING_RATE.captures(block.name_line())?;
    Some(Extraction::LearningRate(LearningRate::Literal(caps[1].to_string())))
}

fn lr_from_body(block: &SessionBlock<'_>) -> Option<Extraction> {
    let caps = patterns::BODY_LEARNING_RATE.captures(block.text())?;
    Some(Extraction::LearningRate(LearningRate::Literal(scientific_2sig(&caps[1]))))
}

fn lr_binary_search(block: &SessionBlock<'_>) -> Option<Extraction> {
    block
        .name_line()
        .contains("_binlr_")
        .then_some(Extraction::LearningRate(LearningRate::BinarySearch))
}

fn saturating_alpha(block: &SessionBlock<'_>) -> Option<Extraction> {
    let caps = patterns::SATURATING_ALPHA.captures(block.text())?;
    Some(Extraction::SaturatingAlpha(caps[1].to_string()))
}

fn saturating_alpha_label(block: &SessionBlock<'_>) -> Option<Extraction> {
    let caps = patterns::SATURATING_ALPHA_LABEL.captures(block.text())?;
    Some(Extraction::SaturatingAlpha(caps[1].to_string()))
}

fn perturbations_from_body(block: &SessionBlock<'_>) -> Option<Extraction> {
    let caps = patterns::NUM_PERTURBATIONS.captures(block.text())?;
    caps[1].parse().ok().map(Extraction::Perturbations)
}

fn perturbations_from_name(block: &SessionBlock<'_>) -> Option<Extraction> {
    let caps = patterns::NAME_PERTURBATIONS.captures(block.name_line())?;
    caps[1].parse().ok().map(Extraction::Perturbations)
}

fn scale_from_body(block: &SessionBlock<'_>) -> Option<Extraction> {
    let caps = patterns::HIDDEN_SIZE.captures(block.text())?;
    let hidden_size: u64 = caps[1].parse().ok()?;
    scale_for_hidden_size(hidden_size).map(Extraction::Scale)
}

fn scale_from_name(block: &SessionBlock<'_>) -> Option<Extraction> {
    let caps = patterns::NAME_SCALE.captures(block.name_line())?;
    let scale: u32 = caps[1].parse().ok()?;
    scale_info(scale).map(|info| Extraction::Scale(info.scale))
}

fn status_diverged(block: &SessionBlock<'_>) -> Option<Extraction> {
    terminal(block, &patterns::STATUS_DIVERGED, RunStatus::Diverged)
}

fn status_converged(block: &SessionBlock<'_>) -> Option<Extraction> {
    terminal(block, &patterns::STATUS_CONVERGED, RunStatus::Converged)
}

fn terminal(block: &SessionBlock<'_>, pattern: &regex::Regex, status: RunStatus) -> Option<Extraction> {
    let text = block.text();
    let caps = pattern.captures(text)?;
    let iterations = caps[1].parse().ok()?;
    let final_loss = patterns::FINAL_LOSS
        .captures(text)
        .map(|c| c[1].to_string());
    let train_time = patterns::TRAIN_TIME
        .captures(text)
        .map(|c| c[1].to_string());

    Some(Extraction::Terminal {
        status,
        iterations,
        final_loss,
        train_time,
    })
}

/// Last progress marker by position in the text, not by iteration value.
fn progress(block: &SessionBlock<'_>) -> Option<Extraction> {
    let caps = patterns::PROGRESS.captures_iter(block.text()).last()?;
    Some(Extraction::Progress {
        iterations: caps[1].parse().ok()?,
        max_iterations: caps[2].parse().ok()?,
        train_loss: caps[3].to_string(),
    })
}

/// Reformat a number as `d.de±XX`; unparseable text is returned unchanged.
pub fn scientific_2sig(raw: &str) -> String {
    let Ok(value) = raw.parse::<f64>() else {
        return raw.to_string();
    };
    if !value.is_finite() {
        return raw.to_string();
    }

    let formatted = format!("{value:.1e}");
    let Some((mantissa, exponent)) = formatted.split_once('e') else {
        return formatted;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return formatted;
    };
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.abs())
}

// ============================================================================
// BUILDER
// ============================================================================

/// Accumulates extractions for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordBuilder {
    screen_name: Option<String>,
    solver: Option<String>,
    learning_rate: Option<LearningRate>,
    saturating_alpha: Option<String>,
    perturbations: Option<u32>,
    scale: Option<u32>,
    status: Option<RunStatus>,
    iterations: Option<u64>,
    final_loss: Option<String>,
    train_time: Option<String>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_filled(&self, slot: Slot) -> bool {
        match slot {
            Slot::ScreenName => self.screen_name.is_some(),
            Slot::Solver => self.solver.is_some(),
            Slot::LearningRate => self.learning_rate.is_some(),
            Slot::SaturatingAlpha => self.saturating_alpha.is_some(),
            Slot::Perturbations => self.perturbations.is_some(),
            Slot::Scale => self.scale.is_some(),
            Slot::Status => self.status.is_some(),
        }
    }

    /// Apply one extraction under `merge`. Returns whether it was written.
    pub fn apply(&mut self, extraction: Extraction, merge: Merge) -> bool {
        if merge == Merge::FirstWins && self.is_filled(extraction.slot()) {
            return false;
        }

        match extraction {
            Extraction::ScreenName(name) => self.screen_name = Some(name),
            Extraction::Solver(solver) => self.solver = Some(solver),
            Extraction::LearningRate(lr) => self.learning_rate = Some(lr),
            Extraction::SaturatingAlpha(alpha) => self.saturating_alpha = Some(alpha),
            Extraction::Perturbations(n) => self.perturbations = Some(n),
            Extraction::Scale(scale) => self.scale = Some(scale),
            Extraction::Terminal {
                status,
                iterations,
                final_loss,
                train_time,
            } => {
                self.status = Some(status);
                self.iterations = Some(iterations);
                self.final_loss = final_loss;
                self.train_time = train_time;
            }
            Extraction::Progress {
                iterations,
                max_iterations,
                train_loss,
            } => {
                self.status = Some(if iterations >= max_iterations {
                    RunStatus::Completed
                } else {
                    RunStatus::StillTraining
                });
                self.iterations = Some(iterations);
                self.final_loss = Some(train_loss);
                self.train_time = None;
            }
        }
        true
    }

    /// Run every rule against `block` in order.
    pub fn apply_rules(&mut self, rules: &[Rule], block: &SessionBlock<'_>) {
        for rule in rules {
            if let Some(extraction) = (rule.probe)(block) {
                let written = self.apply(extraction, rule.merge);
                tracing::trace!(rule = rule.name, written, "extraction rule matched");
            }
        }
    }

    /// Finish the record; `None` unless both solver and status are known.
    pub fn build(self) -> Option<RunRecord> {
        let solver = self.solver.filter(|s| !s.is_empty())?;
        let status = self.status?;

        Some(RunRecord {
            screen_name: self.screen_name.unwrap_or_default(),
            solver,
            perturbations: self.perturbations,
            scale: self.scale,
            learning_rate: self.learning_rate.unwrap_or(LearningRate::BinarySearch),
            saturating_alpha: self.saturating_alpha,
            iterations: self.iterations,
            final_loss: self.final_loss,
            train_time: self.train_time,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> RecordBuilder {
        let block = SessionBlock::new(text);
        let mut builder = RecordBuilder::new();
        builder.apply_rules(RULES, &block);
        builder
    }

    #[test]
    fn test_rule_order() {
        let names: Vec<_> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(names.first(), Some(&"screen_name"));
        assert_eq!(names.last(), Some(&"progress"));

        let pos = |name: &str| names.iter().position(|n| *n == name).unwrap();
        assert!(pos("lr_from_name") < pos("lr_from_body"));
        assert!(pos("lr_from_body") < pos("lr_binary_search"));
        assert!(pos("status_diverged") < pos("status_converged"));

        let overwriting: Vec<_> = RULES
            .iter()
            .filter(|r| r.merge == Merge::Overwrite)
            .map(|r| r.name)
            .collect();
        assert_eq!(overwriting, vec!["progress"]);
    }

    #[test]
    fn test_first_wins_keeps_earlier_value() {
        let mut builder = RecordBuilder::new();
        assert!(builder.apply(Extraction::Solver("BPTT".into()), Merge::FirstWins));
        assert!(!builder.apply(Extraction::Solver("1SPSA".into()), Merge::FirstWins));
        assert!(builder.apply(Extraction::Solver("1SPSA".into()), Merge::Overwrite));
        builder.apply(
            Extraction::Progress { iterations: 1, max_iterations: 2, train_loss: "1.0".into() },
            Merge::Overwrite,
        );
        assert_eq!(builder.build().unwrap().solver, "1SPSA");
    }

    #[test]
    fn test_name_learning_rate_preferred_over_body() {
        let record = run(" 1.SOLV_BPTT_lr0.05_x\nlearning_rate=0.001\nstatus converged iters 3\n")
            .build()
            .unwrap();
        assert_eq!(record.learning_rate, LearningRate::Literal("0.05".into()));
    }

    #[test]
    fn test_body_learning_rate_reformatted() {
        let record = run(" 1.SOLV_BPTT_x\nNamespace(learning_rate=0.001)\nstatus converged iters 3\n")
            .build()
            .unwrap();
        assert_eq!(record.learning_rate, LearningRate::Literal("1.0e-03".into()));
    }

    #[test]
    fn test_binlr_marker_and_default() {
        let record = run(" 1.SOLV_BPTT_binlr_h128\nstatus converged iters 3\n")
            .build()
            .unwrap();
        assert_eq!(record.learning_rate, LearningRate::BinarySearch);

        let record = run(" 1.SOLV_BPTT\nstatus converged iters 3\n").build().unwrap();
        assert_eq!(record.learning_rate.as_str(), "binlr");
    }

    #[test]
    fn test_saturating_alpha_fallback() {
        let builder = run(" 1.SOLV_BPTT\nsaturating_alpha=0.9\nSaturating alpha: 0.2\n");
        assert_eq!(builder.saturating_alpha.as_deref(), Some("0.9"));

        let builder = run(" 1.SOLV_BPTT\nSaturating alpha: 0.2\n");
        assert_eq!(builder.saturating_alpha.as_deref(), Some("0.2"));
    }

    #[test]
    fn test_grid_coordinates() {
        let builder = run(" 1.SOLV_1SPSA_pert96_scale4\nstatus converged iters 3\n");
        assert_eq!(builder.perturbations, Some(96));
        assert_eq!(builder.scale, Some(4));

        let builder = run(" 1.SOLV_1SPSA_pert96_scale4\nnum_perturbations=8 hidden_size=2048\n");
        assert_eq!(builder.perturbations, Some(8));
        assert_eq!(builder.scale, Some(16));

        let builder = run(" 1.SOLV_1SPSA_scale3\nhidden_size=100\n");
        assert_eq!(builder.scale, None);
    }

    #[test]
    fn test_diverged_beats_converged() {
        let record = run(" 1.SOLV_BPTT\nstatus converged iters 10\nstatus diverged iters 7\n")
            .build()
            .unwrap();
        assert_eq!(record.status, RunStatus::Diverged);
        assert_eq!(record.iterations, Some(7));
    }

    #[test]
    fn test_success_normalized_to_converged() {
        let record = run(" 1.SOLV_BPTT\nstatus success iters 12\nTotal training time: 3.5\n")
            .build()
            .unwrap();
        assert_eq!(record.status, RunStatus::Converged);
        assert_eq!(record.train_time.as_deref(), Some("3.5"));
        assert_eq!(record.final_loss, None);
    }

    #[test]
    fn test_progress_takes_last_marker_in_text_order() {
        let text = " 1.SOLV_BPTT\n\
                    Iteration 90/100 Train Loss: 0.2\n\
                    Iteration 40/100 Train Loss: 0.5\n";
        let record = run(text).build().unwrap();
        assert_eq!(record.iterations, Some(40));
        assert_eq!(record.final_loss.as_deref(), Some("0.5"));
        assert_eq!(record.status, RunStatus::StillTraining);
    }

    #[test]
    fn test_progress_ignores_marker_without_loss() {
        let text = " 1.SOLV_BPTT\n\
                    Iteration 10/100 Train Loss: 0.9\n\
                    Iteration 20/100 val acc 0.3\n\
                    Iteration 30/100 Train Loss: 0.4\n";
        let record = run(text).build().unwrap();
        assert_eq!(record.iterations, Some(30));
        assert_eq!(record.final_loss.as_deref(), Some("0.4"));
    }

    #[test]
    fn test_progress_at_budget_is_completed() {
        let record = run(" 1.SOLV_BPTT\nIteration 100/100 Train Loss: 0.01\n")
            .build()
            .unwrap();
        assert_eq!(record.status, RunStatus::Completed);
        assert_eq!(record.train_time, None);
    }

    #[test]
    fn test_progress_overwrites_terminal_status() {
        let text = " 1.SOLV_BPTT\n\
                    status converged iters 400\n\
                    Total training time: 55.2\n\
                    Iteration 20/500 Train Loss: 0.9\n";
        let record = run(text).build().unwrap();
        assert_eq!(record.status, RunStatus::StillTraining);
        assert_eq!(record.iterations, Some(20));
        assert_eq!(record.final_loss.as_deref(), Some("0.9"));
        assert_eq!(record.train_time, None);
    }

    #[test]
    fn test_build_requires_solver_and_status() {
        assert!(run(" 1.SOLV_BPTT\nnothing here\n").build().is_none());
        assert!(run(" 1.plain\nstatus converged iters 3\n").build().is_none());
    }

    #[test]
    fn test_scientific_2sig() {
        assert_eq!(scientific_2sig("0.001"), "1.0e-03");
        assert_eq!(scientific_2sig("3e-05"), "3.0e-05");
        assert_eq!(scientific_2sig("0.0012"), "1.2e-03");
        assert_eq!(scientific_2sig("1500"), "1.5e+03");
        assert_eq!(scientific_2sig("1.2.3"), "1.2.3");
    }
}
