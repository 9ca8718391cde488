//! Regex patterns for session log field extraction.
//!
//! Cached as statics to avoid recompilation on every session. Field markers
//! are literal substrings emitted by the training scripts, not a grammar.

use once_cell::sync::Lazy;
use regex::Regex;

/// Decimal or scientific-notation number.
const NUMBER: &str = r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?";

/// Loss values may also be `nan`/`inf` after a blow-up.
const LOSS: &str = r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?|[-+]?(?:nan|inf)";

/// Ten or more dashes, then a line starting with `Session:`.
pub static SESSION_DELIMITER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-{10,}\n\s*Session:").expect("Invalid session delimiter regex")
});

/// `SOLV_<solver>_...` - the solver runs up to the next underscore.
pub static SOLVER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"SOLV_([^_\s]+)").expect("Invalid solver regex")
});

/// `_lr0.01` in the session name.
pub static NAME_LEARNING_RATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"_lr([0-9.]+)").expect("Invalid name learning rate regex")
});

/// `learning_rate=1e-3` in an argument dump.
pub static BODY_LEARNING_RATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"learning_rate=({NUMBER})")).expect("Invalid learning rate regex")
});

pub static SATURATING_ALPHA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"saturating_alpha=({NUMBER})")).expect("Invalid saturating alpha regex")
});

/// Looser label form: `saturating_alpha: 0.5`, `Saturating alpha 0.5`.
pub static SATURATING_ALPHA_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)saturating[_ ]alpha[^0-9+\-.\n]{{0,3}}({NUMBER})"))
        .expect("Invalid saturating alpha label regex")
});

pub static NUM_PERTURBATIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"num_perturbations=(\d+)").expect("Invalid perturbations regex")
});

pub static NAME_PERTURBATIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"_pert(\d+)").expect("Invalid name perturbations regex")
});

pub static HIDDEN_SIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"hidden_size=(\d+)").expect("Invalid hidden size regex")
});

pub static NAME_SCALE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"_scale(\d+)").expect("Invalid name scale regex")
});

pub static STATUS_DIVERGED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"status diverged iters (\d+)").expect("Invalid diverged status regex")
});

pub static STATUS_CONVERGED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"status (?:converged|success) iters (\d+)").expect("Invalid converged status regex")
});

pub static FINAL_LOSS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"Final loss \(after training\):\s*({LOSS})"))
        .expect("Invalid final loss regex")
});

pub static TRAIN_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"Total training time:\s*({NUMBER})")).expect("Invalid train time regex")
});

/// `Iteration 40/100 ... Train Loss: 0.31` on a single line.
pub static PROGRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"Iteration (\d+)/(\d+)[^\n]*?Train Loss:[ \t]*({LOSS})"))
        .expect("Invalid progress regex")
});
