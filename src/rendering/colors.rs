//! ANSI color utilities for sweepmap reports.
//!
//! Color scheme:
//! - Status values carry the most signal: converged green, completed cyan,
//!   diverged red, in-progress yellow
//! - Headers bold, secondary info (run names, sentinels) dimmed
//!
//! Every helper takes already-padded text so column alignment is computed on
//! the visible characters, not the escape codes.

use owo_colors::{OwoColorize, Style};

use crate::types::RunStatus;

/// Display style for a run status.
pub fn status_style(status: RunStatus) -> Style {
    match status {
        RunStatus::Converged => Style::new().green().bold(),
        RunStatus::Completed => Style::new().cyan(),
        RunStatus::Diverged => Style::new().bright_red(),
        RunStatus::StillTraining | RunStatus::Training => Style::new().yellow(),
    }
}

/// Colorizer that can be switched off for piping.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    fn paint(&self, s: &str, style: Style) -> String {
        if self.enabled {
            s.style(style).to_string()
        } else {
            s.to_string()
        }
    }

    /// Status text (pass the padded cell).
    pub fn status(&self, s: &str, status: RunStatus) -> String {
        self.paint(s, status_style(status))
    }

    pub fn header(&self, s: &str) -> String {
        self.paint(s, Style::new().bold())
    }

    pub fn dim(&self, s: &str) -> String {
        self.paint(s, Style::new().dimmed())
    }

    /// In-progress grid cells (`130*`) yellow, finished ones green.
    pub fn cell(&self, s: &str, terminal: bool) -> String {
        if terminal {
            self.paint(s, Style::new().green())
        } else {
            self.paint(s, Style::new().yellow())
        }
    }
}
