//! Session splitting and per-session record extraction.
//!
//! A captured log is a sequence of blocks separated by a dash rule followed by
//! a `Session:` line. Everything before the first delimiter is preamble and is
//! discarded. Each block is handed to the [`RULES`] pipeline independently.

use super::patterns::SESSION_DELIMITER;
use super::rules::{RecordBuilder, Rule, RULES};
use crate::types::RunRecord;

/// Text of one session, starting right after `Session:`.
#[derive(Debug, Clone, Copy)]
pub struct SessionBlock<'a> {
    text: &'a str,
    name_line: &'a str,
}

impl<'a> SessionBlock<'a> {
    pub fn new(text: &'a str) -> Self {
        let name_line = text.lines().next().unwrap_or("");
        Self { text, name_line }
    }

    /// Whole block, including the name line.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// The line carrying the session name (`123.SOLV_..._lr0.01`).
    pub fn name_line(&self) -> &'a str {
        self.name_line
    }
}

/// Split a log into session blocks, dropping the preamble.
pub fn split_sessions(log: &str) -> impl Iterator<Item = SessionBlock<'_>> {
    SESSION_DELIMITER.split(log).skip(1).map(SessionBlock::new)
}

/// Turns captured log text into run records.
///
/// Stateless apart from the rule list, so parsing is a pure function of the
/// input text.
#[derive(Debug, Clone, Copy)]
pub struct SessionParser {
    rules: &'static [Rule],
}

impl SessionParser {
    pub fn new() -> Self {
        Self { rules: RULES }
    }

    /// One record per session that yields both a solver and a status.
    pub fn parse(&self, log: &str) -> Vec<RunRecord> {
        let mut records = Vec::new();
        let mut dropped = 0usize;

        for block in split_sessions(log) {
            match self.parse_block(&block) {
                Some(record) => records.push(record),
                None => {
                    dropped += 1;
                    tracing::debug!(
                        session = block.name_line().trim(),
                        "dropping session without solver or status"
                    );
                }
            }
        }

        tracing::info!(records = records.len(), dropped, "parsed session log");
        records
    }

    pub fn parse_block(&self, block: &SessionBlock<'_>) -> Option<RunRecord> {
        let mut builder = RecordBuilder::new();
        builder.apply_rules(self.rules, block);
        builder.build()
    }
}

impl Default for SessionParser {
    fn default() -> Self {
        Self::new()
    }
}
