//! Run record extraction from captured session logs.
//!
//! This module handles:
//! - Splitting a log into per-session blocks
//! - Running the ordered rule pipeline over each block
//! - Building a [`RunRecord`](crate::types::RunRecord) when the minimum fields resolve
//!
//! Probes are regex-based and independent of each other; only the merge
//! policy of each rule couples them.

mod patterns;
mod rules;
mod session;

pub use rules::{scientific_2sig, Extraction, Merge, RecordBuilder, Rule, Slot, RULES};
pub use session::{split_sessions, SessionBlock, SessionParser};
