//! Run records from per-run JSON result files.

mod store;

pub use store::{parse_artifact, ResultStore};
