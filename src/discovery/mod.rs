//! Result file discovery.
//!
//! Sequential directory walk via the `ignore` crate, filtered by the
//! configured include/exclude globs.

mod files;

pub use files::find_result_files;
