//! Concurrent CSV ingestion and sorting
//!
//! Records come from standard input, a single file, or a whole directory tree.
//! Directory trees are read by a fixed pool of workers that claim files from a
//! shared path source and stream parsed rows into per-worker lanes; the lanes
//! are merged into one collection which is then ordered by a single field with
//! either a comparison sort or a binary search tree sort.

#![warn(clippy::all)]

pub mod error;
pub mod config;
pub mod record;

// Ingestion pipeline
pub mod discover;
pub mod fan_in;
pub mod ingest;

// Sorting and output
pub mod core_sort;
pub mod tree_sort;
pub mod output;

// Re-export commonly used types
pub use config::{ErrorPolicy, InputSource, SortConfig, SortDirection, SortStrategy};
pub use error::{SortError, SortResult};
pub use record::Record;

/// Exit codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const SORT_FAILURE: i32 = 2;

/// Collect, sort and write records according to `config`
pub fn sort(config: &SortConfig) -> SortResult<i32> {
    config.validate()?;
    core_sort::CoreSort::new(config.clone()).run()
}
