//! Configuration management for ingest and sort operations

use crate::error::{SortError, SortResult};
use std::cmp::Ordering;
use std::path::PathBuf;
use std::str::FromStr;

/// Default number of records buffered per worker lane
pub const DEFAULT_LANE_CAPACITY: usize = 256;

/// Default file extension picked up by the directory walk
pub const DEFAULT_EXTENSION: &str = "csv";

/// Upper bound on ingestion workers
pub const MAX_WORKERS: usize = 1024;

/// Where records come from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputSource {
    /// Read standard input until EOF or the first empty line
    #[default]
    Stdin,
    /// Read one file with field-count checking
    File(PathBuf),
    /// Walk a directory (or single matching file) with the worker pool
    Tree(PathBuf),
}

/// Sort order enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Apply the direction to an ascending comparison result
    #[inline]
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Sorting algorithm enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortStrategy {
    /// All-at-once unstable comparison sort
    #[default]
    Comparison,
    /// Binary search tree insertion followed by in-order traversal
    Tree,
}

/// What to do when a path or file cannot be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Abort the whole run on the first failure
    #[default]
    FailFast,
    /// Log a warning, skip the path or file and keep going
    Skip,
}

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct SortConfig {
    /// Record source
    pub input: InputSource,
    /// Output file path (stdout when unset)
    pub output_file: Option<String>,
    /// Zero-based field index used as the sort key
    pub sort_key: usize,
    /// Sort direction
    pub direction: SortDirection,
    /// Sorting algorithm
    pub strategy: SortStrategy,
    /// Field delimiter for both input and output
    pub delimiter: char,
    /// Extension of files picked up by the directory walk, without the dot
    pub extension: String,
    /// Number of ingestion workers
    pub worker_count: Option<usize>,
    /// Records buffered per worker lane before the worker blocks
    pub lane_capacity: usize,
    /// Failure handling for the directory pipeline
    pub error_policy: ErrorPolicy,
    /// First line of a single source is a header excluded from sorting
    pub header: bool,
    /// Require every merged record to share the first record's field count
    pub uniform_fields: bool,
    /// Debug logging
    pub debug: bool,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            input: InputSource::Stdin,
            output_file: None,
            sort_key: 0,
            direction: SortDirection::Ascending,
            strategy: SortStrategy::Comparison,
            delimiter: ',',
            extension: DEFAULT_EXTENSION.to_string(),
            worker_count: None,
            lane_capacity: DEFAULT_LANE_CAPACITY,
            error_policy: ErrorPolicy::FailFast,
            header: false,
            uniform_fields: false,
            debug: false,
        }
    }
}

impl SortConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, input: InputSource) -> Self {
        self.input = input;
        self
    }

    pub fn with_sort_key(mut self, key: usize) -> Self {
        self.sort_key = key;
        self
    }

    pub fn with_direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_strategy(mut self, strategy: SortStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    /// Validate configuration for consistency
    pub fn validate(&self) -> SortResult<()> {
        if matches!(self.delimiter, '\n' | '\r') {
            return Err(SortError::invalid_field_separator(
                "line terminators cannot separate fields",
            ));
        }

        if self.extension.is_empty() {
            return Err(SortError::conflicting_options(
                "file extension for the directory walk must not be empty",
            ));
        }

        if self.header && matches!(self.input, InputSource::Tree(_)) {
            return Err(SortError::conflicting_options(
                "a header line is only supported for a single input",
            ));
        }

        if self.lane_capacity == 0 {
            return Err(SortError::thread_pool_error(
                "lane capacity must be positive",
            ));
        }

        if let Some(workers) = self.worker_count {
            if workers == 0 {
                return Err(SortError::thread_pool_error(
                    "worker count must be positive",
                ));
            }
            if workers > MAX_WORKERS {
                return Err(SortError::thread_pool_error(
                    "too many workers (maximum 1024)",
                ));
            }
        }

        Ok(())
    }

    /// Get effective worker count
    pub fn effective_worker_count(&self) -> usize {
        self.worker_count.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Check if reading from stdin
    pub fn reading_from_stdin(&self) -> bool {
        matches!(self.input, InputSource::Stdin)
    }

    /// Check if writing to stdout
    pub fn writing_to_stdout(&self) -> bool {
        self.output_file.is_none()
    }
}

impl FromStr for SortStrategy {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "comparison" | "default" | "1" => Ok(SortStrategy::Comparison),
            "tree" | "2" => Ok(SortStrategy::Tree),
            _ => Err(SortError::parse_error(&format!("unknown sort algorithm: {s}"))),
        }
    }
}

impl std::fmt::Display for SortStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SortStrategy::Comparison => "comparison",
            SortStrategy::Tree => "tree",
        };
        write!(f, "{name}")
    }
}

impl FromStr for SortDirection {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ascending" | "asc" => Ok(SortDirection::Ascending),
            "descending" | "desc" | "reverse" => Ok(SortDirection::Descending),
            _ => Err(SortError::parse_error(&format!("unknown sort direction: {s}"))),
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SortDirection::Ascending => "ascending",
            SortDirection::Descending => "descending",
        };
        write!(f, "{name}")
    }
}

impl FromStr for ErrorPolicy {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail-fast" | "abort" => Ok(ErrorPolicy::FailFast),
            "skip" => Ok(ErrorPolicy::Skip),
            _ => Err(SortError::parse_error(&format!("unknown error policy: {s}"))),
        }
    }
}

/// Builder pattern for creating configurations
pub struct SortConfigBuilder {
    config: SortConfig,
}

impl SortConfigBuilder {
    /// Start building a new configuration
    pub fn new() -> Self {
        Self {
            config: SortConfig::default(),
        }
    }

    pub fn input(mut self, input: InputSource) -> Self {
        self.config.input = input;
        self
    }

    pub fn sort_key(mut self, key: usize) -> Self {
        self.config.sort_key = key;
        self
    }

    /// Sort in descending order
    pub fn reverse(mut self) -> Self {
        self.config.direction = SortDirection::Descending;
        self
    }

    pub fn strategy(mut self, strategy: SortStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    pub fn extension(mut self, extension: &str) -> Self {
        self.config.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.worker_count = Some(workers);
        self
    }

    pub fn lane_capacity(mut self, capacity: usize) -> Self {
        self.config.lane_capacity = capacity;
        self
    }

    /// Skip unreadable paths and files instead of aborting
    pub fn skip_errors(mut self) -> Self {
        self.config.error_policy = ErrorPolicy::Skip;
        self
    }

    pub fn header(mut self) -> Self {
        self.config.header = true;
        self
    }

    pub fn uniform_fields(mut self) -> Self {
        self.config.uniform_fields = true;
        self
    }

    pub fn output_file(mut self, file: String) -> Self {
        self.config.output_file = Some(file);
        self
    }

    pub fn debug(mut self) -> Self {
        self.config.debug = true;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> SortResult<SortConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for SortConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
