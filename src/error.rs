//! Error handling for the ingestion pipeline and sort engine

use std::io;
use std::path::Path;
use thiserror::Error;

/// Custom error type for ingest and sort operations
#[derive(Error, Debug)]
pub enum SortError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("cannot walk {path}: {message}")]
    PathWalk { path: String, message: String },

    #[error("cannot open {path}: {source}")]
    FileOpen {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot read {path} at line {line}: {source}")]
    FileRead {
        path: String,
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("{origin}:{line}: expected {expected} fields, found {found}")]
    FieldCountMismatch {
        origin: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("sort key {key} is out of range for records with {fields} fields")]
    InvalidSortKey { key: usize, fields: usize },

    #[error("Invalid field separator: {sep}")]
    InvalidFieldSeparator { sep: String },

    #[error("Conflicting options: {message}")]
    ConflictingOptions { message: String },

    #[error("Thread pool error: {message}")]
    ThreadPool { message: String },

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SortError {
    /// Returns the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SortError::Io(_)
            | SortError::PathWalk { .. }
            | SortError::FileOpen { .. }
            | SortError::FileRead { .. } => crate::SORT_FAILURE,

            _ => crate::EXIT_FAILURE,
        }
    }

    /// Create a directory walk error
    pub fn path_walk(path: &Path, message: &str) -> Self {
        SortError::PathWalk {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create a file open error
    pub fn file_open(path: &Path, source: io::Error) -> Self {
        SortError::FileOpen {
            path: path.display().to_string(),
            source,
        }
    }

    /// Create a file read error for a 1-based line number
    pub fn file_read(path: &Path, line: usize, source: io::Error) -> Self {
        SortError::FileRead {
            path: path.display().to_string(),
            line,
            source,
        }
    }

    pub fn field_count_mismatch(origin: &str, line: usize, expected: usize, found: usize) -> Self {
        SortError::FieldCountMismatch {
            origin: origin.to_string(),
            line,
            expected,
            found,
        }
    }

    pub fn invalid_sort_key(key: usize, fields: usize) -> Self {
        SortError::InvalidSortKey { key, fields }
    }

    /// Create an invalid field separator error
    pub fn invalid_field_separator(sep: &str) -> Self {
        SortError::InvalidFieldSeparator {
            sep: sep.to_string(),
        }
    }

    /// Create a conflicting options error
    pub fn conflicting_options(message: &str) -> Self {
        SortError::ConflictingOptions {
            message: message.to_string(),
        }
    }

    /// Create a thread pool error
    pub fn thread_pool_error(message: &str) -> Self {
        SortError::ThreadPool {
            message: message.to_string(),
        }
    }

    /// Create a parse error
    pub fn parse_error(message: &str) -> Self {
        SortError::Parse {
            message: message.to_string(),
        }
    }

    /// Create an internal error
    pub fn internal(message: &str) -> Self {
        SortError::Internal {
            message: message.to_string(),
        }
    }
}

/// Result type for ingest and sort operations
pub type SortResult<T> = Result<T, SortError>;

/// Context trait for attaching a path to I/O failures
pub trait SortContext<T> {
    /// Map an error raised while opening `path`
    fn open_context(self, path: &Path) -> SortResult<T>;

    /// Map an error raised while reading line `line` of `path`
    fn read_context(self, path: &Path, line: usize) -> SortResult<T>;
}

impl<T> SortContext<T> for Result<T, io::Error> {
    fn open_context(self, path: &Path) -> SortResult<T> {
        self.map_err(|io_err| SortError::file_open(path, io_err))
    }

    fn read_context(self, path: &Path, line: usize) -> SortResult<T> {
        self.map_err(|io_err| SortError::file_read(path, line, io_err))
    }
}
