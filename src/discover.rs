//! Lazy discovery of input files under a root path

use crate::config::ErrorPolicy;
use crate::error::{SortError, SortResult};
use std::ffi::OsStr;
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Walks a root path and yields regular files with a matching extension.
///
/// A root that is itself a matching file yields exactly that file. Entries are
/// visited in file-name order per directory, but consumers must not rely on it.
pub struct PathDiscoverer {
    walker: walkdir::IntoIter,
    extension: String,
    policy: ErrorPolicy,
    root: PathBuf,
    finished: bool,
    discovered: usize,
}

impl PathDiscoverer {
    pub fn new(root: impl AsRef<Path>, extension: &str, policy: ErrorPolicy) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            walker: WalkDir::new(&root).sort_by_file_name().into_iter(),
            extension: extension.trim_start_matches('.').to_string(),
            policy,
            root,
            finished: false,
            discovered: 0,
        }
    }

    /// Number of paths yielded so far
    pub fn discovered(&self) -> usize {
        self.discovered
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension() == Some(OsStr::new(&self.extension))
    }

    fn walk_error(&self, err: &walkdir::Error) -> SortError {
        let path = err.path().unwrap_or(&self.root);
        let message = match err.io_error() {
            Some(io_err) => io_err.to_string(),
            None => err.to_string(),
        };
        SortError::path_walk(path, &message)
    }
}

impl Iterator for PathDiscoverer {
    type Item = SortResult<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            match self.walker.next() {
                Some(Ok(entry)) => {
                    if entry.file_type().is_file() && self.matches(entry.path()) {
                        self.discovered += 1;
                        return Some(Ok(entry.into_path()));
                    }
                }
                Some(Err(err)) => {
                    let err = self.walk_error(&err);
                    match self.policy {
                        ErrorPolicy::Skip => {
                            log::warn!("skipping unreadable path: {err}");
                        }
                        ErrorPolicy::FailFast => {
                            self.finished = true;
                            return Some(Err(err));
                        }
                    }
                }
                None => {
                    self.finished = true;
                    log::debug!(
                        "discovered {} file(s) under {}",
                        self.discovered,
                        self.root.display()
                    );
                    return None;
                }
            }
        }
    }
}

impl FusedIterator for PathDiscoverer {}
