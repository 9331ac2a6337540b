//! Concurrent ingestion of many files
//!
//! Workers claim paths one at a time from a shared [`PathSource`], stream the
//! claimed file line by line and push each parsed [`Record`] into their own
//! bounded lane. The calling thread drains all lanes through [`FanIn`] into
//! the record collection it owns.

use crate::config::{ErrorPolicy, DEFAULT_LANE_CAPACITY};
use crate::error::{SortContext, SortError, SortResult};
use crate::fan_in::FanIn;
use crate::record::Record;
use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

/// Shared, order-agnostic source of paths.
///
/// Each call to [`claim`](PathSource::claim) hands the next path to exactly one
/// caller. Callers block on the lock while another worker is advancing the
/// underlying iterator.
pub struct PathSource<I> {
    paths: Mutex<I>,
    claimed: AtomicUsize,
}

impl<I> PathSource<I>
where
    I: Iterator<Item = SortResult<PathBuf>>,
{
    pub fn new(paths: I) -> Self {
        Self {
            paths: Mutex::new(paths),
            claimed: AtomicUsize::new(0),
        }
    }

    /// Take the next path; `None` once the source is exhausted
    pub fn claim(&self) -> Option<SortResult<PathBuf>> {
        let next = self.paths.lock().next();
        if next.is_some() {
            self.claimed.fetch_add(1, Ordering::Relaxed);
        }
        next
    }

    /// Paths (or walk errors) handed out so far
    pub fn claimed(&self) -> usize {
        self.claimed.load(Ordering::Relaxed)
    }
}

/// Totals for one ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Files fully read
    pub files: usize,
    /// Records delivered to the consumer, from complete and partial files
    pub records: usize,
    /// Files that failed after some of their records were sent; those records are kept
    pub partial: usize,
    /// Files that failed before sending any record
    pub skipped: usize,
}

impl IngestStats {
    fn absorb(&mut self, other: IngestStats) {
        self.files += other.files;
        self.records += other.records;
        self.partial += other.partial;
        self.skipped += other.skipped;
    }
}

/// Outcome of streaming one file into a lane
enum Drain {
    Completed,
    /// The consumer went away or the run was aborted
    Stopped,
}

/// Fixed-size pool of ingestion workers
#[derive(Debug, Clone)]
pub struct IngestionPool {
    workers: usize,
    delimiter: char,
    lane_capacity: usize,
    policy: ErrorPolicy,
}

impl IngestionPool {
    pub fn new(workers: usize, delimiter: char) -> Self {
        Self {
            workers: workers.max(1),
            delimiter,
            lane_capacity: DEFAULT_LANE_CAPACITY,
            policy: ErrorPolicy::FailFast,
        }
    }

    pub fn with_lane_capacity(mut self, capacity: usize) -> Self {
        self.lane_capacity = capacity.max(1);
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Read every path from `paths` and append the parsed records to `records`.
    ///
    /// Returns once every worker has finished and been joined. On failure the
    /// first error is returned and `records` holds an unspecified prefix of the
    /// input that the caller must discard.
    pub fn run<I>(&self, paths: I, records: &mut Vec<Record>) -> SortResult<IngestStats>
    where
        I: Iterator<Item = SortResult<PathBuf>> + Send,
    {
        let source = PathSource::new(paths);
        let abort = AtomicBool::new(false);

        log::debug!("starting {} ingestion worker(s)", self.workers);

        let stats = thread::scope(|scope| -> SortResult<IngestStats> {
            let mut lanes = Vec::with_capacity(self.workers);
            let mut handles = Vec::with_capacity(self.workers);

            for id in 0..self.workers {
                let (lane, receiver) = bounded(self.lane_capacity);
                lanes.push(receiver);
                let worker = Worker {
                    id,
                    source: &source,
                    abort: &abort,
                    delimiter: self.delimiter,
                    policy: self.policy,
                };
                let handle = thread::Builder::new()
                    .name(format!("ingest-{id}"))
                    .spawn_scoped(scope, move || worker.run(lane))
                    .map_err(|e| {
                        abort.store(true, Ordering::Release);
                        SortError::thread_pool_error(&format!("cannot spawn worker {id}: {e}"))
                    })?;
                handles.push(handle);
            }

            let mut merged = FanIn::new(lanes);
            for record in merged.by_ref() {
                if abort.load(Ordering::Acquire) {
                    break;
                }
                records.push(record);
            }
            drop(merged);

            let mut totals = IngestStats::default();
            let mut first_error = None;
            for handle in handles {
                match handle.join() {
                    Ok(Ok(worker_stats)) => totals.absorb(worker_stats),
                    Ok(Err(err)) => {
                        if first_error.is_none() {
                            first_error = Some(err);
                        }
                    }
                    Err(_) => {
                        if first_error.is_none() {
                            first_error =
                                Some(SortError::thread_pool_error("ingestion worker panicked"));
                        }
                    }
                }
            }

            match first_error {
                Some(err) => Err(err),
                None => Ok(totals),
            }
        })?;

        log::info!(
            "ingested {} record(s) from {} file(s), {} partial, {} skipped",
            stats.records,
            stats.files,
            stats.partial,
            stats.skipped
        );
        Ok(stats)
    }
}

struct Worker<'a, I> {
    id: usize,
    source: &'a PathSource<I>,
    abort: &'a AtomicBool,
    delimiter: char,
    policy: ErrorPolicy,
}

impl<I> Worker<'_, I>
where
    I: Iterator<Item = SortResult<PathBuf>>,
{
    fn run(self, lane: Sender<Record>) -> SortResult<IngestStats> {
        let mut stats = IngestStats::default();

        while !self.aborted() {
            let path = match self.source.claim() {
                None => break,
                Some(Ok(path)) => path,
                Some(Err(err)) => return Err(self.fail(err)),
            };

            log::debug!("worker {} reading {}", self.id, path.display());

            let mut sent = 0;
            let outcome = self.drain_file(&path, &lane, &mut sent);
            stats.records += sent;

            match outcome {
                Ok(Drain::Completed) => stats.files += 1,
                Ok(Drain::Stopped) => break,
                Err(err) => match self.policy {
                    ErrorPolicy::Skip if sent == 0 => {
                        log::warn!("skipping file: {err}");
                        stats.skipped += 1;
                    }
                    ErrorPolicy::Skip => {
                        log::warn!("keeping {sent} record(s) read before error: {err}");
                        stats.partial += 1;
                    }
                    ErrorPolicy::FailFast => return Err(self.fail(err)),
                },
            }
        }

        log::debug!("worker {} done: {:?}", self.id, stats);
        Ok(stats)
    }

    /// Stream one file into the lane, counting records handed over in `sent`
    fn drain_file(
        &self,
        path: &Path,
        lane: &Sender<Record>,
        sent: &mut usize,
    ) -> SortResult<Drain> {
        let file = File::open(path).open_context(path)?;
        let reader = BufReader::new(file);

        for (index, line) in reader.lines().enumerate() {
            let line = line.read_context(path, index + 1)?;
            if self.aborted() {
                return Ok(Drain::Stopped);
            }
            if lane.send(Record::parse(&line, self.delimiter)).is_err() {
                return Ok(Drain::Stopped);
            }
            *sent += 1;
        }

        Ok(Drain::Completed)
    }

    fn aborted(&self) -> bool {
        self.abort.load(Ordering::Acquire)
    }

    fn fail(&self, err: SortError) -> SortError {
        self.abort.store(true, Ordering::Release);
        err
    }
}
