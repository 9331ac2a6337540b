use crate::config::{InputSource, SortConfig, SortDirection, SortStrategy};
use crate::discover::PathDiscoverer;
use crate::error::{SortContext, SortError, SortResult};
use crate::ingest::IngestionPool;
use crate::output::RecordWriter;
use crate::record::Record;
use crate::tree_sort::tree_sort;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Collections at least this large use rayon's parallel sort
const PARALLEL_SORT_THRESHOLD: usize = 10_000;

/// Name used for standard input in error messages
const STDIN_NAME: &str = "-";

/// Records gathered from the configured source, plus the header if one was read
#[derive(Debug, Default)]
pub struct Collected {
    pub header: Option<String>,
    pub records: Vec<Record>,
}

/// Orchestrates one run: collect, validate, sort, write
pub struct CoreSort {
    config: SortConfig,
}

impl CoreSort {
    pub fn new(config: SortConfig) -> Self {
        Self { config }
    }

    /// Collect, sort and write everything; returns the process exit code
    pub fn run(&self) -> SortResult<i32> {
        let Collected {
            header,
            mut records,
        } = self.collect()?;

        self.sort_records(&mut records)?;

        let mut writer = RecordWriter::create(self.config.output_file.as_deref())?;
        writer.write_all(header.as_deref(), &records, self.config.delimiter)?;

        Ok(crate::EXIT_SUCCESS)
    }

    /// Read all records from the configured source
    pub fn collect(&self) -> SortResult<Collected> {
        match &self.config.input {
            InputSource::Stdin => {
                let stdin = io::stdin();
                self.read_single(stdin.lock(), Path::new(STDIN_NAME), true)
            }
            InputSource::File(path) => {
                let file = File::open(path).open_context(path)?;
                self.read_single(BufReader::new(file), path, false)
            }
            InputSource::Tree(root) => self.collect_tree(root),
        }
    }

    /// Run the directory pipeline; records arrive in no particular order
    fn collect_tree(&self, root: &Path) -> SortResult<Collected> {
        let paths = PathDiscoverer::new(root, &self.config.extension, self.config.error_policy);
        let pool = IngestionPool::new(self.config.effective_worker_count(), self.config.delimiter)
            .with_lane_capacity(self.config.lane_capacity)
            .with_error_policy(self.config.error_policy);

        let mut records = Vec::new();
        pool.run(paths, &mut records)?;

        if self.config.uniform_fields {
            check_uniform(&records, &root.display().to_string())?;
        }

        Ok(Collected {
            header: None,
            records,
        })
    }

    /// Read one source strictly: every row must match the first row's width.
    ///
    /// With `stop_at_blank`, the first empty line ends the input.
    fn read_single<R: BufRead>(
        &self,
        reader: R,
        origin: &Path,
        stop_at_blank: bool,
    ) -> SortResult<Collected> {
        let name = origin.display().to_string();
        let mut lines = reader.lines().enumerate();
        let mut collected = Collected::default();

        if self.config.header {
            if let Some((index, line)) = lines.next() {
                collected.header = Some(line.read_context(origin, index + 1)?);
            }
        }

        let mut width = None;
        for (index, line) in lines {
            let line = line.read_context(origin, index + 1)?;
            if stop_at_blank && line.trim_end_matches('\r').is_empty() {
                break;
            }

            let record = Record::parse(&line, self.config.delimiter);
            let expected = *width.get_or_insert(record.len());
            if record.len() != expected {
                return Err(SortError::field_count_mismatch(
                    &name,
                    index + 1,
                    expected,
                    record.len(),
                ));
            }
            collected.records.push(record);
        }

        log::info!("read {} record(s) from {}", collected.records.len(), name);
        Ok(collected)
    }

    /// Validate the key and order `records` with the configured strategy
    pub fn sort_records(&self, records: &mut Vec<Record>) -> SortResult<()> {
        let key = self.config.sort_key;
        let direction = self.config.direction;

        match self.config.strategy {
            SortStrategy::Comparison => comparison_sort(records, key, direction)?,
            SortStrategy::Tree => tree_sort(records, key, direction)?,
        }

        log::info!(
            "sorted {} record(s) on field {} ({}, {})",
            records.len(),
            key,
            direction,
            self.config.strategy
        );
        Ok(())
    }
}

/// Reject a key that is not below the field count of every record
pub fn validate_key(records: &[Record], key: usize) -> SortResult<()> {
    match records.iter().map(Record::len).min() {
        Some(fields) if key >= fields => Err(SortError::invalid_sort_key(key, fields)),
        _ => Ok(()),
    }
}

/// Unstable byte-wise sort on one field; equal keys end up in any order.
///
/// Fails with `InvalidSortKey` before touching `records` when some record
/// has no field `key`.
pub fn comparison_sort(
    records: &mut [Record],
    key: usize,
    direction: SortDirection,
) -> SortResult<()> {
    use rayon::prelude::*;

    validate_key(records, key)?;

    let compare = |a: &Record, b: &Record| direction.apply(a.key(key).cmp(b.key(key)));

    if records.len() >= PARALLEL_SORT_THRESHOLD {
        records.par_sort_unstable_by(compare);
    } else {
        records.sort_unstable_by(compare);
    }
    Ok(())
}

/// Post-merge check that every record has the first record's field count
fn check_uniform(records: &[Record], origin: &str) -> SortResult<()> {
    let Some(expected) = records.first().map(Record::len) else {
        return Ok(());
    };
    match records.iter().position(|r| r.len() != expected) {
        Some(index) => Err(SortError::field_count_mismatch(
            origin,
            index + 1,
            expected,
            records[index].len(),
        )),
        None => Ok(()),
    }
}
