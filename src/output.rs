//! Writing ordered records to stdout or a file

use crate::error::{SortContext, SortResult};
use crate::record::Record;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Buffered sink for sorted records
pub struct RecordWriter {
    inner: BufWriter<Box<dyn Write>>,
}

impl RecordWriter {
    /// Open `output_file`, or stdout when `None`
    pub fn create(output_file: Option<&str>) -> SortResult<Self> {
        let sink: Box<dyn Write> = match output_file {
            Some(path) => Box::new(File::create(path).open_context(Path::new(path))?),
            None => Box::new(io::stdout()),
        };
        Ok(Self::new(sink))
    }

    pub fn new(sink: Box<dyn Write>) -> Self {
        Self {
            inner: BufWriter::new(sink),
        }
    }

    /// Write the optional header, then one delimited line per record, and flush
    pub fn write_all(
        &mut self,
        header: Option<&str>,
        records: &[Record],
        delimiter: char,
    ) -> SortResult<()> {
        write_records(&mut self.inner, header, records, delimiter)?;
        self.inner.flush()?;
        Ok(())
    }
}

/// Serialize records as delimited lines into any writer
pub fn write_records<W: Write>(
    out: &mut W,
    header: Option<&str>,
    records: &[Record],
    delimiter: char,
) -> io::Result<()> {
    if let Some(header) = header {
        writeln!(out, "{header}")?;
    }
    for record in records {
        writeln!(out, "{}", record.join(delimiter))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_write_records_with_header() -> io::Result<()> {
        let records = vec![Record::parse("a;1", ';'), Record::parse("b;2", ';')];
        let mut out = Vec::new();
        write_records(&mut out, Some("k;v"), &records, ';')?;
        assert_eq!(String::from_utf8_lossy(&out), "k;v\na;1\nb;2\n");
        Ok(())
    }

    #[test]
    fn test_write_records_empty() -> io::Result<()> {
        let mut out = Vec::new();
        write_records(&mut out, None, &[], ',')?;
        assert!(out.is_empty());
        Ok(())
    }

    #[test]
    fn test_writer_creates_file() -> SortResult<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("out.csv");
        let records = vec![Record::parse("x,9", ',')];

        let name = path.to_string_lossy();
        let mut writer = RecordWriter::create(Some(name.as_ref()))?;
        writer.write_all(None, &records, ',')?;
        drop(writer);

        assert_eq!(fs::read_to_string(&path)?, "x,9\n");
        Ok(())
    }

    #[test]
    fn test_writer_reports_bad_path() -> SortResult<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("no/such/dir/out.csv");
        let name = path.to_string_lossy();
        let result = RecordWriter::create(Some(name.as_ref()));
        assert!(matches!(
            result,
            Err(crate::error::SortError::FileOpen { .. })
        ));
        Ok(())
    }
}
