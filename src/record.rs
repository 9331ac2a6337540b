//! One parsed input row

/// An ordered sequence of field strings parsed from one delimited line.
///
/// Records are immutable once built. They move from the worker that parsed
/// them into the collection owned by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Record {
    fields: Vec<String>,
}

impl Record {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Split a line on `delimiter`.
    ///
    /// A trailing carriage return is dropped first. An empty line yields a
    /// single empty field, and a trailing delimiter yields a trailing empty
    /// field.
    pub fn parse(line: &str, delimiter: char) -> Self {
        let line = line.strip_suffix('\r').unwrap_or(line);
        Self {
            fields: line.split(delimiter).map(str::to_owned).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[inline]
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Key field for sorting; empty when the index is out of range
    #[inline]
    pub(crate) fn key(&self, index: usize) -> &str {
        self.field(index).unwrap_or_default()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Join the fields back into one line
    pub fn join(&self, delimiter: char) -> String {
        let mut buf = [0u8; 4];
        self.fields.join(delimiter.encode_utf8(&mut buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_on_delimiter() {
        let record = Record::parse("b,2,x", ',');
        assert_eq!(record.len(), 3);
        assert_eq!(record.field(0), Some("b"));
        assert_eq!(record.field(2), Some("x"));
        assert_eq!(record.field(3), None);
    }

    #[test]
    fn test_parse_edge_lines() {
        let empty = Record::parse("", ',');
        assert_eq!(empty.fields(), &[String::new()]);
        assert!(!empty.is_empty());

        let trailing = Record::parse("a,", ',');
        assert_eq!(trailing.fields(), &["a".to_string(), String::new()]);

        let crlf = Record::parse("a,b\r", ',');
        assert_eq!(crlf.field(1), Some("b"));
    }

    #[test]
    fn test_join_round_trips_line() {
        assert_eq!(Record::parse("x;9;z", ';').join(';'), "x;9;z");
        assert_eq!(Record::parse("naïve\tß", '\t').join('\t'), "naïve\tß");
    }

    #[test]
    fn test_key_out_of_range_is_empty() {
        let record = Record::parse("a", ',');
        assert_eq!(record.key(0), "a");
        assert_eq!(record.key(5), "");
    }
}
