use std::fs;
use std::io;
use std::path::Path;

use log::warn;

use crate::error::Result;
use crate::line::LineReader;
use crate::record::Record;
use crate::split::{
    split_naive, split_quoted, split_quoted_parallel, split_quoted_raw,
};

/// The strategy used to turn one logical record's text into fields.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseStrategy {
    /// Pure delimiter splitting with no quote awareness.
    ///
    /// Fast, and wrong on quoted input. Only for trusted data known to
    /// contain neither delimiters nor quotes inside fields.
    Naive,
    /// Quote-aware splitting that leaves fields escaped, outer quotes
    /// and doubled interior quotes included.
    QuotedRaw,
    /// Quote-aware splitting with each field unescaped.
    ///
    /// This is the default.
    Quoted,
    /// Like `Quoted`, but fields are unescaped on a bounded pool of
    /// worker threads. Output is identical; only worth it for records
    /// with many large quoted fields.
    QuotedParallel,
}

impl Default for ParseStrategy {
    fn default() -> ParseStrategy {
        ParseStrategy::Quoted
    }
}

/// Builds a CSV reader with various configuration knobs.
#[derive(Clone, Debug)]
pub struct ReaderBuilder {
    delimiter: u8,
    has_headers: bool,
    warn_on_column_mismatch: bool,
    strategy: ParseStrategy,
}

impl Default for ReaderBuilder {
    fn default() -> ReaderBuilder {
        ReaderBuilder {
            delimiter: b',',
            has_headers: false,
            warn_on_column_mismatch: true,
            strategy: ParseStrategy::default(),
        }
    }
}

impl ReaderBuilder {
    /// Create a new builder for configuring a CSV reader.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// The field delimiter to use when reading CSV.
    ///
    /// Must be a single ASCII byte. For example, to read tab-delimited
    /// data, use `b'\t'`. The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut ReaderBuilder {
        self.delimiter = delimiter;
        self
    }

    /// Whether to treat the first record as a header row.
    ///
    /// When enabled, the first record is consumed through the same
    /// pipeline as data rows, made available via
    /// [`Reader::headers`], and never yielded as data. Its field count
    /// also seeds the expected column count used for mismatch warnings.
    ///
    /// Disabled by default.
    pub fn has_headers(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.has_headers = yes;
        self
    }

    /// Whether to log a warning when a row's field count differs from
    /// the first row seen.
    ///
    /// The mismatch is diagnostic only: the row is delivered either way.
    /// Enabled by default.
    pub fn warn_on_column_mismatch(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.warn_on_column_mismatch = yes;
        self
    }

    /// The strategy used to split record text into fields.
    ///
    /// The default is [`ParseStrategy::Quoted`].
    pub fn parse_strategy(&mut self, strategy: ParseStrategy) -> &mut ReaderBuilder {
        self.strategy = strategy;
        self
    }

    /// Build a CSV reader from an arbitrary `io::Read`.
    pub fn from_reader<R: io::Read, C: Record>(&self, rdr: R) -> Reader<R, C> {
        Reader {
            line_reader: LineReader::new(rdr),
            delimiter: self.delimiter,
            has_headers: self.has_headers,
            warn_on_column_mismatch: self.warn_on_column_mismatch,
            strategy: self.strategy,
            headers: None,
            headers_done: false,
            num_columns: None,
        }
    }

    /// Build a CSV reader for the data at the file path given.
    pub fn from_path<P, C>(&self, path: P) -> Result<Reader<fs::File, C>>
    where
        P: AsRef<Path>,
        C: Record,
    {
        Ok(self.from_reader(fs::File::open(path)?))
    }
}

/// A CSV reader.
///
/// Composes a [`LineReader`](crate::LineReader) with a parse strategy:
/// each advance assembles one logical record (merging physical lines that
/// fall inside quotes), splits it into fields and delivers the row. Rows
/// are loaded into any [`Record`] container; the default is
/// `Vec<String>`.
///
/// Iteration is forward-only. There is no rewind: the cursor is the
/// reader's state, and once the source is exhausted the iterator yields
/// `None` forever.
///
/// ### Example
///
/// ```
/// use delimited::{Reader, ReaderBuilder};
///
/// let data = "city,pop\n\"Cross Creek, NC\",123\n";
/// let mut rdr: Reader<_> =
///     ReaderBuilder::new().has_headers(true).from_reader(data.as_bytes());
///
/// assert_eq!(
///     rdr.headers().unwrap(),
///     Some(&vec!["city".to_string(), "pop".to_string()])
/// );
/// let rows = rdr.records().collect::<delimited::Result<Vec<_>>>().unwrap();
/// assert_eq!(rows, vec![vec!["Cross Creek, NC".to_string(), "123".to_string()]]);
/// ```
pub struct Reader<R, C = Vec<String>> {
    line_reader: LineReader<R>,
    delimiter: u8,
    has_headers: bool,
    warn_on_column_mismatch: bool,
    strategy: ParseStrategy,
    headers: Option<C>,
    headers_done: bool,
    num_columns: Option<usize>,
}

impl<R: io::Read, C: Record> Reader<R, C> {
    /// Create a new CSV reader with the default configuration.
    pub fn from_reader(rdr: R) -> Reader<R, C> {
        ReaderBuilder::new().from_reader(rdr)
    }

    /// Returns the header row, if one was requested.
    ///
    /// The first call consumes the header record from the source; later
    /// calls return the stored copy. Returns `None` when the reader was
    /// built without headers or the source was empty.
    pub fn headers(&mut self) -> Result<Option<&C>> {
        self.read_headers()?;
        Ok(self.headers.as_ref())
    }

    /// Reads the next row.
    ///
    /// Returns `Ok(None)` once the source is exhausted; repeated calls
    /// keep returning it. A blank line is not exhaustion: it yields a
    /// row of exactly one empty field.
    pub fn read_row(&mut self) -> Result<Option<C>> {
        self.read_headers()?;
        let text = match self.line_reader.read_record()? {
            None => return Ok(None),
            Some(text) => text,
        };
        let row = self.parse_record(&text);
        match self.num_columns {
            None => self.num_columns = Some(row.len()),
            Some(expected) => {
                if self.warn_on_column_mismatch && row.len() != expected {
                    warn!(
                        "record {}: {} fields where {} were expected; \
                         further parsing may be malformed",
                        self.line_reader.records_read(),
                        row.len(),
                        expected,
                    );
                }
            }
        }
        Ok(Some(row))
    }

    /// Returns an iterator over the remaining rows.
    ///
    /// The iterator yields `Result` items. A fault is yielded once as
    /// `Err`, after which the iterator is terminal.
    pub fn records(&mut self) -> Records<R, C> {
        Records { rdr: self, errored: false }
    }

    /// Returns the number of logical records read so far, the header
    /// record included.
    pub fn records_read(&self) -> u64 {
        self.line_reader.records_read()
    }

    /// Returns true once the underlying source is exhausted or faulted.
    pub fn is_done(&self) -> bool {
        self.line_reader.is_done()
    }

    /// Returns the configured delimiter.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    fn read_headers(&mut self) -> Result<()> {
        if self.headers_done {
            return Ok(());
        }
        self.headers_done = true;
        if !self.has_headers {
            return Ok(());
        }
        if let Some(text) = self.line_reader.read_record()? {
            let row = self.parse_record(&text);
            self.num_columns = Some(row.len());
            self.headers = Some(row);
        }
        Ok(())
    }

    fn parse_record(&self, text: &str) -> C {
        // A blank line is a row with one empty field, never an empty row.
        if text.is_empty() {
            let mut row = C::default();
            row.push_field(String::new());
            return row;
        }
        match self.strategy {
            ParseStrategy::Naive => split_naive(text, self.delimiter),
            ParseStrategy::QuotedRaw => split_quoted_raw(text, self.delimiter),
            ParseStrategy::Quoted => split_quoted(text, self.delimiter),
            ParseStrategy::QuotedParallel => {
                split_quoted_parallel(text, self.delimiter)
            }
        }
    }
}

/// An iterator over the rows of a CSV reader.
///
/// The lifetime parameter `'a` refers to the lifetime of the underlying
/// reader.
pub struct Records<'a, R, C = Vec<String>> {
    rdr: &'a mut Reader<R, C>,
    errored: bool,
}

impl<'a, R: io::Read, C: Record> Iterator for Records<'a, R, C> {
    type Item = Result<C>;

    fn next(&mut self) -> Option<Result<C>> {
        if self.errored {
            return None;
        }
        match self.rdr.read_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(err) => {
                self.errored = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn svec(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    // Applies a config closure to the builder. The higher-ranked bound
    // links the input and output lifetimes so that closures which return
    // `&mut builder` (e.g. `|b| b.delimiter(..)`) type-check.
    fn apply_config<F>(builder: &mut ReaderBuilder, config: F)
    where
        F: for<'a> FnOnce(&'a mut ReaderBuilder) -> &'a mut ReaderBuilder,
    {
        config(builder);
    }

    macro_rules! parses_to {
        ($name:ident, $csv:expr, $expect:expr) => {
            parses_to!($name, $csv, $expect, |b: &mut ReaderBuilder| b);
        };
        ($name:ident, $csv:expr, $expect:expr, $config:expr) => {
            #[test]
            fn $name() {
                let mut builder = ReaderBuilder::new();
                apply_config(&mut builder, $config);
                let mut rdr: Reader<_> =
                    builder.from_reader($csv.as_bytes());
                let rows = rdr
                    .records()
                    .collect::<crate::Result<Vec<Vec<String>>>>()
                    .unwrap();
                let expect: Vec<Vec<String>> =
                    $expect.iter().map(|row: &&[&str]| svec(row)).collect();
                assert_eq!(rows, expect);
            }
        };
    }

    parses_to!(one_row, "a,b,c\n", &[&["a", "b", "c"][..]]);
    parses_to!(
        two_rows,
        "a,b\nc,d\n",
        &[&["a", "b"][..], &["c", "d"][..]]
    );
    parses_to!(
        crlf_rows,
        "a,b\r\nc,d\r\n",
        &[&["a", "b"][..], &["c", "d"][..]]
    );
    parses_to!(
        quoted_field_with_newline,
        "\"l1\nl2\",x\nnext,y\n",
        &[&["l1\nl2", "x"][..], &["next", "y"][..]]
    );
    parses_to!(
        blank_line_is_single_empty_field,
        "a\n\nb\n",
        &[&["a"][..], &[""][..], &["b"][..]]
    );
    parses_to!(
        tab_delimited,
        "a\tb\nc\td\n",
        &[&["a", "b"][..], &["c", "d"][..]],
        |b: &mut ReaderBuilder| b.delimiter(b'\t')
    );
    parses_to!(
        raw_strategy_keeps_quotes,
        "a,\"b,c\"\n",
        &[&["a", "\"b,c\""][..]],
        |b: &mut ReaderBuilder| b.parse_strategy(ParseStrategy::QuotedRaw)
    );
    parses_to!(
        parallel_strategy,
        "a,\"b,c\",d\n",
        &[&["a", "b,c", "d"][..]],
        |b: &mut ReaderBuilder| {
            b.parse_strategy(ParseStrategy::QuotedParallel)
        }
    );
    parses_to!(
        naive_strategy,
        "a,\"b,c\"\n",
        &[&["a", "\"b", "c\""][..]],
        |b: &mut ReaderBuilder| b.parse_strategy(ParseStrategy::Naive)
    );

    // Test that the header row is consumed up front and never yielded
    // as data.
    #[test]
    fn headers_not_yielded() {
        let data = "name,count\nfoo,1\nbar,2\n";
        let mut rdr: Reader<_> =
            ReaderBuilder::new().has_headers(true).from_reader(data.as_bytes());
        assert_eq!(rdr.headers().unwrap(), Some(&svec(&["name", "count"])));
        let rows = rdr
            .records()
            .collect::<crate::Result<Vec<Vec<String>>>>()
            .unwrap();
        assert_eq!(rows, vec![svec(&["foo", "1"]), svec(&["bar", "2"])]);
        // The stored header is still available after iteration.
        assert_eq!(rdr.headers().unwrap(), Some(&svec(&["name", "count"])));
    }

    #[test]
    fn headers_consumed_without_explicit_access() {
        let data = "name,count\nfoo,1\n";
        let mut rdr: Reader<_> =
            ReaderBuilder::new().has_headers(true).from_reader(data.as_bytes());
        let rows = rdr
            .records()
            .collect::<crate::Result<Vec<Vec<String>>>>()
            .unwrap();
        assert_eq!(rows, vec![svec(&["foo", "1"])]);
    }

    #[test]
    fn no_headers_by_default() {
        let data = "a,b\n";
        let mut rdr: Reader<_> = Reader::from_reader(data.as_bytes());
        assert_eq!(rdr.headers().unwrap(), None);
        let rows = rdr
            .records()
            .collect::<crate::Result<Vec<Vec<String>>>>()
            .unwrap();
        assert_eq!(rows, vec![svec(&["a", "b"])]);
    }

    #[test]
    fn empty_source_has_no_rows() {
        let mut rdr: Reader<_> =
            ReaderBuilder::new().has_headers(true).from_reader("".as_bytes());
        assert_eq!(rdr.headers().unwrap(), None);
        assert!(rdr.read_row().unwrap().is_none());
        assert!(rdr.read_row().unwrap().is_none());
    }

    // Test that a column-count mismatch is diagnostic only: the short
    // row still comes through.
    #[test]
    fn mismatched_row_still_delivered() {
        let data = "a,b,c\nd,e\n";
        let mut rdr: Reader<_> = Reader::from_reader(data.as_bytes());
        let rows = rdr
            .records()
            .collect::<crate::Result<Vec<Vec<String>>>>()
            .unwrap();
        assert_eq!(rows, vec![svec(&["a", "b", "c"]), svec(&["d", "e"])]);
    }

    // Test that an unterminated quote surfaces as an error once and the
    // iterator is terminal afterwards.
    #[test]
    fn unterminated_quote_ends_iteration() {
        let data = "a,b\n\"open";
        let mut rdr: Reader<_> = Reader::from_reader(data.as_bytes());
        let mut records = rdr.records();
        assert_eq!(records.next().unwrap().unwrap(), svec(&["a", "b"]));
        match records.next() {
            Some(Err(Error::UnterminatedQuote { record })) => {
                assert_eq!(record, 1)
            }
            other => panic!("unexpected item: {:?}", other),
        }
        assert!(records.next().is_none());
        assert!(records.next().is_none());
    }

    #[test]
    fn counter_includes_header() {
        let data = "h1,h2\na,b\n";
        let mut rdr: Reader<_> =
            ReaderBuilder::new().has_headers(true).from_reader(data.as_bytes());
        let rows = rdr
            .records()
            .collect::<crate::Result<Vec<Vec<String>>>>()
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rdr.records_read(), 2);
        assert!(rdr.is_done());
    }

    #[test]
    fn deque_rows() {
        use std::collections::VecDeque;

        let data = "a,b\n";
        let mut rdr: Reader<_, VecDeque<String>> =
            Reader::from_reader(data.as_bytes());
        let row = rdr.read_row().unwrap().unwrap();
        assert_eq!(row, VecDeque::from(svec(&["a", "b"])));
    }
}
