use std::fs;
use std::io;
use std::path::Path;
use std::str;

use log::warn;

use crate::error::Result;
use crate::format::{join_escaped, join_raw};
use crate::line::LineWriter;
use crate::record::Record;

/// A record terminator for written CSV data.
///
/// The read side always accepts a line feed as the record boundary (with
/// a trailing carriage return stripped), so this only shapes output.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Terminator {
    /// Terminate records with `\r\n`.
    ///
    /// This is the default.
    CRLF,
    /// Terminate records with the byte given.
    Any(u8),
}

impl Default for Terminator {
    fn default() -> Terminator {
        Terminator::CRLF
    }
}

impl Terminator {
    pub(crate) fn push_onto(&self, out: &mut String) {
        match *self {
            Terminator::CRLF => out.push_str("\r\n"),
            Terminator::Any(b) => out.push(char::from(b)),
        }
    }
}

/// The strategy used to turn a row's fields into one record's text.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FormatStrategy {
    /// Quote and escape each field that needs it.
    ///
    /// This is the default.
    Escaped,
    /// Join fields verbatim. A field containing the delimiter or a line
    /// break will not survive a read back; for trusted output only.
    Raw,
}

impl Default for FormatStrategy {
    fn default() -> FormatStrategy {
        FormatStrategy::Escaped
    }
}

/// Builds a CSV writer with various configuration knobs.
#[derive(Clone, Debug)]
pub struct WriterBuilder {
    delimiter: u8,
    warn_on_column_mismatch: bool,
    terminator: Terminator,
    strategy: FormatStrategy,
}

impl Default for WriterBuilder {
    fn default() -> WriterBuilder {
        WriterBuilder {
            delimiter: b',',
            warn_on_column_mismatch: true,
            terminator: Terminator::default(),
            strategy: FormatStrategy::default(),
        }
    }
}

impl WriterBuilder {
    /// Create a new builder for configuring a CSV writer.
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// The field delimiter to use when writing CSV.
    ///
    /// Must be a single ASCII byte. The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut WriterBuilder {
        self.delimiter = delimiter;
        self
    }

    /// Whether to log a warning when a row's field count differs from
    /// the first row written.
    ///
    /// The mismatch is diagnostic only: the row is written either way.
    /// Enabled by default.
    pub fn warn_on_column_mismatch(&mut self, yes: bool) -> &mut WriterBuilder {
        self.warn_on_column_mismatch = yes;
        self
    }

    /// The record terminator to use when writing CSV.
    ///
    /// The default is [`Terminator::CRLF`].
    pub fn terminator(&mut self, terminator: Terminator) -> &mut WriterBuilder {
        self.terminator = terminator;
        self
    }

    /// The strategy used to format a row into record text.
    ///
    /// The default is [`FormatStrategy::Escaped`].
    pub fn format_strategy(&mut self, strategy: FormatStrategy) -> &mut WriterBuilder {
        self.strategy = strategy;
        self
    }

    /// Build a CSV writer from an arbitrary `io::Write`.
    pub fn from_writer<W: io::Write>(&self, wtr: W) -> Writer<W> {
        Writer {
            line_writer: LineWriter::new(wtr),
            delimiter: self.delimiter,
            warn_on_column_mismatch: self.warn_on_column_mismatch,
            terminator: self.terminator,
            strategy: self.strategy,
            num_columns: None,
        }
    }

    /// Build a CSV writer for the file path given, truncating any
    /// existing file.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Writer<fs::File>> {
        Ok(self.from_writer(fs::File::create(path)?))
    }
}

/// A CSV writer.
///
/// Formats rows with the configured strategy and hands the finished
/// record text to a [`LineWriter`](crate::LineWriter). Stream failures do
/// not surface as errors here: the first fault parks the underlying sink
/// and later writes become no-ops, observable through
/// [`is_healthy`](Writer::is_healthy) and
/// [`last_error`](Writer::last_error).
///
/// ### Example
///
/// ```
/// use delimited::WriterBuilder;
///
/// let mut wtr = WriterBuilder::new().from_writer(Vec::new());
/// wtr.write_record(&vec!["a".to_string(), "b,c".to_string()]);
/// assert_eq!(wtr.as_string(), "a,\"b,c\"\r\n");
/// ```
pub struct Writer<W: io::Write> {
    line_writer: LineWriter<W>,
    delimiter: u8,
    warn_on_column_mismatch: bool,
    terminator: Terminator,
    strategy: FormatStrategy,
    num_columns: Option<usize>,
}

impl<W: io::Write> Writer<W> {
    /// Create a new CSV writer with the default configuration.
    pub fn from_writer(wtr: W) -> Writer<W> {
        WriterBuilder::new().from_writer(wtr)
    }

    /// Writes the header row and seeds the expected column count from
    /// its field count.
    ///
    /// An empty row is a no-op.
    pub fn write_header<C: Record>(&mut self, row: &C) {
        if row.is_empty() {
            return;
        }
        self.num_columns = Some(row.len());
        let text = self.format(row);
        self.line_writer.write_record(&text);
    }

    /// Writes one row.
    ///
    /// An empty row is a no-op: nothing is written and nothing is
    /// counted. The first non-empty row (or the header) seeds the
    /// expected column count; rows that differ from it are still
    /// written, with a warning logged when enabled.
    pub fn write_record<C: Record>(&mut self, row: &C) {
        if row.is_empty() {
            return;
        }
        match self.num_columns {
            None => self.num_columns = Some(row.len()),
            Some(expected) => {
                if self.warn_on_column_mismatch && row.len() != expected {
                    warn!(
                        "record {}: writing {} fields where {} were expected",
                        self.line_writer.records_written(),
                        row.len(),
                        expected,
                    );
                }
            }
        }
        let text = self.format(row);
        self.line_writer.write_record(&text);
    }

    /// Flushes buffered output through to the sink.
    pub fn flush(&mut self) {
        self.line_writer.flush();
    }

    /// Returns true while the sink has not faulted.
    pub fn is_healthy(&self) -> bool {
        self.line_writer.is_healthy()
    }

    /// Returns the error that parked this writer, if any.
    pub fn last_error(&self) -> Option<&io::Error> {
        self.line_writer.last_error()
    }

    /// Returns the number of records written so far, the header
    /// included.
    pub fn records_written(&self) -> u64 {
        self.line_writer.records_written()
    }

    /// Returns the configured delimiter.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    fn format<C: Record>(&self, row: &C) -> String {
        match self.strategy {
            FormatStrategy::Escaped => {
                join_escaped(row, self.delimiter, self.terminator)
            }
            FormatStrategy::Raw => {
                join_raw(row, self.delimiter, self.terminator)
            }
        }
    }
}

impl Writer<Vec<u8>> {
    /// Returns the written CSV data as a string. Flushes first.
    pub fn as_string(&mut self) -> &str {
        // Record text is built from `&str` fields, so the buffer is
        // always valid UTF-8.
        str::from_utf8(self.line_writer.as_bytes()).unwrap()
    }
}
