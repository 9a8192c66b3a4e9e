use std::fs;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use memchr::memchr2;

use crate::error::{Error, Result};
use crate::escape::QUOTE;
use crate::split::State;

/// A stream adapter that assembles logical records from a byte source.
///
/// A logical record usually corresponds to one physical line, but a line
/// feed inside a quoted field is data, not a record boundary, so one
/// record may span several physical lines. The reader tracks quote state
/// while scanning for the terminating line feed and only ends a record
/// when that line feed is seen outside quotes.
///
/// Reading is strictly forward-only: consumed bytes are never revisited,
/// and once the source is exhausted every subsequent call reports
/// exhaustion.
///
/// ```
/// use delimited::LineReader;
///
/// let data = "\"line1\nline2\"\nnext\n";
/// let mut rdr = LineReader::new(data.as_bytes());
///
/// assert_eq!(rdr.read_record().unwrap(), Some("\"line1\nline2\"".to_string()));
/// assert_eq!(rdr.read_record().unwrap(), Some("next".to_string()));
/// assert_eq!(rdr.read_record().unwrap(), None);
/// assert_eq!(rdr.records_read(), 2);
/// ```
pub struct LineReader<R> {
    src: BufReader<R>,
    records_read: u64,
    done: bool,
}

impl LineReader<fs::File> {
    /// Creates a new line reader for the data at the file path given.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<LineReader<fs::File>> {
        Ok(LineReader::new(fs::File::open(path)?))
    }
}

impl<R: Read> LineReader<R> {
    /// Creates a new line reader from an arbitrary `io::Read`.
    ///
    /// The source is buffered for you automatically.
    pub fn new(src: R) -> LineReader<R> {
        LineReader { src: BufReader::new(src), records_read: 0, done: false }
    }

    /// Reads the next logical record.
    ///
    /// Returns `Ok(Some(text))` with the record's text, excluding the
    /// terminating line feed. A carriage return preceding that line feed
    /// is kept; the tokenizer strips it. A blank line is a record: its
    /// text is the empty string, which is distinct from `Ok(None)`, the
    /// end of the source.
    ///
    /// If the source ends while inside a quoted field, this returns
    /// `Err(Error::UnterminatedQuote)` and discards the partial record.
    /// After any error, or after `Ok(None)`, the reader is exhausted and
    /// keeps returning `Ok(None)`.
    pub fn read_record(&mut self) -> Result<Option<String>> {
        if self.done {
            return Ok(None);
        }
        let mut record: Vec<u8> = Vec::new();
        let mut state = State::Unquoted;
        loop {
            let available = match self.src.fill_buf() {
                Ok(buf) => buf,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {
                    continue
                }
                Err(err) => {
                    self.done = true;
                    return Err(Error::Io(err));
                }
            };
            if available.is_empty() {
                self.done = true;
                if state == State::Quoted {
                    return Err(Error::UnterminatedQuote {
                        record: self.records_read,
                    });
                }
                if record.is_empty() {
                    return Ok(None);
                }
                return self.finish_record(record);
            }

            // Scan this chunk for the next interesting byte: a quote
            // flips the state, a line feed outside quotes ends the
            // record. Everything in between is copied wholesale.
            let mut pos = 0;
            let mut terminator = None;
            while pos < available.len() {
                match memchr2(QUOTE, b'\n', &available[pos..]) {
                    None => {
                        pos = available.len();
                    }
                    Some(i) => {
                        let at = pos + i;
                        if available[at] == QUOTE {
                            state = match state {
                                State::Unquoted => State::Quoted,
                                State::Quoted => State::Unquoted,
                            };
                            pos = at + 1;
                        } else if state == State::Unquoted {
                            terminator = Some(at);
                            break;
                        } else {
                            // Line feed inside quotes: record continues
                            // across this physical line.
                            pos = at + 1;
                        }
                    }
                }
            }
            match terminator {
                Some(at) => {
                    record.extend_from_slice(&available[..at]);
                    self.src.consume(at + 1);
                    return self.finish_record(record);
                }
                None => {
                    record.extend_from_slice(&available[..pos]);
                    self.src.consume(pos);
                }
            }
        }
    }

    fn finish_record(&mut self, record: Vec<u8>) -> Result<Option<String>> {
        match String::from_utf8(record) {
            Ok(text) => {
                self.records_read += 1;
                Ok(Some(text))
            }
            Err(err) => Err(Error::Utf8 {
                record: self.records_read,
                err: err.utf8_error(),
            }),
        }
    }

    /// Returns the number of records read so far.
    ///
    /// The counter only moves on successful records; faults do not count.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Returns true once the source is exhausted or has faulted.
    pub fn is_done(&self) -> bool {
        self.done
    }
}

/// A stream adapter that writes pre-formatted records to a byte sink.
///
/// This is deliberately thin—symmetry with [`LineReader`], plus a
/// records-written counter and a health flag. The first I/O failure
/// parks the adapter: every later call is a no-op that does not touch
/// the counter, and the error that caused it stays available through
/// [`last_error`](LineWriter::last_error).
pub struct LineWriter<W: Write> {
    sink: BufWriter<W>,
    records_written: u64,
    err: Option<io::Error>,
}

impl LineWriter<fs::File> {
    /// Creates a new line writer for the file path given, truncating any
    /// existing file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<LineWriter<fs::File>> {
        Ok(LineWriter::new(fs::File::create(path)?))
    }
}

impl<W: Write> LineWriter<W> {
    /// Creates a new line writer from an arbitrary `io::Write`.
    ///
    /// The sink is buffered for you automatically.
    pub fn new(sink: W) -> LineWriter<W> {
        LineWriter { sink: BufWriter::new(sink), records_written: 0, err: None }
    }

    /// Writes one pre-formatted record verbatim, terminator included.
    ///
    /// A no-op if the sink has already faulted.
    pub fn write_record(&mut self, text: &str) {
        if self.err.is_some() {
            return;
        }
        match self.sink.write_all(text.as_bytes()) {
            Ok(()) => self.records_written += 1,
            Err(err) => self.err = Some(err),
        }
    }

    /// Flushes buffered output through to the sink.
    pub fn flush(&mut self) {
        if self.err.is_some() {
            return;
        }
        if let Err(err) = self.sink.flush() {
            self.err = Some(err);
        }
    }

    /// Returns true while the sink has not faulted.
    pub fn is_healthy(&self) -> bool {
        self.err.is_none()
    }

    /// Returns the error that parked this writer, if any.
    pub fn last_error(&self) -> Option<&io::Error> {
        self.err.as_ref()
    }

    /// Returns the number of records written so far.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }
}

impl LineWriter<Vec<u8>> {
    /// Returns the written data so far. Flushes the internal buffer.
    pub fn as_bytes(&mut self) -> &[u8] {
        self.flush();
        self.sink.get_ref()
    }
}
