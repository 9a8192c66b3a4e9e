use std::error;
use std::fmt;
use std::io;
use std::result;
use std::str;

/// A type alias for `Result<T, delimited::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when reading CSV data.
///
/// Note that writing CSV data never produces one of these. The write side
/// absorbs stream failures into a queryable health state instead; see
/// [`LineWriter::is_healthy`](crate::LineWriter::is_healthy).
#[derive(Debug)]
pub enum Error {
    /// An I/O error reported by the underlying byte source.
    Io(io::Error),
    /// A UTF-8 decoding error that occurred while assembling a record into
    /// a Rust `String`.
    Utf8 {
        /// The zero-based index of the record that failed validation.
        record: u64,
        /// The corresponding UTF-8 error.
        err: str::Utf8Error,
    },
    /// The end of the source was reached while still inside a quoted field.
    ///
    /// No partial record is fabricated when this happens. The bytes of the
    /// incomplete record are discarded and the reader reports exhaustion on
    /// every subsequent call.
    UnterminatedQuote {
        /// The zero-based index of the record that was being assembled when
        /// the source ran out.
        record: u64,
    },
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::Utf8 { ref err, .. } => Some(err),
            Error::UnterminatedQuote { .. } => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref err) => err.fmt(f),
            Error::Utf8 { record, ref err } => {
                write!(f, "CSV parse error: record {}: {}", record, err)
            }
            Error::UnterminatedQuote { record } => {
                write!(
                    f,
                    "CSV parse error: record {}: \
                     unterminated quoted field at end of input",
                    record
                )
            }
        }
    }
}
