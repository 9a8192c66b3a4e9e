use std::cmp;
use std::mem;
use std::thread;

use crate::escape::unescape_in_place;
use crate::record::Record;

/// Upper bound on worker threads used by [`split_quoted_parallel`], on top
/// of whatever `available_parallelism` reports.
const MAX_UNESCAPE_THREADS: usize = 8;

/// Scanner context: whether the current position is inside a quoted field.
///
/// Both the record tokenizer here and the stream assembler in `line` run
/// the same two-state machine; each owns its state for the span it scans
/// (one record here, the whole stream there).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum State {
    Unquoted,
    Quoted,
}

/// Splits one logical record into raw fields, respecting quoted regions.
///
/// Fields are returned still escaped; a quoted field keeps its outer
/// quotes and doubled interior quotes. In the unquoted state the
/// delimiter or a line feed ends the current field, and a quote enters
/// the quoted state. Inside quotes everything—delimiter and line feed
/// included—is field data.
///
/// The last field is flushed when it is non-empty or when fewer fields
/// were produced than delimiters seen, so a trailing delimiter yields a
/// trailing empty field. A carriage return at the end of the last field
/// is stripped, which handles CRLF-terminated records.
pub fn split_quoted_raw<C: Record>(record: &str, delimiter: u8) -> C {
    into_record(split_fields(record, delimiter))
}

/// Splits one logical record into unescaped fields.
///
/// Equivalent to [`split_quoted_raw`] followed by
/// [`unescape`](crate::unescape) on every field. This is the default
/// parse strategy.
///
/// ```
/// use delimited::split_quoted;
///
/// let row: Vec<String> = split_quoted("a,\"b,c\",d", b',');
/// assert_eq!(row, vec!["a", "b,c", "d"]);
/// ```
pub fn split_quoted<C: Record>(record: &str, delimiter: u8) -> C {
    let mut fields = split_fields(record, delimiter);
    for field in fields.iter_mut() {
        unescape_in_place(field);
    }
    into_record(fields)
}

/// Splits one logical record into unescaped fields, unescaping in
/// parallel.
///
/// Output is identical to [`split_quoted`], field for field. The
/// per-field unescape is fanned out over a bounded pool of scoped
/// threads, each owning a disjoint chunk of the field buffer, so
/// positional order is preserved no matter which worker finishes first.
/// Only worth it for records with many large quoted fields.
pub fn split_quoted_parallel<C: Record>(record: &str, delimiter: u8) -> C {
    let mut fields = split_fields(record, delimiter);
    let threads = cmp::min(
        MAX_UNESCAPE_THREADS,
        thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
    );
    if threads < 2 || fields.len() < 2 {
        for field in fields.iter_mut() {
            unescape_in_place(field);
        }
        return into_record(fields);
    }
    let chunk_len = (fields.len() + threads - 1) / threads;
    thread::scope(|scope| {
        for chunk in fields.chunks_mut(chunk_len) {
            scope.spawn(move || {
                for field in chunk {
                    unescape_in_place(field);
                }
            });
        }
    });
    into_record(fields)
}

/// Splits one logical record on the delimiter with no quote awareness.
///
/// This produces incorrect results on quoted input: a delimiter inside a
/// quoted field still splits, and quotes are passed through verbatim. It
/// exists for trusted input known to contain neither delimiters nor
/// quotes inside fields, where skipping the state machine is worthwhile.
///
/// Empty fields are preserved everywhere—leading, interior and
/// trailing—exactly as the quote-aware splitters do, and one trailing
/// record terminator (`\n`, `\r\n` or `\r`) is trimmed before splitting.
/// Empty input yields a single empty field.
pub fn split_naive<C: Record>(record: &str, delimiter: u8) -> C {
    let mut input = record;
    if let Some(stripped) = input.strip_suffix('\n') {
        input = stripped;
    }
    if let Some(stripped) = input.strip_suffix('\r') {
        input = stripped;
    }
    let mut row = C::default();
    for field in input.split(char::from(delimiter)) {
        row.push_field(field.to_string());
    }
    row
}

/// The tokenizer core. Always returns at least one field.
fn split_fields(record: &str, delimiter: u8) -> Vec<String> {
    let delimiter = char::from(delimiter);
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut state = State::Unquoted;
    let mut expected_cols = 1;
    for c in record.chars() {
        match state {
            State::Unquoted => {
                if c == '"' {
                    state = State::Quoted;
                    field.push(c);
                } else if c == delimiter || c == '\n' {
                    if c == delimiter {
                        expected_cols += 1;
                    }
                    fields.push(mem::take(&mut field));
                } else {
                    field.push(c);
                }
            }
            State::Quoted => {
                if c == '"' {
                    state = State::Unquoted;
                }
                field.push(c);
            }
        }
    }
    if !field.is_empty() || fields.len() < expected_cols {
        fields.push(field);
    }
    if let Some(last) = fields.last_mut() {
        if last.ends_with('\r') {
            last.pop();
        }
    }
    fields
}

fn into_record<C: Record>(fields: Vec<String>) -> C {
    let mut row = C::default();
    for field in fields {
        row.push_field(field);
    }
    row
}
