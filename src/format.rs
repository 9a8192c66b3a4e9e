use crate::escape::escape;
use crate::record::Record;
use crate::writer::Terminator;

/// Joins a record's fields with the delimiter and appends the terminator,
/// escaping each field that needs it.
pub fn join_escaped<C: Record>(
    row: &C,
    delimiter: u8,
    terminator: Terminator,
) -> String {
    let mut out = String::new();
    for i in 0..row.len() {
        if i > 0 {
            out.push(char::from(delimiter));
        }
        if let Some(field) = row.get(i) {
            out.push_str(&escape(field, delimiter, false));
        }
    }
    terminator.push_onto(&mut out);
    out
}

/// Joins a record's fields with the delimiter and appends the terminator,
/// writing every field verbatim.
///
/// No escaping is performed, so a field containing the delimiter or a
/// line break will not survive a read back. Intended for trusted output
/// paths that guarantee clean fields.
pub fn join_raw<C: Record>(
    row: &C,
    delimiter: u8,
    terminator: Terminator,
) -> String {
    let mut out = String::new();
    for i in 0..row.len() {
        if i > 0 {
            out.push(char::from(delimiter));
        }
        if let Some(field) = row.get(i) {
            out.push_str(field);
        }
    }
    terminator.push_onto(&mut out);
    out
}
