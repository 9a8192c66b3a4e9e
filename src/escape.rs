use std::borrow::Cow;

use memchr::{memchr, memchr3};

/// The quoting byte. This crate always quotes with `"` and escapes quotes
/// by doubling them.
pub(crate) const QUOTE: u8 = b'"';

/// Returns true if and only if the field must be quoted to survive a
/// round trip: it contains the delimiter, a quote, a carriage return or a
/// line feed.
#[inline]
fn needs_quotes(field: &[u8], delimiter: u8) -> bool {
    memchr3(delimiter, QUOTE, b'\r', field).is_some()
        || memchr(b'\n', field).is_some()
}

/// Escapes a single field for writing.
///
/// If the field contains the delimiter, a quote character, a carriage
/// return or a line feed—or if `force` is set—the result is the field
/// wrapped in quotes with every interior quote doubled. Otherwise the
/// field is returned unchanged, without allocating.
///
/// This is a total function: every input, including the empty string, has
/// a well defined result.
///
/// ```
/// use delimited::escape;
///
/// assert_eq!(escape("a,b", b',', false), "\"a,b\"");
/// assert_eq!(escape("ab", b',', false), "ab");
/// assert_eq!(escape("ab", b',', true), "\"ab\"");
/// ```
pub fn escape(field: &str, delimiter: u8, force: bool) -> Cow<str> {
    if !force && !needs_quotes(field.as_bytes(), delimiter) {
        return Cow::Borrowed(field);
    }
    let mut escaped = String::with_capacity(field.len() + 2);
    escaped.push('"');
    for c in field.chars() {
        if c == '"' {
            escaped.push('"');
        }
        escaped.push(c);
    }
    escaped.push('"');
    Cow::Owned(escaped)
}

/// Unescapes a single field read from CSV data.
///
/// If the first character is a quote, the field is assumed to carry its
/// outer quote pair, which is stripped. Doubled interior quotes collapse
/// to one literal quote. Fields that need no rewriting are returned as a
/// borrow of the input.
///
/// Inverse of [`escape`] on any correctly escaped input:
/// `unescape(escape(s, d, force)) == s` for every `s`, `d` and `force`.
///
/// ```
/// use delimited::unescape;
///
/// assert_eq!(unescape("\"he said \"\"hi\"\"\""), "he said \"hi\"");
/// assert_eq!(unescape("plain"), "plain");
/// assert_eq!(unescape(""), "");
/// ```
pub fn unescape(field: &str) -> Cow<str> {
    if field.is_empty() {
        return Cow::Borrowed(field);
    }
    let bytes = field.as_bytes();
    let inner = if bytes[0] == QUOTE {
        if bytes.len() >= 2 && bytes[bytes.len() - 1] == QUOTE {
            &field[1..field.len() - 1]
        } else {
            // Mis-escaped: an opening quote with no closing partner.
            &field[1..]
        }
    } else {
        field
    };
    if memchr(QUOTE, inner.as_bytes()).is_none() {
        return Cow::Borrowed(inner);
    }
    let mut unescaped = String::with_capacity(inner.len());
    let mut quotes_seen = 0;
    for c in inner.chars() {
        if c == '"' {
            quotes_seen += 1;
            if quotes_seen == 2 {
                unescaped.push('"');
                quotes_seen = 0;
            }
        } else {
            quotes_seen = 0;
            unescaped.push(c);
        }
    }
    Cow::Owned(unescaped)
}

/// Unescapes a field in place, skipping the write when the field is
/// already raw.
pub(crate) fn unescape_in_place(field: &mut String) {
    let unescaped = match unescape(field) {
        Cow::Owned(s) => Some(s),
        Cow::Borrowed(s) if s.len() != field.len() => Some(s.to_string()),
        Cow::Borrowed(_) => None,
    };
    if let Some(s) = unescaped {
        *field = s;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! escapes_to {
        ($name:ident, $given:expr, $expect:expr) => {
            escapes_to!($name, $given, $expect, b',', false);
        };
        ($name:ident, $given:expr, $expect:expr, $delim:expr, $force:expr) => {
            #[test]
            fn $name() {
                assert_eq!(escape($given, $delim, $force), $expect);
            }
        };
    }

    macro_rules! unescapes_to {
        ($name:ident, $given:expr) => {
            unescapes_to!($name, $given, $given);
        };
        ($name:ident, $given:expr, $expect:expr) => {
            #[test]
            fn $name() {
                assert_eq!(unescape($given), $expect);
            }
        };
    }

    escapes_to!(escape_plain, "ab", "ab");
    escapes_to!(escape_empty, "", "");
    escapes_to!(escape_delimiter, "a,b", "\"a,b\"");
    escapes_to!(escape_quote, "he said \"hi\"", "\"he said \"\"hi\"\"\"");
    escapes_to!(escape_line_feed, "a\nb", "\"a\nb\"");
    escapes_to!(escape_carriage_return, "a\rb", "\"a\rb\"");
    escapes_to!(escape_forced, "ab", "\"ab\"", b',', true);
    escapes_to!(escape_alternate_delim, "a;b", "\"a;b\"", b';', false);
    escapes_to!(escape_comma_not_special, "a,b", "a,b", b';', false);

    unescapes_to!(unescape_plain, "ab");
    unescapes_to!(unescape_empty, "");
    unescapes_to!(unescape_quoted, "\"a,b\"", "a,b");
    unescapes_to!(unescape_doubled, "\"he said \"\"hi\"\"\"", "he said \"hi\"");
    unescapes_to!(unescape_embedded_newline, "\"a\nb\"", "a\nb");
    unescapes_to!(unescape_lone_quote, "\"", "");
    unescapes_to!(unescape_empty_quotes, "\"\"", "");

    // Test that quoting is only applied when needed.
    #[test]
    fn escape_borrows_when_clean() {
        match escape("nothing special", b',', false) {
            Cow::Borrowed(_) => {}
            Cow::Owned(ref s) => panic!("unexpected allocation: {:?}", s),
        }
    }

    // Test the round-trip law on a handful of adversarial inputs.
    #[test]
    fn escape_then_unescape_is_identity() {
        let inputs = [
            "",
            "plain",
            "a,b",
            "\"",
            "\"\"",
            "he said \"hi\"",
            "line1\nline2",
            "crlf\r\nend",
            ",leading",
            "trailing,",
        ];
        for input in inputs.iter() {
            let escaped = escape(input, b',', false);
            assert_eq!(
                unescape(&escaped),
                *input,
                "round trip failed for {:?}",
                input
            );
            let forced = escape(input, b',', true);
            assert_eq!(
                unescape(&forced),
                *input,
                "forced round trip failed for {:?}",
                input
            );
        }
    }

    #[test]
    fn unescape_in_place_strips_quotes() {
        let mut field = "\"a,b\"".to_string();
        unescape_in_place(&mut field);
        assert_eq!(field, "a,b");

        let mut raw = "plain".to_string();
        unescape_in_place(&mut raw);
        assert_eq!(raw, "plain");
    }
}
