/*!
Streaming CSV reading and writing with quote-aware record assembly.

A logical CSV record is not always one physical line: a quoted field may
contain the delimiter, doubled quotes, or literal line breaks. This crate
keeps one bit of quote state consistent across three layers—field
escape/unescape, record-into-fields splitting, and stream-into-records
assembly—so that such fields survive a round trip.

The main types are [`Reader`] and [`Writer`], composed from parts that
are all public on their own: [`escape`]/[`unescape`] field transforms,
the [`split_quoted`] family of tokenizers, and the [`LineReader`]/
[`LineWriter`] stream adapters. Rows are loaded into any container
implementing [`Record`]; `Vec<String>` is the default.

### Example

```
use delimited::{Reader, ReaderBuilder, WriterBuilder};

let mut wtr = WriterBuilder::new().from_writer(Vec::new());
wtr.write_header(&vec!["name".to_string(), "note".to_string()]);
wtr.write_record(&vec![
    "ada".to_string(),
    "said \"hi\",\ntwice".to_string(),
]);
let data = wtr.as_string().to_string();

let mut rdr: Reader<_> =
    ReaderBuilder::new().has_headers(true).from_reader(data.as_bytes());
let rows = rdr.records().collect::<delimited::Result<Vec<_>>>().unwrap();
assert_eq!(
    rows,
    vec![vec!["ada".to_string(), "said \"hi\",\ntwice".to_string()]]
);
```
*/

pub use crate::error::{Error, Result};
pub use crate::escape::{escape, unescape};
pub use crate::format::{join_escaped, join_raw};
pub use crate::line::{LineReader, LineWriter};
pub use crate::reader::{ParseStrategy, Reader, ReaderBuilder, Records};
pub use crate::record::Record;
pub use crate::split::{
    split_naive, split_quoted, split_quoted_parallel, split_quoted_raw,
};
pub use crate::writer::{FormatStrategy, Terminator, Writer, WriterBuilder};

mod error;
mod escape;
mod format;
mod line;
mod reader;
mod record;
mod split;
mod writer;
