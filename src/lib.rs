/*!
The `streamcsv` crate provides a streaming, lenient CSV reader with support
for Serde.

Data is decoded as UTF-8 and read one character at a time, so arbitrarily
large inputs can be parsed with a fixed amount of buffering. Rows are made
of fields that are either strings or null, which lets callers tell a field
that was present but empty apart from one that had no value at all.

# Overview

The primary type is [`Reader`], which is configured with a
[`ReaderBuilder`]. Each row is returned as a [`Row`], or deserialized into
a type of your choosing via [`Reader::deserialize`].

The reader is forgiving by default:

* Whitespace around fields is trimmed.
* Unescaped quotes inside quoted fields are kept as content.
* Text that follows a closing quote and some whitespace is folded back into
  the quoted field.
* Blank lines are skipped.

All of this is configurable, along with the delimiter, quote and escape
characters, line separators, header handling, column selection, and what
empty fields turn into.

The character-level record recognizer lives in the `streamcsv-core` crate,
which does no I/O and no allocation per character.

# Example

```
use std::error::Error;
use streamcsv::{LineSeparator, ReaderBuilder};

# fn main() { example().unwrap(); }
fn example() -> Result<(), Box<dyn Error>> {
    let data = "name,nick\r\n Ann , \"The \"\"A\"\"\" \r\nBob,\r\n";
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .line_separator(LineSeparator::CrLf)
        .from_reader(data.as_bytes());

    let ann = rdr.parse_next()?.expect("a row");
    assert_eq!(ann.get(0), Some("Ann"));
    assert_eq!(ann.get(1), Some("The \"A\""));

    let bob = rdr.parse_next()?.expect("a row");
    assert_eq!(bob.get(0), Some("Bob"));
    assert!(bob.is_null(1));

    assert!(rdr.parse_next()?.is_none());
    Ok(())
}
```
*/

#![deny(missing_docs)]

pub use streamcsv_core::{SyntaxError, SyntaxErrorKind};

pub use crate::cursor::LineSeparator;
pub use crate::deserializer::{DeserializeError, DeserializeErrorKind};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::reader::{
    DeserializeRowsIntoIter, DeserializeRowsIter, Reader, ReaderBuilder,
    RowsIntoIter, RowsIter,
};
pub use crate::row::{Position, Row, RowIter};

mod accumulator;
mod cursor;
mod deserializer;
mod error;
mod reader;
mod row;
mod selection;
