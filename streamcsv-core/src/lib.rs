/*!
`streamcsv-core` provides a character-at-a-time CSV record recognizer.

The recognizer does no I/O and no decoding. It pulls already decoded
characters from a [`CharSource`] and pushes field content into a
[`FieldSink`], one record per call to [`Recognizer::read_record`]. Line
separators must be normalized to a single terminator character by the
source before they reach the recognizer.

Quote handling is lenient by default. Unescaped quotes inside quoted values
are kept as content, text that follows a closing quote and some whitespace
is folded back into the value, and a line holding nothing but a quote is an
empty record. Each leniency can be switched off with
[`RecognizerBuilder::unescaped_quotes`], in which case the recognizer
reports a [`SyntaxError`].

The recognizer never decides what an empty field means. It distinguishes a
value with zero length (`""`) from an empty field (nothing between two
delimiters) and leaves the interpretation, such as mapping the latter to
null, to the sink.

# Example

```
use streamcsv_core::{Field, Fields, ReadRecordResult, Recognizer, StrSource};

let mut rcg = Recognizer::new();
let mut src = StrSource::new("a, \"b,c\" ,,\"\"\n");
let mut fields = Fields::new();

assert_eq!(ReadRecordResult::Record, rcg.read_record(&mut src, &mut fields)?);
assert_eq!(fields.take(), vec![
    Field::Value("a".to_string()),
    Field::Value("b,c".to_string()),
    Field::Empty,
    Field::Value(String::new()),
]);
assert_eq!(ReadRecordResult::End, rcg.read_record(&mut src, &mut fields)?);
# Ok::<(), streamcsv_core::SyntaxError>(())
```
*/

#![deny(missing_docs)]

pub use crate::error::{SyntaxError, SyntaxErrorKind};
pub use crate::recognizer::{ReadRecordResult, Recognizer, RecognizerBuilder};
pub use crate::sink::{Field, FieldSink, Fields};
pub use crate::source::{CharSource, StrSource};

mod error;
mod recognizer;
mod sink;
mod source;

/// Returns true if `ch` is whitespace or a control character, i.e., its
/// code point is at most `U+0020`.
///
/// This is the class of characters that trimming removes.
#[inline]
pub fn is_blank(ch: char) -> bool {
    ch <= ' '
}
