use std::error;
use std::fmt;

/// An error that occurs when a record cannot be recognized.
///
/// Every syntax error is fatal for the record in which it occurs. The
/// recognizer makes no attempt to resynchronize after reporting one; callers
/// decide whether to abort or to skip ahead.
///
/// Syntax errors only occur when the recognizer has been told not to
/// tolerate unescaped quotes. In its default configuration, a recognizer
/// always finds *a* parse.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyntaxError {
    kind: SyntaxErrorKind,
    line: u64,
    offset: u64,
    field: usize,
    value: String,
}

/// The specific type of a syntax error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SyntaxErrorKind {
    /// A quote appeared inside a quoted value without being escaped and
    /// without closing the value.
    UnescapedQuote {
        /// The quote character.
        quote: char,
    },
    /// Something other than whitespace, a delimiter or a record terminator
    /// followed a closed quoted value.
    MalformedQuotedTail {
        /// The quote character that closed the value.
        quote: char,
        /// The first non-whitespace character after the value.
        found: char,
    },
    /// The character after a quoted value was neither a delimiter nor a
    /// record terminator.
    UnexpectedTrailingCharacter {
        /// The offending character.
        found: char,
        /// The delimiter that was expected.
        delimiter: char,
    },
}

impl SyntaxError {
    pub(crate) fn new(
        kind: SyntaxErrorKind,
        line: u64,
        offset: u64,
        field: usize,
        value: &str,
    ) -> SyntaxError {
        SyntaxError { kind, line, offset, field, value: value.to_string() }
    }

    /// Return the specific type of this error.
    pub fn kind(&self) -> &SyntaxErrorKind {
        &self.kind
    }

    /// The line on which the error was detected, as reported by the
    /// character source.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The character offset at which the error was detected, as reported by
    /// the character source.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The index (starting at `0`) of the field in which the error occurred.
    pub fn field(&self) -> usize {
        self.field
    }

    /// The portion of the offending value that was accumulated before the
    /// error was detected.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl error::Error for SyntaxError {}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "CSV syntax error: line {}, character {}, field {}: {} \
             (value so far: {:?})",
            self.line, self.offset, self.field, self.kind, self.value
        )
    }
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SyntaxErrorKind::UnescapedQuote { quote } => write!(
                f,
                "unescaped quote {:?} inside quoted value; enable \
                 unescaped quote tolerance to accept it",
                quote
            ),
            SyntaxErrorKind::MalformedQuotedTail { quote, found } => write!(
                f,
                "found {:?} after closing quote {:?} and whitespace; \
                 enable unescaped quote tolerance to accept it",
                found, quote
            ),
            SyntaxErrorKind::UnexpectedTrailingCharacter {
                found,
                delimiter,
            } => write!(
                f,
                "unexpected character {:?} following quoted value, \
                 expected {:?} or end of record",
                found, delimiter
            ),
        }
    }
}
