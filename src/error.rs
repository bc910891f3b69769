use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::result;

use streamcsv_core::SyntaxError;

use crate::deserializer::DeserializeError;
use crate::row::Position;

/// A type alias for `Result<T, streamcsv::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when reading CSV data.
///
/// Most errors are tied to a position in the data. Use `position` to
/// retrieve it, and `kind` to inspect what went wrong.
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    /// A crate private constructor for `Error`.
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }

    /// Return the specific type of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Unwrap this error into its underlying type.
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns true if this is an I/O error.
    pub fn is_io_error(&self) -> bool {
        match *self.0 {
            ErrorKind::Io(_) => true,
            _ => false,
        }
    }

    /// Return the position for this error, if one exists.
    pub fn position(&self) -> Option<&Position> {
        match *self.0 {
            ErrorKind::Utf8 { ref pos, .. } => pos.as_ref(),
            ErrorKind::Syntax { ref pos, .. } => pos.as_ref(),
            ErrorKind::FieldTooLong { ref pos, .. } => Some(pos),
            ErrorKind::Deserialize { ref pos, .. } => pos.as_ref(),
            _ => None,
        }
    }

    /// Attach `at` to this error if it can carry a position and does not
    /// have one yet.
    pub(crate) fn locate(mut self, at: Position) -> Error {
        match *self.0 {
            ErrorKind::Utf8 { ref mut pos, .. }
            | ErrorKind::Syntax { ref mut pos, .. }
            | ErrorKind::Deserialize { ref mut pos, .. } => {
                if pos.is_none() {
                    *pos = Some(at);
                }
            }
            _ => {}
        }
        self
    }
}

/// The specific type of an error.
#[derive(Debug)]
pub enum ErrorKind {
    /// An I/O error that occurred while reading CSV data.
    Io(io::Error),
    /// The input is not valid UTF-8.
    Utf8 {
        /// The position of the record in which this error occurred, if
        /// available.
        pos: Option<Position>,
        /// The number of bytes of input that were valid UTF-8 (and a byte
        /// order mark, if any) before the invalid sequence.
        valid_up_to: u64,
    },
    /// The CSV data could not be recognized. This only happens when the
    /// reader does not tolerate unescaped quotes.
    Syntax {
        /// The position of the record in which this error occurred, if
        /// available.
        pos: Option<Position>,
        /// The syntax error itself.
        err: SyntaxError,
    },
    /// A field is longer than the configured maximum number of characters
    /// per column.
    FieldTooLong {
        /// The position of the record in which this error occurred.
        pos: Position,
        /// The index of the first field that is too long.
        field: usize,
        /// The configured maximum.
        limit: usize,
    },
    /// A field selection names a column that is not in the header row.
    UnknownHeader {
        /// The name that was not found.
        name: String,
    },
    /// A field selection by name was requested, but the reader has no
    /// headers.
    HeadersRequired,
    /// An error that occurred while deserializing a row into a Rust type.
    Deserialize {
        /// The position of the record in which this error occurred, if
        /// available.
        pos: Option<Position>,
        /// The deserialization error.
        err: DeserializeError,
    },
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::new(ErrorKind::Io(err))
    }
}

impl From<SyntaxError> for Error {
    fn from(err: SyntaxError) -> Error {
        Error::new(ErrorKind::Syntax { pos: None, err })
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        io::Error::new(io::ErrorKind::Other, err)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self.0 {
            ErrorKind::Io(ref err) => Some(err),
            ErrorKind::Syntax { ref err, .. } => Some(err),
            ErrorKind::Deserialize { ref err, .. } => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            ErrorKind::Io(ref err) => err.fmt(f),
            ErrorKind::Utf8 { pos: None, valid_up_to } => write!(
                f,
                "CSV parse error: invalid UTF-8 after byte {}",
                valid_up_to
            ),
            ErrorKind::Utf8 { pos: Some(ref pos), valid_up_to } => write!(
                f,
                "CSV parse error: record {} (line {}, character {}): \
                 invalid UTF-8 after byte {}",
                pos.record(),
                pos.line(),
                pos.offset(),
                valid_up_to
            ),
            ErrorKind::Syntax { pos: None, ref err } => err.fmt(f),
            ErrorKind::Syntax { pos: Some(ref pos), ref err } => write!(
                f,
                "CSV parse error: record {} (line {}, character {}, \
                 field {}): {}",
                pos.record(),
                pos.line(),
                pos.offset(),
                err.field(),
                err.kind()
            ),
            ErrorKind::FieldTooLong { ref pos, field, limit } => write!(
                f,
                "CSV parse error: record {} (line {}): field {} has more \
                 than {} characters",
                pos.record(),
                pos.line(),
                field,
                limit
            ),
            ErrorKind::UnknownHeader { ref name } => write!(
                f,
                "CSV error: cannot select column {:?}, which is not in the \
                 header row",
                name
            ),
            ErrorKind::HeadersRequired => write!(
                f,
                "CSV error: columns can only be selected by name when the \
                 data has headers"
            ),
            ErrorKind::Deserialize { pos: None, ref err } => {
                write!(f, "CSV deserialize error: {}", err)
            }
            ErrorKind::Deserialize { pos: Some(ref pos), ref err } => write!(
                f,
                "CSV deserialize error: record {} (line {}): {}",
                pos.record(),
                pos.line(),
                err
            ),
        }
    }
}
