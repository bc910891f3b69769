use std::str;

use crate::error::SyntaxError;

/// A supplier of already decoded, newline-normalized characters.
///
/// The recognizer pulls exactly one character per call to `next_char`. Every
/// line separator in the underlying data must have been replaced by the
/// recognizer's record terminator before it is returned, so that a record
/// terminator is always a single character.
///
/// Errors produced by the recognizer are converted into the source's error
/// type, which lets a source backed by I/O report both kinds of failure
/// through one type.
pub trait CharSource {
    /// The error type returned by this source.
    type Error: From<SyntaxError>;

    /// Return the next character, or `None` once the data is exhausted.
    ///
    /// After returning `None` once, every subsequent call must also return
    /// `None`.
    fn next_char(&mut self) -> Result<Option<char>, Self::Error>;

    /// The current line number, starting at `1`.
    fn line(&self) -> u64;

    /// The number of characters returned so far.
    fn offset(&self) -> u64;
}

/// A character source over an in-memory string.
///
/// No newline normalization is done. Whatever character is given as the
/// terminator (`\n` by default) is the only character counted as a line
/// break.
#[derive(Clone, Debug)]
pub struct StrSource<'a> {
    chars: str::Chars<'a>,
    term: char,
    line: u64,
    offset: u64,
}

impl<'a> StrSource<'a> {
    /// Create a source over `data` that counts `\n` as a line break.
    pub fn new(data: &'a str) -> StrSource<'a> {
        StrSource::with_terminator(data, '\n')
    }

    /// Create a source over `data` that counts `term` as a line break.
    pub fn with_terminator(data: &'a str, term: char) -> StrSource<'a> {
        StrSource { chars: data.chars(), term, line: 1, offset: 0 }
    }

    /// The data that has not been read yet.
    pub fn as_str(&self) -> &'a str {
        self.chars.as_str()
    }
}

impl<'a> CharSource for StrSource<'a> {
    type Error = SyntaxError;

    fn next_char(&mut self) -> Result<Option<char>, SyntaxError> {
        let ch = self.chars.next();
        if let Some(ch) = ch {
            self.offset += 1;
            self.line += (ch == self.term) as u64;
        }
        Ok(ch)
    }

    fn line(&self) -> u64 {
        self.line
    }

    fn offset(&self) -> u64 {
        self.offset
    }
}
