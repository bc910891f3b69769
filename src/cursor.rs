use std::io;

use log::debug;
use memchr::memchr2;
use streamcsv_core::CharSource;

use crate::error::{Error, ErrorKind, Result};

/// The default buffer size, in bytes.
pub(crate) const DEFAULT_BUFFER_CAPACITY: usize = 64 * (1 << 10);

/// The longest UTF-8 encoding of a single character.
const MAX_UTF8_LEN: usize = 4;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// The line separator used in CSV data.
///
/// Whatever the separator, every occurrence is replaced by the reader's
/// normalized newline before records are recognized.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LineSeparator {
    /// `\n`. This is the default.
    Lf,
    /// `\r\n`. A `\r` that is not followed by `\n` is kept as is.
    CrLf,
    /// `\r`.
    Cr,
    /// Pick one of the above by looking at the first line separator in the
    /// first buffer of input. If none is found, `Lf` is used.
    Detect,
}

impl Default for LineSeparator {
    fn default() -> LineSeparator {
        LineSeparator::Lf
    }
}

/// A buffered source of decoded, newline-normalized characters.
#[derive(Debug)]
pub(crate) struct Cursor<R> {
    rdr: R,
    buf: Vec<u8>,
    /// The start of unread bytes in `buf`.
    pos: usize,
    /// The end of valid bytes in `buf`.
    end: usize,
    eof: bool,
    started: bool,
    separator: LineSeparator,
    newline: char,
    /// A character read while looking for the `\n` of a `\r\n`.
    pushback: Option<char>,
    /// The number of bytes consumed so far.
    bytes: u64,
    line: u64,
    offset: u64,
}

impl<R: io::Read> Cursor<R> {
    pub(crate) fn new(
        rdr: R,
        capacity: usize,
        separator: LineSeparator,
        newline: char,
    ) -> Cursor<R> {
        Cursor {
            rdr,
            buf: vec![0; capacity.max(MAX_UTF8_LEN)],
            pos: 0,
            end: 0,
            eof: false,
            started: false,
            separator,
            newline,
            pushback: None,
            bytes: 0,
            line: 1,
            offset: 0,
        }
    }

    pub(crate) fn get_ref(&self) -> &R {
        &self.rdr
    }

    pub(crate) fn into_inner(self) -> R {
        self.rdr
    }

    /// The line separator in use. Before the first character is read, this
    /// may still be `LineSeparator::Detect`.
    #[cfg(test)]
    pub(crate) fn separator(&self) -> LineSeparator {
        self.separator
    }

    /// Move unread bytes to the front of the buffer and read more data after
    /// them.
    fn fill(&mut self) -> io::Result<()> {
        if self.pos > 0 {
            self.buf.copy_within(self.pos..self.end, 0);
            self.end -= self.pos;
            self.pos = 0;
        }
        if self.eof || self.end == self.buf.len() {
            return Ok(());
        }
        loop {
            match self.rdr.read(&mut self.buf[self.end..]) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.end += n;
                    return Ok(());
                }
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
    }

    /// Make sure a complete character is buffered, unless the input ends
    /// first.
    fn fill_char(&mut self) -> io::Result<()> {
        while !self.eof && self.end - self.pos < MAX_UTF8_LEN {
            self.fill()?;
        }
        Ok(())
    }

    /// Skip a byte order mark and settle the line separator. Until this
    /// succeeds, every read retries it.
    fn start(&mut self) -> Result<()> {
        self.fill_char()?;
        let at_start = self.bytes == 0;
        if at_start && self.buf[self.pos..self.end].starts_with(BOM) {
            self.pos += BOM.len();
            self.bytes += BOM.len() as u64;
        }
        if self.separator == LineSeparator::Detect {
            self.separator = self.detect()?;
            debug!("detected line separator {:?}", self.separator);
        }
        self.started = true;
        Ok(())
    }

    fn detect(&mut self) -> io::Result<LineSeparator> {
        loop {
            let full = self.pos == 0 && self.end == self.buf.len();
            let hay = &self.buf[self.pos..self.end];
            match memchr2(b'\r', b'\n', hay) {
                Some(i) if hay[i] == b'\n' => return Ok(LineSeparator::Lf),
                Some(i) if i + 1 < hay.len() => {
                    return Ok(if hay[i + 1] == b'\n' {
                        LineSeparator::CrLf
                    } else {
                        LineSeparator::Cr
                    });
                }
                Some(_) if self.eof || full => return Ok(LineSeparator::Cr),
                None if self.eof || full => return Ok(LineSeparator::Lf),
                _ => self.fill()?,
            }
        }
    }

    /// Decode the next character from the raw input.
    fn decode(&mut self) -> Result<Option<char>> {
        self.fill_char()?;
        if self.pos == self.end {
            return Ok(None);
        }
        let (ch, size) = bstr::decode_utf8(&self.buf[self.pos..self.end]);
        let valid_up_to = self.bytes;
        self.pos += size;
        self.bytes += size as u64;
        match ch {
            Some(ch) => Ok(Some(ch)),
            None => {
                Err(Error::new(ErrorKind::Utf8 { pos: None, valid_up_to }))
            }
        }
    }
}

impl<R: io::Read> CharSource for Cursor<R> {
    type Error = Error;

    fn next_char(&mut self) -> Result<Option<char>> {
        if !self.started {
            self.start()?;
        }
        let ch = match self.pushback.take() {
            Some(ch) => Some(ch),
            None => self.decode()?,
        };
        let ch = match (ch, self.separator) {
            (Some('\n'), LineSeparator::Lf) => Some(self.newline),
            (Some('\r'), LineSeparator::Cr) => Some(self.newline),
            (Some('\r'), LineSeparator::CrLf) => match self.decode()? {
                Some('\n') => Some(self.newline),
                next => {
                    self.pushback = next;
                    Some('\r')
                }
            },
            (ch, _) => ch,
        };
        if let Some(ch) = ch {
            self.offset += 1;
            if ch == self.newline {
                self.line += 1;
            }
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

#[cfg(test)]
mod tests {
    use std::io::{self, Read};

    use streamcsv_core::CharSource;

    use crate::error::ErrorKind;

    use super::{Cursor, LineSeparator};

    /// A reader that returns at most one byte per call.
    struct Trickle<'a>(&'a [u8]);

    impl<'a> Read for Trickle<'a> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.0[0];
            self.0 = &self.0[1..];
            Ok(1)
        }
    }

    /// A reader whose first read fails.
    struct FailOnce<'a> {
        failed: bool,
        data: &'a [u8],
    }

    impl<'a> Read for FailOnce<'a> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.failed {
                self.failed = true;
                return Err(io::Error::new(io::ErrorKind::Other, "boom"));
            }
            self.data.read(buf)
        }
    }

    fn chars<R: Read>(mut cur: Cursor<R>) -> String {
        let mut s = String::new();
        while let Some(ch) = cur.next_char().unwrap() {
            s.push(ch);
        }
        s
    }

    fn cursor(data: &str, sep: LineSeparator) -> Cursor<&[u8]> {
        Cursor::new(data.as_bytes(), 8, sep, '\n')
    }

    #[test]
    fn lf_passes_through() {
        assert_eq!("a\r\nb\n", chars(cursor("a\r\nb\n", LineSeparator::Lf)));
    }

    #[test]
    fn crlf_normalized() {
        let cur = cursor("a\r\nb\rc\r\r\n", LineSeparator::CrLf);
        assert_eq!("a\nb\rc\r\n", chars(cur));
    }

    #[test]
    fn cr_normalized() {
        assert_eq!("a\nb\n", chars(cursor("a\rb\r", LineSeparator::Cr)));
    }

    #[test]
    fn custom_newline() {
        let cur = Cursor::new(&b"a\r\nb"[..], 8, LineSeparator::CrLf, '|');
        assert_eq!("a|b", chars(cur));
    }

    #[test]
    fn detect() {
        let cases = [
            ("a,b\r\nc", LineSeparator::CrLf),
            ("a,b\rc\n", LineSeparator::Cr),
            ("a,b\nc\r\n", LineSeparator::Lf),
            ("a,b", LineSeparator::Lf),
            ("a,b\r", LineSeparator::Cr),
        ];
        for &(data, expected) in &cases {
            let mut cur = cursor(data, LineSeparator::Detect);
            cur.next_char().unwrap();
            assert_eq!(expected, cur.separator(), "data: {:?}", data);
        }
    }

    #[test]
    fn detect_across_reads() {
        let rdr = Trickle(b"abcdefghij\r\nk");
        let mut cur = Cursor::new(rdr, 64, LineSeparator::Detect, '\n');
        cur.next_char().unwrap();
        assert_eq!(LineSeparator::CrLf, cur.separator());
    }

    #[test]
    fn detect_retried_after_error() {
        let rdr = FailOnce { failed: false, data: b"a\r\nb" };
        let mut cur = Cursor::new(rdr, 64, LineSeparator::Detect, '\n');
        assert!(cur.next_char().unwrap_err().is_io_error());
        assert_eq!("a\nb", chars(cur));
    }

    #[test]
    fn multibyte_split_across_reads() {
        let data = "añ☃𝄞z";
        let rdr = Trickle(data.as_bytes());
        let cur = Cursor::new(rdr, 4, LineSeparator::Lf, '\n');
        assert_eq!(data, chars(cur));
    }

    #[test]
    fn bom_skipped() {
        let data = "\u{FEFF}a,b";
        assert_eq!("a,b", chars(cursor(data, LineSeparator::Lf)));
    }

    #[test]
    fn lines_and_offsets() {
        let mut cur = cursor("ab\r\nc", LineSeparator::CrLf);
        while cur.next_char().unwrap().is_some() {}
        assert_eq!(2, cur.line());
        assert_eq!(4, cur.offset());
    }

    #[test]
    fn invalid_utf8() {
        let mut cur = Cursor::new(&b"ab\xFFc"[..], 8, LineSeparator::Lf, '\n');
        assert_eq!(Some('a'), cur.next_char().unwrap());
        assert_eq!(Some('b'), cur.next_char().unwrap());
        let err = cur.next_char().unwrap_err();
        match *err.kind() {
            ErrorKind::Utf8 { pos: None, valid_up_to: 2 } => {}
            ref kind => panic!("unexpected error kind: {:?}", kind),
        }
        // The bad byte is consumed.
        assert_eq!(Some('c'), cur.next_char().unwrap());
    }
}
