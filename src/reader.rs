use std::fs::File;
use std::io;
use std::marker::PhantomData;
use std::mem;
use std::path::Path;

use log::debug;
use serde::de::DeserializeOwned;
use streamcsv_core::{
    CharSource, ReadRecordResult, Recognizer, RecognizerBuilder,
};

use crate::accumulator::{RowAccumulator, Substitutes};
use crate::cursor::{Cursor, LineSeparator, DEFAULT_BUFFER_CAPACITY};
use crate::deserializer::deserialize_row;
use crate::error::{Error, ErrorKind, Result};
use crate::row::{Position, Row};
use crate::selection::{Projection, Selector};

/// The default maximum number of characters in a field.
const DEFAULT_MAX_CHARS_PER_COLUMN: usize = 4096;

/// Builds a CSV reader with various configuration knobs.
///
/// This builder can be used to tweak the field delimiter, quoting rules,
/// line separators, null handling, headers and column selection. Once a
/// CSV `Reader` is built, its configuration cannot be changed.
#[derive(Debug)]
pub struct ReaderBuilder {
    builder: RecognizerBuilder,
    capacity: usize,
    separator: LineSeparator,
    newline: char,
    subst: Substitutes,
    has_headers: bool,
    headers: Option<Row>,
    selector: Selector,
    reorder: bool,
    max_records: Option<u64>,
    max_chars: usize,
}

impl Default for ReaderBuilder {
    fn default() -> ReaderBuilder {
        ReaderBuilder {
            builder: RecognizerBuilder::default(),
            capacity: DEFAULT_BUFFER_CAPACITY,
            separator: LineSeparator::default(),
            newline: '\n',
            subst: Substitutes::default(),
            has_headers: false,
            headers: None,
            selector: Selector::default(),
            reorder: true,
            max_records: None,
            max_chars: DEFAULT_MAX_CHARS_PER_COLUMN,
        }
    }
}

impl ReaderBuilder {
    /// Create a new builder for configuring CSV parsing.
    ///
    /// To convert a builder into a reader, call one of the methods starting
    /// with `from_`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::error::Error;
    /// use streamcsv::ReaderBuilder;
    ///
    /// # fn main() { example().unwrap(); }
    /// fn example() -> Result<(), Box<dyn Error>> {
    ///     let data = "\
    /// city;country;pop
    /// Boston;United States;4628910
    /// ";
    ///     let mut rdr = ReaderBuilder::new()
    ///         .delimiter(';')
    ///         .has_headers(true)
    ///         .from_reader(data.as_bytes());
    ///
    ///     let row = rdr.parse_next()?.expect("a row");
    ///     assert_eq!(row.get(0), Some("Boston"));
    ///     assert_eq!(row.get(2), Some("4628910"));
    ///     assert!(rdr.parse_next()?.is_none());
    ///     Ok(())
    /// }
    /// ```
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Build a CSV parser from this configuration that reads data from `rdr`.
    ///
    /// Note that the CSV reader is buffered automatically, so you should not
    /// wrap `rdr` in a buffered reader like `io::BufReader`.
    pub fn from_reader<R: io::Read>(&self, rdr: R) -> Reader<R> {
        Reader::new(self, rdr)
    }

    /// Build a CSV parser from this configuration that reads data from the
    /// given file path.
    ///
    /// If there was a problem opening the file at the given path, then this
    /// returns the corresponding error.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Reader<File>> {
        Ok(Reader::new(self, File::open(path)?))
    }

    /// The field delimiter to use when parsing CSV.
    ///
    /// The default is `,`.
    pub fn delimiter(&mut self, delimiter: char) -> &mut ReaderBuilder {
        self.builder.delimiter(delimiter);
        self
    }

    /// The quote character to use when parsing CSV.
    ///
    /// The default is `"`.
    pub fn quote(&mut self, quote: char) -> &mut ReaderBuilder {
        self.builder.quote(quote);
        self
    }

    /// The character that escapes a quote inside a quoted field.
    ///
    /// The default is `"`, i.e., quotes are escaped by doubling them.
    pub fn escape(&mut self, escape: char) -> &mut ReaderBuilder {
        self.builder.escape(escape);
        self
    }

    /// Whether to skip whitespace and control characters before each field.
    ///
    /// This is enabled by default.
    pub fn trim_leading(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.builder.trim_leading(yes);
        self
    }

    /// Whether to drop whitespace and control characters at the end of each
    /// unquoted field.
    ///
    /// This is enabled by default.
    pub fn trim_trailing(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.builder.trim_trailing(yes);
        self
    }

    /// Whether to accept unescaped quotes inside quoted fields.
    ///
    /// When enabled (the default), malformed quoting is repaired by keeping
    /// the stray quotes as field content. When disabled, it is reported as
    /// an `ErrorKind::Syntax` error.
    pub fn unescaped_quotes(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.builder.unescaped_quotes(yes);
        self
    }

    /// Whether an escaped quote is kept live as a possible closing quote.
    ///
    /// See `RecognizerBuilder::ignore_quote_escape` in `streamcsv-core`.
    /// This is disabled by default.
    pub fn ignore_quote_escape(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.builder.ignore_quote_escape(yes);
        self
    }

    /// The line separator used in the CSV data.
    ///
    /// The default is `LineSeparator::Lf`.
    pub fn line_separator(
        &mut self,
        separator: LineSeparator,
    ) -> &mut ReaderBuilder {
        self.separator = separator;
        self
    }

    /// The character that line separators are replaced with.
    ///
    /// This is the character that ends records, and also the character that
    /// represents a line break inside quoted fields. The default is `\n`.
    pub fn normalized_newline(&mut self, newline: char) -> &mut ReaderBuilder {
        self.newline = newline;
        self.builder.terminator(newline);
        self
    }

    /// The value used for empty fields, i.e., fields with nothing between
    /// their delimiters such as the middle field of `a,,b`.
    ///
    /// The default is `None`, which means such fields are null.
    pub fn null_value(&mut self, value: Option<&str>) -> &mut ReaderBuilder {
        self.subst.null = value.map(|s| s.to_string());
        self
    }

    /// The value used for fields whose value has zero length, such as `""`
    /// or, when trimming, a field of only whitespace at the end of a row.
    ///
    /// The default is `None`, which means such fields are null.
    pub fn empty_value(&mut self, value: Option<&str>) -> &mut ReaderBuilder {
        self.subst.empty = value.map(|s| s.to_string());
        self
    }

    /// Whether to treat the first row as a special header row.
    ///
    /// When enabled, the first non-empty row is consumed and is available
    /// through `Reader::headers`. It is never returned as a data row. This
    /// is disabled by default.
    pub fn has_headers(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.has_headers = yes;
        self
    }

    /// Use these headers instead of the header row of the data.
    ///
    /// If `has_headers` is also enabled, the first row of the data is still
    /// consumed, but is discarded.
    pub fn headers<T: AsRef<str>>(
        &mut self,
        headers: &[T],
    ) -> &mut ReaderBuilder {
        self.headers = Some(Row::from(headers));
        self
    }

    /// Only keep the columns at these indexes.
    ///
    /// This replaces any earlier column selection.
    pub fn select_indexes(&mut self, indexes: &[usize]) -> &mut ReaderBuilder {
        self.selector = Selector::SelectIndexes(indexes.to_vec());
        self
    }

    /// Drop the columns at these indexes.
    ///
    /// This replaces any earlier column selection.
    pub fn exclude_indexes(
        &mut self,
        indexes: &[usize],
    ) -> &mut ReaderBuilder {
        self.selector = Selector::ExcludeIndexes(indexes.to_vec());
        self
    }

    /// Only keep the columns with these header names.
    ///
    /// Reading fails with `ErrorKind::HeadersRequired` if the reader has no
    /// headers, and with `ErrorKind::UnknownHeader` if a name is not among
    /// them. This replaces any earlier column selection.
    pub fn select_fields<T: AsRef<str>>(
        &mut self,
        names: &[T],
    ) -> &mut ReaderBuilder {
        self.selector = Selector::SelectFields(to_strings(names));
        self
    }

    /// Drop the columns with these header names.
    ///
    /// The same requirements as for `select_fields` apply. This replaces
    /// any earlier column selection.
    pub fn exclude_fields<T: AsRef<str>>(
        &mut self,
        names: &[T],
    ) -> &mut ReaderBuilder {
        self.selector = Selector::ExcludeFields(to_strings(names));
        self
    }

    /// Whether rows contain only the selected columns, in selection order.
    ///
    /// When disabled, rows keep every column and the columns that are not
    /// selected are null. This is enabled by default.
    pub fn column_reordering(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.reorder = yes;
        self
    }

    /// Stop reading after this many data rows. The header row is not
    /// counted.
    ///
    /// The default is `None`, i.e., no limit.
    pub fn max_records(&mut self, limit: Option<u64>) -> &mut ReaderBuilder {
        self.max_records = limit;
        self
    }

    /// The maximum number of characters in a single field.
    ///
    /// A row with a longer field results in an `ErrorKind::FieldTooLong`
    /// error. The default is `4096`.
    pub fn max_chars_per_column(
        &mut self,
        limit: usize,
    ) -> &mut ReaderBuilder {
        self.max_chars = limit;
        self.builder.whitespace_capacity(limit);
        self
    }

    /// Set the capacity (in bytes) of the buffer used in the CSV reader.
    pub fn buffer_capacity(&mut self, capacity: usize) -> &mut ReaderBuilder {
        self.capacity = capacity;
        self
    }
}

fn to_strings<T: AsRef<str>>(names: &[T]) -> Vec<String> {
    names.iter().map(|n| n.as_ref().to_string()).collect()
}

/// A configured CSV reader.
///
/// A CSV reader takes as input CSV data and transforms that into rows of
/// fields, where each field is either a string or null.
///
/// # Example
///
/// ```
/// use std::error::Error;
/// use streamcsv::Reader;
///
/// # fn main() { example().unwrap(); }
/// fn example() -> Result<(), Box<dyn Error>> {
///     let data = "\
/// Boston, \"United States\" ,4628910
/// Concord,,42695
/// ";
///     let mut rdr = Reader::from_reader(data.as_bytes());
///     let rows = rdr.rows().collect::<Result<Vec<_>, _>>()?;
///     assert_eq!(rows[0].get(1), Some("United States"));
///     assert!(rows[1].is_null(1));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Reader<R> {
    rcg: Recognizer,
    src: Cursor<R>,
    subst: Substitutes,
    max_chars: usize,
    state: ReaderState,
}

#[derive(Debug)]
struct ReaderState {
    /// Whether the first row is a header row.
    has_headers: bool,
    /// The header row, either given explicitly or read from the data.
    headers: Option<Row>,
    /// The header row as seen by deserialization, after column selection.
    de_headers: Option<Row>,
    /// Whether headers were read and the selection resolved.
    started: bool,
    selector: Selector,
    projection: Projection,
    reorder: bool,
    /// Scratch space for rows before column selection.
    raw: Row,
    max_records: Option<u64>,
    /// The number of data rows returned so far.
    rows: u64,
    /// The number of records recognized so far, skipped ones included.
    records: u64,
    /// The position at which the last record started.
    cur_pos: Position,
    /// Whether reading has finished.
    done: bool,
}

impl Reader<File> {
    /// Create a new CSV parser with a default configuration for the given
    /// file path.
    ///
    /// To customize CSV parsing, use a `ReaderBuilder`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Reader<File>> {
        ReaderBuilder::new().from_path(path)
    }
}

impl<R: io::Read> Reader<R> {
    /// Create a new CSV reader given a builder and a source of underlying
    /// bytes.
    fn new(builder: &ReaderBuilder, rdr: R) -> Reader<R> {
        Reader {
            rcg: builder.builder.build(),
            src: Cursor::new(
                rdr,
                builder.capacity,
                builder.separator,
                builder.newline,
            ),
            subst: builder.subst.clone(),
            max_chars: builder.max_chars,
            state: ReaderState {
                has_headers: builder.has_headers,
                headers: builder.headers.clone(),
                de_headers: None,
                started: false,
                selector: builder.selector.clone(),
                projection: Projection::All,
                reorder: builder.reorder,
                raw: Row::new(),
                max_records: builder.max_records,
                rows: 0,
                records: 0,
                cur_pos: Position::new(),
                done: false,
            },
        }
    }

    /// Create a new CSV parser with a default configuration for the given
    /// reader.
    ///
    /// To customize CSV parsing, use a `ReaderBuilder`.
    pub fn from_reader(rdr: R) -> Reader<R> {
        ReaderBuilder::new().from_reader(rdr)
    }

    /// Returns a borrowed iterator over all rows.
    ///
    /// Each item yielded by this iterator is a `Result<Row, Error>`.
    /// Therefore, in order to access the row, callers must handle the
    /// possibility of error (typically with `?`).
    ///
    /// If `has_headers` was enabled via a `ReaderBuilder`, then the header
    /// row is never yielded.
    pub fn rows(&mut self) -> RowsIter<R> {
        RowsIter { rdr: self }
    }

    /// Returns an owned iterator over all rows.
    pub fn into_rows(self) -> RowsIntoIter<R> {
        RowsIntoIter { rdr: self }
    }

    /// Returns a borrowed iterator over deserialized rows.
    ///
    /// When the reader has headers, rows are deserialized by header name
    /// into structs and maps. Otherwise, fields are deserialized in order.
    /// Null fields, as well as empty strings, deserialize as `None` into
    /// `Option` types and are an error everywhere else.
    ///
    /// # Example
    ///
    /// ```
    /// use std::error::Error;
    /// use serde::Deserialize;
    /// use streamcsv::ReaderBuilder;
    ///
    /// #[derive(Debug, Deserialize, Eq, PartialEq)]
    /// struct Row {
    ///     city: String,
    ///     country: String,
    ///     popcount: Option<u64>,
    /// }
    ///
    /// # fn main() { example().unwrap(); }
    /// fn example() -> Result<(), Box<dyn Error>> {
    ///     let data = "\
    /// city,country,popcount
    /// Boston,United States,4628910
    /// Unnamed,Nowhere,
    /// ";
    ///     let mut rdr = ReaderBuilder::new()
    ///         .has_headers(true)
    ///         .from_reader(data.as_bytes());
    ///     let rows: Vec<Row> =
    ///         rdr.deserialize().collect::<Result<_, _>>()?;
    ///     assert_eq!(rows[0].popcount, Some(4628910));
    ///     assert_eq!(rows[1].popcount, None);
    ///     Ok(())
    /// }
    /// ```
    pub fn deserialize<D>(&mut self) -> DeserializeRowsIter<R, D>
    where
        D: DeserializeOwned,
    {
        DeserializeRowsIter::new(self)
    }

    /// Returns an owned iterator over deserialized rows.
    pub fn into_deserialize<D>(self) -> DeserializeRowsIntoIter<R, D>
    where
        D: DeserializeOwned,
    {
        DeserializeRowsIntoIter::new(self)
    }

    /// Returns the header row, reading it first if necessary.
    ///
    /// This returns `None` when the reader neither reads a header row nor
    /// was given explicit headers, or when the data is empty.
    pub fn headers(&mut self) -> Result<Option<&Row>> {
        self.start()?;
        Ok(self.state.headers.as_ref())
    }

    /// Read the next row into `row`, reusing its allocation.
    ///
    /// This returns `true` if a row was read and `false` when there are no
    /// more rows, in which case `row` is cleared. Empty rows, such as blank
    /// lines, are skipped.
    pub fn read_row(&mut self, row: &mut Row) -> Result<bool> {
        let read = self.read_row_inner(row);
        if let Ok(false) = read {
            row.clear();
        }
        read
    }

    /// Read the next row, if any.
    pub fn parse_next(&mut self) -> Result<Option<Row>> {
        let mut row = Row::new();
        if self.read_row(&mut row)? {
            Ok(Some(row))
        } else {
            Ok(None)
        }
    }

    /// Returns the position at which the most recently read record started.
    ///
    /// Before any record has been read, this is the start of the data.
    pub fn position(&self) -> &Position {
        &self.state.cur_pos
    }

    /// Returns true if and only if this reader will not return any more
    /// rows, because the data is exhausted, the record limit was reached or
    /// `stop` was called.
    pub fn is_done(&self) -> bool {
        self.state.done
    }

    /// Stop reading. Every later read returns no row.
    pub fn stop(&mut self) {
        self.state.done = true;
    }

    /// Returns a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        self.src.get_ref()
    }

    /// Unwraps this CSV reader, returning the underlying reader.
    ///
    /// Note that any leftover data inside this reader's internal buffer is
    /// lost.
    pub fn into_inner(self) -> R {
        self.src.into_inner()
    }

    fn read_row_inner(&mut self, row: &mut Row) -> Result<bool> {
        self.start()?;
        if self.state.done {
            return Ok(false);
        }
        if let Some(limit) = self.state.max_records {
            if self.state.rows >= limit {
                debug!("stopping after reaching the limit of {} rows", limit);
                self.state.done = true;
                return Ok(false);
            }
        }
        let read = if self.state.projection.is_all() {
            self.read_record(row)?
        } else {
            let mut raw = mem::replace(&mut self.state.raw, Row::new());
            let read = self.read_record(&mut raw);
            if let Ok(true) = read {
                self.state.projection.apply(self.state.reorder, &raw, row);
            }
            self.state.raw = raw;
            read?
        };
        if read {
            self.state.rows += 1;
        } else {
            self.state.done = true;
        }
        Ok(read)
    }

    /// Read headers and resolve the column selection, once.
    fn start(&mut self) -> Result<()> {
        if self.state.started {
            return Ok(());
        }
        self.state.started = true;
        // A failed header read leaves the reader without headers, but the
        // selection is still settled before the error is returned.
        let mut failed = None;
        if self.state.has_headers {
            let mut first = Row::new();
            match self.read_record(&mut first) {
                Ok(true) if self.state.headers.is_none() => {
                    self.state.headers = Some(first);
                }
                Ok(_) => {}
                Err(err) => failed = Some(err),
            }
        }
        let projection =
            match self.state.selector.resolve(self.state.headers.as_ref()) {
                Ok(projection) => projection,
                Err(err) => {
                    self.state.done = true;
                    return Err(failed.unwrap_or(err));
                }
            };
        self.state.de_headers = match self.state.headers {
            Some(ref headers) if self.state.reorder => {
                let mut projected = Row::new();
                projection.apply(true, headers, &mut projected);
                Some(projected)
            }
            ref headers => headers.clone(),
        };
        self.state.projection = projection;
        match failed {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Read the next record with at least one field.
    fn read_record(&mut self, row: &mut Row) -> Result<bool> {
        loop {
            row.clear();
            self.state.cur_pos = self.here();
            let (res, too_long) = {
                let mut acc =
                    RowAccumulator::new(row, &self.subst, self.max_chars);
                let res = self.rcg.read_record(&mut self.src, &mut acc);
                (res, acc.too_long())
            };
            let res = match res {
                Ok(res) => res,
                Err(err) => return Err(err.locate(self.here())),
            };
            if res == ReadRecordResult::End {
                return Ok(false);
            }
            self.state.records += 1;
            if row.is_empty() {
                continue;
            }
            if let Some(field) = too_long {
                let pos = self.state.cur_pos.clone();
                let limit = self.max_chars;
                return Err(Error::new(ErrorKind::FieldTooLong {
                    pos,
                    field,
                    limit,
                }));
            }
            return Ok(true);
        }
    }

    /// The current position of the underlying cursor.
    fn here(&self) -> Position {
        let mut pos = Position::new();
        pos.set_record(self.state.records)
            .set_line(self.src.line())
            .set_offset(self.src.offset());
        pos
    }

    fn deserialize_row<D: DeserializeOwned>(&self, row: &Row) -> Result<D> {
        deserialize_row(row, self.state.de_headers.as_ref()).map_err(|err| {
            Error::new(ErrorKind::Deserialize {
                pos: Some(self.state.cur_pos.clone()),
                err,
            })
        })
    }
}

/// A borrowed iterator over rows.
///
/// The lifetime parameter `'r` refers to the lifetime of the underlying CSV
/// `Reader`.
pub struct RowsIter<'r, R: 'r> {
    rdr: &'r mut Reader<R>,
}

impl<'r, R: io::Read> RowsIter<'r, R> {
    /// Return a reference to the underlying CSV reader.
    pub fn reader(&self) -> &Reader<R> {
        &self.rdr
    }
}

impl<'r, R: io::Read> Iterator for RowsIter<'r, R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Result<Row>> {
        self.rdr.parse_next().transpose()
    }
}

/// An owned iterator over rows.
pub struct RowsIntoIter<R> {
    rdr: Reader<R>,
}

impl<R: io::Read> RowsIntoIter<R> {
    /// Return a reference to the underlying CSV reader.
    pub fn reader(&self) -> &Reader<R> {
        &self.rdr
    }

    /// Drop this iterator and return the underlying CSV reader.
    pub fn into_reader(self) -> Reader<R> {
        self.rdr
    }
}

impl<R: io::Read> Iterator for RowsIntoIter<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Result<Row>> {
        self.rdr.parse_next().transpose()
    }
}

/// A borrowed iterator over deserialized rows.
///
/// The lifetime parameter `'r` refers to the lifetime of the underlying CSV
/// `Reader`. The type parameter `D` refers to the type that this iterator
/// will deserialize a row into.
pub struct DeserializeRowsIter<'r, R: 'r, D> {
    rdr: &'r mut Reader<R>,
    row: Row,
    _priv: PhantomData<D>,
}

impl<'r, R: io::Read, D: DeserializeOwned> DeserializeRowsIter<'r, R, D> {
    fn new(rdr: &'r mut Reader<R>) -> DeserializeRowsIter<'r, R, D> {
        DeserializeRowsIter { rdr, row: Row::new(), _priv: PhantomData }
    }

    /// Return a reference to the underlying CSV reader.
    pub fn reader(&self) -> &Reader<R> {
        &self.rdr
    }
}

impl<'r, R: io::Read, D: DeserializeOwned> Iterator
    for DeserializeRowsIter<'r, R, D>
{
    type Item = Result<D>;

    fn next(&mut self) -> Option<Result<D>> {
        match self.rdr.read_row(&mut self.row) {
            Err(err) => Some(Err(err)),
            Ok(false) => None,
            Ok(true) => Some(self.rdr.deserialize_row(&self.row)),
        }
    }
}

/// An owned iterator over deserialized rows.
///
/// The type parameter `D` refers to the type that this iterator will
/// deserialize a row into.
pub struct DeserializeRowsIntoIter<R, D> {
    rdr: Reader<R>,
    row: Row,
    _priv: PhantomData<D>,
}

impl<R: io::Read, D: DeserializeOwned> DeserializeRowsIntoIter<R, D> {
    fn new(rdr: Reader<R>) -> DeserializeRowsIntoIter<R, D> {
        DeserializeRowsIntoIter { rdr, row: Row::new(), _priv: PhantomData }
    }

    /// Return a reference to the underlying CSV reader.
    pub fn reader(&self) -> &Reader<R> {
        &self.rdr
    }

    /// Drop this iterator and return the underlying CSV reader.
    pub fn into_reader(self) -> Reader<R> {
        self.rdr
    }
}

impl<R: io::Read, D: DeserializeOwned> Iterator
    for DeserializeRowsIntoIter<R, D>
{
    type Item = Result<D>;

    fn next(&mut self) -> Option<Result<D>> {
        match self.rdr.read_row(&mut self.row) {
            Err(err) => Some(Err(err)),
            Ok(false) => None,
            Ok(true) => Some(self.rdr.deserialize_row(&self.row)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use crate::error::ErrorKind;
    use crate::row::Row;

    use super::{Reader, ReaderBuilder};

    fn b(s: &str) -> &[u8] {
        s.as_bytes()
    }

    fn fields(row: &Row) -> Vec<Option<&str>> {
        row.iter().collect()
    }

    #[test]
    fn read_row_reuses_allocation() {
        let mut rdr = Reader::from_reader(b("a,b\nc,d\n"));
        let mut row = Row::new();

        assert!(rdr.read_row(&mut row).unwrap());
        assert_eq!(fields(&row), vec![Some("a"), Some("b")]);
        assert!(rdr.read_row(&mut row).unwrap());
        assert_eq!(fields(&row), vec![Some("c"), Some("d")]);
        assert!(!rdr.read_row(&mut row).unwrap());
        assert!(row.is_empty());
        assert!(rdr.is_done());
    }

    #[test]
    fn blank_rows_skipped() {
        let mut rdr = Reader::from_reader(b("\n\na\n   \n\"\nb"));
        let rows = rdr.rows().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(rows, vec![Row::from(&["a"][..]), Row::from(&["b"][..])]);
    }

    #[test]
    fn positions() {
        let mut rdr = Reader::from_reader(b("a\n\nb,c\n"));
        rdr.parse_next().unwrap();
        assert_eq!(rdr.position().record(), 0);
        assert_eq!(rdr.position().line(), 1);
        rdr.parse_next().unwrap();
        assert_eq!(rdr.position().record(), 2);
        assert_eq!(rdr.position().line(), 3);
        assert_eq!(rdr.position().offset(), 3);
    }

    #[test]
    fn stop() {
        let mut rdr = Reader::from_reader(b("a\nb\n"));
        assert!(rdr.parse_next().unwrap().is_some());
        rdr.stop();
        assert!(rdr.is_done());
        assert!(rdr.parse_next().unwrap().is_none());
    }

    #[test]
    fn headers_explicit() {
        let mut rdr = ReaderBuilder::new()
            .headers(&["x", "y"])
            .from_reader(b("1,2\n"));
        assert_eq!(
            fields(rdr.headers().unwrap().unwrap()),
            vec![Some("x"), Some("y")]
        );
        assert_eq!(rdr.rows().count(), 1);
    }

    #[test]
    fn headers_explicit_replace_header_row() {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .headers(&["x", "y"])
            .from_reader(b("a,b\n1,2\n"));
        let rows = rdr.rows().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(rows, vec![Row::from(&["1", "2"][..])]);
        assert_eq!(
            fields(rdr.headers().unwrap().unwrap()),
            vec![Some("x"), Some("y")]
        );
    }

    #[test]
    fn no_headers() {
        let mut rdr = Reader::from_reader(b("a\n"));
        assert!(rdr.headers().unwrap().is_none());
        assert_eq!(rdr.rows().count(), 1);
    }

    #[test]
    fn field_too_long() {
        let mut rdr = ReaderBuilder::new()
            .max_chars_per_column(3)
            .from_reader(b("abc,de\nabcd,e\nf\n"));
        assert!(rdr.parse_next().unwrap().is_some());
        let err = rdr.parse_next().unwrap_err();
        match *err.kind() {
            ErrorKind::FieldTooLong { ref pos, field: 0, limit: 3 } => {
                assert_eq!(pos.record(), 1);
                assert_eq!(pos.line(), 2);
                assert_eq!(pos.offset(), 7);
            }
            ref kind => panic!("unexpected error kind: {:?}", kind),
        }
        // The offending row was consumed.
        let row = rdr.parse_next().unwrap().unwrap();
        assert_eq!(fields(&row), vec![Some("f")]);
    }

    #[test]
    fn into_inner() {
        let rdr = Reader::from_reader(io::Cursor::new("a,b"));
        let inner = rdr.into_inner();
        assert_eq!(inner.get_ref(), &"a,b");
    }
}
