use std::fmt;
use std::iter::FromIterator;
use std::ops;

/// A single CSV row.
///
/// Every field is either a string (possibly empty) or null. Fields are
/// stored contiguously in one buffer, so a `Row` can be reused across reads
/// without reallocating.
///
/// Whether a field read from CSV data comes out as null or as a string
/// depends on the reader's `null_value` and `empty_value` settings.
#[derive(Clone, Eq, PartialEq)]
pub struct Row {
    /// All fields in this row, stored contiguously. Any text after the end
    /// of the last field belongs to a field that is still being read.
    text: String,
    /// The number of and location of each field in this row.
    bounds: Bounds,
}

impl Default for Row {
    fn default() -> Row {
        Row::new()
    }
}

impl Row {
    /// Create a new empty `Row`.
    pub fn new() -> Row {
        Row::with_capacity(0, 0)
    }

    /// Create a new empty `Row` with room for `buffer` bytes of field data
    /// and `fields` fields.
    pub fn with_capacity(buffer: usize, fields: usize) -> Row {
        Row {
            text: String::with_capacity(buffer),
            bounds: Bounds {
                ends: Vec::with_capacity(fields),
                nulls: Vec::with_capacity(fields),
            },
        }
    }

    /// Return the field at index `i`.
    ///
    /// This returns `None` both when no field at index `i` exists and when
    /// the field is null. Use `is_null` to tell these apart.
    pub fn get(&self, i: usize) -> Option<&str> {
        if self.bounds.is_null(i) {
            return None;
        }
        self.bounds.get(i).map(|range| &self.text[range])
    }

    /// Returns true if and only if the field at index `i` exists and is
    /// null.
    pub fn is_null(&self, i: usize) -> bool {
        self.bounds.is_null(i)
    }

    /// Returns true if and only if this row has no fields.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of fields in this row, null fields included.
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// Clear this row so that it has zero fields.
    ///
    /// Note that it is not necessary to clear the row to reuse it with the
    /// CSV reader.
    pub fn clear(&mut self) {
        self.text.clear();
        self.bounds.clear();
    }

    /// Add a new field to the end of this row.
    pub fn push_field(&mut self, field: Option<&str>) {
        self.truncate_pending(0);
        match field {
            None => self.commit(true),
            Some(field) => {
                self.text.push_str(field);
                self.commit(false);
            }
        }
    }

    /// Returns an iterator over all fields in this row. Null fields are
    /// yielded as `None`.
    pub fn iter(&self) -> RowIter {
        RowIter { row: self, i: 0 }
    }

    /// The text of the field currently being read.
    pub(crate) fn pending(&self) -> &str {
        &self.text[self.bounds.end()..]
    }

    pub(crate) fn push_pending(&mut self, ch: char) {
        self.text.push(ch);
    }

    pub(crate) fn push_pending_str(&mut self, s: &str) {
        self.text.push_str(s);
    }

    /// Shorten the pending field to `len` bytes.
    pub(crate) fn truncate_pending(&mut self, len: usize) {
        let end = self.bounds.end() + len;
        self.text.truncate(end);
    }

    /// Turn the pending text into a field.
    ///
    /// When `null` is true, the pending text is discarded first.
    pub(crate) fn commit(&mut self, null: bool) {
        if null {
            self.truncate_pending(0);
        }
        self.bounds.add(self.text.len(), null);
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Row(")?;
        f.debug_list().entries(self.iter()).finish()?;
        write!(f, ")")
    }
}

/// The bounds of fields in a single row.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct Bounds {
    /// The ending index of each field. Guaranteed to fall on UTF-8 boundaries.
    ends: Vec<usize>,
    /// Whether each field is null. Null fields are zero-length.
    nulls: Vec<bool>,
}

impl Bounds {
    /// Returns the bounds of field `i`.
    fn get(&self, i: usize) -> Option<ops::Range<usize>> {
        let end = match self.ends.get(i) {
            None => return None,
            Some(&end) => end,
        };
        let start = match i.checked_sub(1).and_then(|i| self.ends.get(i)) {
            None => 0,
            Some(&start) => start,
        };
        Some(ops::Range { start, end })
    }

    fn is_null(&self, i: usize) -> bool {
        self.nulls.get(i).cloned().unwrap_or(false)
    }

    /// Return the last position of the last field.
    ///
    /// If there are no fields, this returns `0`.
    fn end(&self) -> usize {
        self.ends.last().cloned().unwrap_or(0)
    }

    fn len(&self) -> usize {
        self.ends.len()
    }

    fn clear(&mut self) {
        self.ends.clear();
        self.nulls.clear();
    }

    /// Add a new field with the given ending position.
    fn add(&mut self, pos: usize, null: bool) {
        self.ends.push(pos);
        self.nulls.push(null);
    }
}

/// Returns the text of field `i`, with null fields as `""`.
///
/// # Panics
///
/// When no field at index `i` exists.
impl ops::Index<usize> for Row {
    type Output = str;

    fn index(&self, i: usize) -> &str {
        match self.bounds.get(i) {
            Some(range) => &self.text[range],
            None => panic!(
                "index out of bounds: the row has {} fields but the index \
                 is {}",
                self.len(),
                i
            ),
        }
    }
}

impl<'a> From<Vec<Option<&'a str>>> for Row {
    fn from(fields: Vec<Option<&'a str>>) -> Row {
        fields.into_iter().collect()
    }
}

impl<'a, T: AsRef<str>> From<&'a [T]> for Row {
    fn from(fields: &'a [T]) -> Row {
        fields.iter().map(|f| Some(f.as_ref())).collect()
    }
}

impl<'a> FromIterator<Option<&'a str>> for Row {
    fn from_iter<I: IntoIterator<Item = Option<&'a str>>>(iter: I) -> Row {
        let mut row = Row::new();
        for field in iter {
            row.push_field(field);
        }
        row
    }
}

impl<'a> IntoIterator for &'a Row {
    type IntoIter = RowIter<'a>;
    type Item = Option<&'a str>;

    fn into_iter(self) -> RowIter<'a> {
        self.iter()
    }
}

/// An iterator over the fields in a row.
#[derive(Clone, Debug)]
pub struct RowIter<'r> {
    row: &'r Row,
    i: usize,
}

impl<'r> Iterator for RowIter<'r> {
    type Item = Option<&'r str>;

    fn next(&mut self) -> Option<Option<&'r str>> {
        if self.i >= self.row.len() {
            return None;
        }
        let field = self.row.get(self.i);
        self.i += 1;
        Some(field)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.row.len() - self.i;
        (n, Some(n))
    }
}

impl<'r> ExactSizeIterator for RowIter<'r> {}

/// A position in CSV data.
///
/// A position records the index of a row, the line it starts on and a
/// character offset into the decoded input.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Position {
    record: u64,
    line: u64,
    offset: u64,
}

impl Position {
    /// Returns a new position at the start of the data: record `0`, line `1`,
    /// offset `0`.
    pub fn new() -> Position {
        Position { record: 0, line: 1, offset: 0 }
    }

    /// The index of the record, starting at `0`. Every record counts,
    /// including the header row and blank records that the reader skips.
    pub fn record(&self) -> u64 {
        self.record
    }

    /// The line number, starting at `1`.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The number of characters read before this position, after line
    /// separators were normalized.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub(crate) fn set_record(&mut self, record: u64) -> &mut Position {
        self.record = record;
        self
    }

    pub(crate) fn set_line(&mut self, line: u64) -> &mut Position {
        self.line = line;
        self
    }

    pub(crate) fn set_offset(&mut self, offset: u64) -> &mut Position {
        self.offset = offset;
        self
    }
}
