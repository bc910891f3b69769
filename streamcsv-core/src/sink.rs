use std::mem;

use crate::is_blank;

/// A receiver of recognized field content.
///
/// The recognizer appends the unescaped characters of the current field one
/// at a time and then finalizes the field exactly once, either as a value or
/// as an empty field. What a zero-length value or an empty field turns into
/// (an empty string, a null, some placeholder) is entirely up to the sink.
pub trait FieldSink {
    /// Append a character to the current field.
    fn append(&mut self, ch: char);

    /// Append a character to the current field, remembering whether it is
    /// part of a trailing run of whitespace.
    ///
    /// When the field is committed, any whitespace appended with this method
    /// after the last non-whitespace character is dropped.
    fn append_trim_trailing(&mut self, ch: char);

    /// Finalize the current field as a value. The value may have zero length,
    /// for example, when it was written as `""`.
    fn commit_value(&mut self);

    /// Finalize the current field as empty, i.e., two adjacent delimiters
    /// or a delimiter directly followed by the end of the record.
    fn commit_empty(&mut self);

    /// The number of fields committed so far in the current record.
    fn column(&self) -> usize;

    /// The content of the field in progress.
    fn pending(&self) -> &str;
}

/// A single recognized field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Field {
    /// A field with explicit content, which may be zero-length.
    Value(String),
    /// A field that had no content between its delimiters.
    Empty,
}

impl Field {
    /// Return the text of this field, treating `Empty` as zero-length.
    pub fn as_str(&self) -> &str {
        match *self {
            Field::Value(ref s) => s,
            Field::Empty => "",
        }
    }
}

/// A sink that collects the fields of one record.
///
/// Call `take` after each record to retrieve its fields and start over.
#[derive(Clone, Debug, Default)]
pub struct Fields {
    fields: Vec<Field>,
    current: String,
    /// The length, in bytes, of the trailing whitespace run in `current`.
    trailing: usize,
}

impl Fields {
    /// Create an empty collector.
    pub fn new() -> Fields {
        Fields::default()
    }

    /// The fields committed so far.
    pub fn as_slice(&self) -> &[Field] {
        &self.fields
    }

    /// Remove and return the fields committed so far.
    pub fn take(&mut self) -> Vec<Field> {
        self.current.clear();
        self.trailing = 0;
        mem::replace(&mut self.fields, vec![])
    }
}

impl FieldSink for Fields {
    fn append(&mut self, ch: char) {
        self.current.push(ch);
        self.trailing = 0;
    }

    fn append_trim_trailing(&mut self, ch: char) {
        self.current.push(ch);
        if is_blank(ch) {
            // Blank characters are all ASCII, so one byte each.
            self.trailing += 1;
        } else {
            self.trailing = 0;
        }
    }

    fn commit_value(&mut self) {
        let end = self.current.len() - self.trailing;
        self.current.truncate(end);
        self.trailing = 0;
        let value = mem::replace(&mut self.current, String::new());
        self.fields.push(Field::Value(value));
    }

    fn commit_empty(&mut self) {
        self.current.clear();
        self.trailing = 0;
        self.fields.push(Field::Empty);
    }

    fn column(&self) -> usize {
        self.fields.len()
    }

    fn pending(&self) -> &str {
        &self.current
    }
}
