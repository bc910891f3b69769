use streamcsv_core::{is_blank, FieldSink};

use crate::row::Row;

/// What empty fields and zero-length values are replaced with.
///
/// `None` means the field is stored as null.
#[derive(Clone, Debug, Default)]
pub(crate) struct Substitutes {
    /// Used for fields with nothing between their delimiters.
    pub(crate) null: Option<String>,
    /// Used for values with zero length, such as `""`.
    pub(crate) empty: Option<String>,
}

/// Assembles the fields pushed by the recognizer into a `Row`.
#[derive(Debug)]
pub(crate) struct RowAccumulator<'a> {
    row: &'a mut Row,
    subst: &'a Substitutes,
    /// The maximum number of characters in a field.
    limit: usize,
    /// The number of characters in the pending field. Only the first
    /// `limit` of them are stored in the row.
    chars: usize,
    /// The number of trailing whitespace characters in the pending field,
    /// stored or not. Whitespace is ASCII, so each is one byte.
    trailing: usize,
    /// The first field that exceeded `limit`.
    too_long: Option<usize>,
}

impl<'a> RowAccumulator<'a> {
    pub(crate) fn new(
        row: &'a mut Row,
        subst: &'a Substitutes,
        limit: usize,
    ) -> RowAccumulator<'a> {
        RowAccumulator {
            row,
            subst,
            limit,
            chars: 0,
            trailing: 0,
            too_long: None,
        }
    }

    /// The index of the first field longer than the limit, if any.
    pub(crate) fn too_long(&self) -> Option<usize> {
        self.too_long
    }

    fn commit_with(&mut self, substitute: Option<&str>) {
        match substitute {
            None => self.row.commit(true),
            Some(s) => {
                self.row.truncate_pending(0);
                self.row.push_pending_str(s);
                self.row.commit(false);
            }
        }
    }

    /// Store `ch` unless the pending field is already at the limit.
    fn push(&mut self, ch: char) {
        if self.chars < self.limit {
            self.row.push_pending(ch);
        }
        self.chars += 1;
    }

    fn reset(&mut self) {
        self.chars = 0;
        self.trailing = 0;
    }
}

impl<'a> FieldSink for RowAccumulator<'a> {
    fn append(&mut self, ch: char) {
        self.push(ch);
        self.trailing = 0;
    }

    fn append_trim_trailing(&mut self, ch: char) {
        self.push(ch);
        if is_blank(ch) {
            self.trailing += 1;
        } else {
            self.trailing = 0;
        }
    }

    fn commit_value(&mut self) {
        let unstored = self.chars.saturating_sub(self.limit);
        let stored_trailing = self.trailing.saturating_sub(unstored);
        let len = self.row.pending().len() - stored_trailing;
        self.row.truncate_pending(len);
        if self.chars - self.trailing > self.limit && self.too_long.is_none()
        {
            self.too_long = Some(self.row.len());
        }
        if len == 0 {
            let subst = self.subst;
            self.commit_with(subst.empty.as_ref().map(|s| s.as_str()));
        } else {
            self.row.commit(false);
        }
        self.reset();
    }

    fn commit_empty(&mut self) {
        let subst = self.subst;
        self.commit_with(subst.null.as_ref().map(|s| s.as_str()));
        self.reset();
    }

    fn column(&self) -> usize {
        self.row.len()
    }

    fn pending(&self) -> &str {
        self.row.pending()
    }
}
