use crate::error::{Error, ErrorKind, Result};
use crate::row::Row;

/// Which columns a reader keeps, as configured.
///
/// Selections by name are resolved against the header row once it is
/// known. Selections by index never need headers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Selector {
    All,
    SelectIndexes(Vec<usize>),
    ExcludeIndexes(Vec<usize>),
    SelectFields(Vec<String>),
    ExcludeFields(Vec<String>),
}

impl Default for Selector {
    fn default() -> Selector {
        Selector::All
    }
}

impl Selector {
    /// Turn this selector into a projection over column indexes.
    pub(crate) fn resolve(
        &self,
        headers: Option<&Row>,
    ) -> Result<Projection> {
        Ok(match *self {
            Selector::All => Projection::All,
            Selector::SelectIndexes(ref idx) => {
                Projection::Select(idx.clone())
            }
            Selector::ExcludeIndexes(ref idx) => {
                Projection::Exclude(idx.clone())
            }
            Selector::SelectFields(ref names) => {
                Projection::Select(find_all(headers, names)?)
            }
            Selector::ExcludeFields(ref names) => {
                Projection::Exclude(find_all(headers, names)?)
            }
        })
    }
}

fn find_all(headers: Option<&Row>, names: &[String]) -> Result<Vec<usize>> {
    let headers = match headers {
        None => return Err(Error::new(ErrorKind::HeadersRequired)),
        Some(headers) => headers,
    };
    let mut idx = Vec::with_capacity(names.len());
    for name in names {
        match headers.iter().position(|h| h == Some(name.as_str())) {
            Some(i) => idx.push(i),
            None => {
                let name = name.clone();
                return Err(Error::new(ErrorKind::UnknownHeader { name }));
            }
        }
    }
    Ok(idx)
}

/// A resolved column selection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Projection {
    /// Keep every column.
    All,
    /// Keep these columns, in this order.
    Select(Vec<usize>),
    /// Keep every column except these.
    Exclude(Vec<usize>),
}

impl Projection {
    pub(crate) fn is_all(&self) -> bool {
        *self == Projection::All
    }

    /// Write the selected columns of `src` to `dst`.
    ///
    /// When `reorder` is true, `dst` holds only the selected columns, in
    /// selection order, and selected columns missing from `src` are null.
    /// Otherwise, `dst` has the same width as `src` and every column that is
    /// not selected is null.
    pub(crate) fn apply(&self, reorder: bool, src: &Row, dst: &mut Row) {
        dst.clear();
        match *self {
            Projection::All => {
                for field in src {
                    dst.push_field(field);
                }
            }
            Projection::Select(ref idx) if reorder => {
                for &i in idx {
                    dst.push_field(src.get(i));
                }
            }
            Projection::Select(ref idx) => {
                for (i, field) in src.iter().enumerate() {
                    let keep = idx.contains(&i);
                    dst.push_field(if keep { field } else { None });
                }
            }
            Projection::Exclude(ref idx) => {
                for (i, field) in src.iter().enumerate() {
                    if !idx.contains(&i) {
                        dst.push_field(field);
                    } else if !reorder {
                        dst.push_field(None);
                    }
                }
            }
        }
    }
}
