use std::error::Error as StdError;
use std::fmt;
use std::iter;
use std::num;
use std::str;

use serde::de::value::BorrowedStrDeserializer;
use serde::de::{
    Deserialize, DeserializeSeed, Deserializer, EnumAccess,
    Error as SerdeError, IntoDeserializer, MapAccess, SeqAccess, Unexpected,
    VariantAccess, Visitor,
};

use crate::row::{Row, RowIter};

use self::DeserializeErrorKind as DEK;

/// Deserialize `row` into `D`, by header name when `headers` is given and
/// positionally otherwise.
pub(crate) fn deserialize_row<'r, D: Deserialize<'r>>(
    row: &'r Row,
    headers: Option<&'r Row>,
) -> Result<D, DeserializeError> {
    let mut deser = DeRow::new(row, headers);
    D::deserialize(&mut deser)
}

struct DeRow<'r> {
    it: iter::Peekable<RowIter<'r>>,
    headers: Option<RowIter<'r>>,
    field: u64,
}

impl<'r> DeRow<'r> {
    fn new(row: &'r Row, headers: Option<&'r Row>) -> DeRow<'r> {
        DeRow {
            it: row.iter().peekable(),
            headers: headers.map(|r| r.iter()),
            field: 0,
        }
    }

    /// Returns an error corresponding to the most recently extracted field.
    fn error(&self, kind: DeserializeErrorKind) -> DeserializeError {
        DeserializeError { field: Some(self.field.saturating_sub(1)), kind }
    }

    /// Returns an arbitrary catch-all error for the most recently extracted
    /// field.
    fn message(&self, msg: String) -> DeserializeError {
        self.error(DEK::Message(msg))
    }

    /// Extracts the next field, which may be null.
    fn next_nullable(&mut self) -> Result<Option<&'r str>, DeserializeError> {
        match self.it.next() {
            Some(field) => {
                self.field += 1;
                Ok(field)
            }
            None => Err(DeserializeError {
                field: None,
                kind: DEK::UnexpectedEndOfRow,
            }),
        }
    }

    /// Extracts the next field, which must not be null.
    #[inline(always)]
    fn next_field(&mut self) -> Result<&'r str, DeserializeError> {
        match self.next_nullable()? {
            Some(field) => Ok(field),
            None => Err(self.error(DEK::UnexpectedNull)),
        }
    }

    /// Peeks at the next field. The outer `Option` is `None` at the end of
    /// the row.
    fn peek_field(&mut self) -> Option<Option<&'r str>> {
        self.it.peek().cloned()
    }
}

macro_rules! deserialize_int {
    ($method:ident, $visit:ident) => {
        fn $method<V: Visitor<'de>>(
            self,
            visitor: V,
        ) -> Result<V::Value, Self::Error> {
            let field = self.next_field()?;
            visitor.$visit(
                field.parse().map_err(|err| self.error(DEK::ParseInt(err)))?,
            )
        }
    };
}

impl<'a, 'de: 'a> Deserializer<'de> for &'a mut DeRow<'de> {
    type Error = DeserializeError;

    fn deserialize_any<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let x = match self.next_nullable()? {
            None => return visitor.visit_none(),
            Some(x) => x,
        };
        if x == "true" {
            visitor.visit_bool(true)
        } else if x == "false" {
            visitor.visit_bool(false)
        } else if is_positive_integer(x.as_bytes()) {
            match x.parse::<u64>() {
                Ok(n) => visitor.visit_u64(n),
                Err(_) => visitor.visit_borrowed_str(x),
            }
        } else if is_negative_integer(x.as_bytes()) {
            match x.parse::<i64>() {
                Ok(n) => visitor.visit_i64(n),
                Err(_) => visitor.visit_borrowed_str(x),
            }
        } else if let Some(n) = try_float(x) {
            visitor.visit_f64(n)
        } else {
            visitor.visit_borrowed_str(x)
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let field = self.next_field()?;
        visitor.visit_bool(
            field.parse().map_err(|err| self.error(DEK::ParseBool(err)))?,
        )
    }

    deserialize_int!(deserialize_u8, visit_u8);
    deserialize_int!(deserialize_u16, visit_u16);
    deserialize_int!(deserialize_u32, visit_u32);
    deserialize_int!(deserialize_u64, visit_u64);
    deserialize_int!(deserialize_i8, visit_i8);
    deserialize_int!(deserialize_i16, visit_i16);
    deserialize_int!(deserialize_i32, visit_i32);
    deserialize_int!(deserialize_i64, visit_i64);

    fn deserialize_f32<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let field = self.next_field()?;
        visitor.visit_f32(
            field.parse().map_err(|err| self.error(DEK::ParseFloat(err)))?,
        )
    }

    fn deserialize_f64<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let field = self.next_field()?;
        visitor.visit_f64(
            field.parse().map_err(|err| self.error(DEK::ParseFloat(err)))?,
        )
    }

    fn deserialize_char<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let field = self.next_field()?;
        let mut chars = field.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => visitor.visit_char(ch),
            _ => Err(self.message(format!(
                "expected single character but got {} characters in '{}'",
                field.chars().count(),
                field
            ))),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.next_field().and_then(|f| visitor.visit_borrowed_str(f))
    }

    fn deserialize_string<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.next_field().and_then(|f| visitor.visit_str(f))
    }

    fn deserialize_bytes<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.next_field()
            .and_then(|f| visitor.visit_borrowed_bytes(f.as_bytes()))
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.next_field()
            .and_then(|f| visitor.visit_byte_buf(f.as_bytes().to_vec()))
    }

    fn deserialize_option<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.peek_field() {
            None => visitor.visit_none(),
            Some(None) | Some(Some("")) => {
                self.next_nullable()?;
                visitor.visit_none()
            }
            Some(Some(_)) => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_seq(self)
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_seq(self)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_seq(self)
    }

    fn deserialize_map<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        if self.headers.is_none() {
            visitor.visit_seq(self)
        } else {
            visitor.visit_map(self)
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        if self.headers.is_none() {
            visitor.visit_seq(self)
        } else {
            visitor.visit_map(self)
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(
        self,
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(self.error(DEK::Unsupported("deserialize_identifier".into())))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_enum(self)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        // Read and drop the next field.
        // This code is reached, e.g., when trying to deserialize a header
        // that doesn't exist in the destination struct.
        let _ = self.next_nullable()?;
        visitor.visit_unit()
    }
}

impl<'a, 'de: 'a> EnumAccess<'de> for &'a mut DeRow<'de> {
    type Error = DeserializeError;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, Self::Variant), Self::Error> {
        let variant_name = self.next_field()?;
        let de: BorrowedStrDeserializer<DeserializeError> =
            BorrowedStrDeserializer::new(variant_name);
        seed.deserialize(de).map(|v| (v, self))
    }
}

impl<'a, 'de: 'a> VariantAccess<'de> for &'a mut DeRow<'de> {
    type Error = DeserializeError;

    fn unit_variant(self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(
        self,
        _seed: T,
    ) -> Result<T::Value, Self::Error> {
        let unexp = Unexpected::UnitVariant;
        Err(DeserializeError::invalid_type(unexp, &"newtype variant"))
    }

    fn tuple_variant<V: Visitor<'de>>(
        self,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let unexp = Unexpected::UnitVariant;
        Err(DeserializeError::invalid_type(unexp, &"tuple variant"))
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let unexp = Unexpected::UnitVariant;
        Err(DeserializeError::invalid_type(unexp, &"struct variant"))
    }
}

impl<'a, 'de: 'a> SeqAccess<'de> for &'a mut DeRow<'de> {
    type Error = DeserializeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Self::Error> {
        if self.peek_field().is_none() {
            Ok(None)
        } else {
            seed.deserialize(&mut **self).map(Some)
        }
    }
}

impl<'a, 'de: 'a> MapAccess<'de> for &'a mut DeRow<'de> {
    type Error = DeserializeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        let field = match self.headers.as_mut().and_then(|it| it.next()) {
            None => return Ok(None),
            Some(field) => field.unwrap_or(""),
        };
        seed.deserialize(field.into_deserializer()).map(Some)
    }

    fn next_value_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<K::Value, Self::Error> {
        seed.deserialize(&mut **self)
    }
}

/// An error that occurs when deserializing a row into a Rust type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeserializeError {
    field: Option<u64>,
    kind: DeserializeErrorKind,
}

/// The type of a deserialization error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeserializeErrorKind {
    /// A generic serde deserialization error.
    Message(String),
    /// A generic serde deserialization error from calling an unsupported
    /// deserializer method.
    Unsupported(String),
    /// The row has fewer fields than the type requires.
    UnexpectedEndOfRow,
    /// A null field was found where a value is required. Null fields only
    /// deserialize into `Option` types.
    UnexpectedNull,
    /// An error that occurred when parsing a boolean.
    ParseBool(str::ParseBoolError),
    /// An error that occurred when parsing an integer.
    ParseInt(num::ParseIntError),
    /// An error that occurred when parsing a floating point number.
    ParseFloat(num::ParseFloatError),
}

impl SerdeError for DeserializeError {
    fn custom<T: fmt::Display>(msg: T) -> DeserializeError {
        DeserializeError { field: None, kind: DEK::Message(msg.to_string()) }
    }
}

impl StdError for DeserializeError {}

impl fmt::Display for DeserializeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(field) = self.field {
            write!(f, "field {}: {}", field, self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

impl fmt::Display for DeserializeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::DeserializeErrorKind::*;

        match *self {
            Message(ref msg) => write!(f, "{}", msg),
            Unsupported(ref which) => {
                write!(f, "unsupported deserializer method: {}", which)
            }
            UnexpectedEndOfRow => {
                write!(f, "expected field, but got end of row")
            }
            UnexpectedNull => write!(f, "expected value, but got null field"),
            ParseBool(ref err) => err.fmt(f),
            ParseInt(ref err) => err.fmt(f),
            ParseFloat(ref err) => err.fmt(f),
        }
    }
}

impl DeserializeError {
    /// Return the field index (starting at 0) of this error, if available.
    pub fn field(&self) -> Option<u64> {
        self.field
    }

    /// Return the underlying error kind.
    pub fn kind(&self) -> &DeserializeErrorKind {
        &self.kind
    }
}

fn is_positive_integer(bs: &[u8]) -> bool {
    !bs.is_empty() && bs.iter().all(|&b| b'0' <= b && b <= b'9')
}

fn is_negative_integer(bs: &[u8]) -> bool {
    !bs.is_empty() && bs[0] == b'-' && is_positive_integer(&bs[1..])
}

fn try_float(s: &str) -> Option<f64> {
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::Deserialize;

    use crate::row::Row;

    use super::{deserialize_row, DeserializeError, DeserializeErrorKind};

    fn de<D: for<'de> Deserialize<'de>>(
        fields: &[Option<&str>],
    ) -> Result<D, DeserializeError> {
        let row = Row::from(fields.to_vec());
        deserialize_row(&row, None)
    }

    fn de_headers<D: for<'de> Deserialize<'de>>(
        headers: &[&str],
        fields: &[Option<&str>],
    ) -> Result<D, DeserializeError> {
        let headers = Row::from(headers);
        let row = Row::from(fields.to_vec());
        deserialize_row(&row, Some(&headers))
    }

    #[test]
    fn with_header() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Foo {
            z: f64,
            y: i32,
            x: String,
        }

        let got: Foo = de_headers(
            &["x", "y", "z"],
            &[Some("hi"), Some("42"), Some("1.3")],
        )
        .unwrap();
        assert_eq!(got, Foo { x: "hi".into(), y: 42, z: 1.3 });
    }

    #[test]
    fn with_header_unknown() {
        #[derive(Deserialize, Debug, PartialEq)]
        #[serde(deny_unknown_fields)]
        struct Foo {
            z: f64,
            y: i32,
            x: String,
        }
        assert!(de_headers::<Foo>(
            &["a", "x", "y", "z"],
            &[Some("foo"), Some("hi"), Some("42"), Some("1.3")],
        )
        .is_err());
    }

    #[test]
    fn with_header_missing_ok() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Foo {
            z: f64,
            y: i32,
            x: Option<String>,
        }

        let got: Foo =
            de_headers(&["y", "z"], &[Some("42"), Some("1.3")]).unwrap();
        assert_eq!(got, Foo { x: None, y: 42, z: 1.3 });
    }

    #[test]
    fn without_header() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Foo {
            z: f64,
            y: i32,
            x: String,
        }

        let got: Foo = de(&[Some("1.3"), Some("42"), Some("hi")]).unwrap();
        assert_eq!(got, Foo { x: "hi".into(), y: 42, z: 1.3 });
    }

    #[test]
    fn no_fields() {
        assert!(de::<String>(&[]).is_err());
    }

    #[test]
    fn two_fields_too_few() {
        assert!(de::<(i32, bool)>(&[Some("42")]).is_err());
        let err = de::<(i32, bool)>(&[Some("42"), None]).unwrap_err();
        assert_eq!(err.kind(), &DeserializeErrorKind::UnexpectedNull);
    }

    #[test]
    fn one_char() {
        let got: char = de(&[Some("a")]).unwrap();
        assert_eq!(got, 'a');
        assert!(de::<char>(&[Some("")]).is_err());
        assert!(de::<char>(&[Some("ab")]).is_err());
    }

    #[test]
    fn seq_in_struct_tail() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Foo {
            label: String,
            xs: Vec<i32>,
        }
        let got: Foo =
            de(&[Some("foo"), Some("1"), Some("5"), Some("10")]).unwrap();
        assert_eq!(got, Foo { label: "foo".into(), xs: vec![1, 5, 10] });
    }

    #[test]
    fn map_headers() {
        let got: HashMap<String, i32> = de_headers(
            &["a", "b", "c"],
            &[Some("1"), Some("5"), Some("10")],
        )
        .unwrap();
        assert_eq!(got.len(), 3);
        assert_eq!(got["a"], 1);
        assert_eq!(got["c"], 10);
    }

    #[test]
    fn enum_label_simple_tagged() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Record {
            label: Label,
            x: f64,
        }

        #[derive(Deserialize, Debug, PartialEq)]
        #[serde(rename_all = "snake_case")]
        enum Label {
            Foo,
            Bar,
            Baz,
        }

        let got: Record =
            de_headers(&["label", "x"], &[Some("bar"), Some("5")]).unwrap();
        assert_eq!(got, Record { label: Label::Bar, x: 5.0 });
    }

    #[test]
    fn option_empty_and_null_fields() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Foo {
            a: Option<i32>,
            b: String,
            c: Option<i32>,
            d: Option<String>,
        }

        let got: Foo = de_headers(
            &["a", "b", "c", "d"],
            &[Some(""), Some("foo"), Some("5"), None],
        )
        .unwrap();
        assert_eq!(got, Foo { a: None, b: "foo".into(), c: Some(5), d: None });
    }

    #[test]
    fn null_in_required_field() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Foo {
            a: String,
            b: i32,
        }

        let err =
            de_headers::<Foo>(&["a", "b"], &[Some("x"), None]).unwrap_err();
        assert_eq!(err.kind(), &DeserializeErrorKind::UnexpectedNull);
        assert_eq!(err.field(), Some(1));
    }

    #[test]
    fn borrowed_str() {
        let row = Row::from(&["abc", "xyz"][..]);
        let got: (&str, &str) = deserialize_row(&row, None).unwrap();
        assert_eq!(got, ("abc", "xyz"));
    }
}
