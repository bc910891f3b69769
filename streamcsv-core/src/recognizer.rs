use log::trace;

use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::is_blank;
use crate::sink::FieldSink;
use crate::source::CharSource;

/// The default capacity of the buffer used to hold whitespace that follows
/// a closing quote.
const DEFAULT_WHITESPACE_CAPACITY: usize = 4096;

/// A pull based CSV record recognizer.
///
/// The recognizer reads one character at a time from a `CharSource` and
/// pushes unescaped field content into a `FieldSink`. Each call to
/// `read_record` consumes exactly one record, including its terminator.
///
/// Unlike RFC 4180 readers, this recognizer is lenient about quotes by
/// default:
///
/// * A quote that appears inside a quoted value without closing it (that is,
///   it is followed by something other than a delimiter, a terminator or
///   whitespace) is kept as literal content.
/// * Content that follows a closing quote after some whitespace is treated
///   as a continuation of the quoted value.
/// * A line consisting of nothing but a quote character is an empty record.
///
/// Both of the first two behaviors can be turned into errors with
/// `RecognizerBuilder::unescaped_quotes(false)`.
///
/// A recognizer's configuration is fixed once it is built. It carries no
/// state from one record to the next other than a reusable scratch buffer.
#[derive(Clone, Debug)]
pub struct Recognizer {
    /// The delimiter that separates fields.
    delimiter: char,
    /// The quotation character.
    quote: char,
    /// The character that escapes a quote inside a quoted value.
    escape: char,
    /// The (normalized) record terminator.
    term: char,
    /// Whether to skip whitespace before each field.
    trim_leading: bool,
    /// Whether to drop whitespace after each unquoted value.
    trim_trailing: bool,
    /// Whether unescaped quotes inside quoted values are kept as content.
    unescaped_quotes: bool,
    /// Whether an escaped quote keeps the quote live as a possible closer.
    ignore_quote_escape: bool,
    /// The capacity given to `whitespace` when built.
    whitespace_capacity: usize,
    /// Whitespace seen after a closing quote, pending a decision about
    /// whether the value really ended.
    whitespace: WhitespaceBuffer,
}

impl Default for Recognizer {
    fn default() -> Recognizer {
        Recognizer {
            delimiter: ',',
            quote: '"',
            escape: '"',
            term: '\n',
            trim_leading: true,
            trim_trailing: true,
            unescaped_quotes: true,
            ignore_quote_escape: false,
            whitespace_capacity: DEFAULT_WHITESPACE_CAPACITY,
            whitespace: WhitespaceBuffer::default(),
        }
    }
}

/// Builds a CSV recognizer with various configuration knobs.
///
/// Once a `Recognizer` is built, its configuration cannot be changed.
#[derive(Debug, Default)]
pub struct RecognizerBuilder {
    rcg: Recognizer,
}

impl RecognizerBuilder {
    /// Create a new builder.
    pub fn new() -> RecognizerBuilder {
        RecognizerBuilder::default()
    }

    /// Build a recognizer from this configuration.
    pub fn build(&self) -> Recognizer {
        let mut rcg = self.rcg.clone();
        rcg.whitespace = WhitespaceBuffer::with_capacity(rcg.whitespace_capacity);
        rcg
    }

    /// The field delimiter.
    ///
    /// The default is `,`.
    pub fn delimiter(&mut self, delimiter: char) -> &mut RecognizerBuilder {
        self.rcg.delimiter = delimiter;
        self
    }

    /// The quote character.
    ///
    /// The default is `"`.
    pub fn quote(&mut self, quote: char) -> &mut RecognizerBuilder {
        self.rcg.quote = quote;
        self
    }

    /// The character that escapes a quote inside a quoted value.
    ///
    /// The default is `"`, which means quotes are escaped by doubling them.
    /// When the escape differs from the quote (say, `\`), the escape is kept
    /// in the value and the quote after it is appended literally.
    pub fn escape(&mut self, escape: char) -> &mut RecognizerBuilder {
        self.rcg.escape = escape;
        self
    }

    /// The record terminator.
    ///
    /// This must be the single character that every line separator was
    /// normalized to by the character source. The default is `\n`.
    pub fn terminator(&mut self, term: char) -> &mut RecognizerBuilder {
        self.rcg.term = term;
        self
    }

    /// Whether to skip whitespace and control characters before each field.
    ///
    /// This is enabled by default.
    pub fn trim_leading(&mut self, yes: bool) -> &mut RecognizerBuilder {
        self.rcg.trim_leading = yes;
        self
    }

    /// Whether to drop whitespace and control characters at the end of each
    /// unquoted value. Whitespace inside quotes is never dropped.
    ///
    /// This is enabled by default.
    pub fn trim_trailing(&mut self, yes: bool) -> &mut RecognizerBuilder {
        self.rcg.trim_trailing = yes;
        self
    }

    /// Whether to accept unescaped quotes inside quoted values.
    ///
    /// When enabled (the default), a quote that does not close its value is
    /// kept as content, and so is anything that follows a closing quote and
    /// some whitespace. When disabled, both situations are syntax errors.
    pub fn unescaped_quotes(&mut self, yes: bool) -> &mut RecognizerBuilder {
        self.rcg.unescaped_quotes = yes;
        self
    }

    /// Whether to treat an escaped quote as a run of consecutive quotes.
    ///
    /// When enabled, the escape sequence still produces one literal quote,
    /// but the quote stays live: it may close the value or start another
    /// escape sequence. Under this mode, `"a""b"` yields `a""b` (given that
    /// unescaped quotes are tolerated) instead of `a"b`.
    ///
    /// This is disabled by default.
    pub fn ignore_quote_escape(&mut self, yes: bool) -> &mut RecognizerBuilder {
        self.rcg.ignore_quote_escape = yes;
        self
    }

    /// The initial capacity of the buffer that holds whitespace following a
    /// closing quote. The buffer is allocated once and reused.
    ///
    /// The default is `4096`.
    pub fn whitespace_capacity(
        &mut self,
        capacity: usize,
    ) -> &mut RecognizerBuilder {
        self.rcg.whitespace_capacity = capacity;
        self
    }
}

/// The result of recognizing at most one record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadRecordResult {
    /// A record was read, including its terminator.
    ///
    /// The record may have zero fields, e.g., for a blank line.
    Record,
    /// The source is exhausted. No fields were produced.
    End,
}

impl ReadRecordResult {
    /// Returns true if and only if this is `ReadRecordResult::Record`.
    pub fn is_record(&self) -> bool {
        *self == ReadRecordResult::Record
    }
}

/// How quoted value recognition ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Quoted {
    /// A value was recognized and should be committed.
    Value,
    /// The quote stood alone on its line. Nothing should be committed.
    EmptyRow,
}

/// Which recognition pass a scan belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Pass {
    /// The pass that started at the opening quote.
    Initial,
    /// A pass that resumed after a quote turned out not to close the value.
    Resumed,
}

/// The states of quoted value recognition.
#[derive(Clone, Copy, Debug)]
enum QuotedState {
    /// Accumulating content. `prev` is the last significant character and
    /// `entry` is set until the first character of a pass has been read.
    Scanning { prev: Option<char>, entry: Option<Pass> },
    /// A quote was followed by whitespace that is neither the delimiter nor
    /// the terminator.
    RecoveringTail,
    /// The value is closed; the lookahead must end the field.
    Closing,
}

/// The single character of lookahead shared by all recognizer operations.
struct Lookahead<'s, S> {
    src: &'s mut S,
    ch: Option<char>,
}

impl<'s, S: CharSource> Lookahead<'s, S> {
    fn bump(&mut self) -> Result<Option<char>, S::Error> {
        self.ch = self.src.next_char()?;
        Ok(self.ch)
    }
}

impl Recognizer {
    /// Create a new recognizer with a default configuration.
    pub fn new() -> Recognizer {
        RecognizerBuilder::new().build()
    }

    /// Recognize one record from `src`, committing its fields to `sink`.
    ///
    /// If `src` is already exhausted, then `ReadRecordResult::End` is
    /// returned. Otherwise, characters are consumed up to and including the
    /// next record terminator (or the end of the data) and
    /// `ReadRecordResult::Record` is returned.
    ///
    /// A record may have zero fields. This happens for blank lines, for
    /// lines of only whitespace when leading whitespace is trimmed, and for
    /// a line consisting of a lone quote character. Callers typically skip
    /// such records.
    ///
    /// # Errors
    ///
    /// Errors from `src` are returned as is. Syntax errors are converted
    /// into `S::Error`. After an error, the record is only partially
    /// consumed and the fields already committed to `sink` are incomplete.
    pub fn read_record<S, K>(
        &mut self,
        src: &mut S,
        sink: &mut K,
    ) -> Result<ReadRecordResult, S::Error>
    where
        S: CharSource,
        K: FieldSink,
    {
        let mut cur = Lookahead { src, ch: None };
        if cur.bump()?.is_none() {
            return Ok(ReadRecordResult::End);
        }
        if self.trim_leading && self.is_blank(cur.ch) {
            self.skip_whitespace(&mut cur)?;
        }
        while !self.is_term(cur.ch) {
            self.parse_field(&mut cur, sink)?;
            if !self.is_term(cur.ch) {
                cur.bump()?;
                if self.is_term(cur.ch) {
                    sink.commit_empty();
                }
            }
        }
        Ok(ReadRecordResult::Record)
    }

    fn parse_field<S, K>(
        &mut self,
        cur: &mut Lookahead<S>,
        sink: &mut K,
    ) -> Result<(), S::Error>
    where
        S: CharSource,
        K: FieldSink,
    {
        if self.trim_leading && self.is_blank(cur.ch) {
            self.skip_whitespace(cur)?;
        }
        if cur.ch == Some(self.delimiter) {
            sink.commit_empty();
            return Ok(());
        }
        if cur.ch == Some(self.quote) {
            if self.parse_quoted_value(cur, sink)? == Quoted::EmptyRow {
                return Ok(());
            }
        } else {
            self.parse_value(cur, sink)?;
        }
        sink.commit_value();
        Ok(())
    }

    fn parse_value<S, K>(
        &self,
        cur: &mut Lookahead<S>,
        sink: &mut K,
    ) -> Result<(), S::Error>
    where
        S: CharSource,
        K: FieldSink,
    {
        while let Some(ch) = cur.ch {
            if ch == self.delimiter || ch == self.term {
                break;
            }
            if self.trim_trailing {
                sink.append_trim_trailing(ch);
            } else {
                sink.append(ch);
            }
            cur.bump()?;
        }
        Ok(())
    }

    fn parse_quoted_value<S, K>(
        &mut self,
        cur: &mut Lookahead<S>,
        sink: &mut K,
    ) -> Result<Quoted, S::Error>
    where
        S: CharSource,
        K: FieldSink,
    {
        let mut state =
            QuotedState::Scanning { prev: None, entry: Some(Pass::Initial) };
        loop {
            state = match state {
                QuotedState::Scanning { prev, entry } => {
                    let ch = cur.bump()?;
                    if let Some(pass) = entry {
                        if self.is_term(ch) && sink.column() == 0 {
                            return Ok(match pass {
                                Pass::Initial => Quoted::EmptyRow,
                                Pass::Resumed => Quoted::Value,
                            });
                        }
                    }
                    match ch {
                        None => QuotedState::Closing,
                        Some(ch) => self.scan_quoted(cur, sink, prev, ch)?,
                    }
                }
                QuotedState::RecoveringTail => {
                    match self.recover_tail(cur, sink)? {
                        Some(state) => state,
                        None => return Ok(Quoted::Value),
                    }
                }
                QuotedState::Closing => {
                    return match cur.ch {
                        None => Ok(Quoted::Value),
                        Some(ch) if ch == self.delimiter || ch == self.term => {
                            Ok(Quoted::Value)
                        }
                        Some(found) => {
                            let kind =
                                SyntaxErrorKind::UnexpectedTrailingCharacter {
                                    found,
                                    delimiter: self.delimiter,
                                };
                            Err(self.error(cur, sink, kind).into())
                        }
                    };
                }
            };
        }
    }

    /// Handle one character inside a quoted value and return the next state.
    fn scan_quoted<S, K>(
        &self,
        cur: &Lookahead<S>,
        sink: &mut K,
        prev: Option<char>,
        ch: char,
    ) -> Result<QuotedState, S::Error>
    where
        S: CharSource,
        K: FieldSink,
    {
        let after_quote = prev == Some(self.quote);
        if after_quote
            && (ch == self.delimiter || ch == self.term || is_blank(ch))
        {
            return Ok(if ch == self.delimiter || ch == self.term {
                QuotedState::Closing
            } else {
                QuotedState::RecoveringTail
            });
        }
        if ch != self.quote {
            if after_quote {
                if !self.unescaped_quotes {
                    let kind =
                        SyntaxErrorKind::UnescapedQuote { quote: self.quote };
                    return Err(self.error(cur, sink, kind).into());
                }
                trace!(
                    "keeping unescaped quote in field {} at line {}",
                    sink.column(),
                    cur.src.line()
                );
                sink.append(self.quote);
                sink.append(ch);
                return Ok(QuotedState::Scanning {
                    prev: Some(ch),
                    entry: Some(Pass::Resumed),
                });
            }
            sink.append(ch);
            return Ok(QuotedState::Scanning { prev: Some(ch), entry: None });
        }
        if prev == Some(self.escape) {
            sink.append(self.quote);
            let prev = if self.ignore_quote_escape { Some(ch) } else { None };
            return Ok(QuotedState::Scanning { prev, entry: None });
        }
        Ok(QuotedState::Scanning { prev: Some(ch), entry: None })
    }

    /// Consume the whitespace after a closing quote and decide what it means.
    ///
    /// Returns `None` when the record terminator (or the end of the data)
    /// ends the value.
    fn recover_tail<S, K>(
        &mut self,
        cur: &mut Lookahead<S>,
        sink: &mut K,
    ) -> Result<Option<QuotedState>, S::Error>
    where
        S: CharSource,
        K: FieldSink,
    {
        self.whitespace.clear();
        let ch = loop {
            match cur.ch {
                Some(ch) if self.is_skippable(ch) => {
                    self.whitespace.push(ch);
                    cur.bump()?;
                }
                ch => break ch,
            }
        };
        let ch = match ch {
            None => return Ok(None),
            Some(ch) if ch == self.term => return Ok(None),
            Some(ch) if ch == self.delimiter => {
                return Ok(Some(QuotedState::Closing));
            }
            Some(ch) => ch,
        };
        if !self.unescaped_quotes {
            let kind = SyntaxErrorKind::MalformedQuotedTail {
                quote: self.quote,
                found: ch,
            };
            return Err(self.error(cur, sink, kind).into());
        }
        trace!(
            "continuing quoted value in field {} after whitespace at line {}",
            sink.column(),
            cur.src.line()
        );
        sink.append(self.quote);
        for ws in self.whitespace.as_str().chars() {
            sink.append(ws);
        }
        // An escape is left out; the next pass interprets it.
        if ch != self.escape {
            sink.append(ch);
        }
        Ok(Some(QuotedState::Scanning {
            prev: Some(ch),
            entry: Some(Pass::Resumed),
        }))
    }

    fn skip_whitespace<S: CharSource>(
        &self,
        cur: &mut Lookahead<S>,
    ) -> Result<(), S::Error> {
        while let Some(ch) = cur.ch {
            if !self.is_skippable(ch) {
                break;
            }
            cur.bump()?;
        }
        Ok(())
    }

    fn error<S: CharSource, K: FieldSink>(
        &self,
        cur: &Lookahead<S>,
        sink: &K,
        kind: SyntaxErrorKind,
    ) -> SyntaxError {
        SyntaxError::new(
            kind,
            cur.src.line(),
            cur.src.offset(),
            sink.column(),
            sink.pending(),
        )
    }

    /// Whitespace or control, but neither the delimiter nor the terminator.
    #[inline]
    fn is_skippable(&self, ch: char) -> bool {
        is_blank(ch) && ch != self.delimiter && ch != self.term
    }

    #[inline]
    fn is_blank(&self, ch: Option<char>) -> bool {
        ch.map_or(false, is_blank)
    }

    /// The end of the data terminates a record just like the terminator.
    #[inline]
    fn is_term(&self, ch: Option<char>) -> bool {
        ch.map_or(true, |ch| ch == self.term)
    }
}

/// Scratch space for whitespace following a closing quote.
#[derive(Clone, Debug, Default)]
struct WhitespaceBuffer {
    buf: String,
}

impl WhitespaceBuffer {
    fn with_capacity(capacity: usize) -> WhitespaceBuffer {
        WhitespaceBuffer { buf: String::with_capacity(capacity) }
    }

    fn clear(&mut self) {
        self.buf.clear();
    }

    fn push(&mut self, ch: char) {
        self.buf.push(ch);
    }

    fn as_str(&self) -> &str {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::error::{SyntaxError, SyntaxErrorKind};
    use crate::sink::{Field, Fields};
    use crate::source::StrSource;

    use super::{ReadRecordResult, Recognizer, RecognizerBuilder};

    type Csv = Vec<Row>;
    type Row = Vec<Field>;

    /// Marks an empty field in `csv!` tables.
    struct E;

    trait IntoField {
        fn into_field(self) -> Field;
    }

    impl<'a> IntoField for &'a str {
        fn into_field(self) -> Field {
            Field::Value(self.to_string())
        }
    }

    impl IntoField for E {
        fn into_field(self) -> Field {
            Field::Empty
        }
    }

    macro_rules! csv {
        ($([$($field:expr),*]),*) => {{
            #[allow(unused_mut)]
            let mut csv: Csv = vec![];
            $(
                #[allow(unused_mut)]
                let mut row: Row = vec![];
                $(
                    row.push(IntoField::into_field($field));
                )*
                csv.push(row);
            )*
            csv
        }}
    }

    macro_rules! parses_to {
        ($name:ident, $data:expr, $expected:expr) => {
            parses_to!($name, $data, $expected, |builder| builder);
        };
        ($name:ident, $data:expr, $expected:expr, $config:expr) => {
            #[test]
            fn $name() {
                let mut builder = RecognizerBuilder::new();
                $config(&mut builder);
                let mut rcg = builder.build();
                let got = parse(&mut rcg, $data).unwrap();
                assert_eq!($expected, got);
            }
        };
    }

    macro_rules! fails_with {
        ($name:ident, $data:expr, $kind:pat, $config:expr) => {
            #[test]
            fn $name() {
                let mut builder = RecognizerBuilder::new();
                $config(&mut builder);
                let mut rcg = builder.build();
                let err = parse(&mut rcg, $data).unwrap_err();
                match *err.kind() {
                    $kind => {}
                    ref kind => panic!("unexpected error kind: {:?}", kind),
                }
            }
        };
    }

    fn parse(rcg: &mut Recognizer, data: &str) -> Result<Csv, SyntaxError> {
        let mut src = StrSource::with_terminator(data, '\n');
        parse_source(rcg, &mut src)
    }

    fn parse_source(
        rcg: &mut Recognizer,
        src: &mut StrSource,
    ) -> Result<Csv, SyntaxError> {
        let mut sink = Fields::new();
        let mut csv = Csv::new();
        loop {
            match rcg.read_record(src, &mut sink)? {
                ReadRecordResult::End => return Ok(csv),
                ReadRecordResult::Record => csv.push(sink.take()),
            }
        }
    }

    fn strict(b: &mut RecognizerBuilder) {
        b.unescaped_quotes(false);
    }

    fn no_trim(b: &mut RecognizerBuilder) {
        b.trim_leading(false).trim_trailing(false);
    }

    parses_to!(empty, "", csv![]);
    parses_to!(one_row_one_field, "a", csv![["a"]]);
    parses_to!(one_row_many_fields, "a,b,c", csv![["a", "b", "c"]]);
    parses_to!(one_row_trailing_comma, "a,b,", csv![["a", "b", E]]);
    parses_to!(one_row_one_field_lf, "a\n", csv![["a"]]);
    parses_to!(one_row_trailing_comma_lf, "a,b,\n", csv![["a", "b", E]]);
    parses_to!(
        many_rows_many_fields,
        "a,b,c\nx,y,z\n",
        csv![["a", "b", "c"], ["x", "y", "z"]]
    );
    parses_to!(blank_lines_have_no_fields, "\n\na\n", csv![[], [], ["a"]]);
    parses_to!(empty_between_delimiters, "a,,b", csv![["a", E, "b"]]);
    parses_to!(leading_delimiter, ",a", csv![[E, "a"]]);
    parses_to!(only_delimiters, ",,", csv![[E, E, E]]);

    parses_to!(trim_both, "  a  ,  b  ", csv![["a", "b"]]);
    parses_to!(trim_keeps_inner, " a b ,c", csv![["a b", "c"]]);
    parses_to!(trim_control, "\ta\t,\u{1}b", csv![["a", "b"]]);
    parses_to!(
        trim_blank_field_before_delimiter,
        "a,   ,b",
        csv![["a", E, "b"]]
    );
    parses_to!(trim_blank_last_field, "a,   \n", csv![["a", ""]]);
    parses_to!(whitespace_only_line, "   \n", csv![[]]);
    parses_to!(no_trim_keeps_all, "  a  , b ", csv![["  a  ", " b "]], no_trim);
    parses_to!(
        trim_leading_only,
        " a , b ",
        csv![["a ", "b "]],
        |b: &mut RecognizerBuilder| { b.trim_trailing(false); }
    );
    parses_to!(
        trim_trailing_only,
        " a , b ",
        csv![[" a", " b"]],
        |b: &mut RecognizerBuilder| { b.trim_leading(false); }
    );
    parses_to!(no_trim_whitespace_line, "  \n", csv![["  "]], no_trim);

    parses_to!(quote_empty, "\"\"", csv![[""]]);
    parses_to!(quote_empty_lf, "\"\"\n", csv![[""]]);
    parses_to!(quote_space, "\" \"", csv![[" "]]);
    parses_to!(quote_inner_space, "\" a \",b", csv![[" a ", "b"]]);
    parses_to!(quote_delimiter_inside, "\"a,b\",c", csv![["a,b", "c"]]);
    parses_to!(quote_newline_inside, "\"a\nb\",c", csv![["a\nb", "c"]]);
    parses_to!(quote_then_terminator, "\"abc\"\nx", csv![["abc"], ["x"]]);
    parses_to!(quote_doubled, "\"a\"\"b\"", csv![["a\"b"]]);
    parses_to!(quote_tripled_at_end, "\"a\"\"\"", csv![["a\""]]);
    parses_to!(quote_unterminated, "\"abc", csv![["abc"]]);
    parses_to!(quote_after_empty, "a,,\"\"", csv![["a", E, ""]]);
    parses_to!(
        quote_outer_space_untrimmed,
        "  \"a\"  ",
        csv![["  \"a\"  "]],
        no_trim
    );
    parses_to!(quote_outer_space_trimmed, "  \"a\"  ", csv![["a"]]);

    parses_to!(lone_quote_is_empty_row, "\"\na,b\n", csv![[], ["a", "b"]]);
    parses_to!(lone_quote_at_end_is_empty_row, "\"", csv![[]]);
    parses_to!(
        lone_quote_in_second_field_spans_lines,
        "a,\"\nb",
        csv![["a", "\nb"]]
    );

    parses_to!(
        unescaped_quote_kept,
        "\"a \"b\" c\"",
        csv![["a \"b\" c"]]
    );
    parses_to!(
        unescaped_quote_resumed_ends_first_field_at_newline,
        "\"abc\"d\nx",
        csv![["abc\"d"], ["x"]]
    );
    parses_to!(
        unescaped_quote_resumed_spans_lines_after_first_field,
        "x,\"abc\"d\ny",
        csv![["x", "abc\"d\ny"]]
    );
    parses_to!(
        unescaped_quotes_without_escape_semantics,
        "\"value with \"embedded\" quote\"",
        csv![["value with \"embedded\" quote"]],
        |b: &mut RecognizerBuilder| { b.ignore_quote_escape(true); }
    );
    parses_to!(
        consecutive_quotes_without_escape_semantics,
        "\"Venture \"\"Extended Edition\"\"\",4900.00",
        csv![["Venture \"\"Extended Edition\"\"", "4900.00"]],
        |b: &mut RecognizerBuilder| { b.ignore_quote_escape(true); }
    );
    parses_to!(
        consecutive_quotes_before_whitespace,
        "\"s, m\"\"\"\t, \"3000.00\"",
        csv![["s, m\"\"", "3000.00"]],
        |b: &mut RecognizerBuilder| { b.ignore_quote_escape(true); }
    );

    parses_to!(tail_whitespace_then_delimiter, "\"abc\"  ,d", csv![["abc", "d"]]);
    parses_to!(
        tail_whitespace_then_terminator,
        "\"abc\" \t\nd",
        csv![["abc"], ["d"]]
    );
    parses_to!(tail_whitespace_then_end, "\"abc\"  ", csv![["abc"]]);
    parses_to!(
        tail_tab_delimiter_is_not_whitespace,
        "\"a\"\tb",
        csv![["a", "b"]],
        |b: &mut RecognizerBuilder| { b.delimiter('\t'); }
    );
    parses_to!(
        leading_tab_delimiter_is_not_whitespace,
        "\ta",
        csv![[E, "a"]],
        |b: &mut RecognizerBuilder| { b.delimiter('\t'); }
    );
    parses_to!(
        tail_recovered_with_content,
        "\"ac, abs\"  moon\",x",
        csv![["ac, abs\"  moon", "x"]]
    );
    parses_to!(
        tail_recovery_skips_escape_equal_to_quote,
        "\"a\"  \"b\"",
        csv![["a\"  \"b"]]
    );
    parses_to!(
        tail_recovery_keeps_quote_distinct_from_escape,
        "\"a\"  \"b\"",
        csv![["a\"  \"\"b"]],
        |b: &mut RecognizerBuilder| { b.escape('\\'); }
    );
    parses_to!(
        tail_recovery_skips_backslash_escape,
        "\"a\"  \\\"b\"",
        csv![["a\"  \"b"]],
        |b: &mut RecognizerBuilder| { b.escape('\\'); }
    );

    parses_to!(
        backslash_escape_is_kept,
        "\"a\\\"b\"",
        csv![["a\\\"b"]],
        |b: &mut RecognizerBuilder| { b.escape('\\'); }
    );
    parses_to!(
        backslash_escape_doubled_quote_collapses,
        "\"a\"\"b\",c",
        csv![["a\"b", "c"]],
        |b: &mut RecognizerBuilder| { b.escape('\\'); }
    );
    parses_to!(
        quote_change,
        "'a''b',c",
        csv![["a'b", "c"]],
        |b: &mut RecognizerBuilder| { b.quote('\'').escape('\''); }
    );
    parses_to!(
        delimiter_semicolon,
        "a;\"b;c\";d",
        csv![["a", "b;c", "d"]],
        |b: &mut RecognizerBuilder| { b.delimiter(';'); }
    );

    fails_with!(
        strict_unescaped_quote,
        "\"bad \"quote\" value\"",
        SyntaxErrorKind::UnescapedQuote { quote: '"' },
        strict
    );
    fails_with!(
        strict_malformed_tail,
        "\"abc\"  x,y",
        SyntaxErrorKind::MalformedQuotedTail { quote: '"', found: 'x' },
        strict
    );
    parses_to!(strict_accepts_doubled, "\"a\"\"b\",c", csv![["a\"b", "c"]], strict);
    parses_to!(strict_accepts_tail_delimiter, "\"a\"  ,b", csv![["a", "b"]], strict);

    #[test]
    fn custom_terminator() {
        let mut rcg = RecognizerBuilder::new().terminator(';').build();
        let mut src = StrSource::with_terminator("a,b;c,d", ';');
        let got = parse_source(&mut rcg, &mut src).unwrap();
        assert_eq!(csv![["a", "b"], ["c", "d"]], got);
    }

    #[test]
    fn one_record_per_call() {
        let mut rcg = Recognizer::new();
        let mut src = StrSource::new("a,b\nc\n");
        let mut sink = Fields::new();

        let res = rcg.read_record(&mut src, &mut sink).unwrap();
        assert!(res.is_record());
        assert_eq!("c\n", src.as_str());
        assert_eq!(csv![["a", "b"]][0], sink.take());

        let res = rcg.read_record(&mut src, &mut sink).unwrap();
        assert!(res.is_record());
        assert_eq!(csv![["c"]][0], sink.take());

        let res = rcg.read_record(&mut src, &mut sink).unwrap();
        assert_eq!(ReadRecordResult::End, res);
        assert!(sink.as_slice().is_empty());
    }

    #[test]
    fn unescaped_quote_error_context() {
        let mut rcg = RecognizerBuilder::new().unescaped_quotes(false).build();
        let err = parse(&mut rcg, "x\ny,\"bad \"quote\" value\"").unwrap_err();
        assert_eq!(2, err.line());
        assert_eq!(1, err.field());
        assert_eq!("bad ", err.value());
        assert_eq!(11, err.offset());
        assert!(err.to_string().contains("unescaped quote"));
    }

    #[test]
    fn whitespace_buffer_is_reused() {
        let mut rcg = RecognizerBuilder::new().whitespace_capacity(16).build();
        let data = "\"a\"  \"b\",\"c\" d";
        let got = parse(&mut rcg, data).unwrap();
        assert_eq!(csv![["a\"  \"b", "c\" d"]], got);
        assert!(rcg.whitespace.buf.capacity() >= 16);
        assert_eq!(" ", rcg.whitespace.as_str());
    }

    proptest! {
        #[test]
        fn unquoted_fields_split_on_delimiter(
            fields in prop::collection::vec("[a-z ]{0,6}", 2..6),
        ) {
            let data = format!("{}\n", fields.join(","));
            let mut rcg = Recognizer::new();
            let got = parse(&mut rcg, &data).unwrap();
            prop_assert_eq!(1, got.len());
            let got: Vec<&str> = got[0].iter().map(|f| f.as_str()).collect();
            let expected: Vec<&str> =
                fields.iter().map(|f| f.trim_matches(' ')).collect();
            prop_assert_eq!(expected, got);
        }

        #[test]
        fn quoted_values_round_trip(value in "[^,\n]{0,16}") {
            let encoded = format!("\"{}\"", value.replace('"', "\"\""));
            let data = format!("x,{},y\n", encoded);
            let mut rcg = Recognizer::new();
            let got = parse(&mut rcg, &data).unwrap();
            prop_assert_eq!(
                csv![["x", value.as_str(), "y"]],
                got
            );
        }
    }
}
