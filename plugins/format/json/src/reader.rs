use std::io::BufRead;

use aon_api::convert::parse_sentinel;
use aon_api::{CodecError, Reader, ReaderOptions, Result, Token, Value};

use crate::number::{self, Shape};

/// What the scanner expects at the next non-whitespace byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// A top-level value or end of input.
    Top,
    /// First list element or `]`.
    ListFirst,
    /// `,` or `]`.
    ListNext,
    /// First key or `}`.
    ObjFirst,
    /// `:` then a member value.
    Colon,
    /// `,` or `}`.
    ObjNext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Open {
    List,
    Obj,
}

/// Streaming JSON reader over any buffered byte source.
pub struct JsonReader<R: BufRead> {
    input: Option<R>,
    options: ReaderOptions,
    offset: u64,
    expect: Expect,
    stack: Vec<Open>,
    last: Token,
    current: Value,
    /// Reused for string and number text.
    buf: Vec<u8>,
}

impl<R: BufRead> JsonReader<R> {
    pub fn new(input: R, options: ReaderOptions) -> Self {
        Self {
            input: Some(input),
            options,
            offset: 0,
            expect: Expect::Top,
            stack: Vec::new(),
            last: Token::Root,
            current: Value::Null,
            buf: Vec::new(),
        }
    }

    // ---- Byte level ----

    fn peek(&mut self) -> Result<Option<u8>> {
        let Some(input) = self.input.as_mut() else {
            return Err(CodecError::sequencing("reader is closed"));
        };
        Ok(input.fill_buf()?.first().copied())
    }

    fn bump(&mut self) {
        if let Some(input) = self.input.as_mut() {
            input.consume(1);
            self.offset += 1;
        }
    }

    fn advance(&mut self) -> Result<Option<u8>> {
        let b = self.peek()?;
        if b.is_some() {
            self.bump();
        }
        Ok(b)
    }

    fn require(&mut self) -> Result<u8> {
        self.advance()?
            .ok_or_else(|| CodecError::format(self.offset, "unexpected end of input"))
    }

    fn skip_whitespace(&mut self) -> Result<Option<u8>> {
        while let Some(b) = self.peek()? {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => self.bump(),
                _ => return Ok(Some(b)),
            }
        }
        Ok(None)
    }

    fn error(&self, msg: impl Into<String>) -> CodecError {
        CodecError::format(self.offset, msg)
    }

    fn expect_bytes(&mut self, expected: &[u8]) -> Result<()> {
        for &b in expected {
            if self.advance()? != Some(b) {
                return Err(self.error(format!(
                    "invalid literal, expected {:?}",
                    String::from_utf8_lossy(expected)
                )));
            }
        }
        Ok(())
    }

    // ---- Token level ----

    fn scan(&mut self) -> Result<Token> {
        self.current = Value::Null;
        let Some(b) = self.skip_whitespace()? else {
            return if self.stack.is_empty() {
                tracing::trace!(offset = self.offset, "end of json input");
                Ok(Token::EndInput)
            } else {
                Err(self.error("unterminated container"))
            };
        };

        match self.expect {
            Expect::Top => self.value(b),
            Expect::ListFirst if b == b']' => self.close(Open::List),
            Expect::ListFirst => self.value(b),
            Expect::ListNext => match b {
                b',' => {
                    self.bump();
                    let b = self.member_start()?;
                    self.value(b)
                }
                b']' => self.close(Open::List),
                _ => Err(self.error("expected ',' or ']'")),
            },
            Expect::ObjFirst if b == b'}' => self.close(Open::Obj),
            Expect::ObjFirst => self.key(b),
            Expect::ObjNext => match b {
                b',' => {
                    self.bump();
                    let b = self.member_start()?;
                    self.key(b)
                }
                b'}' => self.close(Open::Obj),
                _ => Err(self.error("expected ',' or '}'")),
            },
            Expect::Colon => {
                if b != b':' {
                    return Err(self.error("expected ':'"));
                }
                self.bump();
                let b = self.member_start()?;
                self.value(b)
            }
        }
    }

    fn member_start(&mut self) -> Result<u8> {
        self.skip_whitespace()?
            .ok_or_else(|| self.error("unterminated container"))
    }

    fn key(&mut self, b: u8) -> Result<Token> {
        if b != b'"' {
            return Err(self.error("expected string key"));
        }
        self.bump();
        self.read_string()?;
        self.current = Value::string(std::str::from_utf8(&self.buf)?);
        self.expect = Expect::Colon;
        Ok(Token::String)
    }

    fn value(&mut self, b: u8) -> Result<Token> {
        let token = match b {
            b'[' | b'{' => return self.open(if b == b'[' { Open::List } else { Open::Obj }),
            b'"' => {
                self.bump();
                self.read_string()?;
                let s = std::str::from_utf8(&self.buf)?;
                match parse_sentinel(s) {
                    Some(d) => {
                        self.current = Value::Double(d);
                        Token::Double
                    }
                    None => {
                        self.current = Value::string(s);
                        Token::String
                    }
                }
            }
            b't' => {
                self.expect_bytes(b"true")?;
                self.current = Value::Boolean(true);
                Token::Boolean
            }
            b'f' => {
                self.expect_bytes(b"false")?;
                self.current = Value::Boolean(false);
                Token::Boolean
            }
            b'n' => {
                self.expect_bytes(b"null")?;
                Token::Null
            }
            b'-' | b'0'..=b'9' => {
                self.current = self.read_number()?;
                Token::of(self.current.tag())
            }
            other => return Err(self.error(format!("unexpected character {:?}", other as char))),
        };
        if self.stack.is_empty() && b != b'"' {
            self.end_of_top_level()?;
        }
        self.after_value();
        Ok(token)
    }

    /// A top-level number or literal must be followed by whitespace, a
    /// structural character, a quote or the end of input, so `1true` and
    /// `12 3` cannot be told apart from a single malformed token.
    fn end_of_top_level(&mut self) -> Result<()> {
        match self.peek()? {
            Some(b) if !is_delimiter(b) => Err(self.error(format!(
                "expected whitespace after top-level value, found {:?}",
                b as char
            ))),
            _ => Ok(()),
        }
    }

    fn open(&mut self, kind: Open) -> Result<Token> {
        if self.stack.len() >= self.options.max_depth {
            tracing::warn!(
                max_depth = self.options.max_depth,
                offset = self.offset,
                "nesting limit exceeded"
            );
            return Err(self.error(format!("nesting deeper than {}", self.options.max_depth)));
        }
        self.bump();
        self.stack.push(kind);
        Ok(match kind {
            Open::List => {
                self.expect = Expect::ListFirst;
                Token::BeginList
            }
            Open::Obj => {
                self.expect = Expect::ObjFirst;
                Token::BeginObj
            }
        })
    }

    fn close(&mut self, kind: Open) -> Result<Token> {
        self.bump();
        self.stack.pop();
        self.after_value();
        Ok(match kind {
            Open::List => Token::EndList,
            Open::Obj => Token::EndObj,
        })
    }

    fn after_value(&mut self) {
        self.expect = match self.stack.last() {
            None => Expect::Top,
            Some(Open::List) => Expect::ListNext,
            Some(Open::Obj) => Expect::ObjNext,
        };
    }

    // ---- Strings ----

    /// Decode string content after the opening quote into `buf`.
    fn read_string(&mut self) -> Result<()> {
        self.buf.clear();
        loop {
            match self.require()? {
                b'"' => return Ok(()),
                b'\\' => self.read_escape()?,
                b if b < 0x20 => return Err(self.error("control character in string")),
                b => self.buf.push(b),
            }
            if self.buf.len() > self.options.max_payload_len {
                return Err(self.error("string exceeds payload limit"));
            }
        }
    }

    fn read_escape(&mut self) -> Result<()> {
        let c = match self.require()? {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\x08',
            b'f' => '\x0C',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => self.read_unicode_escape()?,
            other => return Err(self.error(format!("invalid escape '\\{}'", other as char))),
        };
        let mut utf8 = [0u8; 4];
        self.buf.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
        Ok(())
    }

    fn read_unicode_escape(&mut self) -> Result<char> {
        let unit = self.read_hex4()?;
        let code = match unit {
            0xD800..=0xDBFF => {
                if self.require()? != b'\\' || self.require()? != b'u' {
                    return Err(self.error("unpaired high surrogate"));
                }
                let low = self.read_hex4()?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(self.error("invalid low surrogate"));
                }
                0x10000 + ((u32::from(unit) - 0xD800) << 10) + (u32::from(low) - 0xDC00)
            }
            0xDC00..=0xDFFF => return Err(self.error("unpaired low surrogate")),
            _ => u32::from(unit),
        };
        char::from_u32(code).ok_or_else(|| self.error("invalid code point"))
    }

    fn read_hex4(&mut self) -> Result<u16> {
        let mut value: u16 = 0;
        for _ in 0..4 {
            let b = self.require()?;
            let digit = match b {
                b'0'..=b'9' => b - b'0',
                b'a'..=b'f' => b - b'a' + 10,
                b'A'..=b'F' => b - b'A' + 10,
                _ => return Err(self.error("invalid hex digit in \\u escape")),
            };
            value = (value << 4) | u16::from(digit);
        }
        Ok(value)
    }

    // ---- Numbers ----

    fn read_number(&mut self) -> Result<Value> {
        let start = self.offset;
        self.buf.clear();
        let mut shape = Shape::default();

        if self.peek()? == Some(b'-') {
            self.take_byte()?;
        }
        match self.peek()? {
            Some(b'0') => {
                self.take_byte()?;
                if matches!(self.peek()?, Some(b'0'..=b'9')) {
                    return Err(self.error("leading zero in number"));
                }
            }
            Some(b'1'..=b'9') => self.take_digits()?,
            _ => return Err(self.error("expected digit")),
        }

        if self.peek()? == Some(b'.') {
            shape.point = Some(self.buf.len());
            self.take_byte()?;
            if !matches!(self.peek()?, Some(b'0'..=b'9')) {
                return Err(self.error("expected digit after decimal point"));
            }
            self.take_digits()?;
        }

        if matches!(self.peek()?, Some(b'e' | b'E')) {
            shape.exponent = Some(self.buf.len());
            self.take_byte()?;
            if matches!(self.peek()?, Some(b'+' | b'-')) {
                self.take_byte()?;
            }
            if !matches!(self.peek()?, Some(b'0'..=b'9')) {
                return Err(self.error("expected digit in exponent"));
            }
            self.take_digits()?;
        }

        let text = std::str::from_utf8(&self.buf)?;
        number::decode(text, shape)
            .ok_or_else(|| CodecError::format(start, format!("invalid number {text:?}")))
    }

    fn take_byte(&mut self) -> Result<()> {
        if let Some(b) = self.advance()? {
            self.buf.push(b);
        }
        if self.buf.len() > self.options.max_payload_len {
            return Err(self.error("number exceeds payload limit"));
        }
        Ok(())
    }

    fn take_digits(&mut self) -> Result<()> {
        while matches!(self.peek()?, Some(b'0'..=b'9')) {
            self.take_byte()?;
        }
        Ok(())
    }
}

fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b' ' | b'\t' | b'\n' | b'\r' | b'"' | b'[' | b']' | b'{' | b'}' | b',' | b':'
    )
}

impl<R: BufRead> Reader for JsonReader<R> {
    fn next(&mut self) -> Result<Token> {
        if self.last == Token::EndInput {
            return Ok(Token::EndInput);
        }
        let token = self.scan()?;
        self.last = token;
        Ok(token)
    }

    fn last(&self) -> Token {
        self.last
    }

    fn current(&self) -> &Value {
        &self.current
    }

    fn depth(&self) -> usize {
        self.stack.len()
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn options(&self) -> &ReaderOptions {
        &self.options
    }

    fn close(&mut self) -> Result<()> {
        self.input = None;
        self.stack.clear();
        self.current = Value::Null;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aon_api::{ErrorKind, Tag};

    fn reader(text: &str) -> JsonReader<&[u8]> {
        JsonReader::new(text.as_bytes(), ReaderOptions::default())
    }

    fn tokens(text: &str) -> Result<Vec<Token>> {
        let mut r = reader(text);
        let mut out = Vec::new();
        loop {
            let t = r.next()?;
            out.push(t);
            if t == Token::EndInput {
                return Ok(out);
            }
        }
    }

    fn parse(text: &str) -> Result<Value> {
        reader(text).get_value()
    }

    #[test]
    fn test_token_stream() {
        use Token::*;
        assert_eq!(
            tokens(r#"{"a":1,"b":[true,null,"x"]}"#).unwrap(),
            vec![
                BeginObj, String, Int, String, BeginList, Boolean, Null, String, EndList, EndObj,
                EndInput
            ]
        );
    }

    #[test]
    fn test_nested_document() {
        let v = parse(r#" { "a" : 1 , "b" : [ true , null , "x" ] } "#).unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.keys().collect::<Vec<_>>(), ["a", "b"]);
        let list = obj.get("b").and_then(Value::as_list).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0], Value::Boolean(true));
        assert!(list[1].is_null());
        assert_eq!(list[2], Value::from("x"));
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(parse("{}").unwrap().size(), 0);
        assert_eq!(parse("[]").unwrap().size(), 0);
        assert_eq!(parse("[[],{}]").unwrap().size(), 2);
    }

    #[test]
    fn test_escapes() {
        let v = parse(r#""a\"b\\c\/d\b\f\n\r\t\u0041\u00e9\ud83d\ude00""#).unwrap();
        assert_eq!(v.as_str().unwrap(), "a\"b\\c/d\u{8}\u{c}\n\r\tAé😀");
        assert_eq!(parse("\"héllo\"").unwrap().as_str(), Some("héllo"));
    }

    #[test]
    fn test_invalid_strings() {
        for bad in [
            r#""\ud800""#,
            r#""\udc00""#,
            "\"a\u{1}b\"",
            r#""\x""#,
            r#""abc"#,
            r#""\u12G4""#,
        ] {
            assert_eq!(parse(bad).unwrap_err().kind(), ErrorKind::Format, "{bad}");
        }
        assert_eq!(parse(&format!("\"{}\"", "\u{ffff}")).unwrap().as_str(), Some("\u{ffff}"));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut r = JsonReader::new(&b"\"\xff\""[..], ReaderOptions::default());
        assert_eq!(r.get_value().unwrap_err().kind(), ErrorKind::Format);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse("0").unwrap(), Value::Int(0));
        assert_eq!(parse("-17").unwrap().tag(), Tag::Int);
        assert_eq!(parse("4294967296").unwrap().tag(), Tag::Long);
        assert_eq!(parse("99999999999999999999").unwrap().tag(), Tag::BigInt);
        assert_eq!(parse("3.14").unwrap(), Value::Double(3.14));
        assert_eq!(parse("2.5e-3").unwrap(), Value::Double(0.0025));
        assert_eq!(parse("[1,2.0]").unwrap().as_list().unwrap()[1].tag(), Tag::Double);
    }

    #[test]
    fn test_invalid_numbers() {
        for bad in ["01", "-", "1.", ".5", "1e", "1e+", "-a", "+1"] {
            assert_eq!(parse(bad).unwrap_err().kind(), ErrorKind::Format, "{bad}");
        }
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse("true").unwrap(), Value::Boolean(true));
        assert_eq!(parse("false").unwrap(), Value::Boolean(false));
        assert!(parse("null").unwrap().is_null());
        assert!(parse("nul").is_err());
        assert!(parse("tru").is_err());
    }

    #[test]
    fn test_sentinels_become_doubles() {
        let v = parse("[\"\\u001bNaN\",\"\\u001bInfinity\",\"\\u001b-Infinity\",\"NaN\"]").unwrap();
        let list = v.as_list().unwrap();
        assert!(matches!(list[0], Value::Double(d) if d.is_nan()));
        assert_eq!(list[1], Value::Double(f64::INFINITY));
        assert_eq!(list[2], Value::Double(f64::NEG_INFINITY));
        assert_eq!(list[3], Value::from("NaN"));
    }

    #[test]
    fn test_sentinel_key_stays_string() {
        let v = parse("{\"\\u001bNaN\":1}").unwrap();
        assert!(v.as_object().unwrap().contains_key("\u{1b}NaN"));
    }

    #[test]
    fn test_structural_errors() {
        for bad in [
            "[1,2",
            "{\"a\":1",
            "[1 2]",
            "{\"a\" 1}",
            "{1:2}",
            "[1,]",
            "{\"a\":1,}",
            "]",
            "{\"a\"}",
        ] {
            let err = parse(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format, "{bad}");
        }
    }

    #[test]
    fn test_unterminated_reports_format_error() {
        let err = parse("[1,[2,3]").unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn test_multiple_top_level_values() {
        let mut r = reader("1 \"two\" [3]");
        assert_eq!(r.get_value().unwrap(), Value::Int(1));
        r.next().unwrap();
        assert_eq!(r.get_value().unwrap(), Value::from("two"));
        r.next().unwrap();
        assert_eq!(r.get_value().unwrap().size(), 1);
        assert_eq!(r.next().unwrap(), Token::EndInput);
        assert_eq!(r.next().unwrap(), Token::EndInput);
    }

    #[test]
    fn test_adjacent_top_level_values() {
        use Token::*;
        assert_eq!(
            tokens("[]{}\"a\"1\n\"b\"").unwrap(),
            vec![BeginList, EndList, BeginObj, EndObj, String, Int, String, EndInput]
        );

        for glued in ["1true", "null1", "1-2", "-0x", "2.5e3e"] {
            let err = tokens(glued).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format, "{glued}");
        }
    }

    #[test]
    fn test_depth_limit() {
        let deep = "[".repeat(100) + &"]".repeat(100);
        let mut r = JsonReader::new(
            deep.as_bytes(),
            ReaderOptions {
                max_depth: 50,
                ..ReaderOptions::default()
            },
        );
        assert_eq!(r.get_value().unwrap_err().kind(), ErrorKind::Format);
        assert_eq!(parse(&deep).unwrap().size(), 1);
    }

    #[test]
    fn test_payload_limit() {
        let mut r = JsonReader::new(
            &b"\"0123456789abcdef\""[..],
            ReaderOptions {
                max_payload_len: 8,
                ..ReaderOptions::default()
            },
        );
        assert_eq!(r.get_value().unwrap_err().kind(), ErrorKind::Format);
    }

    #[test]
    fn test_coercing_getters() {
        let mut r = reader("[\"12\", 7.9, true]");
        r.next().unwrap();
        r.next().unwrap();
        assert_eq!(r.get_int().unwrap(), 12);
        r.next().unwrap();
        assert_eq!(r.get_long().unwrap(), 7);
        assert_eq!(r.get_string().unwrap(), "7.9");
        r.next().unwrap();
        assert_eq!(r.get_int().unwrap(), 1);
        r.next().unwrap();
        assert_eq!(r.get_boolean().unwrap_err().kind(), ErrorKind::Sequencing);
    }

    #[test]
    fn test_close_mid_document() {
        let mut r = reader("[1,2,3]");
        r.next().unwrap();
        r.next().unwrap();
        Reader::close(&mut r).unwrap();
        assert_eq!(r.next().unwrap_err().kind(), ErrorKind::Sequencing);
    }
}
