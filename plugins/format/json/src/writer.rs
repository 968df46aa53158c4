use std::io::Write;

use aon_api::convert::{format_double, format_float, non_finite_sentinel, plain_decimal};
use aon_api::{BigDecimal, BigInt, Emitter, PatchBuffer, Result, WriterOptions};
use base64::Engine;

/// JSON text emitter.
///
/// Non-finite numbers become sentinel strings and binary becomes standard
/// Base64, both of which the reader maps back.
pub struct JsonEmitter<W: Write> {
    out: PatchBuffer<W>,
    pretty: bool,
}

impl<W: Write> JsonEmitter<W> {
    pub fn new(sink: W, options: &WriterOptions) -> Self {
        Self {
            out: PatchBuffer::new(sink, options.flush_threshold),
            pretty: options.pretty,
        }
    }

    pub fn get_ref(&self) -> &W {
        self.out.get_ref()
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn quoted(&mut self, s: &str) {
        self.out.put_u8(b'"');
        let bytes = s.as_bytes();
        let mut start = 0;
        for (i, c) in s.char_indices() {
            let escape = match c {
                '"' => Some("\\\""),
                '\\' => Some("\\\\"),
                '\u{08}' => Some("\\b"),
                '\u{0C}' => Some("\\f"),
                '\n' => Some("\\n"),
                '\r' => Some("\\r"),
                '\t' => Some("\\t"),
                c if c.is_control() => None,
                _ => continue,
            };
            self.out.put(&bytes[start..i]);
            match escape {
                Some(e) => self.out.put(e.as_bytes()),
                None => self.out.put(format!("\\u{:04x}", u32::from(c)).as_bytes()),
            }
            start = i + c.len_utf8();
        }
        self.out.put(&bytes[start..]);
        self.out.put_u8(b'"');
    }

    fn non_finite(&mut self, d: f64) -> bool {
        match non_finite_sentinel(d) {
            Some(sentinel) => {
                self.quoted(sentinel);
                true
            }
            None => false,
        }
    }
}

impl<W: Write> Emitter for JsonEmitter<W> {
    fn write_begin_list(&mut self) -> Result<()> {
        self.out.put_u8(b'[');
        Ok(())
    }

    fn write_end_list(&mut self) -> Result<()> {
        self.out.put_u8(b']');
        Ok(())
    }

    fn write_begin_obj(&mut self) -> Result<()> {
        self.out.put_u8(b'{');
        Ok(())
    }

    fn write_end_obj(&mut self) -> Result<()> {
        self.out.put_u8(b'}');
        Ok(())
    }

    fn write_key(&mut self, key: &str) -> Result<()> {
        self.quoted(key);
        Ok(())
    }

    fn write_key_value_separator(&mut self) -> Result<()> {
        let sep: &[u8] = if self.pretty { b": " } else { b":" };
        self.out.put(sep);
        Ok(())
    }

    fn write_separator(&mut self) -> Result<()> {
        self.out.put_u8(b',');
        Ok(())
    }

    fn write_newline_indent(&mut self, depth: usize, indent: usize) -> Result<()> {
        self.out.put_u8(b'\n');
        for _ in 0..depth * indent {
            self.out.put_u8(b' ');
        }
        Ok(())
    }

    fn write_null(&mut self) -> Result<()> {
        self.out.put(b"null");
        Ok(())
    }

    fn write_boolean(&mut self, b: bool) -> Result<()> {
        let literal: &[u8] = if b { b"true" } else { b"false" };
        self.out.put(literal);
        Ok(())
    }

    fn write_int(&mut self, i: i32) -> Result<()> {
        self.out.put(i.to_string().as_bytes());
        Ok(())
    }

    fn write_long(&mut self, l: i64) -> Result<()> {
        self.out.put(l.to_string().as_bytes());
        Ok(())
    }

    fn write_float(&mut self, f: f32) -> Result<()> {
        if !self.non_finite(f64::from(f)) {
            self.out.put(format_float(f).as_bytes());
        }
        Ok(())
    }

    fn write_double(&mut self, d: f64) -> Result<()> {
        if !self.non_finite(d) {
            self.out.put(format_double(d).as_bytes());
        }
        Ok(())
    }

    fn write_big_int(&mut self, n: &BigInt) -> Result<()> {
        self.out.put(n.to_string().as_bytes());
        Ok(())
    }

    fn write_big_decimal(&mut self, d: &BigDecimal) -> Result<()> {
        self.out.put(plain_decimal(d).as_bytes());
        Ok(())
    }

    fn write_binary(&mut self, b: &[u8]) -> Result<()> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b);
        self.quoted(&encoded);
        Ok(())
    }

    fn write_string(&mut self, s: &str) -> Result<()> {
        self.quoted(s);
        Ok(())
    }

    fn checkpoint(&mut self, _depth: usize) -> Result<()> {
        self.out.flush_if_needed()
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use aon_api::{List, Object, Value, Writer};

    fn render(value: &Value, options: WriterOptions) -> String {
        let mut w = Writer::new(JsonEmitter::new(Vec::new(), &options), options);
        w.value(value).unwrap();
        w.close().unwrap();
        String::from_utf8(w.into_inner().into_inner()).unwrap()
    }

    fn compact(value: &Value) -> String {
        render(value, WriterOptions::default())
    }

    fn sample() -> Value {
        let mut obj = Object::new();
        obj.put("a", 1);
        obj.put("b", List::from_iter([Value::Boolean(true), Value::Null, Value::from("x")]));
        Value::Object(obj)
    }

    #[test]
    fn test_compact_output() {
        assert_eq!(compact(&sample()), r#"{"a":1,"b":[true,null,"x"]}"#);
        assert_eq!(compact(&Value::Object(Object::new())), "{}");
    }

    #[test]
    fn test_pretty_output() {
        let text = render(&sample(), WriterOptions::pretty());
        assert_eq!(text, "{\n  \"a\": 1,\n  \"b\": [\n    true,\n    null,\n    \"x\"\n  ]\n}");
        assert_eq!(render(&Value::List(List::new()), WriterOptions::pretty()), "[]");
    }

    #[test]
    fn test_output_is_standard_json() {
        let parsed: serde_json::Value = serde_json::from_str(&compact(&sample())).unwrap();
        assert_eq!(parsed["b"][2], "x");
        assert_eq!(parsed["a"], 1);
    }

    #[test]
    fn test_string_escapes() {
        let text = compact(&Value::from("q\"b\\\n\t\u{1}\u{7f}/é"));
        assert_eq!(text, r#""q\"b\\\n\t\u0001\u007f/é""#);
        let back: String = serde_json::from_str(&text).unwrap();
        assert_eq!(back, "q\"b\\\n\t\u{1}\u{7f}/é");
    }

    #[test]
    fn test_whole_doubles_keep_point() {
        assert_eq!(compact(&Value::Double(5.0)), "5.0");
        assert_eq!(compact(&Value::Float(3.14)), "3.14");
        assert_eq!(compact(&Value::Double(1e16)), "1.0e16");
        assert_eq!(compact(&Value::Double(1e21)), "1.0e21");
        assert_eq!(compact(&Value::Double(-2e-9)), "-2.0e-9");
        assert_eq!(compact(&Value::Float(1e30)), "1.0e30");
    }

    #[test]
    fn test_non_finite_sentinels() {
        assert_eq!(compact(&Value::Double(f64::NAN)), r#""\u001bNaN""#);
        assert_eq!(compact(&Value::Float(f32::NEG_INFINITY)), r#""\u001b-Infinity""#);
    }

    #[test]
    fn test_big_numbers_and_binary() {
        let n = BigInt::from_str("123456789012345678901234567890").unwrap();
        assert_eq!(compact(&Value::big_int(n)), "123456789012345678901234567890");
        let d = BigDecimal::from_str("-0.000123").unwrap();
        assert_eq!(compact(&Value::big_decimal(d)), "-0.000123");
        assert_eq!(compact(&Value::binary(b"hi")), r#""aGk=""#);
    }

    #[test]
    fn test_small_threshold_still_complete() {
        let options = WriterOptions {
            flush_threshold: 1,
            ..WriterOptions::default()
        };
        assert_eq!(render(&sample(), options), r#"{"a":1,"b":[true,null,"x"]}"#);
    }
}
