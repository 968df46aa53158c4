use std::io::Write;

use aon_api::convert::plain_decimal;
use aon_api::{BigDecimal, BigInt, CodecError, Emitter, PatchBuffer, Result, WriterOptions};

use crate::tag::{self, Payload};

/// Aon emitter. Self-delimiting output, so it never patches and may flush
/// at any value boundary.
pub struct AonEmitter<W: Write> {
    out: PatchBuffer<W>,
}

impl<W: Write> AonEmitter<W> {
    pub fn new(sink: W, options: &WriterOptions) -> Self {
        Self {
            out: PatchBuffer::new(sink, options.flush_threshold),
        }
    }

    pub fn get_ref(&self) -> &W {
        self.out.get_ref()
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn integer(&mut self, n: i64) {
        let (tag, width) = tag::integer_class(n);
        self.out.put_u8(tag);
        // Every class is a two's-complement truncation of the i64.
        self.out.put(&n.to_be_bytes()[8 - width..]);
    }

    fn sized(&mut self, kind: Payload, payload: &[u8]) -> Result<()> {
        let [t8, t16, t32] = kind.tags();
        let len = payload.len();
        if let Ok(n) = u8::try_from(len) {
            self.out.put_u8(t8);
            self.out.put_u8(n);
        } else if let Ok(n) = u16::try_from(len) {
            self.out.put_u8(t16);
            self.out.put(&n.to_be_bytes());
        } else if let Ok(n) = u32::try_from(len) {
            self.out.put_u8(t32);
            self.out.put(&n.to_be_bytes());
        } else {
            return Err(CodecError::format(
                self.out.offset(),
                format!("payload of {len} bytes does not fit a 32-bit length"),
            ));
        }
        self.out.put(payload);
        Ok(())
    }
}

impl<W: Write> Emitter for AonEmitter<W> {
    fn write_begin_list(&mut self) -> Result<()> {
        self.out.put_u8(tag::LIST_START);
        Ok(())
    }

    fn write_end_list(&mut self) -> Result<()> {
        self.out.put_u8(tag::LIST_END);
        Ok(())
    }

    fn write_begin_obj(&mut self) -> Result<()> {
        self.out.put_u8(tag::OBJ_START);
        Ok(())
    }

    fn write_end_obj(&mut self) -> Result<()> {
        self.out.put_u8(tag::OBJ_END);
        Ok(())
    }

    fn write_key(&mut self, key: &str) -> Result<()> {
        self.sized(Payload::Str, key.as_bytes())
    }

    fn write_null(&mut self) -> Result<()> {
        self.out.put_u8(tag::NULL);
        Ok(())
    }

    fn write_boolean(&mut self, b: bool) -> Result<()> {
        self.out.put_u8(if b { tag::TRUE } else { tag::FALSE });
        Ok(())
    }

    fn write_int(&mut self, i: i32) -> Result<()> {
        self.integer(i64::from(i));
        Ok(())
    }

    fn write_long(&mut self, l: i64) -> Result<()> {
        self.integer(l);
        Ok(())
    }

    fn write_float(&mut self, f: f32) -> Result<()> {
        self.out.put_u8(tag::FLOAT);
        self.out.put(&f.to_be_bytes());
        Ok(())
    }

    fn write_double(&mut self, d: f64) -> Result<()> {
        self.out.put_u8(tag::DOUBLE);
        self.out.put(&d.to_be_bytes());
        Ok(())
    }

    fn write_big_int(&mut self, n: &BigInt) -> Result<()> {
        self.sized(Payload::BigInt, n.to_string().as_bytes())
    }

    fn write_big_decimal(&mut self, d: &BigDecimal) -> Result<()> {
        self.sized(Payload::BigDec, plain_decimal(d).as_bytes())
    }

    fn write_binary(&mut self, b: &[u8]) -> Result<()> {
        self.sized(Payload::Bin, b)
    }

    fn write_string(&mut self, s: &str) -> Result<()> {
        self.sized(Payload::Str, s.as_bytes())
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
    use aon_api::{Object, Value, Writer};

    fn encode(value: &Value) -> Vec<u8> {
        let options = WriterOptions::default();
        let mut w = Writer::new(AonEmitter::new(Vec::new(), &options), options);
        w.value(value).unwrap();
        w.close().unwrap();
        w.into_inner().into_inner()
    }

    #[test]
    fn test_integer_widths() {
        assert_eq!(encode(&Value::Int(5)), b"b\x05");
        assert_eq!(encode(&Value::Int(-1)), b"b\xff");
        assert_eq!(encode(&Value::Int(200)), b"B\xc8");
        assert_eq!(encode(&Value::Int(-300)), b"h\xfe\xd4");
        assert_eq!(encode(&Value::Int(65535)), b"H\xff\xff");
        assert_eq!(encode(&Value::Long(-70000)), b"i\xff\xfe\xee\x90");
        assert_eq!(encode(&Value::Long(u32::MAX as i64)), b"I\xff\xff\xff\xff");
        assert_eq!(encode(&Value::Long(i64::MAX)), b"l\x7f\xff\xff\xff\xff\xff\xff\xff");
        assert_eq!(encode(&Value::Long(i64::MIN)), b"l\x80\x00\x00\x00\x00\x00\x00\x00");
    }

    #[test]
    fn test_length_classes() {
        assert_eq!(encode(&Value::from("hi")), b"s\x02hi");
        let long = "a".repeat(300);
        let bytes = encode(&Value::from(long.as_str()));
        assert_eq!(&bytes[..3], b"t\x01\x2c");
        assert_eq!(bytes.len(), 303);
        let huge = vec![7u8; 70_000];
        let bytes = encode(&Value::binary(&huge));
        assert_eq!(&bytes[..5], b"z\x00\x01\x11\x70");
    }

    #[test]
    fn test_big_numbers_as_text() {
        let n = BigInt::from_str("-123456789012345678901234567890").unwrap();
        let bytes = encode(&Value::big_int(n));
        assert_eq!(bytes[0], b'm');
        assert_eq!(&bytes[2..], b"-123456789012345678901234567890");
        let d = BigDecimal::from_str("1.50").unwrap();
        assert_eq!(encode(&Value::big_decimal(d)), b"p\x041.50");
    }

    #[test]
    fn test_containers_are_delimited() {
        let mut obj = Object::new();
        obj.put("a", 1);
        obj.put("b", aon_api::List::from_iter([true]));
        assert_eq!(encode(&Value::Object(obj)), b"{s\x01ab\x01s\x01b[T]}");
        assert_eq!(encode(&Value::Object(Object::new())), b"{}");
    }

    #[test]
    fn test_floats_full_width() {
        let bytes = encode(&Value::Double(f64::NEG_INFINITY));
        assert_eq!(bytes[0], b'd');
        assert_eq!(&bytes[1..], &f64::NEG_INFINITY.to_be_bytes());
        assert_eq!(encode(&Value::Float(0.0)), b"f\x00\x00\x00\x00");
    }
}
