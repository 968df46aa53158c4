use std::io::BufRead;
use std::str::FromStr;

use aon_api::{BigDecimal, BigInt, CodecError, Reader, ReaderOptions, Result, Token, Value};

use crate::tag::{self, Payload};

/// Open container and, for objects, whether a key comes next.
#[derive(Debug, Clone, Copy)]
enum Open {
    List,
    Obj { key_next: bool },
}

/// Aon reader: one tag byte per token, containers closed by end tags.
pub struct AonReader<R: BufRead> {
    input: Option<R>,
    options: ReaderOptions,
    offset: u64,
    stack: Vec<Open>,
    last: Token,
    current: Value,
}

impl<R: BufRead> AonReader<R> {
    pub fn new(input: R, options: ReaderOptions) -> Self {
        Self {
            input: Some(input),
            options,
            offset: 0,
            stack: Vec::new(),
            last: Token::Root,
            current: Value::Null,
        }
    }

    fn input(&mut self) -> Result<&mut R> {
        self.input
            .as_mut()
            .ok_or_else(|| CodecError::sequencing("reader is closed"))
    }

    /// Next tag byte, `None` at a clean end of stream.
    fn read_tag(&mut self) -> Result<Option<u8>> {
        let input = self.input()?;
        let Some(&b) = input.fill_buf()?.first() else {
            return Ok(None);
        };
        input.consume(1);
        self.offset += 1;
        Ok(Some(b))
    }

    fn read_exact<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        let offset = self.offset;
        self.input()?
            .read_exact(&mut bytes)
            .map_err(|e| truncated(offset, e))?;
        self.offset += N as u64;
        Ok(bytes)
    }

    fn read_len(&mut self, width: usize) -> Result<usize> {
        let len = match width {
            1 => u64::from(u8::from_be_bytes(self.read_exact()?)),
            2 => u64::from(u16::from_be_bytes(self.read_exact()?)),
            _ => u64::from(u32::from_be_bytes(self.read_exact()?)),
        };
        match usize::try_from(len) {
            Ok(len) if len <= self.options.max_payload_len => Ok(len),
            _ => Err(CodecError::format(
                self.offset,
                format!("payload length {len} exceeds limit {}", self.options.max_payload_len),
            )),
        }
    }

    fn read_payload(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; len];
        let offset = self.offset;
        self.input()?
            .read_exact(&mut bytes)
            .map_err(|e| truncated(offset, e))?;
        self.offset += len as u64;
        Ok(bytes)
    }

    fn read_text(&mut self, len: usize) -> Result<String> {
        let offset = self.offset;
        String::from_utf8(self.read_payload(len)?)
            .map_err(|e| CodecError::format(offset, format!("invalid utf-8: {e}")))
    }

    fn scan(&mut self) -> Result<Token> {
        self.current = Value::Null;
        let at = self.offset;
        let Some(byte) = self.read_tag()? else {
            return if self.stack.is_empty() {
                tracing::trace!(offset = self.offset, "end of aon input");
                Ok(Token::EndInput)
            } else {
                Err(CodecError::format(self.offset, "unterminated container"))
            };
        };

        if let Some(Open::Obj { key_next: true }) = self.stack.last() {
            if byte != tag::OBJ_END && !matches!(Payload::classify(byte), Some((Payload::Str, _))) {
                let found = byte as char;
                return Err(CodecError::format(at, format!("expected key, found tag {found:?}")));
            }
        }

        let token = match byte {
            tag::LIST_START => return self.open(Open::List, Token::BeginList),
            tag::OBJ_START => return self.open(Open::Obj { key_next: true }, Token::BeginObj),
            tag::LIST_END => return self.close(at, false),
            tag::OBJ_END => return self.close(at, true),
            tag::NULL => Token::Null,
            tag::TRUE | tag::FALSE => {
                self.current = Value::Boolean(byte == tag::TRUE);
                Token::Boolean
            }
            tag::I8 | tag::U8 | tag::I16 | tag::U16 | tag::I32 | tag::U32 | tag::I64 => {
                let n = self.read_integer(byte)?;
                self.current = Value::integer(n);
                Token::of(self.current.tag())
            }
            tag::FLOAT => {
                self.current = Value::Float(f32::from_be_bytes(self.read_exact()?));
                Token::Float
            }
            tag::DOUBLE => {
                self.current = Value::Double(f64::from_be_bytes(self.read_exact()?));
                Token::Double
            }
            other => match Payload::classify(other) {
                Some((kind, width)) => {
                    let len = self.read_len(width)?;
                    self.sized(kind, len, at)?
                }
                None => {
                    return Err(CodecError::format(at, format!("invalid tag byte 0x{other:02x}")));
                }
            },
        };
        self.after_value();
        Ok(token)
    }

    fn read_integer(&mut self, byte: u8) -> Result<i64> {
        Ok(match byte {
            tag::I8 => i64::from(i8::from_be_bytes(self.read_exact()?)),
            tag::U8 => i64::from(u8::from_be_bytes(self.read_exact()?)),
            tag::I16 => i64::from(i16::from_be_bytes(self.read_exact()?)),
            tag::U16 => i64::from(u16::from_be_bytes(self.read_exact()?)),
            tag::I32 => i64::from(i32::from_be_bytes(self.read_exact()?)),
            tag::U32 => i64::from(u32::from_be_bytes(self.read_exact()?)),
            _ => i64::from_be_bytes(self.read_exact()?),
        })
    }

    fn sized(&mut self, kind: Payload, len: usize, at: u64) -> Result<Token> {
        Ok(match kind {
            Payload::Str => {
                self.current = Value::from(self.read_text(len)?);
                Token::String
            }
            Payload::Bin => {
                self.current = Value::binary(&self.read_payload(len)?);
                Token::Binary
            }
            Payload::BigInt => {
                let text = self.read_text(len)?;
                let n = BigInt::from_str(&text)
                    .map_err(|e| CodecError::format(at, format!("invalid bigint {text:?}: {e}")))?;
                self.current = Value::big_int(n);
                Token::BigInt
            }
            Payload::BigDec => {
                let text = self.read_text(len)?;
                let d = BigDecimal::from_str(&text)
                    .map_err(|e| CodecError::format(at, format!("invalid decimal {text:?}: {e}")))?;
                self.current = Value::big_decimal(d);
                Token::BigDecimal
            }
        })
    }

    fn open(&mut self, frame: Open, token: Token) -> Result<Token> {
        if self.stack.len() >= self.options.max_depth {
            tracing::warn!(
                max_depth = self.options.max_depth,
                offset = self.offset,
                "nesting limit exceeded"
            );
            return Err(CodecError::format(
                self.offset,
                format!("nesting deeper than {}", self.options.max_depth),
            ));
        }
        self.stack.push(frame);
        Ok(token)
    }

    fn close(&mut self, at: u64, object: bool) -> Result<Token> {
        match (self.stack.pop(), object) {
            (Some(Open::List), false) => {}
            (Some(Open::Obj { key_next: true }), true) => {}
            (Some(Open::Obj { key_next: false }), true) => {
                return Err(CodecError::format(at, "object ends between key and value"));
            }
            _ => return Err(CodecError::format(at, "unbalanced end tag")),
        }
        self.after_value();
        Ok(if object { Token::EndObj } else { Token::EndList })
    }

    /// Flip the key/value role in the enclosing object.
    fn after_value(&mut self) {
        if let Some(Open::Obj { key_next }) = self.stack.last_mut() {
            *key_next = !*key_next;
        }
    }
}

fn truncated(offset: u64, e: std::io::Error) -> CodecError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        CodecError::format(offset, "truncated payload")
    } else {
        CodecError::Resource(e)
    }
}

impl<R: BufRead> Reader for AonReader<R> {
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

    fn read(bytes: &[u8]) -> Result<Value> {
        AonReader::new(bytes, ReaderOptions::default()).get_value()
    }

    #[test]
    fn test_scalars() {
        assert!(read(b"N").unwrap().is_null());
        assert_eq!(read(b"T").unwrap(), Value::Boolean(true));
        assert_eq!(read(b"b\xff").unwrap(), Value::Int(-1));
        assert_eq!(read(b"B\xff").unwrap(), Value::Int(255));
        assert_eq!(read(b"h\x80\x00").unwrap(), Value::Int(-32768));
        assert_eq!(read(b"I\xff\xff\xff\xff").unwrap(), Value::Long(u32::MAX as i64));
        assert_eq!(read(b"I\xff\xff\xff\xff").unwrap().tag(), Tag::Long);
        assert_eq!(read(b"l\x7f\xff\xff\xff\xff\xff\xff\xff").unwrap(), Value::Long(i64::MAX));
        assert_eq!(read(b"s\x02hi").unwrap(), Value::from("hi"));
        assert_eq!(read(b"x\x00").unwrap(), Value::binary(b""));
        assert_eq!(read(b"m\x0212").unwrap().tag(), Tag::BigInt);
    }

    #[test]
    fn test_floats_are_big_endian() {
        let mut bytes = vec![b'd'];
        bytes.extend_from_slice(&1.5f64.to_be_bytes());
        assert_eq!(read(&bytes).unwrap(), Value::Double(1.5));
        let mut bytes = vec![b'f'];
        bytes.extend_from_slice(&f32::NAN.to_be_bytes());
        assert!(matches!(read(&bytes).unwrap(), Value::Float(f) if f.is_nan()));
    }

    #[test]
    fn test_object_tokens() {
        let mut r = AonReader::new(&b"{s\x01aB\x01s\x01b[TN]}"[..], ReaderOptions::default());
        let mut seen = Vec::new();
        loop {
            let t = r.next().unwrap();
            seen.push(t);
            if t == Token::EndInput {
                break;
            }
        }
        use Token::*;
        assert_eq!(
            seen,
            vec![BeginObj, String, Int, String, BeginList, Boolean, Null, EndList, EndObj, EndInput]
        );
    }

    #[test]
    fn test_bad_input() {
        for bad in [
            &b"?"[..],
            b"s\x05ab",
            b"[N",
            b"]",
            b"{B\x01N}",
            b"{s\x01a}",
            b"[}",
            b"s\x02\xff\xfe",
            b"m\x02zz",
            b"i\x00\x01",
        ] {
            assert_eq!(read(bad).unwrap_err().kind(), ErrorKind::Format, "{bad:?}");
        }
    }

    #[test]
    fn test_payload_limit() {
        let mut r = AonReader::new(
            &b"u\x7f\xff\xff\xff"[..],
            ReaderOptions {
                max_payload_len: 1024,
                ..ReaderOptions::default()
            },
        );
        let err = r.get_value().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("exceeds limit"));
    }

    #[test]
    fn test_depth_limit() {
        let deep = [b'['; 40].iter().chain(&[b']'; 40]).copied().collect::<Vec<_>>();
        let mut r = AonReader::new(
            &deep[..],
            ReaderOptions {
                max_depth: 16,
                ..ReaderOptions::default()
            },
        );
        assert_eq!(r.get_value().unwrap_err().kind(), ErrorKind::Format);
        assert_eq!(read(&deep).unwrap().size(), 1);
    }
}
