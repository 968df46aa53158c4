use std::io::BufRead;
use std::str::FromStr;

use aon_api::{BigDecimal, BigInt, CodecError, Reader, ReaderOptions, Result, Token, Value};

use crate::tag;

/// Open container: children still to read and, for maps, the key/value
/// role of the next one.
#[derive(Debug, Clone, Copy)]
struct Frame {
    is_map: bool,
    remaining: u64,
    key_next: bool,
}

/// MessagePack reader. Containers are count-prefixed; the end tokens are
/// synthesized once a frame's count runs out.
pub struct MsgPackReader<R: BufRead> {
    input: Option<R>,
    options: ReaderOptions,
    offset: u64,
    frames: Vec<Frame>,
    last: Token,
    current: Value,
}

impl<R: BufRead> MsgPackReader<R> {
    pub fn new(input: R, options: ReaderOptions) -> Self {
        Self {
            input: Some(input),
            options,
            offset: 0,
            frames: Vec::new(),
            last: Token::Root,
            current: Value::Null,
        }
    }

    fn input(&mut self) -> Result<&mut R> {
        self.input
            .as_mut()
            .ok_or_else(|| CodecError::sequencing("reader is closed"))
    }

    fn read_marker(&mut self) -> Result<Option<u8>> {
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

    fn read_u8(&mut self) -> Result<u8> {
        Ok(u8::from_be_bytes(self.read_exact()?))
    }

    fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_exact()?))
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_exact()?))
    }

    fn read_payload(&mut self, len: usize) -> Result<Vec<u8>> {
        if len > self.options.max_payload_len {
            return Err(CodecError::format(
                self.offset,
                format!("payload length {len} exceeds limit {}", self.options.max_payload_len),
            ));
        }
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

        if let Some(frame) = self.frames.last() {
            if frame.remaining == 0 {
                let is_map = frame.is_map;
                self.frames.pop();
                return Ok(if is_map { Token::EndObj } else { Token::EndList });
            }
        }

        let at = self.offset;
        let Some(marker) = self.read_marker()? else {
            return if self.frames.is_empty() {
                tracing::trace!(offset = self.offset, "end of msgpack input");
                Ok(Token::EndInput)
            } else {
                Err(CodecError::format(self.offset, "unterminated container"))
            };
        };

        if let Some(frame) = self.frames.last_mut() {
            if frame.is_map {
                if frame.key_next && !tag::is_str(marker) {
                    return Err(CodecError::format(
                        at,
                        format!("map key must be a string, found marker 0x{marker:02x}"),
                    ));
                }
                frame.key_next = !frame.key_next;
            }
            frame.remaining -= 1;
        }

        match marker {
            0x00..=tag::POSITIVE_FIXINT_MAX => self.integer(i64::from(marker)),
            tag::NEGATIVE_FIXINT_MIN..=0xff => self.integer(i64::from(marker as i8)),
            0x80..=0x8f => self.open(true, u64::from(marker & 0x0f)),
            0x90..=0x9f => self.open(false, u64::from(marker & 0x0f)),
            0xa0..=0xbf => self.string(usize::from(marker & 0x1f)),
            tag::NIL => Ok(Token::Null),
            tag::FALSE | tag::TRUE => {
                self.current = Value::Boolean(marker == tag::TRUE);
                Ok(Token::Boolean)
            }
            tag::BIN8 | tag::BIN16 | tag::BIN32 => {
                let len = self.read_len(marker - tag::BIN8)?;
                self.current = Value::binary(&self.read_payload(len)?);
                Ok(Token::Binary)
            }
            tag::EXT8 | tag::EXT16 | tag::EXT32 => {
                let len = self.read_len(marker - tag::EXT8)?;
                self.extension(len, at)
            }
            tag::FIXEXT1..=tag::FIXEXT16 => self.extension(1 << (marker - tag::FIXEXT1), at),
            tag::FLOAT32 => {
                self.current = Value::Float(f32::from_be_bytes(self.read_exact()?));
                Ok(Token::Float)
            }
            tag::FLOAT64 => {
                self.current = Value::Double(f64::from_be_bytes(self.read_exact()?));
                Ok(Token::Double)
            }
            tag::UINT8 => {
                let n = self.read_u8()?;
                self.integer(i64::from(n))
            }
            tag::UINT16 => {
                let n = self.read_u16()?;
                self.integer(i64::from(n))
            }
            tag::UINT32 => {
                let n = self.read_u32()?;
                self.integer(i64::from(n))
            }
            tag::UINT64 => {
                let n = u64::from_be_bytes(self.read_exact()?);
                match i64::try_from(n) {
                    Ok(n) => self.integer(n),
                    Err(_) => {
                        self.current = Value::big_int(BigInt::from(n));
                        Ok(Token::BigInt)
                    }
                }
            }
            tag::INT8 => {
                let n = i8::from_be_bytes(self.read_exact()?);
                self.integer(i64::from(n))
            }
            tag::INT16 => {
                let n = i16::from_be_bytes(self.read_exact()?);
                self.integer(i64::from(n))
            }
            tag::INT32 => {
                let n = i32::from_be_bytes(self.read_exact()?);
                self.integer(i64::from(n))
            }
            tag::INT64 => {
                let n = i64::from_be_bytes(self.read_exact()?);
                self.integer(n)
            }
            tag::STR8 | tag::STR16 | tag::STR32 => {
                let len = self.read_len(marker - tag::STR8)?;
                self.string(len)
            }
            tag::ARRAY16 => {
                let n = self.read_u16()?;
                self.open(false, u64::from(n))
            }
            tag::ARRAY32 => {
                let n = self.read_u32()?;
                self.open(false, u64::from(n))
            }
            tag::MAP16 => {
                let n = self.read_u16()?;
                self.open(true, u64::from(n))
            }
            tag::MAP32 => {
                let n = self.read_u32()?;
                self.open(true, u64::from(n))
            }
            other => Err(CodecError::format(at, format!("invalid marker 0x{other:02x}"))),
        }
    }

    /// Length field of the 8/16/32-bit family member `class` (0, 1, 2).
    fn read_len(&mut self, class: u8) -> Result<usize> {
        let len = match class {
            0 => u32::from(self.read_u8()?),
            1 => u32::from(self.read_u16()?),
            _ => self.read_u32()?,
        };
        usize::try_from(len).map_err(|_| CodecError::format(self.offset, "length overflows usize"))
    }

    fn integer(&mut self, n: i64) -> Result<Token> {
        self.current = Value::integer(n);
        Ok(Token::of(self.current.tag()))
    }

    fn string(&mut self, len: usize) -> Result<Token> {
        self.current = Value::from(self.read_text(len)?);
        Ok(Token::String)
    }

    fn extension(&mut self, len: usize, at: u64) -> Result<Token> {
        let ext_type = i8::from_be_bytes(self.read_exact()?);
        let text = self.read_text(len)?;
        match ext_type {
            tag::EXT_BIG_INT => {
                let n = BigInt::from_str(&text)
                    .map_err(|e| CodecError::format(at, format!("invalid bigint {text:?}: {e}")))?;
                self.current = Value::big_int(n);
                Ok(Token::BigInt)
            }
            tag::EXT_BIG_DECIMAL => {
                let d = BigDecimal::from_str(&text)
                    .map_err(|e| CodecError::format(at, format!("invalid decimal {text:?}: {e}")))?;
                self.current = Value::big_decimal(d);
                Ok(Token::BigDecimal)
            }
            other => Err(CodecError::format(at, format!("unsupported extension type {other}"))),
        }
    }

    fn open(&mut self, is_map: bool, count: u64) -> Result<Token> {
        if self.frames.len() >= self.options.max_depth {
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
        self.frames.push(Frame {
            is_map,
            remaining: if is_map { count * 2 } else { count },
            key_next: true,
        });
        Ok(if is_map { Token::BeginObj } else { Token::BeginList })
    }
}

fn truncated(offset: u64, e: std::io::Error) -> CodecError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        CodecError::format(offset, "truncated payload")
    } else {
        CodecError::Resource(e)
    }
}

impl<R: BufRead> Reader for MsgPackReader<R> {
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
        self.frames.len()
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn options(&self) -> &ReaderOptions {
        &self.options
    }

    fn close(&mut self) -> Result<()> {
        self.input = None;
        self.frames.clear();
        self.current = Value::Null;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aon_api::{ErrorKind, Tag};

    fn read(bytes: &[u8]) -> Result<Value> {
        MsgPackReader::new(bytes, ReaderOptions::default()).get_value()
    }

    #[test]
    fn test_fixed_markers() {
        assert_eq!(read(&[0x05]).unwrap(), Value::Int(5));
        assert_eq!(read(&[0xff]).unwrap(), Value::Int(-1));
        assert_eq!(read(&[0xe0]).unwrap(), Value::Int(-32));
        assert!(read(&[0xc0]).unwrap().is_null());
        assert_eq!(read(&[0xc3]).unwrap(), Value::Boolean(true));
        assert_eq!(read(&[0xa2, b'h', b'i']).unwrap(), Value::from("hi"));
    }

    #[test]
    fn test_integer_families() {
        assert_eq!(read(&[0xcc, 0xff]).unwrap(), Value::Int(255));
        assert_eq!(read(&[0xd1, 0x80, 0x00]).unwrap(), Value::Int(-32768));
        assert_eq!(read(&[0xce, 0xff, 0xff, 0xff, 0xff]).unwrap().tag(), Tag::Long);
        let max = read(&[0xcf, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]).unwrap();
        assert_eq!(max.tag(), Tag::BigInt);
        assert_eq!(max.to_string().unwrap(), u64::MAX.to_string());
        let mut min = vec![0xd3];
        min.extend_from_slice(&i64::MIN.to_be_bytes());
        assert_eq!(read(&min).unwrap(), Value::Long(i64::MIN));
    }

    #[test]
    fn test_fixmap_document() {
        // {"a":1,"b":[true,nil,"x"]}
        let bytes = [
            0x82, 0xa1, b'a', 0x01, 0xa1, b'b', 0x93, 0xc3, 0xc0, 0xa1, b'x',
        ];
        let v = read(&bytes).unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.get("a"), Some(&Value::Int(1)));
        assert_eq!(obj.get("b").unwrap().size(), 3);
    }

    #[test]
    fn test_end_tokens_are_synthesized() {
        let mut r = MsgPackReader::new(&[0x92, 0x90, 0x80][..], ReaderOptions::default());
        use Token::*;
        let mut seen = Vec::new();
        loop {
            let t = r.next().unwrap();
            seen.push(t);
            if t == EndInput {
                break;
            }
        }
        assert_eq!(seen, vec![BeginList, BeginList, EndList, BeginObj, EndObj, EndList, EndInput]);
    }

    #[test]
    fn test_fixext_bigint_accepted() {
        // fixext4, type 1, "1234"
        let v = read(&[0xd6, 0x01, b'1', b'2', b'3', b'4']).unwrap();
        assert_eq!(v.tag(), Tag::BigInt);
        assert_eq!(v, Value::Int(1234));
    }

    #[test]
    fn test_bad_input() {
        for bad in [
            vec![0xc1],
            vec![0x81, 0x01, 0x02],
            vec![0x92, 0x01],
            vec![0xa5, b'a'],
            vec![0xd4, 0xff, 0x00],
            vec![0xc7, 0x01, 0x05, b'1'],
            vec![0xa2, 0xff, 0xfe],
        ] {
            assert_eq!(read(&bad).unwrap_err().kind(), ErrorKind::Format, "{bad:x?}");
        }
    }

    #[test]
    fn test_depth_limit() {
        let deep = vec![0x91; 64].into_iter().chain([0xc0]).collect::<Vec<u8>>();
        let mut r = MsgPackReader::new(
            &deep[..],
            ReaderOptions {
                max_depth: 10,
                ..ReaderOptions::default()
            },
        );
        assert_eq!(r.get_value().unwrap_err().kind(), ErrorKind::Format);
        assert_eq!(read(&deep).unwrap().size(), 1);
    }
}
