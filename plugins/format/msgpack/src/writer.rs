use std::io::Write;

use aon_api::convert::plain_decimal;
use aon_api::{BigDecimal, BigInt, CodecError, Emitter, PatchBuffer, Result, WriterOptions};

use crate::tag;

/// Open container: where its count field lives and how many children
/// (entries, for maps) it has received.
#[derive(Debug)]
struct Frame {
    count_at: u64,
    count: u32,
    is_map: bool,
}

/// MessagePack emitter.
///
/// Counts are unknown until a container closes, so every container reserves
/// a 32-bit count (`array32` / `map32`) that is patched on close. Output
/// reaches the sink only while no container is open.
pub struct MsgPackEmitter<W: Write> {
    out: PatchBuffer<W>,
    frames: Vec<Frame>,
}

impl<W: Write> MsgPackEmitter<W> {
    pub fn new(sink: W, options: &WriterOptions) -> Self {
        Self {
            out: PatchBuffer::new(sink, options.flush_threshold),
            frames: Vec::new(),
        }
    }

    pub fn get_ref(&self) -> &W {
        self.out.get_ref()
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    /// Count a new child of the enclosing list. Map children are counted
    /// per key.
    fn child(&mut self) -> Result<()> {
        if let Some(frame) = self.frames.last_mut() {
            if !frame.is_map {
                frame.count = frame.count.checked_add(1).ok_or_else(|| {
                    CodecError::format(frame.count_at, "list exceeds 2^32 elements")
                })?;
            }
        }
        Ok(())
    }

    fn begin(&mut self, marker: u8, is_map: bool) -> Result<()> {
        self.child()?;
        self.out.put_u8(marker);
        let count_at = self.out.offset();
        self.out.put(&[0; 4]);
        self.frames.push(Frame {
            count_at,
            count: 0,
            is_map,
        });
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| CodecError::sequencing("container end without begin"))?;
        self.out.patch(frame.count_at, &frame.count.to_be_bytes())
    }

    fn integer(&mut self, n: i64) {
        match n {
            0..=0x7f => self.out.put_u8(n as u8),
            -32..=-1 => self.out.put_u8(n as i8 as u8),
            0x80..=0xff => {
                self.out.put_u8(tag::UINT8);
                self.out.put_u8(n as u8);
            }
            0x100..=0xffff => {
                self.out.put_u8(tag::UINT16);
                self.out.put(&(n as u16).to_be_bytes());
            }
            0x1_0000..=0xffff_ffff => {
                self.out.put_u8(tag::UINT32);
                self.out.put(&(n as u32).to_be_bytes());
            }
            n if n > 0 => {
                self.out.put_u8(tag::UINT64);
                self.out.put(&(n as u64).to_be_bytes());
            }
            -128..=-33 => {
                self.out.put_u8(tag::INT8);
                self.out.put(&(n as i8).to_be_bytes());
            }
            -32768..=-129 => {
                self.out.put_u8(tag::INT16);
                self.out.put(&(n as i16).to_be_bytes());
            }
            -2_147_483_648..=-32769 => {
                self.out.put_u8(tag::INT32);
                self.out.put(&(n as i32).to_be_bytes());
            }
            _ => {
                self.out.put_u8(tag::INT64);
                self.out.put(&n.to_be_bytes());
            }
        }
    }

    /// Marker and length field for a member of the 8/16/32-bit family
    /// starting at `family`.
    fn length(&mut self, family: u8, len: usize) -> Result<()> {
        if let Ok(n) = u8::try_from(len) {
            self.out.put_u8(family);
            self.out.put_u8(n);
        } else if let Ok(n) = u16::try_from(len) {
            self.out.put_u8(family + 1);
            self.out.put(&n.to_be_bytes());
        } else if let Ok(n) = u32::try_from(len) {
            self.out.put_u8(family + 2);
            self.out.put(&n.to_be_bytes());
        } else {
            return Err(CodecError::format(
                self.out.offset(),
                format!("payload of {len} bytes does not fit a 32-bit length"),
            ));
        }
        Ok(())
    }

    fn str(&mut self, s: &str) -> Result<()> {
        match u8::try_from(s.len()) {
            Ok(n) if n <= 31 => self.out.put_u8(tag::FIXSTR | n),
            _ => self.length(tag::STR8, s.len())?,
        }
        self.out.put(s.as_bytes());
        Ok(())
    }

    fn extension(&mut self, ext_type: i8, payload: &[u8]) -> Result<()> {
        self.length(tag::EXT8, payload.len())?;
        self.out.put(&ext_type.to_be_bytes());
        self.out.put(payload);
        Ok(())
    }
}

impl<W: Write> Emitter for MsgPackEmitter<W> {
    fn write_begin_list(&mut self) -> Result<()> {
        self.begin(tag::ARRAY32, false)
    }

    fn write_end_list(&mut self) -> Result<()> {
        self.end()
    }

    fn write_begin_obj(&mut self) -> Result<()> {
        self.begin(tag::MAP32, true)
    }

    fn write_end_obj(&mut self) -> Result<()> {
        self.end()
    }

    fn write_key(&mut self, key: &str) -> Result<()> {
        if let Some(frame) = self.frames.last_mut() {
            frame.count = frame
                .count
                .checked_add(1)
                .ok_or_else(|| CodecError::format(frame.count_at, "map exceeds 2^32 entries"))?;
        }
        self.str(key)
    }

    fn write_null(&mut self) -> Result<()> {
        self.child()?;
        self.out.put_u8(tag::NIL);
        Ok(())
    }

    fn write_boolean(&mut self, b: bool) -> Result<()> {
        self.child()?;
        self.out.put_u8(if b { tag::TRUE } else { tag::FALSE });
        Ok(())
    }

    fn write_int(&mut self, i: i32) -> Result<()> {
        self.child()?;
        self.integer(i64::from(i));
        Ok(())
    }

    fn write_long(&mut self, l: i64) -> Result<()> {
        self.child()?;
        self.integer(l);
        Ok(())
    }

    fn write_float(&mut self, f: f32) -> Result<()> {
        self.child()?;
        self.out.put_u8(tag::FLOAT32);
        self.out.put(&f.to_be_bytes());
        Ok(())
    }

    fn write_double(&mut self, d: f64) -> Result<()> {
        self.child()?;
        self.out.put_u8(tag::FLOAT64);
        self.out.put(&d.to_be_bytes());
        Ok(())
    }

    fn write_big_int(&mut self, n: &BigInt) -> Result<()> {
        self.child()?;
        self.extension(tag::EXT_BIG_INT, n.to_string().as_bytes())
    }

    fn write_big_decimal(&mut self, d: &BigDecimal) -> Result<()> {
        self.child()?;
        self.extension(tag::EXT_BIG_DECIMAL, plain_decimal(d).as_bytes())
    }

    fn write_binary(&mut self, b: &[u8]) -> Result<()> {
        self.child()?;
        self.length(tag::BIN8, b.len())?;
        self.out.put(b);
        Ok(())
    }

    fn write_string(&mut self, s: &str) -> Result<()> {
        self.child()?;
        self.str(s)
    }

    fn checkpoint(&mut self, depth: usize) -> Result<()> {
        if depth == 0 {
            self.out.flush_if_needed()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()
    }
}
