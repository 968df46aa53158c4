use std::io::Write;

use crate::error::{CodecError, Result};

/// Growable output buffer in front of a sink.
///
/// Bytes are appended and may be overwritten at an absolute stream offset
/// until they are flushed. Flushing hands everything buffered to the sink;
/// offsets before the flushed mark can no longer be patched.
pub struct PatchBuffer<W: Write> {
    sink: W,
    buf: Vec<u8>,
    /// Stream offset of `buf[0]`.
    flushed: u64,
    threshold: usize,
}

impl<W: Write> PatchBuffer<W> {
    pub fn new(sink: W, threshold: usize) -> Self {
        Self {
            sink,
            buf: Vec::with_capacity(threshold.min(64 * 1024)),
            flushed: 0,
            threshold,
        }
    }

    /// Absolute stream offset of the next appended byte.
    pub fn offset(&self) -> u64 {
        self.flushed + self.buf.len() as u64
    }

    pub fn put_u8(&mut self, b: u8) {
        self.buf.push(b);
    }

    pub fn put(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Overwrite already-appended bytes starting at stream offset `at`.
    pub fn patch(&mut self, at: u64, bytes: &[u8]) -> Result<()> {
        let start = at
            .checked_sub(self.flushed)
            .and_then(|rel| usize::try_from(rel).ok())
            .ok_or_else(|| CodecError::sequencing(format!("offset {at} already flushed")))?;
        let end = start + bytes.len();
        let target = self.buf.get_mut(start..end).ok_or_else(|| {
            let stop = at + bytes.len() as u64;
            CodecError::sequencing(format!("patch {at}..{stop} past end of buffer"))
        })?;
        target.copy_from_slice(bytes);
        Ok(())
    }

    /// Bytes not yet handed to the sink.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    /// Flush once the buffer has grown past the threshold.
    pub fn flush_if_needed(&mut self) -> Result<()> {
        if self.buf.len() >= self.threshold {
            self.drain()?;
        }
        Ok(())
    }

    /// Hand every buffered byte to the sink and flush it.
    pub fn flush(&mut self) -> Result<()> {
        self.drain()?;
        self.sink.flush()?;
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// The sink. Call `flush` first; unflushed bytes are dropped.
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn drain(&mut self) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        self.sink.write_all(&self.buf)?;
        tracing::trace!(bytes = self.buf.len(), offset = self.flushed, "flushed output buffer");
        self.flushed += self.buf.len() as u64;
        self.buf.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn patch_overwrites_in_place() {
        let mut out = Vec::new();
        let mut buf = PatchBuffer::new(&mut out, 1024);
        buf.put_u8(0xdd);
        let at = buf.offset();
        buf.put(&[0, 0, 0, 0]);
        buf.put_u8(0xc0);
        buf.patch(at, &3u32.to_be_bytes()).unwrap();
        buf.flush().unwrap();
        drop(buf);
        assert_eq!(out, [0xdd, 0, 0, 0, 3, 0xc0]);
    }

    #[test]
    fn threshold_triggers_flush() {
        let mut out = Vec::new();
        let mut buf = PatchBuffer::new(&mut out, 4);
        buf.put(b"abc");
        buf.flush_if_needed().unwrap();
        assert_eq!(buf.pending(), b"abc");
        buf.put_u8(b'd');
        buf.flush_if_needed().unwrap();
        assert!(buf.pending().is_empty());
        assert_eq!(buf.offset(), 4);
        assert_eq!(buf.get_ref().as_slice(), b"abcd");
    }

    #[test]
    fn flushed_bytes_cannot_be_patched() {
        let mut buf = PatchBuffer::new(Vec::new(), 1);
        buf.put(b"xy");
        buf.flush_if_needed().unwrap();
        let err = buf.patch(0, b"z").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Sequencing);
        buf.put(b"q");
        assert!(buf.patch(2, b"rr").is_err());
        assert!(buf.patch(2, b"r").is_ok());
        buf.flush().unwrap();
        assert_eq!(buf.into_inner(), b"xyr");
    }
}
