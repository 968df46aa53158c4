//! Transparent unwrapping of ZIP-compressed input.
//!
//! Only the first entry of the archive is read, straight from its local
//! file header, so the input never has to be seekable.

use std::io::{BufRead, BufReader, Cursor, Read};

use aon_api::{CodecError, Result};
use flate2::read::DeflateDecoder;

pub const LOCAL_HEADER_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATED: u16 = 8;
const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;

/// Local file header fields after the signature.
struct LocalHeader {
    flags: u16,
    method: u16,
    compressed_size: u32,
    name: String,
}

/// Return `input` unchanged, or the decompressed first entry when it starts
/// with a ZIP local file header.
pub fn unwrap<'a, R: BufRead + 'a>(mut input: R) -> Result<Box<dyn BufRead + 'a>> {
    let mut head = Vec::with_capacity(LOCAL_HEADER_MAGIC.len());
    (&mut input)
        .take(LOCAL_HEADER_MAGIC.len() as u64)
        .read_to_end(&mut head)?;

    if head != LOCAL_HEADER_MAGIC {
        return Ok(Box::new(Cursor::new(head).chain(input)));
    }

    let header = read_local_header(&mut input)?;
    tracing::debug!(
        entry = %header.name,
        method = header.method,
        size = header.compressed_size,
        "zip input detected"
    );

    let streamed = header.flags & FLAG_DATA_DESCRIPTOR != 0;
    let limit = if streamed {
        u64::MAX
    } else {
        u64::from(header.compressed_size)
    };

    match header.method {
        METHOD_STORED if streamed => Err(CodecError::format(
            4,
            "stored zip entry without size cannot be streamed",
        )),
        METHOD_STORED => Ok(Box::new(input.take(limit))),
        METHOD_DEFLATED => Ok(Box::new(BufReader::new(DeflateDecoder::new(input.take(limit))))),
        other => Err(CodecError::format(4, format!("unsupported zip compression method {other}"))),
    }
}

fn read_local_header<R: Read>(input: &mut R) -> Result<LocalHeader> {
    let mut fixed = [0u8; 26];
    input
        .read_exact(&mut fixed)
        .map_err(|_| CodecError::format(4, "truncated zip local file header"))?;

    let u16_at = |i: usize| u16::from_le_bytes([fixed[i], fixed[i + 1]]);
    let u32_at =
        |i: usize| u32::from_le_bytes([fixed[i], fixed[i + 1], fixed[i + 2], fixed[i + 3]]);

    let flags = u16_at(2);
    let method = u16_at(4);
    let compressed_size = u32_at(14);
    let name_len = usize::from(u16_at(22));
    let extra_len = usize::from(u16_at(24));

    let mut variable = vec![0u8; name_len + extra_len];
    input
        .read_exact(&mut variable)
        .map_err(|_| CodecError::format(30, "truncated zip entry name"))?;
    let name = String::from_utf8_lossy(&variable[..name_len]).into_owned();

    Ok(LocalHeader {
        flags,
        method,
        compressed_size,
        name,
    })
}
