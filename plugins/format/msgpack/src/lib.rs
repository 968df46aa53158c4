//! MessagePack codec.
//!
//! Standard marker layout. BigInt and BigDecimal, which MessagePack lacks,
//! travel as extension types 1 and 2 wrapping their decimal text.

pub mod reader;
pub mod tag;
pub mod writer;

use std::io::{BufRead, Write};

use aon_api::{ReaderOptions, Writer, WriterOptions};

pub use reader::MsgPackReader;
pub use writer::MsgPackEmitter;

pub fn reader<R: BufRead>(input: R, options: ReaderOptions) -> MsgPackReader<R> {
    MsgPackReader::new(input, options)
}

pub fn writer<W: Write>(sink: W, options: WriterOptions) -> Writer<MsgPackEmitter<W>> {
    Writer::new(MsgPackEmitter::new(sink, &options), options)
}
