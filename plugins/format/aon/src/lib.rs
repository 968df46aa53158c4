//! Aon tagged binary codec.
//!
//! Each value is an ASCII tag byte plus an optional payload. Containers are
//! bracketed by start and end tags with no counts, so both directions stream
//! in a single pass.

pub mod reader;
pub mod tag;
pub mod writer;

use std::io::{BufRead, Write};

use aon_api::{ReaderOptions, Writer, WriterOptions};

pub use reader::AonReader;
pub use writer::AonEmitter;

pub fn reader<R: BufRead>(input: R, options: ReaderOptions) -> AonReader<R> {
    AonReader::new(input, options)
}

pub fn writer<W: Write>(sink: W, options: WriterOptions) -> Writer<AonEmitter<W>> {
    Writer::new(AonEmitter::new(sink, &options), options)
}
