//! JSON codec.
//!
//! Standard JSON text extended with two conventions so every value of the
//! data model survives a round trip: non-finite numbers travel as
//! `\u001B`-prefixed sentinel strings and binary as Base64 strings.

mod number;
pub mod reader;
pub mod writer;
pub mod zip;

use std::io::{BufRead, Write};

use aon_api::{ReaderOptions, Result, Writer, WriterOptions};

pub use reader::JsonReader;
pub use writer::JsonEmitter;

/// Reader over `input`, unwrapping a ZIP archive first when
/// `options.detect_zip` is set.
pub fn reader<'a, R: BufRead + 'a>(
    input: R,
    options: ReaderOptions,
) -> Result<JsonReader<Box<dyn BufRead + 'a>>> {
    let input: Box<dyn BufRead + 'a> = if options.detect_zip {
        zip::unwrap(input)?
    } else {
        Box::new(input)
    };
    Ok(JsonReader::new(input, options))
}

pub fn writer<W: Write>(sink: W, options: WriterOptions) -> Writer<JsonEmitter<W>> {
    Writer::new(JsonEmitter::new(sink, &options), options)
}
