//! Format-agnostic entry points over the three codecs.
//!
//! Pick a codec at run time by [`DataFormat`] and either move whole values
//! (`encode_to_bytes` / `decode_from_bytes`) or stream a document from any
//! reader into any writer (`transcode`) without building a `Value`.

pub mod config;
pub mod error;

use std::io::{BufRead, Write};

use aon_api::{
    CodecError, Cursor, DataFormat, Emitter, Reader, ReaderOptions, Result, Token, Value, Writer,
    WriterOptions,
};

/// Boxed reader for `format` over `input`.
pub fn open_reader<'a, R: BufRead + 'a>(
    format: DataFormat,
    input: R,
    options: ReaderOptions,
) -> Result<Box<dyn Reader + 'a>> {
    Ok(match format {
        DataFormat::Json => Box::new(format_json::reader(input, options)?),
        DataFormat::Aon => Box::new(format_aon::reader(input, options)),
        DataFormat::MsgPack => Box::new(format_msgpack::reader(input, options)),
    })
}

/// Encode a single value as one complete document.
pub fn encode_to_bytes(
    format: DataFormat,
    value: &Value,
    options: &WriterOptions,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let options = options.clone();
    match format {
        DataFormat::Json => write_value(format_json::writer(&mut out, options), value)?,
        DataFormat::Aon => write_value(format_aon::writer(&mut out, options), value)?,
        DataFormat::MsgPack => write_value(format_msgpack::writer(&mut out, options), value)?,
    }
    Ok(out)
}

/// Decode the first value in `bytes`.
pub fn decode_from_bytes(
    format: DataFormat,
    bytes: &[u8],
    options: &ReaderOptions,
) -> Result<Value> {
    let mut reader = open_reader(format, bytes, options.clone())?;
    let value = reader.get_value()?;
    reader.close()?;
    Ok(value)
}

/// Stream the next document of `reader` into a fresh `to` writer over
/// `sink`. Returns the sink once everything is flushed.
pub fn transcode<W: Write>(
    reader: &mut dyn Reader,
    to: DataFormat,
    sink: W,
    options: WriterOptions,
) -> Result<W> {
    Ok(match to {
        DataFormat::Json => finish(reader, format_json::writer(sink, options))?.into_inner(),
        DataFormat::Aon => finish(reader, format_aon::writer(sink, options))?.into_inner(),
        DataFormat::MsgPack => finish(reader, format_msgpack::writer(sink, options))?.into_inner(),
    })
}

/// Stream every remaining document of `reader` into `sink`, one writer per
/// document. JSON documents are separated by newlines; binary formats are
/// self-delimiting and simply concatenated. Returns the sink and the number
/// of documents copied.
pub fn transcode_all<W: Write>(
    reader: &mut dyn Reader,
    to: DataFormat,
    mut sink: W,
    options: WriterOptions,
) -> Result<(W, usize)> {
    let mut count = 0;
    loop {
        let opts = options.clone();
        let copied = match to {
            DataFormat::Json => copy_document(reader, format_json::writer(&mut sink, opts))?,
            DataFormat::Aon => copy_document(reader, format_aon::writer(&mut sink, opts))?,
            DataFormat::MsgPack => copy_document(reader, format_msgpack::writer(&mut sink, opts))?,
        };
        if !copied {
            break;
        }
        count += 1;
        if to.is_text() {
            sink.write_all(b"\n")?;
        }
    }
    tracing::debug!(documents = count, format = %to, "transcode finished");
    Ok((sink, count))
}

fn write_value<E: Emitter>(mut writer: Writer<E>, value: &Value) -> Result<()> {
    writer.value(value)?;
    writer.close()
}

fn finish<E: Emitter>(reader: &mut dyn Reader, mut writer: Writer<E>) -> Result<E> {
    if !pump(reader, &mut writer)? {
        return Err(CodecError::format(reader.offset(), "no document before end of input"));
    }
    writer.close()?;
    Ok(writer.into_inner())
}

fn copy_document<E: Emitter>(reader: &mut dyn Reader, mut writer: Writer<E>) -> Result<bool> {
    if !pump(reader, &mut writer)? {
        return Ok(false);
    }
    writer.close()?;
    Ok(true)
}

/// Copy tokens until the top-level value is complete. `false` means the
/// input ended cleanly before the document started. Inside an object a
/// string arriving while no key is pending is the member name.
fn pump<E: Emitter>(reader: &mut dyn Reader, writer: &mut Writer<E>) -> Result<bool> {
    let mut open: Vec<bool> = Vec::new();
    loop {
        let token = reader.next()?;
        let in_obj = open.last().copied().unwrap_or(false);
        match token {
            Token::EndInput if open.is_empty() && writer.cursor() == Cursor::Init => {
                return Ok(false);
            }
            Token::EndInput => {
                return Err(CodecError::format(reader.offset(), "unterminated container"));
            }
            Token::Root => return Err(CodecError::sequencing("reader returned to root")),
            Token::BeginList => {
                writer.begin_list()?;
                open.push(false);
            }
            Token::BeginObj => {
                writer.begin_obj()?;
                open.push(true);
            }
            Token::EndList => {
                open.pop();
                writer.end_list()?;
            }
            Token::EndObj => {
                open.pop();
                writer.end_obj()?;
            }
            Token::String if in_obj && writer.cursor() != Cursor::Key => {
                let key = reader
                    .current()
                    .as_str()
                    .ok_or_else(|| {
                        CodecError::format(reader.offset(), "object key is not a string")
                    })?
                    .to_owned();
                writer.key(&key)?;
            }
            _ => {
                writer.value(reader.current())?;
            }
        }
        if writer.cursor() == Cursor::Done {
            tracing::trace!(offset = reader.offset(), "document copied");
            return Ok(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aon_api::{ErrorKind, List, Object};

    fn sample() -> Value {
        let mut inner = List::new();
        inner.add(true);
        inner.add(Value::Null);
        inner.add("x");
        let mut obj = Object::new();
        obj.put("a", 1);
        obj.put("b", inner);
        obj.put("blob", Value::binary(&[0, 1, 2, 255]));
        Value::from(obj)
    }

    fn encode(format: DataFormat, value: &Value) -> Vec<u8> {
        encode_to_bytes(format, value, &WriterOptions::default()).unwrap()
    }

    fn open(format: DataFormat, input: &[u8]) -> Box<dyn Reader + '_> {
        open_reader(format, input, ReaderOptions::default()).unwrap()
    }

    fn copy(reader: &mut dyn Reader, to: DataFormat) -> Result<Vec<u8>> {
        transcode(reader, to, Vec::new(), WriterOptions::default())
    }

    fn copy_all(reader: &mut dyn Reader, to: DataFormat) -> (Vec<u8>, usize) {
        transcode_all(reader, to, Vec::new(), WriterOptions::default()).unwrap()
    }

    #[test]
    fn every_format_round_trips() {
        for format in DataFormat::ALL {
            let bytes = encode(format, &sample());
            let back = decode_from_bytes(format, &bytes, &ReaderOptions::default()).unwrap();
            if format == DataFormat::Json {
                // binary comes back as its Base64 text
                let obj = back.as_object().unwrap();
                assert_eq!(obj.get("blob").unwrap().to_binary().unwrap(), vec![0, 1, 2, 255]);
                assert_eq!(obj.get("b"), sample().as_object().unwrap().get("b"));
            } else {
                assert_eq!(back, sample(), "{format}");
            }
        }
    }

    #[test]
    fn transcode_matches_direct_encoding() {
        let value = sample();
        for from in [DataFormat::Aon, DataFormat::MsgPack] {
            let input = encode(from, &value);
            for to in DataFormat::ALL {
                let mut reader = open(from, &input);
                let out = copy(reader.as_mut(), to).unwrap();
                assert_eq!(out, encode(to, &value), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn transcode_keeps_key_strings_apart_from_values() {
        let input = br#"{"k":"v","list":["a",{"x":"y"}]}"#;
        let mut reader = open(DataFormat::Json, input);
        let out = copy(reader.as_mut(), DataFormat::Json).unwrap();
        assert_eq!(out, input.to_vec());
    }

    #[test]
    fn transcode_reads_one_document_at_a_time() {
        let mut reader = open(DataFormat::Json, b"1 [2] {}");
        let mut docs = Vec::new();
        for _ in 0..3 {
            docs.push(copy(reader.as_mut(), DataFormat::Json).unwrap());
        }
        assert_eq!(docs, [b"1".to_vec(), b"[2]".to_vec(), b"{}".to_vec()]);
        let err = copy(reader.as_mut(), DataFormat::Json).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn transcode_all_separates_json_documents() {
        let mut stream = encode(DataFormat::Aon, &Value::Int(1));
        stream.extend(encode(DataFormat::Aon, &sample()));
        let mut reader = open(DataFormat::Aon, &stream);
        let (out, count) = copy_all(reader.as_mut(), DataFormat::Json);
        assert_eq!(count, 2);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "1");
        assert!(lines[1].starts_with(r#"{"a":1,"b":[true,null,"x"]"#));
    }

    #[test]
    fn transcode_all_on_empty_input_copies_nothing() {
        let mut reader = open(DataFormat::MsgPack, b"");
        let (out, count) = copy_all(reader.as_mut(), DataFormat::Aon);
        assert_eq!(count, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn truncated_input_fails() {
        let mut reader = open(DataFormat::Json, b"[1, 2");
        let err = copy(reader.as_mut(), DataFormat::Aon).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
