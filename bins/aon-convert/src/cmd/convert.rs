use std::fs::File;
use std::io::{self, BufWriter, Write};

use aon_convert::error::ConvertError;
use aon_convert::{open_reader, transcode, transcode_all};

use crate::cli::{ConvertArgs, effective};

pub fn run(args: ConvertArgs) -> Result<(), ConvertError> {
    let mut cfg = effective(&args.read)?;
    if args.pretty {
        cfg.writer.pretty = true;
    }
    if let Some(indent) = args.indent {
        cfg.writer.indent = indent;
    }

    let input = super::open_input(args.input.as_deref())?;
    let sink: Box<dyn Write> = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| ConvertError::Config(format!("cannot create output {path}: {e}")))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    tracing::debug!(from = %args.from, to = %args.to, all = args.all, "converting");
    let mut reader = open_reader(args.from, input, cfg.reader)?;
    let mut sink = if args.all {
        let (sink, count) = transcode_all(reader.as_mut(), args.to, sink, cfg.writer)?;
        tracing::info!(documents = count, "converted");
        sink
    } else {
        let mut sink = transcode(reader.as_mut(), args.to, sink, cfg.writer)?;
        if args.to.is_text() {
            sink.write_all(b"\n")?;
        }
        sink
    };
    sink.flush()?;
    reader.close()?;
    Ok(())
}
