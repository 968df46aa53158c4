use std::io::{self, BufWriter, Write};

use aon_api::{Reader, Token, Value};
use aon_convert::error::ConvertError;
use aon_convert::open_reader;

use crate::cli::{InspectArgs, effective};

pub fn run(args: InspectArgs) -> Result<(), ConvertError> {
    let cfg = effective(&args.read)?;
    let input = super::open_input(args.input.as_deref())?;
    let mut reader = open_reader(args.format, input, cfg.reader)?;
    let mut out = BufWriter::new(io::stdout().lock());
    dump(reader.as_mut(), &mut out)?;
    out.flush()?;
    reader.close()?;
    Ok(())
}

struct Frame {
    is_obj: bool,
    key_next: bool,
}

/// Write one line per token, indented two spaces per level. Member names
/// are shown as `KEY`.
fn dump(reader: &mut dyn Reader, out: &mut impl Write) -> Result<(), ConvertError> {
    let mut open: Vec<Frame> = Vec::new();
    loop {
        let token = reader.next()?;
        if token == Token::EndInput {
            writeln!(out, "{token}")?;
            return Ok(());
        }
        if token.is_end() {
            open.pop();
        }
        let pad = "  ".repeat(open.len());
        let is_key = token == Token::String && open.last().is_some_and(|f| f.is_obj && f.key_next);
        if is_key {
            writeln!(out, "{pad}KEY {}", render(reader.current()))?;
        } else if token.is_scalar() {
            writeln!(out, "{pad}{token} {}", render(reader.current()))?;
        } else {
            writeln!(out, "{pad}{token}")?;
        }

        if let Some(parent) = open.last_mut().filter(|f| f.is_obj) {
            parent.key_next = !is_key;
        }
        if token.is_begin() {
            open.push(Frame {
                is_obj: token == Token::BeginObj,
                key_next: true,
            });
        }
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::String(s) => format!("{:?}", &**s),
        other => other.to_string().unwrap_or_else(|_| other.tag().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aon_api::{DataFormat, ReaderOptions};

    fn inspect(json: &str) -> String {
        let mut reader =
            open_reader(DataFormat::Json, json.as_bytes(), ReaderOptions::default()).unwrap();
        let mut out = Vec::new();
        dump(reader.as_mut(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn nested_document_is_indented() {
        let text = inspect(r#"{"a":1,"b":[true,null,"x"],"c":{"d":"e"}}"#);
        let expected = "\
BEGIN_OBJ
  KEY \"a\"
  INT 1
  KEY \"b\"
  BEGIN_LIST
    BOOLEAN true
    NULL null
    STRING \"x\"
  END_LIST
  KEY \"c\"
  BEGIN_OBJ
    KEY \"d\"
    STRING \"e\"
  END_OBJ
END_OBJ
END_INPUT
";
        assert_eq!(text, expected);
    }

    #[test]
    fn string_values_are_not_keys() {
        let text = inspect(r#"{"k":"v","l":"w"}"#);
        let keys = text.lines().filter(|l| l.trim_start().starts_with("KEY")).count();
        assert_eq!(keys, 2);
        assert!(text.contains("  STRING \"v\"\n"));
    }
}
