use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::config::ReaderOptions;
use crate::error::{CodecError, Result};
use crate::list::List;
use crate::object::Object;
use crate::token::Token;
use crate::value::Value;

/// Pull-style cursor over an encoded value stream.
///
/// Codecs implement the cursor (`next`, `last`, `current`); materializing
/// values, skipping and the coercing getters are shared.
pub trait Reader {
    /// Advance one logical unit and return the token now under the cursor.
    fn next(&mut self) -> Result<Token>;

    /// Token under the cursor, without consuming.
    fn last(&self) -> Token;

    /// Payload of the scalar under the cursor. `Null` when the cursor is on
    /// a structural token.
    fn current(&self) -> &Value;

    /// Number of containers currently open.
    fn depth(&self) -> usize;

    /// Byte offset of the cursor in the input, for error reporting.
    fn offset(&self) -> u64;

    fn options(&self) -> &ReaderOptions;

    /// Release the underlying stream. Valid in any state.
    fn close(&mut self) -> Result<()>;

    /// Materialize the value under the cursor. From `Root`, advances once
    /// first. The cursor is left on the value's last token.
    fn get_value(&mut self) -> Result<Value> {
        if self.last() == Token::Root {
            self.next()?;
        }
        match self.last() {
            Token::BeginList | Token::BeginObj => materialize(self),
            Token::EndInput => Err(CodecError::format(
                self.offset(),
                "no value before end of input",
            )),
            Token::Root | Token::EndList | Token::EndObj => Err(CodecError::sequencing(format!(
                "no value at {}",
                self.last()
            ))),
            _ => Ok(self.current().clone()),
        }
    }

    /// Materialize a list; valid only right after `BeginList`.
    fn get_list(&mut self) -> Result<List> {
        if self.last() != Token::BeginList {
            return Err(CodecError::sequencing(format!("get_list at {}", self.last())));
        }
        match materialize(self)? {
            Value::List(list) => Ok(list),
            other => Err(CodecError::format(
                self.offset(),
                format!("expected list, got {}", other.tag()),
            )),
        }
    }

    /// Materialize an object; valid only right after `BeginObj`.
    fn get_obj(&mut self) -> Result<Object> {
        if self.last() != Token::BeginObj {
            return Err(CodecError::sequencing(format!("get_obj at {}", self.last())));
        }
        match materialize(self)? {
            Value::Object(obj) => Ok(obj),
            other => Err(CodecError::format(
                self.offset(),
                format!("expected object, got {}", other.tag()),
            )),
        }
    }

    /// Discard the value under the cursor without materializing it.
    fn skip(&mut self) -> Result<()> {
        if self.last() == Token::Root {
            self.next()?;
        }
        match self.last() {
            Token::BeginList | Token::BeginObj => {}
            Token::EndList | Token::EndObj | Token::EndInput | Token::Root => {
                return Err(CodecError::sequencing(format!("nothing to skip at {}", self.last())));
            }
            _ => return Ok(()),
        }
        let mut open = 1usize;
        while open > 0 {
            match self.next()? {
                Token::BeginList | Token::BeginObj => open += 1,
                Token::EndList | Token::EndObj => open -= 1,
                Token::EndInput => {
                    return Err(CodecError::format(self.offset(), "unterminated container"));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn get_boolean(&mut self) -> Result<bool> {
        scalar(self, "boolean")?.to_boolean()
    }

    fn get_int(&mut self) -> Result<i32> {
        scalar(self, "int")?.to_int()
    }

    fn get_long(&mut self) -> Result<i64> {
        scalar(self, "long")?.to_long()
    }

    fn get_float(&mut self) -> Result<f32> {
        scalar(self, "float")?.to_float()
    }

    fn get_double(&mut self) -> Result<f64> {
        scalar(self, "double")?.to_double()
    }

    fn get_big_int(&mut self) -> Result<BigInt> {
        scalar(self, "bigint")?.to_big_int()
    }

    fn get_big_decimal(&mut self) -> Result<BigDecimal> {
        scalar(self, "bigdecimal")?.to_big_decimal()
    }

    fn get_string(&mut self) -> Result<String> {
        scalar(self, "string")?.to_string()
    }

    fn get_binary(&mut self) -> Result<Vec<u8>> {
        scalar(self, "binary")?.to_binary()
    }
}

fn scalar<'a, R: Reader + ?Sized>(reader: &'a R, to: &str) -> Result<&'a Value> {
    if reader.last().is_scalar() {
        Ok(reader.current())
    } else {
        Err(CodecError::sequencing(format!("cannot read {to} at {}", reader.last())))
    }
}

enum Frame {
    List(List),
    Object(Object, Option<String>),
}

/// Build the container whose begin token is under the cursor.
///
/// Iterative with an explicit frame stack, so hostile nesting costs heap
/// and hits `max_depth` instead of overflowing the call stack.
fn materialize<R: Reader + ?Sized>(reader: &mut R) -> Result<Value> {
    let max_depth = reader.options().max_depth;
    let mut stack: Vec<Frame> = Vec::new();
    let mut token = reader.last();

    loop {
        if let Some(Frame::Object(_, pending)) = stack.last_mut() {
            if pending.is_none() {
                match token {
                    Token::String => {
                        let key = reader.current().as_str().unwrap_or_default().to_string();
                        *pending = Some(key);
                        token = reader.next()?;
                        continue;
                    }
                    Token::EndObj => {}
                    Token::EndInput => {
                        return Err(CodecError::format(reader.offset(), "unterminated object"));
                    }
                    other => {
                        return Err(CodecError::format(
                            reader.offset(),
                            format!("expected object key, found {other}"),
                        ));
                    }
                }
            }
        }

        let done = match token {
            Token::BeginList | Token::BeginObj => {
                if stack.len() >= max_depth {
                    tracing::warn!(max_depth, offset = reader.offset(), "nesting limit exceeded");
                    return Err(CodecError::format(
                        reader.offset(),
                        format!("nesting deeper than {max_depth}"),
                    ));
                }
                stack.push(if token == Token::BeginList {
                    Frame::List(List::new())
                } else {
                    Frame::Object(Object::new(), None)
                });
                token = reader.next()?;
                continue;
            }
            Token::EndList => match stack.pop() {
                Some(Frame::List(list)) => Value::List(list),
                _ => return Err(CodecError::format(reader.offset(), "unbalanced END_LIST")),
            },
            Token::EndObj => match stack.pop() {
                Some(Frame::Object(obj, None)) => Value::Object(obj),
                Some(Frame::Object(_, Some(key))) => {
                    return Err(CodecError::format(
                        reader.offset(),
                        format!("missing value for key {key:?}"),
                    ));
                }
                _ => return Err(CodecError::format(reader.offset(), "unbalanced END_OBJ")),
            },
            Token::EndInput | Token::Root => {
                return Err(CodecError::format(reader.offset(), "unterminated container"));
            }
            _ => reader.current().clone(),
        };

        match stack.last_mut() {
            None => return Ok(done),
            Some(Frame::List(list)) => list.add(done),
            Some(Frame::Object(obj, pending)) => {
                if let Some(key) = pending.take() {
                    obj.put(key, done);
                }
            }
        }
        token = reader.next()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    /// Replays a fixed token script.
    struct ScriptReader {
        script: Vec<(Token, Value)>,
        pos: Option<usize>,
        depth: usize,
        options: ReaderOptions,
        null: Value,
    }

    impl ScriptReader {
        fn new(script: Vec<(Token, Value)>) -> Self {
            Self {
                script,
                pos: None,
                depth: 0,
                options: ReaderOptions::default(),
                null: Value::Null,
            }
        }
    }

    impl Reader for ScriptReader {
        fn next(&mut self) -> Result<Token> {
            let pos = self.pos.map_or(0, |p| p + 1);
            self.pos = Some(pos.min(self.script.len()));
            let token = self.last();
            match token {
                Token::BeginList | Token::BeginObj => self.depth += 1,
                Token::EndList | Token::EndObj => self.depth = self.depth.saturating_sub(1),
                _ => {}
            }
            Ok(token)
        }

        fn last(&self) -> Token {
            match self.pos {
                None => Token::Root,
                Some(p) => self.script.get(p).map_or(Token::EndInput, |(t, _)| *t),
            }
        }

        fn current(&self) -> &Value {
            self.pos
                .and_then(|p| self.script.get(p))
                .map_or(&self.null, |(_, v)| v)
        }

        fn depth(&self) -> usize {
            self.depth
        }

        fn offset(&self) -> u64 {
            self.pos.unwrap_or(0) as u64
        }

        fn options(&self) -> &ReaderOptions {
            &self.options
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn s(t: Token) -> (Token, Value) {
        (t, Value::Null)
    }

    fn str_tok(v: &str) -> (Token, Value) {
        (Token::String, Value::from(v))
    }

    #[test]
    fn materializes_nested_document() {
        // {"a":1,"b":[true,null,"x"]}
        let mut r = ScriptReader::new(vec![
            s(Token::BeginObj),
            str_tok("a"),
            (Token::Int, Value::Int(1)),
            str_tok("b"),
            s(Token::BeginList),
            (Token::Boolean, Value::Boolean(true)),
            s(Token::Null),
            str_tok("x"),
            s(Token::EndList),
            s(Token::EndObj),
        ]);
        let v = r.get_value().unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj.get("a"), Some(&Value::Int(1)));
        let list = obj.get("b").and_then(Value::as_list).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[2], Value::from("x"));
        assert_eq!(r.last(), Token::EndObj);
        assert_eq!(r.next().unwrap(), Token::EndInput);
    }

    #[test]
    fn empty_object() {
        let mut r = ScriptReader::new(vec![s(Token::BeginObj), s(Token::EndObj)]);
        let v = r.get_value().unwrap();
        assert_eq!(v.size(), 0);
        assert!(v.as_object().is_some());
    }

    #[test]
    fn premature_end_is_unterminated() {
        let mut r = ScriptReader::new(vec![s(Token::BeginList), (Token::Int, Value::Int(1))]);
        let err = r.get_value().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn non_string_key_is_format_error() {
        let mut r = ScriptReader::new(vec![
            s(Token::BeginObj),
            (Token::Int, Value::Int(1)),
            (Token::Int, Value::Int(2)),
            s(Token::EndObj),
        ]);
        assert_eq!(r.get_value().unwrap_err().kind(), ErrorKind::Format);
    }

    #[test]
    fn dangling_key_is_format_error() {
        let mut r = ScriptReader::new(vec![s(Token::BeginObj), str_tok("k"), s(Token::EndObj)]);
        assert_eq!(r.get_value().unwrap_err().kind(), ErrorKind::Format);
    }

    #[test]
    fn depth_limit_is_enforced() {
        let mut script: Vec<_> = (0..10).map(|_| s(Token::BeginList)).collect();
        script.extend((0..10).map(|_| s(Token::EndList)));
        let mut r = ScriptReader::new(script.clone());
        r.options.max_depth = 4;
        assert_eq!(r.get_value().unwrap_err().kind(), ErrorKind::Format);

        let mut r = ScriptReader::new(script);
        r.options.max_depth = 10;
        assert_eq!(r.get_value().unwrap().size(), 1);
    }

    #[test]
    fn getters_check_the_cursor() {
        let mut r = ScriptReader::new(vec![
            s(Token::BeginList),
            str_tok("42"),
            s(Token::EndList),
        ]);
        assert_eq!(r.get_int().unwrap_err().kind(), ErrorKind::Sequencing);
        r.next().unwrap();
        assert_eq!(r.get_int().unwrap_err().kind(), ErrorKind::Sequencing);
        assert_eq!(r.get_obj().unwrap_err().kind(), ErrorKind::Sequencing);
        r.next().unwrap();
        assert_eq!(r.get_int().unwrap(), 42);
        assert_eq!(r.get_long().unwrap(), 42);
        assert_eq!(r.get_string().unwrap(), "42");
        assert_eq!(r.get_boolean().unwrap_err().kind(), ErrorKind::Coercion);
    }

    #[test]
    fn skip_jumps_over_containers() {
        let mut r = ScriptReader::new(vec![
            s(Token::BeginList),
            s(Token::BeginObj),
            str_tok("k"),
            s(Token::BeginList),
            s(Token::EndList),
            s(Token::EndObj),
            (Token::Int, Value::Int(7)),
            s(Token::EndList),
        ]);
        r.next().unwrap();
        r.next().unwrap();
        r.skip().unwrap();
        assert_eq!(r.last(), Token::EndObj);
        assert_eq!(r.next().unwrap(), Token::Int);
        assert_eq!(r.get_int().unwrap(), 7);
    }

    #[test]
    fn get_value_from_root_reads_scalar() {
        let mut r = ScriptReader::new(vec![(Token::Double, Value::Double(2.5))]);
        assert_eq!(r.get_value().unwrap(), Value::Double(2.5));
        assert_eq!(r.next().unwrap(), Token::EndInput);
        assert_eq!(r.get_value().unwrap_err().kind(), ErrorKind::Format);
    }
}
