use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::config::WriterOptions;
use crate::error::{CodecError, Result};
use crate::value::Value;

/// Primitive emission hooks of one wire format.
///
/// `Writer` owns the sequencing rules and calls these in a valid order.
/// Separators and layout default to no-ops for formats that have none.
pub trait Emitter {
    fn write_begin_list(&mut self) -> Result<()>;
    fn write_end_list(&mut self) -> Result<()>;
    fn write_begin_obj(&mut self) -> Result<()>;
    fn write_end_obj(&mut self) -> Result<()>;
    fn write_key(&mut self, key: &str) -> Result<()>;

    fn write_key_value_separator(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_separator(&mut self) -> Result<()> {
        Ok(())
    }

    /// Line break before a container member or closing bracket.
    fn write_newline_indent(&mut self, _depth: usize, _indent: usize) -> Result<()> {
        Ok(())
    }

    fn write_null(&mut self) -> Result<()>;
    fn write_boolean(&mut self, b: bool) -> Result<()>;
    fn write_int(&mut self, i: i32) -> Result<()>;
    fn write_long(&mut self, l: i64) -> Result<()>;
    fn write_float(&mut self, f: f32) -> Result<()>;
    fn write_double(&mut self, d: f64) -> Result<()>;
    fn write_big_int(&mut self, n: &BigInt) -> Result<()>;
    fn write_big_decimal(&mut self, d: &BigDecimal) -> Result<()>;
    fn write_binary(&mut self, b: &[u8]) -> Result<()>;
    fn write_string(&mut self, s: &str) -> Result<()>;

    /// Called after every complete value with the remaining depth. Emitters
    /// decide here whether buffered output may go to the sink.
    fn checkpoint(&mut self, _depth: usize) -> Result<()> {
        Ok(())
    }

    /// Push everything buffered to the sink.
    fn flush(&mut self) -> Result<()>;
}

/// Where the writer stands in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// Nothing written yet.
    Init,
    /// Top-level value complete.
    Done,
    /// A container just closed inside its parent.
    End,
    /// A member value just completed.
    Val,
    /// A list just opened.
    List,
    /// An object just opened.
    Obj,
    /// A key was written; its value is due.
    Key,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    List,
    Obj,
}

/// Push-style writer enforcing a well-formed call sequence on top of an
/// `Emitter`.
pub struct Writer<E: Emitter> {
    emitter: E,
    options: WriterOptions,
    cursor: Cursor,
    stack: Vec<Container>,
    closed: bool,
}

impl<E: Emitter> std::fmt::Debug for Writer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("options", &self.options)
            .field("cursor", &self.cursor)
            .field("stack", &self.stack)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl<E: Emitter> Writer<E> {
    pub fn new(emitter: E, options: WriterOptions) -> Self {
        Self {
            emitter,
            options,
            cursor: Cursor::Init,
            stack: Vec::new(),
            closed: false,
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    /// The emitter, with whatever it has not flushed yet.
    pub fn into_inner(self) -> E {
        self.emitter
    }

    // ---- Containers ----

    pub fn begin_list(&mut self) -> Result<&mut Self> {
        self.before_value()?;
        self.emitter.write_begin_list()?;
        self.stack.push(Container::List);
        self.cursor = Cursor::List;
        Ok(self)
    }

    pub fn begin_obj(&mut self) -> Result<&mut Self> {
        self.before_value()?;
        self.emitter.write_begin_obj()?;
        self.stack.push(Container::Obj);
        self.cursor = Cursor::Obj;
        Ok(self)
    }

    pub fn end_list(&mut self) -> Result<&mut Self> {
        self.ensure_open()?;
        let top = self.stack.last().copied();
        match (top, self.cursor) {
            (Some(Container::List), Cursor::List) => {}
            (Some(Container::List), _) => self.newline(self.stack.len() - 1)?,
            (Some(Container::Obj), _) => {
                return Err(CodecError::sequencing("end_list inside an object"));
            }
            (None, _) => return Err(CodecError::sequencing("end_list without open list")),
        }
        self.stack.pop();
        self.emitter.write_end_list()?;
        self.after_value(Cursor::End)?;
        Ok(self)
    }

    pub fn end_obj(&mut self) -> Result<&mut Self> {
        self.ensure_open()?;
        let top = self.stack.last().copied();
        match (top, self.cursor) {
            (Some(Container::Obj), Cursor::Key) => {
                return Err(CodecError::sequencing("end_obj while a key awaits its value"));
            }
            (Some(Container::Obj), Cursor::Obj) => {}
            (Some(Container::Obj), _) => self.newline(self.stack.len() - 1)?,
            (Some(Container::List), _) => {
                return Err(CodecError::sequencing("end_obj inside a list"));
            }
            (None, _) => return Err(CodecError::sequencing("end_obj without open object")),
        }
        self.stack.pop();
        self.emitter.write_end_obj()?;
        self.after_value(Cursor::End)?;
        Ok(self)
    }

    pub fn key(&mut self, name: &str) -> Result<&mut Self> {
        self.ensure_open()?;
        if self.stack.last() != Some(&Container::Obj) {
            return Err(CodecError::sequencing(format!("key {name:?} outside an object")));
        }
        match self.cursor {
            Cursor::Obj => {}
            Cursor::Val | Cursor::End => self.emitter.write_separator()?,
            Cursor::Key => return Err(CodecError::sequencing(format!("key {name:?} after a key"))),
            other => return Err(CodecError::sequencing(format!("key {name:?} at {other:?}"))),
        }
        self.newline(self.stack.len())?;
        self.emitter.write_key(name)?;
        self.emitter.write_key_value_separator()?;
        self.cursor = Cursor::Key;
        Ok(self)
    }

    // ---- Scalars ----

    pub fn null(&mut self) -> Result<&mut Self> {
        self.scalar(|e| e.write_null())
    }

    pub fn boolean(&mut self, b: bool) -> Result<&mut Self> {
        self.scalar(|e| e.write_boolean(b))
    }

    pub fn int(&mut self, i: i32) -> Result<&mut Self> {
        self.scalar(|e| e.write_int(i))
    }

    pub fn long(&mut self, l: i64) -> Result<&mut Self> {
        self.scalar(|e| e.write_long(l))
    }

    pub fn float(&mut self, f: f32) -> Result<&mut Self> {
        self.scalar(|e| e.write_float(f))
    }

    pub fn double(&mut self, d: f64) -> Result<&mut Self> {
        self.scalar(|e| e.write_double(d))
    }

    pub fn big_int(&mut self, n: &BigInt) -> Result<&mut Self> {
        self.scalar(|e| e.write_big_int(n))
    }

    pub fn big_decimal(&mut self, d: &BigDecimal) -> Result<&mut Self> {
        self.scalar(|e| e.write_big_decimal(d))
    }

    pub fn binary(&mut self, b: &[u8]) -> Result<&mut Self> {
        self.scalar(|e| e.write_binary(b))
    }

    pub fn string(&mut self, s: &str) -> Result<&mut Self> {
        self.scalar(|e| e.write_string(s))
    }

    /// Write any value, recursing into containers in iteration order.
    pub fn value(&mut self, value: &Value) -> Result<&mut Self> {
        match value {
            Value::Null => self.null(),
            Value::Boolean(b) => self.boolean(*b),
            Value::Int(i) => self.int(*i),
            Value::Long(l) => self.long(*l),
            Value::Float(f) => self.float(*f),
            Value::Double(d) => self.double(*d),
            Value::BigInt(n) => self.big_int(n),
            Value::BigDecimal(d) => self.big_decimal(d),
            Value::Binary(b) => self.binary(b),
            Value::String(s) => self.string(s),
            Value::List(list) => {
                self.begin_list()?;
                for item in list {
                    self.value(item)?;
                }
                self.end_list()
            }
            Value::Object(obj) => {
                self.begin_obj()?;
                for (k, v) in obj {
                    self.key(k)?;
                    self.value(v)?;
                }
                self.end_obj()
            }
        }
    }

    /// Finish the document and flush to the sink. Every container must be
    /// closed.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        if !self.stack.is_empty() {
            return Err(CodecError::sequencing(format!(
                "close with {} open container(s)",
                self.stack.len()
            )));
        }
        self.emitter.flush()?;
        self.closed = true;
        Ok(())
    }

    fn scalar(&mut self, emit: impl FnOnce(&mut E) -> Result<()>) -> Result<&mut Self> {
        self.before_value()?;
        emit(&mut self.emitter)?;
        self.after_value(Cursor::Val)?;
        Ok(self)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(CodecError::sequencing("writer is closed"));
        }
        Ok(())
    }

    fn before_value(&mut self) -> Result<()> {
        self.ensure_open()?;
        match self.cursor {
            Cursor::Init | Cursor::Key => Ok(()),
            Cursor::Done => Err(CodecError::sequencing("document already complete")),
            Cursor::Obj => Err(CodecError::sequencing("object member needs a key first")),
            Cursor::List => self.newline(self.stack.len()),
            Cursor::Val | Cursor::End => match self.stack.last() {
                Some(Container::List) => {
                    self.emitter.write_separator()?;
                    self.newline(self.stack.len())
                }
                Some(Container::Obj) => {
                    Err(CodecError::sequencing("object member needs a key first"))
                }
                None => Err(CodecError::sequencing("document already complete")),
            },
        }
    }

    fn after_value(&mut self, inside: Cursor) -> Result<()> {
        self.cursor = if self.stack.is_empty() { Cursor::Done } else { inside };
        self.emitter.checkpoint(self.stack.len())
    }

    fn newline(&mut self, depth: usize) -> Result<()> {
        if self.options.pretty {
            self.emitter.write_newline_indent(depth, self.options.indent)?;
        }
        Ok(())
    }
}
