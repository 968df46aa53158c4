//! Shared data model and codec protocols.
//!
//! - [`Value`] with [`List`] / [`Object`] containers and the coercion matrix
//! - [`Reader`]: pull cursor over a token stream, with bulk materialization
//! - [`Writer`] over an [`Emitter`]: push API with sequencing checks
//! - [`PatchBuffer`]: output buffering with backward patching

pub mod buffer;
pub mod config;
pub mod convert;
pub mod error;
pub mod format;
pub mod intern;
pub mod list;
pub mod object;
pub mod reader;
pub mod tag;
pub mod token;
pub mod value;
pub mod writer;

pub use buffer::PatchBuffer;
pub use config::{ReaderOptions, WriterOptions};
pub use error::{CodecError, ErrorKind, Result};
pub use format::DataFormat;
pub use list::List;
pub use object::Object;
pub use reader::Reader;
pub use tag::Tag;
pub use token::Token;
pub use value::Value;
pub use writer::{Cursor, Emitter, Writer};

pub use bigdecimal::BigDecimal;
pub use num_bigint::BigInt;
