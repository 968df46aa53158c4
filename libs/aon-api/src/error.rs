use std::fmt;

use crate::tag::Tag;

/// Category of a codec error.
///
/// None of them is recoverable: once a reader or writer has reported an
/// error the only valid call left is `close()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed bytes, invalid tag, premature end, unterminated container.
    Format,
    /// Requested representation not derivable from the actual value.
    Coercion,
    /// API called outside its valid state-machine transitions.
    Sequencing,
    /// I/O failure of the wrapped stream.
    Resource,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Format => f.write_str("format"),
            ErrorKind::Coercion => f.write_str("coercion"),
            ErrorKind::Sequencing => f.write_str("sequencing"),
            ErrorKind::Resource => f.write_str("resource"),
        }
    }
}

/// Unified error type of readers, writers and value conversions.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("format error at byte {offset}: {message}")]
    Format { offset: u64, message: String },

    #[error("cannot convert {from} to {to}: {detail}")]
    Coercion {
        from: Tag,
        to: &'static str,
        detail: String,
    },

    #[error("sequencing error: {0}")]
    Sequencing(String),

    #[error("io error: {0}")]
    Resource(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;

impl CodecError {
    pub fn format(offset: u64, msg: impl Into<String>) -> Self {
        CodecError::Format {
            offset,
            message: msg.into(),
        }
    }

    pub fn coercion(from: Tag, to: &'static str, detail: impl Into<String>) -> Self {
        CodecError::Coercion {
            from,
            to,
            detail: detail.into(),
        }
    }

    pub fn sequencing(msg: impl Into<String>) -> Self {
        CodecError::Sequencing(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::Format { .. } => ErrorKind::Format,
            CodecError::Coercion { .. } => ErrorKind::Coercion,
            CodecError::Sequencing(_) => ErrorKind::Sequencing,
            CodecError::Resource(_) => ErrorKind::Resource,
        }
    }

    /// Add context to the error, preserving its kind.
    ///
    /// Produces `"context: original message"`. I/O errors keep their
    /// `std::io::ErrorKind`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        match self {
            CodecError::Format { offset, message } => CodecError::Format {
                offset,
                message: format!("{ctx}: {message}"),
            },
            CodecError::Coercion { from, to, detail } => CodecError::Coercion {
                from,
                to,
                detail: format!("{ctx}: {detail}"),
            },
            CodecError::Sequencing(msg) => CodecError::Sequencing(format!("{ctx}: {msg}")),
            CodecError::Resource(e) => {
                CodecError::Resource(std::io::Error::new(e.kind(), format!("{ctx}: {e}")))
            }
        }
    }
}

impl From<std::str::Utf8Error> for CodecError {
    fn from(e: std::str::Utf8Error) -> Self {
        CodecError::format(0, e.to_string())
    }
}

impl From<std::string::FromUtf8Error> for CodecError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        CodecError::format(0, e.to_string())
    }
}
