use serde::Deserialize;

/// Limits and input detection applied by every reader.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Maximum container nesting. Deeper input is a format error.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Upper bound for any single length-prefixed payload, string or number
    /// literal, in bytes.
    #[serde(default = "default_max_payload_len")]
    pub max_payload_len: usize,

    /// Unwrap ZIP-compressed text input.
    #[serde(default = "default_detect_zip")]
    pub detect_zip: bool,
}

fn default_max_depth() -> usize {
    512
}

fn default_max_payload_len() -> usize {
    64 * 1024 * 1024
}

fn default_detect_zip() -> bool {
    true
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_payload_len: default_max_payload_len(),
            detect_zip: default_detect_zip(),
        }
    }
}

/// Layout and buffering of every writer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    /// Newline plus indentation before container members (text formats).
    pub pretty: bool,

    /// Spaces per nesting level when `pretty` is on.
    #[serde(default = "default_indent")]
    pub indent: usize,

    /// Buffered bytes that trigger a flush to the sink.
    #[serde(default = "default_flush_threshold")]
    pub flush_threshold: usize,
}

fn default_indent() -> usize {
    2
}

fn default_flush_threshold() -> usize {
    8 * 1024
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            pretty: false,
            indent: default_indent(),
            flush_threshold: default_flush_threshold(),
        }
    }
}

impl WriterOptions {
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Self::default()
        }
    }
}
