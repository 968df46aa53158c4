use aon_api::{ReaderOptions, WriterOptions};
use serde::Deserialize;

use crate::error::ConvertError;

/// Contents of the optional TOML config file.
///
/// ```toml
/// [reader]
/// max_depth = 128
/// detect_zip = false
///
/// [writer]
/// pretty = true
/// indent = 4
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub reader: ReaderOptions,
    #[serde(default)]
    pub writer: WriterOptions,
}

impl Config {
    pub fn parse(content: &str) -> Result<Self, ConvertError> {
        toml::from_str(content).map_err(|e| ConvertError::Config(format!("bad config: {e}")))
    }
}

pub fn load_config(path: &str) -> Result<Config, ConvertError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConvertError::Config(format!("cannot read config {path}: {e}")))?;
    toml::from_str(&content).map_err(|e| ConvertError::Config(format!("bad config {path}: {e}")))
}
