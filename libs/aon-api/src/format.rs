use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Wire formats the workspace can read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    #[default]
    Json,
    Aon,
    #[serde(rename = "msgpack", alias = "messagepack", alias = "msg_pack")]
    MsgPack,
}

impl DataFormat {
    pub const ALL: [DataFormat; 3] = [DataFormat::Json, DataFormat::Aon, DataFormat::MsgPack];

    /// Conventional file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            DataFormat::Json => "json",
            DataFormat::Aon => "aon",
            DataFormat::MsgPack => "msgpack",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, DataFormat::Json)
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataFormat::Json => write!(f, "json"),
            DataFormat::Aon => write!(f, "aon"),
            DataFormat::MsgPack => write!(f, "msgpack"),
        }
    }
}

impl FromStr for DataFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(DataFormat::Json),
            "aon" => Ok(DataFormat::Aon),
            "msgpack" | "messagepack" | "msg_pack" | "mp" => Ok(DataFormat::MsgPack),
            other => Err(format!(
                "unknown format '{other}', expected one of: json, aon, msgpack"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parses_back() {
        for f in DataFormat::ALL {
            assert_eq!(f.to_string().parse::<DataFormat>().unwrap(), f);
        }
        assert_eq!("MessagePack".parse::<DataFormat>().unwrap(), DataFormat::MsgPack);
        assert!("yaml".parse::<DataFormat>().is_err());
    }

    #[test]
    fn deserializes_snake_case() {
        #[derive(Deserialize)]
        struct Doc {
            format: DataFormat,
        }
        let doc: Doc = toml::from_str("format = \"msg_pack\"").unwrap();
        assert_eq!(doc.format, DataFormat::MsgPack);
        let doc: Doc = toml::from_str("format = \"aon\"").unwrap();
        assert_eq!(doc.format, DataFormat::Aon);
    }
}
