use aon_api::DataFormat;
use aon_convert::config::{Config, load_config};
use aon_convert::error::ConvertError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "aon-convert", about = "Convert and inspect JSON, Aon and MessagePack documents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Re-encode a document in another format
    Convert(ConvertArgs),
    /// Print the token stream of a document, one token per line
    Inspect(InspectArgs),
}

/// Reader settings shared by every subcommand.
#[derive(Args, Clone, Debug)]
pub struct ReadArgs {
    /// Path to TOML config file with [reader] and [writer] tables
    #[arg(long, env = "AON_CONFIG")]
    pub config: Option<String>,

    /// Maximum container nesting accepted from the input
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Read zipped JSON as-is instead of unwrapping it
    #[arg(long)]
    pub no_zip: bool,
}

#[derive(Args, Clone, Debug)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub read: ReadArgs,

    /// Input format: json, aon, msgpack
    #[arg(long)]
    pub from: DataFormat,

    /// Output format: json, aon, msgpack
    #[arg(long)]
    pub to: DataFormat,

    /// Indent JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Spaces per level with --pretty
    #[arg(long)]
    pub indent: Option<usize>,

    /// Convert every document in the input, not just the first
    #[arg(long)]
    pub all: bool,

    /// Input file (stdin when omitted)
    pub input: Option<String>,

    /// Output file (stdout when omitted)
    pub output: Option<String>,
}

#[derive(Args, Clone, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub read: ReadArgs,

    /// Input format: json, aon, msgpack
    #[arg(long)]
    pub format: DataFormat,

    /// Input file (stdin when omitted)
    pub input: Option<String>,
}

/// Options after merging: config file < CLI flags.
pub fn effective(read: &ReadArgs) -> Result<Config, ConvertError> {
    let mut cfg = match &read.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    if let Some(depth) = read.max_depth {
        cfg.reader.max_depth = depth;
    }
    if read.no_zip {
        cfg.reader.detect_zip = false;
    }
    Ok(cfg)
}
