mod cli;
mod cmd;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    // stdout carries converted documents, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Convert(args) => cmd::convert::run(args),
        Commands::Inspect(args) => cmd::inspect::run(args),
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
