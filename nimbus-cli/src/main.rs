//! Binary crate for the `nimbus` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Human-friendly output formatting

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod render;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    init_tracing(cmd.verbose);
    cmd.run().await
}

/// `RUST_LOG` wins; otherwise `-v` flags pick the level.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "nimbus_core=info,nimbus_cli=info,warn",
        _ => "nimbus_core=debug,nimbus_cli=debug,info",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
