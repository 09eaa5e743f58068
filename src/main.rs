use std::io;

use anyhow::Result;
use clap::Parser;
use smartqr::cli::Cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    smartqr::commands::run(cli, &mut out)
}

// Logs go to stderr so stdout stays clean for JSON and terminal art. RUST_LOG wins over -v.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "smartqr=warn",
        1 => "smartqr=info",
        _ => "smartqr=debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}
