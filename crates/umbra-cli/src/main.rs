//! `umbra`: read, change and style the light/dark theme preference.
//!
//! ```text
//! umbra get --source        # dark (system setting)
//! umbra set light
//! umbra toggle
//! umbra tokens --format css > tokens.css
//! umbra swatch
//! ```
//!
//! Logging goes to stderr and is filtered by `UMBRA_LOG` (default `warn`).

mod cli;

use std::io;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use umbra::env::RealEnv;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env("UMBRA_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = cli::Cli::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    cli::run(&cli, &RealEnv, &mut out)
}
