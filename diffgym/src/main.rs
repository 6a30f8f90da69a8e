//! # diffgym
//!
//! Command-line entry point. Parses flags, merges them over the optional
//! JSON config and runs the training loop.

use anyhow::Result;
use clap::Parser;
use diffgym::Cli;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Cli::parse().into_config()?;
    let report = diffgym::run(&config)?;

    match report.last_score {
        Some(score) => tracing::info!("finished {} iterations, final score {score}", report.iterations),
        None => tracing::info!("no iterations requested"),
    }
    if let Some(dir) = report.frames_dir {
        tracing::info!("frames saved under {}", dir.display());
    }
    Ok(())
}
