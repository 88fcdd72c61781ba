//! Remove a feed's entries and its configuration directory.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use feedtools::feeds;

#[derive(Parser, Debug)]
#[command(
    name = "feed-delete",
    about = "Remove a feed's entries and its configuration directory"
)]
struct Args {
    /// The feed to delete
    feed: String,
}

fn run(args: &Args) -> anyhow::Result<()> {
    feeds::delete(&args.feed).with_context(|| format!("failed to delete {}", args.feed))?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if let Err(err) = run(&args) {
        let name = std::env::args().next().unwrap_or_else(|| "feed-delete".into());
        eprintln!("{}: {:#}", name, err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
