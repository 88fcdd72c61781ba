//! Mark every entry of one feed as read.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use feedtools::feeds;

#[derive(Parser, Debug)]
#[command(name = "feed-markasread", about = "Mark every entry of a feed as read")]
struct Args {
    /// The feed whose entries are marked read
    feed: String,
}

fn run(args: &Args) -> anyhow::Result<()> {
    feeds::mark_feed_read(&args.feed)
        .with_context(|| format!("failed to mark {} as read", args.feed))?;
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
        let name = std::env::args()
            .next()
            .unwrap_or_else(|| "feed-markasread".into());
        eprintln!("{}: {:#}", name, err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
