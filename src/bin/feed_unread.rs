//! Print unread entry counts per feed.

use std::io;
use std::process::ExitCode;

use clap::Parser;

use feedtools::feeds;

#[derive(Parser, Debug)]
#[command(name = "feed-unread", about = "Print unread entry counts per feed")]
struct Args {}

fn run(_args: &Args) -> anyhow::Result<()> {
    for (feed_name, unread) in feeds::unread_counts()? {
        println!("{unread: >4} {feed_name}");
    }
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
        let name = std::env::args().next().unwrap_or_else(|| "feed-unread".into());
        eprintln!("{}: {:#}", name, err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
