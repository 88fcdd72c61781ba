//! Open the unread entries of the named feeds, oldest first.

use std::io;
use std::process::ExitCode;

use clap::Parser;

use feedtools::feeds;

#[derive(Parser, Debug)]
#[command(
    name = "feed-read",
    about = "Open each unread entry of the named feeds and mark it read"
)]
struct Args {
    /// Feeds to read
    #[arg(required = true)]
    feeds: Vec<String>,
}

fn run(args: &Args) -> anyhow::Result<()> {
    let mut failed = 0usize;
    for feed_name in &args.feeds {
        let entries = match feeds::unread_entries(feed_name) {
            Ok(entries) => entries,
            Err(err) => {
                eprintln!("{feed_name}: {err}");
                failed += 1;
                continue;
            }
        };
        for entry in entries {
            if let Err(err) = feeds::open_entry(feed_name, &entry) {
                eprintln!("{feed_name}: {err}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} entries or feeds could not be read");
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
        let name = std::env::args().next().unwrap_or_else(|| "feed-read".into());
        eprintln!("{}: {:#}", name, err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
