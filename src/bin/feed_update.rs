//! Fetch configured feeds and merge their entries into the database.

use std::io;
use std::process::ExitCode;

use clap::Parser;

use feedtools::feeds;

#[derive(Parser, Debug)]
#[command(
    name = "feed-update",
    about = "Fetch feeds and merge their entries into the entry database"
)]
struct Args {
    /// Feeds to update (all configured feeds when none given)
    feeds: Vec<String>,
}

fn run(args: &Args) -> anyhow::Result<()> {
    let feeds = if args.feeds.is_empty() {
        feeds::all_feed_names()?
    } else {
        args.feeds.clone()
    };

    // One broken feed must not stop the rest of the round.
    let mut failed = 0usize;
    for feed_name in &feeds {
        println!("Updating feed {feed_name}");
        if let Err(err) = feeds::update(feed_name) {
            eprintln!("{feed_name}: {err}");
            failed += 1;
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} feeds failed to update", feeds.len());
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
        let name = std::env::args().next().unwrap_or_else(|| "feed-update".into());
        eprintln!("{}: {:#}", name, err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
