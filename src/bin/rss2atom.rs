//! Convert an RSS feed on stdin to the Atom feed format on stdout.

use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use feedtools::config::Limits;
use feedtools::io::RetryReader;
use feedtools::transcode;

#[derive(Parser, Debug)]
#[command(
    name = "rss2atom",
    about = "Convert an RSS feed on stdin to an Atom feed on stdout"
)]
struct Args {
    /// Limits file (TOML) overriding the built-in buffer sizes
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Text arena capacity in bytes (overrides the limits file)
    #[arg(long, value_name = "BYTES")]
    arena_capacity: Option<usize>,
}

fn run(args: &Args) -> anyhow::Result<()> {
    let mut limits =
        Limits::load(args.config.as_deref()).context("failed to load limits")?;
    if let Some(capacity) = args.arena_capacity {
        limits.data_buf_size = capacity;
    }

    let stdin = io::stdin();
    let input = BufReader::with_capacity(limits.read_buf_size, RetryReader::new(stdin.lock()));
    let stdout = io::stdout();
    let mut output = BufWriter::new(stdout.lock());

    transcode::run(input, &mut output, limits.data_buf_size)?;
    output.flush()?;
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
        let name = std::env::args().next().unwrap_or_else(|| "rss2atom".into());
        eprintln!("{}: {:#}", name, err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
