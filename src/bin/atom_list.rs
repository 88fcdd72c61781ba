//! List the id of each entry in an Atom feed fed into stdin.
//!
//! Ids are escaped to be safe as UNIX file names and NUL-terminated.

use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use feedtools::atom::list::list_entry_ids;
use feedtools::config::Limits;
use feedtools::io::RetryReader;

#[derive(Parser, Debug)]
#[command(
    name = "atom-list",
    about = "List the escaped, NUL-terminated id of each entry in an Atom feed on stdin"
)]
struct Args {
    /// Limits file (TOML) overriding the built-in buffer sizes
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn run(args: &Args) -> anyhow::Result<()> {
    let limits = Limits::load(args.config.as_deref()).context("failed to load limits")?;

    let stdin = io::stdin();
    let input = BufReader::with_capacity(limits.read_buf_size, RetryReader::new(stdin.lock()));
    let stdout = io::stdout();
    let output = BufWriter::new(stdout.lock());

    list_entry_ids(input, output)?;
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
        let name = std::env::args().next().unwrap_or_else(|| "atom-list".into());
        eprintln!("{}: {:#}", name, err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
