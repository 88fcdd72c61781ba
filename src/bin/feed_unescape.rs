//! Print the given escaped id in unescaped form on stdout.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;

use feedtools::ident;

#[derive(Parser, Debug)]
#[command(
    name = "feed-unescape",
    about = "Print the unescaped form of a filesystem-safe feed id"
)]
struct Args {
    /// Escaped id, as produced by atom-list
    id: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let unescaped = ident::unescape(&args.id);
    // No trailing newline; the output is the id, nothing else
    if let Err(err) = io::stdout().lock().write_all(unescaped.as_bytes()) {
        let name = std::env::args().next().unwrap_or_else(|| "feed-unescape".into());
        eprintln!("{}: {}", name, err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
