//! Execute a command with TITLE, LINK, CONTENT, and UPDATED set to the
//! values of the corresponding tags in an Atom entry document.
//!
//! Tags absent from the entry leave the corresponding variable untouched,
//! so the child may still see an inherited value.

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::{Command, ExitCode};

use anyhow::Context;
use clap::Parser;

use feedtools::atom::extract::{extract_entry_fields, EntryFields};
use feedtools::config::Limits;
use feedtools::io::RetryReader;

#[derive(Parser, Debug)]
#[command(
    name = "atom-exec",
    about = "Run a command with TITLE/LINK/CONTENT/UPDATED taken from an Atom entry"
)]
struct Args {
    /// Atom entry document to read
    file: PathBuf,

    /// Command to run, with its arguments
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    command: Vec<OsString>,
}

fn run(args: &Args) -> anyhow::Result<()> {
    let limits = Limits::load(None).context("failed to load limits")?;

    let file = File::open(&args.file)
        .with_context(|| format!("failed to open {}", args.file.display()))?;
    let input = BufReader::with_capacity(limits.read_buf_size, RetryReader::new(file));
    let fields = extract_entry_fields(input)?;

    let mut command = Command::new(&args.command[0]);
    command.args(&args.command[1..]);
    apply_env(&mut command, &fields);
    exec(command, &args.command[0])
}

fn apply_env(command: &mut Command, fields: &EntryFields) {
    let exported = [
        ("TITLE", &fields.title),
        ("LINK", &fields.link),
        ("CONTENT", &fields.content),
        ("UPDATED", &fields.updated),
    ];
    for (name, value) in exported {
        if let Some(value) = value {
            command.env(name, value);
        }
    }
}

#[cfg(unix)]
fn exec(mut command: Command, name: &OsString) -> anyhow::Result<()> {
    use std::os::unix::process::CommandExt;
    // exec only returns on failure
    let err = command.exec();
    Err(anyhow::Error::new(err).context(format!("failed to exec {}", name.to_string_lossy())))
}

#[cfg(not(unix))]
fn exec(mut command: Command, name: &OsString) -> anyhow::Result<()> {
    let status = command
        .status()
        .with_context(|| format!("failed to run {}", name.to_string_lossy()))?;
    if !status.success() {
        anyhow::bail!("child exited with {}", status);
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
        let name = std::env::args().next().unwrap_or_else(|| "atom-exec".into());
        eprintln!("{}: {:#}", name, err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
