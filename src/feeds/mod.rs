//! Subscribed-feed configuration and the operations over it.
//!
//! Each subscribed feed is a directory under the feed configuration
//! directory, named after the feed and holding two executables: `fetch`
//! writes the feed document to stdout, `open` presents one entry to the
//! user with its fields in the environment. Everything else about a feed
//! lives in the entry database.

mod parse;

use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use thiserror::Error;

use crate::db::{self, DbError, Entry};

pub use parse::parse_feed;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("no feed config directory: set FEEDTOOLS_CONFIGDIR, XDG_CONFIG_HOME or HOME")]
    NoConfigDir,
    #[error("cannot read feed config directory: {source}")]
    ConfigDir { source: io::Error },
    #[error("no such feed: {name}")]
    NoSuchFeed { name: String },
    #[error("cannot run {path}: {source}")]
    Exec { source: io::Error, path: PathBuf },
    #[error("cannot delete {path}: {source}")]
    Delete { source: io::Error, path: PathBuf },
    #[error("fetch failed with {status}")]
    Fetch { status: ExitStatus },
    #[error(transparent)]
    Db(#[from] DbError),
}

/// The feed configuration directory, from the first set of
/// `FEEDTOOLS_CONFIGDIR`, `XDG_CONFIG_HOME` and `HOME`.
pub fn config_dir() -> Result<PathBuf, FeedError> {
    if let Some(path) = env::var_os("FEEDTOOLS_CONFIGDIR") {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = env::var_os("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(path).join("feeds"));
    }
    if let Some(path) = env::var_os("HOME") {
        return Ok(PathBuf::from(path).join(".config/feeds"));
    }
    Err(FeedError::NoConfigDir)
}

/// The configuration directory of one feed; an error if it does not exist.
pub fn feed_dir(name: &str) -> Result<PathBuf, FeedError> {
    let config_dir = config_dir()?;
    fs::metadata(&config_dir).map_err(|source| FeedError::ConfigDir { source })?;
    let feed_dir = config_dir.join(name);
    fs::metadata(&feed_dir).map_err(|_| FeedError::NoSuchFeed {
        name: name.to_string(),
    })?;
    Ok(feed_dir)
}

/// All configured feed names, sorted.
pub fn all_feed_names() -> Result<Vec<String>, FeedError> {
    let config_dir = config_dir()?;
    let listing = fs::read_dir(&config_dir).map_err(|source| FeedError::ConfigDir { source })?;
    let mut names = Vec::new();
    for dir_entry in listing {
        let dir_entry = dir_entry.map_err(|source| FeedError::ConfigDir { source })?;
        if dir_entry
            .file_type()
            .map_err(|source| FeedError::ConfigDir { source })?
            .is_dir()
        {
            // Feed names end up in the database, so they get the same
            // control-character treatment as entry fields.
            names.push(db::sanitize(&dir_entry.file_name().to_string_lossy()));
        }
    }
    names.sort();
    Ok(names)
}

/// Fetches one feed and merges its entries into the database.
///
/// The feed's `fetch` executable produces the document on stdout. A failed
/// fetch leaves its stderr in `error.log` next to the executable for a
/// later interactive program to show; a successful one clears any old log.
pub fn update(feed_name: &str) -> Result<(), FeedError> {
    let feed_dir = feed_dir(feed_name)?;
    let fetch_path = feed_dir.join("fetch");
    let error_path = feed_dir.join("error.log");

    let output = Command::new(&fetch_path)
        .output()
        .map_err(|source| FeedError::Exec {
            source,
            path: fetch_path,
        })?;
    if !output.status.success() {
        let _ = fs::write(error_path, &output.stderr);
        return Err(FeedError::Fetch {
            status: output.status,
        });
    }
    let _ = fs::remove_file(error_path);

    let feed_entries = parse_feed(&output.stdout, feed_name);
    let database_path = db::database_path()?;
    db::modify(&database_path, |entries| {
        db::merge_feed(feed_name, feed_entries, entries)
    })?;
    Ok(())
}

/// Marks one entry of one feed as read.
pub fn mark_entry_read(feed_name: &str, entry_id: &str) -> Result<(), FeedError> {
    let database_path = db::database_path()?;
    db::modify(&database_path, |mut entries| {
        for entry in &mut entries {
            if entry.feed == feed_name && entry.id == entry_id {
                entry.read = true;
            }
        }
        entries
    })?;
    Ok(())
}

/// Marks every entry of one feed as read.
pub fn mark_feed_read(feed_name: &str) -> Result<(), FeedError> {
    feed_dir(feed_name)?;
    let database_path = db::database_path()?;
    db::modify(&database_path, |mut entries| {
        for entry in &mut entries {
            if entry.feed == feed_name {
                entry.read = true;
            }
        }
        entries
    })?;
    Ok(())
}

/// Removes a feed: its entries from the database, then its configuration
/// directory.
pub fn delete(feed_name: &str) -> Result<(), FeedError> {
    let feed_dir = feed_dir(feed_name)?;
    let database_path = db::database_path()?;
    db::modify(&database_path, |entries| {
        entries
            .into_iter()
            .filter(|entry| entry.feed != feed_name)
            .collect()
    })?;
    fs::remove_dir_all(&feed_dir).map_err(|source| FeedError::Delete {
        source,
        path: feed_dir,
    })?;
    Ok(())
}

/// The unread entries of one feed, oldest first so reading starts where
/// the reader left off.
pub fn unread_entries(feed_name: &str) -> Result<Vec<Entry>, FeedError> {
    let database_path = db::database_path()?;
    let entries = db::read_entries(&database_path)?;
    let mut unread: Vec<Entry> = entries
        .into_iter()
        .filter(|entry| entry.feed == feed_name && !entry.read)
        .collect();
    unread.sort_by(|a, b| (&a.updated, &a.id).cmp(&(&b.updated, &b.id)));
    Ok(unread)
}

/// Unread counts per feed, sorted by count then name so the busiest feeds
/// print last.
pub fn unread_counts() -> Result<Vec<(String, u32)>, FeedError> {
    let database_path = db::database_path()?;
    let entries = db::read_entries(&database_path)?;
    let mut counts: Vec<(String, u32)> = db::unread_counts(&entries).into_iter().collect();
    counts.sort_by(|a, b| (a.1, &a.0).cmp(&(b.1, &b.0)));
    Ok(counts)
}

/// Presents one entry through the feed's `open` executable, then marks it
/// read. `open` gets the entry's title and link in `TITLE` and `LINK`.
pub fn open_entry(feed_name: &str, entry: &Entry) -> Result<(), FeedError> {
    let feed_dir = feed_dir(feed_name)?;
    let open_path = feed_dir.join("open");
    Command::new(&open_path)
        .env("TITLE", &entry.title)
        .env("LINK", &entry.link)
        .status()
        .map_err(|source| FeedError::Exec {
            source,
            path: open_path,
        })?;
    mark_entry_read(&entry.feed, &entry.id)
}
