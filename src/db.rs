//! The tab-separated entry database.
//!
//! All entries of all subscribed feeds live in one TSV file, one entry per
//! line. Writers take an exclusive lockfile next to the database, write the
//! modified contents into the lockfile, and rename it over the database, so
//! readers always see a complete file and concurrent writers queue up on
//! the lock.

use std::collections::HashMap;
use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use thiserror::Error;

const HEADER: &str = "feed\tid\tupdated\ttitle\tlink\tread\n";

#[derive(Error, Debug)]
pub enum DbError {
    #[error("no database path: set FEEDTOOLS_DB, XDG_DATA_HOME or HOME")]
    NoPath,
    #[error("{path}: {source}")]
    Io { source: io::Error, path: PathBuf },
    #[error("line {line}: missing {field} field")]
    MissingField { line: usize, field: &'static str },
    #[error("cannot lock database: {path}: {source}")]
    Lock { source: io::Error, path: PathBuf },
}

/// One feed entry as stored in the database.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct Entry {
    pub feed: String,
    pub id: String,
    pub title: String,
    pub updated: String,
    pub link: String,
    pub read: bool,
}

/// Strips control characters from a value headed for the database.
///
/// Tab and newline are the record delimiters, so no stored value may
/// contain them; stripping all control characters also keeps the values
/// safe to hand to a terminal.
pub fn sanitize(data: &str) -> String {
    data.chars().filter(|c| !c.is_control()).collect()
}

/// The database file path, from the first set of `FEEDTOOLS_DB`,
/// `XDG_DATA_HOME` and `HOME`. The file itself need not exist yet.
pub fn database_path() -> Result<PathBuf, DbError> {
    if let Some(path) = env::var_os("FEEDTOOLS_DB") {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = env::var_os("XDG_DATA_HOME") {
        return Ok(PathBuf::from(path).join("feedtools.tsv"));
    }
    if let Some(path) = env::var_os("HOME") {
        return Ok(PathBuf::from(path).join(".local/share/feedtools.tsv"));
    }
    Err(DbError::NoPath)
}

/// Reads every entry from the database at `path`.
///
/// A missing database reads as empty, so the first update does not need a
/// separate initialization step.
pub fn read_entries(path: &Path) -> Result<Vec<Entry>, DbError> {
    let file = match OpenOptions::new().read(true).open(path) {
        Ok(file) => file,
        Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(DbError::Io {
                source,
                path: path.to_path_buf(),
            })
        }
    };
    parse_entries(BufReader::new(file)).map_err(|err| match err {
        DbError::Io { source, .. } => DbError::Io {
            source,
            path: path.to_path_buf(),
        },
        other => other,
    })
}

fn parse_entries<R: BufRead>(reader: R) -> Result<Vec<Entry>, DbError> {
    let mut entries = Vec::new();
    for (index, line) in reader.lines().enumerate().skip(1) {
        let line = line.map_err(|source| DbError::Io {
            source,
            path: PathBuf::new(),
        })?;
        let lineno = index + 1;
        let mut fields = line.split('\t');
        let mut next = |field: &'static str| {
            fields.next().ok_or(DbError::MissingField {
                line: lineno,
                field,
            })
        };
        entries.push(Entry {
            feed: next("feed")?.to_string(),
            id: next("id")?.to_string(),
            updated: next("updated")?.to_string(),
            title: next("title")?.to_string(),
            link: next("link")?.to_string(),
            read: next("read")? == "read",
        });
    }
    Ok(entries)
}

fn write_entries<W: Write>(out: W, entries: &[Entry]) -> io::Result<()> {
    let mut writer = BufWriter::new(out);
    writer.write_all(HEADER.as_bytes())?;
    for entry in entries {
        // Values were sanitized on the way in, so the delimiters are safe.
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}",
            entry.feed,
            entry.id,
            entry.updated,
            entry.title,
            entry.link,
            if entry.read { "read" } else { "unread" },
        )?;
    }
    writer.flush()
}

/// Creates the lockfile, blocking with doubling delays until it can be
/// created fresh or the wait exceeds two seconds.
fn acquire_lockfile(path: &Path) -> io::Result<File> {
    let mut delay = Duration::from_millis(50);
    let timeout = Duration::from_millis(2000);
    loop {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => return Ok(file),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists && delay < timeout => {
                thread::sleep(delay);
                delay *= 2;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Rewrites the database at `path` through `modifier` under the lockfile.
///
/// The new contents are written into the lockfile, synced, and renamed over
/// the database. On any failure the lockfile is removed so a crashed writer
/// does not wedge every later one past its timeout.
pub fn modify<F>(path: &Path, modifier: F) -> Result<(), DbError>
where
    F: FnOnce(Vec<Entry>) -> Vec<Entry>,
{
    let lock_path = lock_path(path);
    let mut lockfile = acquire_lockfile(&lock_path).map_err(|source| DbError::Lock {
        source,
        path: lock_path.clone(),
    })?;

    let unlock_on = |err: DbError| {
        if let Err(remove_err) = fs::remove_file(&lock_path) {
            tracing::warn!(error = %remove_err, "cannot remove lockfile");
        }
        err
    };

    let entries = read_entries(path).map_err(|err| unlock_on(err))?;
    let entries = modifier(entries);

    write_entries(&mut lockfile, &entries)
        .and_then(|()| lockfile.sync_all())
        .map_err(|source| {
            unlock_on(DbError::Io {
                source,
                path: lock_path.clone(),
            })
        })?;
    fs::rename(&lock_path, path).map_err(|source| {
        unlock_on(DbError::Io {
            source,
            path: lock_path.clone(),
        })
    })?;
    Ok(())
}

fn lock_path(database_path: &Path) -> PathBuf {
    let mut name = database_path
        .file_name()
        .unwrap_or_default()
        .to_os_string();
    name.push(".lock");
    database_path.with_file_name(name)
}

/// Merges one fetched feed into the database entries.
///
/// Entries in the feed but not yet in the database are added as unread.
/// Entries of this feed that have disappeared from it are dropped once
/// read; unread ones are kept so nothing is lost before it was seen.
/// Entries of other feeds pass through untouched.
pub fn merge_feed(
    feed_name: &str,
    feed_entries: Vec<Entry>,
    database_entries: Vec<Entry>,
) -> Vec<Entry> {
    let mut incoming: HashMap<String, Entry> = feed_entries
        .into_iter()
        .map(|entry| (entry.id.clone(), entry))
        .collect();

    let mut merged = Vec::new();
    for entry in database_entries {
        if entry.feed != feed_name {
            merged.push(entry);
        } else if incoming.remove(&entry.id).is_some() {
            // Already known; the stored read state wins.
            merged.push(entry);
        } else if !entry.read {
            merged.push(entry);
        }
    }
    merged.extend(incoming.into_values());
    merged
}

/// Unread entries per feed name.
pub fn unread_counts(entries: &[Entry]) -> HashMap<String, u32> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for entry in entries {
        if !entry.read {
            *counts.entry(entry.feed.clone()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(feed: &str, id: &str, read: bool) -> Entry {
        Entry {
            feed: feed.to_string(),
            id: id.to_string(),
            title: format!("title of {id}"),
            updated: "2026-01-01T00:00:00+00:00".to_string(),
            link: format!("https://example.com/{id}"),
            read,
        }
    }

    fn scratch_path(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("feedtools-db-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join("feedtools.tsv")
    }

    #[test]
    fn sanitize_strips_the_delimiters() {
        assert_eq!(sanitize("a\tb\nc"), "abc");
        assert_eq!(sanitize("plain Ünïcode"), "plain Ünïcode");
    }

    #[test]
    fn entries_survive_a_write_and_parse_cycle() {
        let entries = vec![entry("news", "n1", false), entry("blog", "b1", true)];
        let mut buf = Vec::new();
        write_entries(&mut buf, &entries).unwrap();
        assert!(buf.starts_with(HEADER.as_bytes()));
        assert_eq!(parse_entries(&buf[..]).unwrap(), entries);
    }

    #[test]
    fn short_lines_are_an_error() {
        let err = parse_entries("feed\tid\tupdated\ttitle\tlink\tread\nnews\tn1\n".as_bytes())
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::MissingField {
                line: 2,
                field: "updated"
            }
        ));
    }

    #[test]
    fn merge_adds_keeps_and_drops() {
        let database = vec![
            entry("news", "gone-read", true),
            entry("news", "gone-unread", false),
            entry("news", "still-there", true),
            entry("blog", "other-feed", true),
        ];
        let fetched = vec![entry("news", "still-there", false), entry("news", "brand-new", false)];

        let mut merged = merge_feed("news", fetched, database);
        merged.sort();

        let ids: Vec<&str> = merged.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["other-feed", "brand-new", "gone-unread", "still-there"]);
        // The stored read state wins over the freshly fetched copy.
        let kept = merged.iter().find(|e| e.id == "still-there").unwrap();
        assert!(kept.read);
    }

    #[test]
    fn unread_counts_group_by_feed() {
        let entries = vec![
            entry("news", "a", false),
            entry("news", "b", false),
            entry("news", "c", true),
            entry("blog", "d", false),
        ];
        let counts = unread_counts(&entries);
        assert_eq!(counts.get("news"), Some(&2));
        assert_eq!(counts.get("blog"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn modify_rewrites_atomically_and_releases_the_lock() {
        let path = scratch_path("modify");
        let _ = fs::remove_file(&path);

        modify(&path, |entries| {
            assert!(entries.is_empty());
            vec![entry("news", "n1", false)]
        })
        .unwrap();
        modify(&path, |mut entries| {
            entries[0].read = true;
            entries
        })
        .unwrap();

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].read);
        assert!(!lock_path(&path).exists());
    }

    #[test]
    fn modify_failure_removes_the_lockfile() {
        // A directory in place of the database makes the read step fail
        // after the lock was taken.
        let dir = env::temp_dir().join(format!("feedtools-db-rofail-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        assert!(modify(&dir, |entries| entries).is_err());
        assert!(!lock_path(&dir).exists());
    }
}
