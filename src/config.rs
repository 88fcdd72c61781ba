//! Runtime limits for the feed filters.
//!
//! The limits were compile-time constants in earlier revisions; here they
//! live in an optional TOML file passed via `--config`. A missing file
//! yields the defaults, and any subset of keys can be specified.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read limits file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML in limits file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Buffer-size limits shared by the filters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Size of the input read buffer, in bytes. About a page is plenty.
    pub read_buf_size: usize,

    /// Capacity of the persistent text arena, in bytes. This bounds the
    /// total field data of a single channel or item; a record exceeding it
    /// is a fatal malformed-feed error, never a silent truncation.
    pub data_buf_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            read_buf_size: 4096,
            data_buf_size: 1_000_000,
        }
    }
}

impl Limits {
    /// Loads limits from the given file, or the defaults when no file is
    /// given.
    pub fn load(path: Option<&Path>) -> Result<Limits, ConfigError> {
        match path {
            None => Ok(Limits::default()),
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                Ok(toml::from_str(&content)?)
            }
        }
    }
}
