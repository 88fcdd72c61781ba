//! Streaming readers over Atom documents, serving the companion tools:
//! entry-id listing for `atom-list` and entry-field extraction for
//! `atom-exec`. Both are single forward passes over the tokenizer's event
//! stream with a couple of booleans of state, never a document tree.

pub mod extract;
pub mod list;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtomError {
    /// An entry id with no text cannot name a file.
    #[error("invalid empty id")]
    EmptyId,

    /// A recognized tag opened while another was still being captured.
    #[error("malformed feed: unexpected tag '{0}'")]
    NestedTag(String),

    #[error("{source} at byte {position}")]
    Xml {
        position: u64,
        source: quick_xml::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
