//! RSS→Atom transcoding.
//!
//! [`run`] drives the whole pipeline: quick-xml tokenizes the input stream,
//! the [`state::Transcoder`] classifies elements and buffers field text in
//! the arena, and the renderer prints Atom fragments as soon as each
//! channel or item closes. Output is therefore incremental; a caller
//! streaming it sees the feed header before all items have been read.
//!
//! Diagnostics come in two severities only. Structural violations, a
//! missing required title, arena overflow, and tokenizer syntax errors are
//! fatal and surface as [`TranscodeError`]; everything else (unknown
//! extension elements, missing optional fields, mismatched field end tags)
//! is logged and processing continues.

mod escape;
mod render;
mod state;

use std::io::{BufRead, Write};

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

use crate::arena::ArenaError;

pub use escape::{escape_attribute, escape_content};
pub use state::Transcoder;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("malformed feed: unexpected item when not in RSS or CHANNEL")]
    ItemOutsideRoot,

    #[error("malformed feed: no channel entry before item")]
    NoChannelBeforeItem,

    #[error("malformed feed: unexpected channel when not in RSS")]
    ChannelOutsideRoot,

    #[error("malformed feed: unexpected rss when not at document root")]
    NestedRoot,

    #[error("malformed feed: content before document root")]
    ContentBeforeRoot,

    #[error("malformed feed: no channel title")]
    NoChannelTitle,

    #[error("malformed feed: no item title")]
    NoItemTitle,

    #[error("malformed feed: unexpected end of document")]
    UnexpectedEof,

    #[error(transparent)]
    Arena(#[from] ArenaError),

    /// Tokenizer-level syntax error, with the byte position quick-xml
    /// reported it at.
    #[error("{source} at byte {position}")]
    Xml {
        position: u64,
        source: quick_xml::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Transcodes one RSS document from `input` to an Atom document on
/// `output`.
///
/// `arena_capacity` bounds the total field text of any single channel or
/// item; exceeding it is fatal rather than silently truncated. Total memory
/// use is bounded by this capacity regardless of document size.
pub fn run<R: BufRead, W: Write>(
    input: R,
    output: W,
    arena_capacity: usize,
) -> Result<(), TranscodeError> {
    let mut reader = Reader::from_reader(input);
    // Mismatched end tags are a tokenizer-level syntax error, matching the
    // fail-fast contract for malformed structure
    reader.config_mut().check_end_names = true;
    let mut transcoder = Transcoder::new(output, arena_capacity);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => transcoder.handle_start(e.name())?,
            Ok(Event::End(e)) => transcoder.handle_end(e.name())?,
            Ok(Event::Empty(e)) => {
                // The tokenizer collapses `<tag/>`; the state machine wants
                // a start immediately followed by an end.
                transcoder.handle_start(e.name())?;
                transcoder.handle_end(e.name())?;
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|source| TranscodeError::Xml {
                    position: reader.buffer_position(),
                    source,
                })?;
                transcoder.handle_text(&text)?;
            }
            Ok(Event::CData(e)) => {
                let text = e.decode().map_err(|source| TranscodeError::Xml {
                    position: reader.buffer_position(),
                    source: source.into(),
                })?;
                transcoder.handle_text(&text)?;
            }
            Ok(Event::Eof) => break,
            // Declarations, comments, processing instructions, doctypes
            Ok(_) => {}
            Err(source) => {
                return Err(TranscodeError::Xml {
                    position: reader.error_position(),
                    source,
                })
            }
        }
        buf.clear();
    }

    transcoder.finish()
}
