//! Entry-id listing over a streamed Atom feed.

use std::io::{BufRead, Write};

use quick_xml::events::Event;
use quick_xml::Reader;

use super::AtomError;
use crate::ident;

/// Prints the id of each `entry` in the Atom feed on `input`.
///
/// Each id is escaped to be safe as a UNIX file name (see [`crate::ident`])
/// and terminated with a NUL byte. An empty id is fatal.
pub fn list_entry_ids<R: BufRead, W: Write>(input: R, mut out: W) -> Result<(), AtomError> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut in_entry = false;
    let mut in_id = false;
    let mut id = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let local = e.name().local_name();
                if in_entry && local.as_ref() == b"id" {
                    in_id = true;
                    id.clear();
                } else if local.as_ref() == b"entry" {
                    in_entry = true;
                }
            }
            Ok(Event::End(e)) => {
                let local = e.name().local_name();
                if in_id && local.as_ref() == b"id" {
                    in_id = false;
                    write_escaped_id(&mut out, &id)?;
                }
                if in_entry && local.as_ref() == b"entry" {
                    in_id = false;
                    in_entry = false;
                }
            }
            Ok(Event::Text(e)) if in_id => {
                let text = e.unescape().map_err(|source| AtomError::Xml {
                    position: reader.buffer_position(),
                    source,
                })?;
                id.push_str(&text);
            }
            Ok(Event::CData(e)) if in_id => {
                let text = e.decode().map_err(|source| AtomError::Xml {
                    position: reader.buffer_position(),
                    source: source.into(),
                })?;
                id.push_str(&text);
            }
            Ok(Event::Empty(e)) => {
                // A self-closing tag opens and closes in one event, so an
                // <id/> inside an entry has no character data at all.
                if in_entry && e.name().local_name().as_ref() == b"id" {
                    write_escaped_id(&mut out, "")?;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(source) => {
                return Err(AtomError::Xml {
                    position: reader.error_position(),
                    source,
                })
            }
        }
        buf.clear();
    }

    out.flush()?;
    Ok(())
}

fn write_escaped_id<W: Write>(out: &mut W, id: &str) -> Result<(), AtomError> {
    if id.is_empty() {
        return Err(AtomError::EmptyId);
    }
    out.write_all(ident::escape(id).as_bytes())?;
    out.write_all(&[0])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn list(feed: &str) -> Result<Vec<u8>, AtomError> {
        let mut out = Vec::new();
        list_entry_ids(feed.as_bytes(), &mut out)?;
        Ok(out)
    }

    #[test]
    fn ids_are_escaped_and_nul_terminated() {
        let out = list(
            "<feed><entry><id>https://example.com/a</id></entry>\
             <entry><id>b</id></entry></feed>",
        )
        .unwrap();
        assert_eq!(out, b"https:\\_\\_example.com\\_a\0b\0");
    }

    #[test]
    fn ids_outside_entries_are_ignored() {
        let out = list("<feed><id>feed-id</id><entry><id>x</id></entry></feed>").unwrap();
        assert_eq!(out, b"x\0");
    }

    #[test]
    fn empty_id_is_fatal() {
        // Both encodings of an empty element must fail the same way.
        for feed in [
            "<feed><entry><id></id></entry></feed>",
            "<feed><entry><id/></entry></feed>",
        ] {
            assert!(matches!(list(feed), Err(AtomError::EmptyId)), "{feed}");
        }
    }
}
