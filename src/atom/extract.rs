//! Entry-field extraction from a streamed Atom entry document.
//!
//! Captures the text of `title`, `content`, and `updated` and the `href`
//! of the alternate `link`, for export into a child process environment.
//! If a tag occurs more than once the last value wins.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Decoder;
use quick_xml::Reader;

use super::AtomError;

/// The extracted values. Absent tags stay `None` so the caller can leave
/// the corresponding environment variables untouched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EntryFields {
    pub title: Option<String>,
    pub link: Option<String>,
    pub content: Option<String>,
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Tag {
    Title,
    Link,
    Content,
    Updated,
}

impl Tag {
    fn slot<'a>(self, fields: &'a mut EntryFields) -> &'a mut Option<String> {
        match self {
            Tag::Title => &mut fields.title,
            Tag::Link => &mut fields.link,
            Tag::Content => &mut fields.content,
            Tag::Updated => &mut fields.updated,
        }
    }
}

/// Reads one Atom entry document and returns its recognized fields.
///
/// Any element opening while a recognized tag is still capturing is fatal;
/// the format is flat and nesting means the document is not the simple
/// entry shape this reader supports.
pub fn extract_entry_fields<R: BufRead>(input: R) -> Result<EntryFields, AtomError> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut fields = EntryFields::default();
    let mut open: Option<Tag> = None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                handle_start(&e, reader.decoder(), reader.buffer_position(), &mut open, &mut text)?;
            }
            Ok(Event::Empty(e)) => {
                handle_start(&e, reader.decoder(), reader.buffer_position(), &mut open, &mut text)?;
                handle_end(&mut open, &mut text, &mut fields);
            }
            Ok(Event::End(_)) => handle_end(&mut open, &mut text, &mut fields),
            Ok(Event::Text(e)) if open.is_some() => {
                let chunk = e.unescape().map_err(|source| AtomError::Xml {
                    position: reader.buffer_position(),
                    source,
                })?;
                text.push_str(&chunk);
            }
            Ok(Event::CData(e)) if open.is_some() => {
                let chunk = e.decode().map_err(|source| AtomError::Xml {
                    position: reader.buffer_position(),
                    source: source.into(),
                })?;
                text.push_str(&chunk);
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

    Ok(fields)
}

fn handle_start(
    e: &BytesStart<'_>,
    decoder: Decoder,
    position: u64,
    open: &mut Option<Tag>,
    text: &mut String,
) -> Result<(), AtomError> {
    if open.is_some() {
        return Err(AtomError::NestedTag(qname_string(e.name())));
    }
    text.clear();

    match e.name().local_name().as_ref() {
        b"title" => *open = Some(Tag::Title),
        b"content" => *open = Some(Tag::Content),
        b"updated" => *open = Some(Tag::Updated),
        b"link" => {
            let mut href = None;
            let mut rel = None;
            for attr in e.attributes() {
                let attr = match attr {
                    Ok(attr) => attr,
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping malformed link attribute");
                        continue;
                    }
                };
                let value = attr
                    .decode_and_unescape_value(decoder)
                    .map_err(|source| AtomError::Xml { position, source })?;
                match attr.key.local_name().as_ref() {
                    b"href" => href = Some(value.into_owned()),
                    b"rel" => rel = Some(value.into_owned()),
                    _ => {}
                }
            }
            match href {
                // Keep processing with no captured value; the child simply
                // sees no LINK.
                None => tracing::warn!("malformed feed: link with no href"),
                Some(href) => {
                    // An absent rel means rel="alternate" per the Atom spec;
                    // any other rel is a related resource (comments feed or
                    // similar) and is skipped.
                    if rel.as_deref().map_or(true, |rel| rel == "alternate") {
                        *open = Some(Tag::Link);
                        // The link value lives in the attribute, not in
                        // character data.
                        *text = href;
                    }
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn handle_end(open: &mut Option<Tag>, text: &mut String, fields: &mut EntryFields) {
    if let Some(tag) = open.take() {
        *tag.slot(fields) = Some(std::mem::take(text));
    }
}

fn qname_string(name: QName<'_>) -> String {
    String::from_utf8_lossy(name.as_ref()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn captures_all_four_fields() {
        let fields = extract_entry_fields(
            "<entry><title>T</title>\
             <link href=\"https://example.com/p\"/>\
             <content>body &amp; more</content>\
             <updated>2026-01-01T00:00:00Z</updated></entry>"
                .as_bytes(),
        )
        .unwrap();
        assert_eq!(fields.title.as_deref(), Some("T"));
        assert_eq!(fields.link.as_deref(), Some("https://example.com/p"));
        assert_eq!(fields.content.as_deref(), Some("body & more"));
        assert_eq!(fields.updated.as_deref(), Some("2026-01-01T00:00:00Z"));
    }

    #[test]
    fn non_alternate_links_are_skipped() {
        let fields = extract_entry_fields(
            "<entry>\
             <link rel=\"self\" href=\"https://example.com/comments\"/>\
             <link href=\"https://example.com/p\"/>\
             </entry>"
                .as_bytes(),
        )
        .unwrap();
        assert_eq!(fields.link.as_deref(), Some("https://example.com/p"));
    }

    #[test]
    fn link_without_href_is_reported_not_fatal() {
        let fields = extract_entry_fields("<entry><link rel=\"alternate\"/></entry>".as_bytes())
            .unwrap();
        assert_eq!(fields.link, None);
    }

    #[test]
    fn last_occurrence_wins() {
        let fields = extract_entry_fields(
            "<entry><title>first</title><title>second</title></entry>".as_bytes(),
        )
        .unwrap();
        assert_eq!(fields.title.as_deref(), Some("second"));
    }

    #[test]
    fn nesting_inside_a_captured_tag_is_fatal() {
        let err = extract_entry_fields("<entry><title>a<b/>c</title></entry>".as_bytes())
            .unwrap_err();
        assert!(matches!(err, AtomError::NestedTag(tag) if tag == "b"));
    }

    #[test]
    fn unrecognized_tags_are_ignored() {
        let fields =
            extract_entry_fields("<entry><summary>s</summary><title>T</title></entry>".as_bytes())
                .unwrap();
        assert_eq!(fields.title.as_deref(), Some("T"));
    }
}
