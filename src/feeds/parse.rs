//! Fetched-feed parsing into database entries.
//!
//! Autodetects RSS vs Atom from the root element and extracts the fields
//! the database stores. Nothing in here is fatal: a malformed feed yields
//! whatever entries were parsed before the damage, and the merge keeps
//! what the database already has.

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Decoder;
use quick_xml::Reader;
use url::Url;

use crate::db::{sanitize, Entry};

/// Parses one fetched feed document into entries for `feed_name`.
pub fn parse_feed(input: &[u8], feed_name: &str) -> Vec<Entry> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().local_name().as_ref() {
                b"rss" | b"RDF" => return parse_rss(reader, feed_name),
                b"feed" => return parse_atom(reader, feed_name),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    position = reader.error_position(),
                    "malformed feed"
                );
                return Vec::new();
            }
            Ok(_) => {}
        }
        buf.clear();
    }
    tracing::warn!("neither an RSS nor an Atom feed");
    Vec::new()
}

/// RSS publication dates are optional and frequently not proper RFC 2822.
/// Anything unusable falls back to the fetch time, so the entry still
/// sorts near where it appeared.
fn normalize_pub_date(pub_date: Option<String>) -> String {
    if let Some(pub_date) = pub_date {
        // Some feeds write UTC where RFC 2822 wants UT or GMT.
        let fixed = pub_date.replace("UTC", "GMT");
        if let Ok(updated) = DateTime::parse_from_rfc2822(&fixed) {
            return updated.to_rfc3339();
        }
    }
    Utc::now().to_rfc3339()
}

#[derive(Default)]
struct RssItems {
    pending: Option<String>,
    id: Option<String>,
    title: Option<String>,
    pub_date: Option<String>,
    link: Option<String>,
    entries: Vec<Entry>,
}

impl RssItems {
    fn start(&mut self, local: &[u8]) {
        self.pending = None;
        if local == b"item" {
            self.id = None;
            self.title = None;
            self.pub_date = None;
            self.link = None;
        }
    }

    fn end(&mut self, local: &[u8], feed_name: &str) {
        match local {
            b"guid" => self.id = self.pending.take(),
            b"title" => self.title = self.pending.take(),
            b"pubDate" => self.pub_date = self.pending.take(),
            b"link" => self.link = self.pending.take(),
            b"item" => self.finish_item(feed_name),
            _ => {}
        }
    }

    fn finish_item(&mut self, feed_name: &str) {
        let Some(link) = self.link.take() else {
            tracing::warn!("ignoring incomplete entry, missing link");
            return;
        };
        // A guid is optional; the link stands in as the identity.
        let id = self.id.take().unwrap_or_else(|| link.clone());
        let title = self.title.take().unwrap_or_else(|| "Untitled".to_string());
        self.entries.push(Entry {
            feed: feed_name.to_string(),
            id,
            title,
            updated: normalize_pub_date(self.pub_date.take()),
            link,
            read: false,
        });
    }
}

fn parse_rss(mut reader: Reader<&[u8]>, feed_name: &str) -> Vec<Entry> {
    let mut buf = Vec::new();
    let mut items = RssItems::default();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => items.start(e.name().local_name().as_ref()),
            Ok(Event::Empty(e)) => {
                // A self-closing element opens and closes in one event.
                let name = e.name();
                let local = name.local_name();
                items.start(local.as_ref());
                items.end(local.as_ref(), feed_name);
            }
            Ok(Event::End(e)) => items.end(e.name().local_name().as_ref(), feed_name),
            Ok(Event::Text(e)) => match e.unescape() {
                Ok(text) => items.pending = Some(sanitize(&text)),
                Err(err) => {
                    tracing::warn!(error = %err, "malformed feed");
                    break;
                }
            },
            Ok(Event::CData(e)) => match e.decode() {
                Ok(text) => items.pending = Some(sanitize(&text)),
                Err(err) => {
                    tracing::warn!(error = %err, "malformed feed");
                    break;
                }
            },
            Ok(Event::Eof) => break,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    position = reader.error_position(),
                    "malformed feed"
                );
                break;
            }
            Ok(_) => {}
        }
        buf.clear();
    }
    items.entries
}

#[derive(Default)]
struct AtomEntries {
    pending: Option<String>,
    id: Option<String>,
    title: Option<String>,
    updated: Option<String>,
    link: Option<String>,
    entries: Vec<Entry>,
}

impl AtomEntries {
    fn start(&mut self, e: &BytesStart<'_>, decoder: Decoder) {
        self.pending = None;
        match e.name().local_name().as_ref() {
            b"link" => self.capture_link(e, decoder),
            b"entry" => {
                self.id = None;
                self.title = None;
                self.updated = None;
                self.link = None;
            }
            _ => {}
        }
    }

    fn capture_link(&mut self, e: &BytesStart<'_>, decoder: Decoder) {
        for attr in e.attributes() {
            let attr = match attr {
                Ok(attr) => attr,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping malformed link attribute");
                    continue;
                }
            };
            if attr.key.local_name().as_ref() != b"href" {
                continue;
            }
            let value = match attr.decode_and_unescape_value(decoder) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping malformed link attribute");
                    continue;
                }
            };
            let href = sanitize(&value);
            match Url::parse(&href) {
                Ok(_) => self.link = Some(href),
                Err(err) => tracing::warn!(error = %err, "ignoring invalid URL"),
            }
        }
    }

    fn end(&mut self, local: &[u8], feed_name: &str) {
        match local {
            b"id" => self.id = self.pending.take(),
            b"title" => self.title = self.pending.take(),
            b"updated" => self.updated = self.pending.take(),
            b"entry" => self.finish_entry(feed_name),
            _ => {}
        }
    }

    fn finish_entry(&mut self, feed_name: &str) {
        let taken = (
            self.id.take(),
            self.title.take(),
            self.updated.take(),
            self.link.take(),
        );
        match taken {
            (Some(id), Some(title), Some(updated), Some(link)) => self.entries.push(Entry {
                feed: feed_name.to_string(),
                id,
                title,
                updated,
                link,
                read: false,
            }),
            (None, ..) => tracing::warn!("ignoring incomplete entry, missing id"),
            (Some(id), None, ..) => tracing::warn!(%id, "ignoring entry, missing title"),
            (_, _, None, _) => tracing::warn!("ignoring incomplete entry, missing updated"),
            (_, _, _, None) => tracing::warn!("ignoring incomplete entry, missing link"),
        }
    }
}

fn parse_atom(mut reader: Reader<&[u8]>, feed_name: &str) -> Vec<Entry> {
    let mut buf = Vec::new();
    let mut atom = AtomEntries::default();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => atom.start(&e, reader.decoder()),
            Ok(Event::Empty(e)) => {
                atom.start(&e, reader.decoder());
                atom.end(e.name().local_name().as_ref(), feed_name);
            }
            Ok(Event::End(e)) => atom.end(e.name().local_name().as_ref(), feed_name),
            Ok(Event::Text(e)) => match e.unescape() {
                Ok(text) => atom.pending = Some(sanitize(&text)),
                Err(err) => {
                    tracing::warn!(error = %err, "malformed feed");
                    break;
                }
            },
            Ok(Event::CData(e)) => match e.decode() {
                Ok(text) => atom.pending = Some(sanitize(&text)),
                Err(err) => {
                    tracing::warn!(error = %err, "malformed feed");
                    break;
                }
            },
            Ok(Event::Eof) => break,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    position = reader.error_position(),
                    "malformed feed"
                );
                break;
            }
            Ok(_) => {}
        }
        buf.clear();
    }
    atom.entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rss_items_become_entries() {
        let entries = parse_feed(
            b"<rss><channel><title>Feed</title>\
              <item><guid>g1</guid><title>One</title>\
              <pubDate>Thu, 01 Jan 2026 00:00:00 GMT</pubDate>\
              <link>https://example.com/1</link></item>\
              </channel></rss>",
            "news",
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].feed, "news");
        assert_eq!(entries[0].id, "g1");
        assert_eq!(entries[0].title, "One");
        assert_eq!(entries[0].link, "https://example.com/1");
        assert_eq!(entries[0].updated, "2026-01-01T00:00:00+00:00");
        assert!(!entries[0].read);
    }

    #[test]
    fn rss_fallbacks_for_guid_and_title() {
        let entries = parse_feed(
            b"<rss><channel>\
              <item><link>https://example.com/1</link></item>\
              </channel></rss>",
            "news",
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "https://example.com/1");
        assert_eq!(entries[0].title, "Untitled");
    }

    #[test]
    fn rss_item_without_link_is_dropped() {
        let entries = parse_feed(
            b"<rss><channel><item><title>no link</title></item>\
              <item><link>https://example.com/2</link></item>\
              </channel></rss>",
            "news",
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "https://example.com/2");
    }

    #[test]
    fn unparseable_pub_date_falls_back_to_now() {
        let entries = parse_feed(
            b"<rss><channel><item><pubDate>yesterday-ish</pubDate>\
              <link>https://example.com/1</link></item></channel></rss>",
            "news",
        );
        assert!(DateTime::parse_from_rfc3339(&entries[0].updated).is_ok());
    }

    #[test]
    fn utc_suffix_is_tolerated() {
        assert_eq!(
            normalize_pub_date(Some("Thu, 01 Jan 2026 12:00:00 UTC".to_string())),
            "2026-01-01T12:00:00+00:00"
        );
    }

    #[test]
    fn atom_entries_become_entries() {
        let entries = parse_feed(
            b"<feed><entry><id>a1</id><title>One</title>\
              <updated>2026-01-01T00:00:00Z</updated>\
              <link href=\"https://example.com/1\"/></entry></feed>",
            "blog",
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "a1");
        assert_eq!(entries[0].updated, "2026-01-01T00:00:00Z");
        assert_eq!(entries[0].link, "https://example.com/1");
    }

    #[test]
    fn atom_incomplete_entries_are_dropped() {
        let entries = parse_feed(
            b"<feed><entry><id>a1</id><title>no updated or link</title></entry>\
              <entry><id>a2</id><title>Two</title>\
              <updated>2026-01-01T00:00:00Z</updated>\
              <link href=\"https://example.com/2\"/></entry></feed>",
            "blog",
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "a2");
    }

    #[test]
    fn atom_invalid_link_url_is_ignored() {
        let entries = parse_feed(
            b"<feed><entry><id>a1</id><title>One</title>\
              <updated>2026-01-01T00:00:00Z</updated>\
              <link href=\"not a url\"/></entry></feed>",
            "blog",
        );
        assert!(entries.is_empty());
    }

    #[test]
    fn control_characters_are_stripped_from_values() {
        let entries = parse_feed(
            b"<rss><channel><item><title><![CDATA[a\tb\nc]]></title>\
              <link>https://example.com/1</link></item></channel></rss>",
            "news",
        );
        assert_eq!(entries[0].title, "abc");
    }

    #[test]
    fn unrecognized_documents_parse_to_nothing() {
        assert!(parse_feed(b"<html><body/></html>", "news").is_empty());
        assert!(parse_feed(b"not xml at all", "news").is_empty());
    }
}
