//! The RSS document state machine.
//!
//! Consumes tokenizer events, tracks which part of the document is open
//! (document root, channel, item), accumulates recognized field text in the
//! arena, skips unknown subtrees by depth counting, and hands completed
//! records to the renderer as their closing tag is seen.

use std::io::Write;
use std::mem;

use quick_xml::name::QName;

use super::render;
use super::TranscodeError;
use crate::arena::{Arena, FieldRef, StringView};

/// All optional metadata of one RSS `channel`, as arena views.
#[derive(Debug, Default)]
pub(crate) struct ChannelRecord {
    pub title: Option<StringView>,
    pub link: Option<StringView>,
    pub description: Option<StringView>,
    pub author: Option<StringView>,
    pub last_build_date: Option<StringView>,
    pub category: Option<StringView>,
    pub copyright: Option<StringView>,
    pub generator: Option<StringView>,
    pub managing_editor: Option<StringView>,
    pub pub_date: Option<StringView>,
}

/// All optional metadata of one RSS `item`, as arena views.
#[derive(Debug, Default)]
pub(crate) struct ItemRecord {
    pub title: Option<StringView>,
    pub link: Option<StringView>,
    pub description: Option<StringView>,
    pub author: Option<StringView>,
    pub category: Option<StringView>,
    pub guid: Option<StringView>,
    pub pub_date: Option<StringView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelField {
    Title,
    Link,
    Description,
    Author,
    LastBuildDate,
    Category,
    Copyright,
    Generator,
    ManagingEditor,
    PubDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemField {
    Title,
    Link,
    Description,
    Author,
    Category,
    Guid,
    PubDate,
}

/// Recognized channel field elements, by local name.
const CHANNEL_FIELDS: &[(&[u8], ChannelField)] = &[
    (b"title", ChannelField::Title),
    (b"link", ChannelField::Link),
    (b"description", ChannelField::Description),
    (b"author", ChannelField::Author),
    (b"lastBuildDate", ChannelField::LastBuildDate),
    (b"category", ChannelField::Category),
    (b"copyright", ChannelField::Copyright),
    (b"generator", ChannelField::Generator),
    (b"managingEditor", ChannelField::ManagingEditor),
    (b"pubDate", ChannelField::PubDate),
];

/// Recognized item field elements, by local name.
const ITEM_FIELDS: &[(&[u8], ItemField)] = &[
    (b"title", ItemField::Title),
    (b"link", ItemField::Link),
    (b"description", ItemField::Description),
    (b"author", ItemField::Author),
    (b"category", ItemField::Category),
    (b"guid", ItemField::Guid),
    (b"pubDate", ItemField::PubDate),
];

fn channel_field(local: &[u8]) -> Option<ChannelField> {
    CHANNEL_FIELDS
        .iter()
        .find(|(name, _)| *name == local)
        .map(|(_, field)| *field)
}

fn item_field(local: &[u8]) -> Option<ItemField> {
    ITEM_FIELDS
        .iter()
        .find(|(name, _)| *name == local)
        .map(|(_, field)| *field)
}

impl ChannelRecord {
    fn slot_mut(&mut self, field: ChannelField) -> &mut Option<StringView> {
        match field {
            ChannelField::Title => &mut self.title,
            ChannelField::Link => &mut self.link,
            ChannelField::Description => &mut self.description,
            ChannelField::Author => &mut self.author,
            ChannelField::LastBuildDate => &mut self.last_build_date,
            ChannelField::Category => &mut self.category,
            ChannelField::Copyright => &mut self.copyright,
            ChannelField::Generator => &mut self.generator,
            ChannelField::ManagingEditor => &mut self.managing_editor,
            ChannelField::PubDate => &mut self.pub_date,
        }
    }
}

impl ItemRecord {
    fn slot_mut(&mut self, field: ItemField) -> &mut Option<StringView> {
        match field {
            ItemField::Title => &mut self.title,
            ItemField::Link => &mut self.link,
            ItemField::Description => &mut self.description,
            ItemField::Author => &mut self.author,
            ItemField::Category => &mut self.category,
            ItemField::Guid => &mut self.guid,
            ItemField::PubDate => &mut self.pub_date,
        }
    }
}

/// Destination slot for the field currently accumulating text.
#[derive(Debug, Clone, Copy)]
enum FieldTarget {
    Channel(ChannelField),
    Item(ItemField),
}

/// The document part currently open, carrying its record where one exists.
///
/// Nesting is shallow and explicit; the only legal transitions are
/// `None → Root → {Channel, Item} → Root → None`.
#[derive(Debug)]
enum Scope {
    None,
    Root,
    Channel(ChannelRecord),
    Item(ItemRecord),
}

/// A recognized field element that has been opened but not yet closed.
///
/// The element name as written is kept for end-tag matching; the target
/// identifies the record slot the closed value will be stored in.
#[derive(Debug)]
struct OpenField {
    name: Vec<u8>,
    target: FieldTarget,
    text: FieldRef,
}

/// Event-driven RSS→Atom transcoder.
///
/// Owns the output stream, the arena, and all parse state for one document
/// run. Rendering is eager: the feed header is written when the channel
/// completes (or when the first nested item forces it out early) and each
/// entry is written at its `</item>`.
pub struct Transcoder<W: Write> {
    out: W,
    arena: Arena,
    scope: Scope,
    /// Set once the feed header has been written, so the nested-items
    /// document shape does not render the channel a second time at
    /// `</channel>`.
    channel_rendered: bool,
    open_field: Option<OpenField>,
    /// Depth inside an unrecognized subtree. While non-zero, all events are
    /// absorbed, so a recognized name nested in an unknown element cannot
    /// be mistaken for a real field.
    unknown_depth: usize,
}

impl<W: Write> Transcoder<W> {
    pub fn new(out: W, arena_capacity: usize) -> Self {
        Transcoder {
            out,
            arena: Arena::with_capacity(arena_capacity),
            scope: Scope::None,
            channel_rendered: false,
            open_field: None,
            unknown_depth: 0,
        }
    }

    /// Handles an element-start event.
    pub fn handle_start(&mut self, name: QName<'_>) -> Result<(), TranscodeError> {
        if self.unknown_depth > 0 {
            self.unknown_depth += 1;
            return Ok(());
        }
        if self.open_field.is_some() {
            // Nested field tags are not supported by the format; track the
            // subtree so the field's own end tag still matches up.
            self.skip_unknown(name);
            return Ok(());
        }

        let local = name.local_name();
        if local.as_ref() == b"item" {
            match mem::replace(&mut self.scope, Scope::Root) {
                Scope::Channel(channel) => {
                    // Items nested inside the channel: the feed header must
                    // be written before the first entry.
                    render::channel(&mut self.out, &channel, &self.arena)?;
                    self.channel_rendered = true;
                }
                Scope::Root => {}
                _ => return Err(TranscodeError::ItemOutsideRoot),
            }
            if !self.channel_rendered {
                return Err(TranscodeError::NoChannelBeforeItem);
            }
            self.arena.reset();
            self.scope = Scope::Item(ItemRecord::default());
        } else if local.as_ref() == b"channel" {
            if !matches!(self.scope, Scope::Root) {
                return Err(TranscodeError::ChannelOutsideRoot);
            }
            self.arena.reset();
            self.scope = Scope::Channel(ChannelRecord::default());
        } else if name.as_ref() == b"rss" || name.as_ref() == b"rdf:RDF" {
            if !matches!(self.scope, Scope::None) {
                return Err(TranscodeError::NestedRoot);
            }
            self.scope = Scope::Root;
            self.channel_rendered = false;
        } else {
            match &self.scope {
                Scope::Channel(_) => match channel_field(local.as_ref()) {
                    Some(field) => self.open_field(name, FieldTarget::Channel(field)),
                    None => self.skip_unknown(name),
                },
                Scope::Item(_) => match item_field(local.as_ref()) {
                    Some(field) => self.open_field(name, FieldTarget::Item(field)),
                    None => self.skip_unknown(name),
                },
                Scope::Root => self.skip_unknown(name),
                Scope::None => return Err(TranscodeError::ContentBeforeRoot),
            }
        }
        Ok(())
    }

    /// Handles an element-end event.
    pub fn handle_end(&mut self, name: QName<'_>) -> Result<(), TranscodeError> {
        if self.unknown_depth > 0 {
            self.unknown_depth -= 1;
            return Ok(());
        }

        if let Some(open) = self.open_field.take() {
            if open.name == name.as_ref() {
                let view = self.arena.close_field(open.text)?;
                // An element with no character data leaves its slot empty,
                // so the renderer's fallback chains still apply.
                if !view.is_empty() {
                    self.store(open.target, view);
                }
            } else {
                tracing::warn!(
                    tag = %String::from_utf8_lossy(name.as_ref()),
                    "unhandled end tag while reading a field"
                );
                self.open_field = Some(open);
            }
            return Ok(());
        }

        let local = name.local_name();
        if (name.as_ref() == b"rss" || name.as_ref() == b"rdf:RDF")
            && matches!(self.scope, Scope::Root)
        {
            self.out.write_all(b"</feed>\n")?;
            self.scope = Scope::None;
            self.channel_rendered = false;
        } else if local.as_ref() == b"channel"
            && (matches!(self.scope, Scope::Channel(_))
                || (matches!(self.scope, Scope::Root) && self.channel_rendered))
        {
            // In the sibling document shape this is the point where the
            // channel is complete; in the nested shape the header is
            // already out and must not be repeated. A `</channel>` with no
            // matching open falls through to the unhandled-end-tag warning.
            if let Scope::Channel(channel) = mem::replace(&mut self.scope, Scope::Root) {
                if !self.channel_rendered {
                    render::channel(&mut self.out, &channel, &self.arena)?;
                    self.channel_rendered = true;
                }
            }
        } else if local.as_ref() == b"item" && matches!(self.scope, Scope::Item(_)) {
            if let Scope::Item(item) = mem::replace(&mut self.scope, Scope::Root) {
                render::item(&mut self.out, &item, &self.arena)?;
            }
        } else {
            tracing::warn!(
                tag = %String::from_utf8_lossy(name.as_ref()),
                "unhandled end tag"
            );
        }
        Ok(())
    }

    /// Handles a character-data event. Text arrives in arbitrary chunks;
    /// each chunk is appended at the arena's running offset.
    pub fn handle_text(&mut self, text: &str) -> Result<(), TranscodeError> {
        if self.unknown_depth == 0 && self.open_field.is_some() {
            self.arena.append(text)?;
        }
        Ok(())
    }

    /// Called at end of input; the document must have closed back down to
    /// the initial state.
    pub fn finish(mut self) -> Result<(), TranscodeError> {
        if !matches!(self.scope, Scope::None) {
            return Err(TranscodeError::UnexpectedEof);
        }
        self.out.flush()?;
        Ok(())
    }

    fn open_field(&mut self, name: QName<'_>, target: FieldTarget) {
        self.open_field = Some(OpenField {
            name: name.as_ref().to_vec(),
            target,
            text: self.arena.open_field(),
        });
    }

    fn store(&mut self, target: FieldTarget, view: StringView) {
        match (target, &mut self.scope) {
            (FieldTarget::Channel(field), Scope::Channel(record)) => {
                *record.slot_mut(field) = Some(view);
            }
            (FieldTarget::Item(field), Scope::Item(record)) => {
                *record.slot_mut(field) = Some(view);
            }
            // A field can only be open while its record's scope is active.
            _ => debug_assert!(false, "field closed outside its record scope"),
        }
    }

    fn skip_unknown(&mut self, name: QName<'_>) {
        self.unknown_depth += 1;
        tracing::warn!(
            tag = %String::from_utf8_lossy(name.as_ref()),
            "unhandled tag"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_tables_cover_both_contexts() {
        assert_eq!(channel_field(b"managingEditor"), Some(ChannelField::ManagingEditor));
        assert_eq!(channel_field(b"guid"), None);
        assert_eq!(item_field(b"guid"), Some(ItemField::Guid));
        assert_eq!(item_field(b"lastBuildDate"), None);
    }

    #[test]
    fn unknown_names_are_not_fields() {
        assert_eq!(channel_field(b"ttl"), None);
        assert_eq!(item_field(b"enclosure"), None);
    }

    #[test]
    fn channel_close_without_open_warns_and_continues() {
        let mut out = Vec::new();
        let mut transcoder = Transcoder::new(&mut out, 1024);
        transcoder.handle_start(QName(b"rss")).unwrap();
        // A close with no matching open renders nothing and is not fatal.
        transcoder.handle_end(QName(b"channel")).unwrap();
        drop(transcoder);
        assert!(out.is_empty());
    }
}
