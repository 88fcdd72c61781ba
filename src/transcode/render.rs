//! Atom fragment rendering.
//!
//! Pure with respect to parsing: each function takes a fully populated
//! record plus the arena its views point into and prints Atom XML. Fallback
//! policy for absent fields lives here, not in the state machine.
//!
//! Date values are passed through as-is. RSS uses RFC-822 dates and Atom
//! expects ISO-8601; converting between them is out of scope, so a missing
//! date renders as a fixed placeholder instead.

use std::io::Write;

use super::escape::{escape_attribute, escape_content};
use super::state::{ChannelRecord, ItemRecord};
use super::TranscodeError;
use crate::arena::{Arena, StringView};

const FALLBACK_AUTHOR: &str = "Unknown Author";
const FALLBACK_UPDATED: &str = "placeholder date/time";

fn resolve(arena: &Arena, view: Option<StringView>) -> Result<Option<&str>, TranscodeError> {
    match view {
        Some(view) => Ok(Some(arena.resolve(view)?)),
        None => Ok(None),
    }
}

fn write_id<W: Write>(out: &mut W, id: &str) -> std::io::Result<()> {
    // No attempt is made at the Atom spec's id normalization strategy.
    writeln!(out, "\t\t<id>{}</id>", escape_content(id))
}

fn write_link<W: Write>(out: &mut W, link: &str) -> std::io::Result<()> {
    writeln!(out, "\t\t<link href=\"{}\"></link>", escape_attribute(link))
}

fn write_author<W: Write>(out: &mut W, author: &str) -> std::io::Result<()> {
    writeln!(
        out,
        "\t\t<author><name>{}</name></author>",
        escape_content(author)
    )
}

fn write_updated<W: Write>(out: &mut W, updated: Option<&str>) -> std::io::Result<()> {
    writeln!(
        out,
        "\t\t<updated>{}</updated>",
        escape_content(updated.unwrap_or(FALLBACK_UPDATED))
    )
}

fn write_category<W: Write>(out: &mut W, category: Option<&str>) -> std::io::Result<()> {
    if let Some(category) = category {
        writeln!(
            out,
            "\t\t<category term=\"{}\"></category>",
            escape_attribute(category)
        )?;
    }
    Ok(())
}

/// Writes the Atom feed header derived from a channel record.
///
/// A channel without a title cannot be transcoded. A channel without a link
/// falls back to the title for both id and link, with a diagnostic; the
/// author chain is author, then managingEditor, then a placeholder.
pub(crate) fn channel<W: Write>(
    out: &mut W,
    channel: &ChannelRecord,
    arena: &Arena,
) -> Result<(), TranscodeError> {
    let title = resolve(arena, channel.title)?.ok_or(TranscodeError::NoChannelTitle)?;

    writeln!(out, "<feed xmlns=\"http://www.w3.org/2005/Atom\">")?;
    writeln!(out, "\t\t<title>{}</title>", escape_content(title))?;

    if let Some(description) = resolve(arena, channel.description)? {
        writeln!(
            out,
            "\t\t<subtitle>\n{}\n\t\t</subtitle>",
            escape_content(description)
        )?;
    }

    // Not all feeds carry a link despite the RSS spec requiring one.
    let id = match resolve(arena, channel.link)? {
        Some(link) => link,
        None => {
            tracing::warn!("malformed feed: no channel link");
            title
        }
    };
    write_id(out, id)?;
    write_link(out, id)?;

    let author = resolve(arena, channel.author)?
        .or(resolve(arena, channel.managing_editor)?)
        .unwrap_or(FALLBACK_AUTHOR);
    write_author(out, author)?;

    let updated = resolve(arena, channel.pub_date)?.or(resolve(arena, channel.last_build_date)?);
    write_updated(out, updated)?;

    write_category(out, resolve(arena, channel.category)?)?;

    if let Some(copyright) = resolve(arena, channel.copyright)? {
        writeln!(out, "\t\t<rights>{}</rights>", escape_content(copyright))?;
    }

    if let Some(generator) = resolve(arena, channel.generator)? {
        writeln!(out, "\t\t<generator>{}</generator>", escape_content(generator))?;
    }

    Ok(())
}

/// Writes one Atom entry derived from an item record.
///
/// Identity falls back from link to guid (with a diagnostic; a guid is not
/// technically a valid href) and finally to the title.
pub(crate) fn item<W: Write>(
    out: &mut W,
    item: &ItemRecord,
    arena: &Arena,
) -> Result<(), TranscodeError> {
    let title = resolve(arena, item.title)?.ok_or(TranscodeError::NoItemTitle)?;

    writeln!(out, "\t<entry>")?;
    writeln!(out, "\t\t<title>{}</title>", escape_content(title))?;

    if let Some(description) = resolve(arena, item.description)? {
        writeln!(
            out,
            "\t\t<content>\n{}\n\t\t</content>",
            escape_content(description)
        )?;
    }

    let id = match resolve(arena, item.link)? {
        Some(link) => Some(link),
        None => {
            tracing::warn!("malformed feed: no item link");
            resolve(arena, item.guid)?
        }
    };
    let id = match id {
        Some(id) => id,
        None => title,
    };
    write_id(out, id)?;
    write_link(out, id)?;

    let author = resolve(arena, item.author)?.unwrap_or(FALLBACK_AUTHOR);
    write_author(out, author)?;

    write_updated(out, resolve(arena, item.pub_date)?)?;

    write_category(out, resolve(arena, item.category)?)?;

    writeln!(out, "\t</entry>")?;
    Ok(())
}
