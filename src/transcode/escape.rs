//! Context-sensitive XML escaping for the rendered Atom output.
//!
//! Element content and attribute values have different escaping rules:
//! content needs `&`, `<`, `>` and carriage return handled, attribute
//! values additionally tab, line feed, and the quote delimiter.

use std::borrow::Cow;

/// Escapes text for an element-content position.
///
/// Returns `Cow::Borrowed` when the input needs no escaping (the common
/// case), avoiding an allocation per field.
pub fn escape_content(s: &str) -> Cow<'_, str> {
    if !s
        .bytes()
        .any(|b| matches!(b, b'&' | b'<' | b'>' | b'\r'))
    {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Escapes text for an attribute-value position (delimited by `"`).
///
/// Tab and line feed must be escaped here as well, or a conformant parser
/// would normalize them to spaces on read-back.
pub fn escape_attribute(s: &str) -> Cow<'_, str> {
    if !s
        .bytes()
        .any(|b| matches!(b, b'&' | b'<' | b'>' | b'\r' | b'\t' | b'\n' | b'"'))
    {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn content_passes_clean_text_through_borrowed() {
        let escaped = escape_content("plain text");
        assert!(matches!(escaped, Cow::Borrowed(_)));
        assert_eq!(escaped, "plain text");
    }

    #[test]
    fn content_escapes_markup_and_carriage_return() {
        assert_eq!(
            escape_content("a & b <c> d\re"),
            "a &amp; b &lt;c&gt; d&#xD;e"
        );
    }

    #[test]
    fn content_leaves_tab_and_newline_raw() {
        assert_eq!(escape_content("a\tb\nc"), "a\tb\nc");
    }

    #[test]
    fn attribute_escapes_whitespace_and_quotes() {
        assert_eq!(
            escape_attribute("a\tb\nc\"d"),
            "a&#x9;b&#xA;c&quot;d"
        );
    }

    mod round_trip {
        use super::*;
        use quick_xml::events::Event;
        use quick_xml::Reader;
        use proptest::prelude::*;

        /// Renders the escaped text inside an element and parses it back
        /// with quick-xml, which must yield the original string.
        fn parse_back_content(original: &str) -> String {
            let doc = format!("<x>{}</x>", escape_content(original));
            let mut reader = Reader::from_str(&doc);
            let mut text = String::new();
            loop {
                match reader.read_event().unwrap() {
                    Event::Text(e) => text.push_str(&e.unescape().unwrap()),
                    Event::Eof => break,
                    _ => {}
                }
            }
            text
        }

        fn parse_back_attribute(original: &str) -> String {
            let doc = format!("<x a=\"{}\"/>", escape_attribute(original));
            let mut reader = Reader::from_str(&doc);
            loop {
                if let Event::Empty(e) = reader.read_event().unwrap() {
                    let attr = e.attributes().next().unwrap().unwrap();
                    return attr
                        .decode_and_unescape_value(reader.decoder())
                        .unwrap()
                        .into_owned();
                }
            }
        }

        proptest! {
            #[test]
            fn content_round_trips(s in "[ -~\r]{0,64}") {
                prop_assert_eq!(parse_back_content(&s), s);
            }

            #[test]
            fn attribute_round_trips(s in "[ -~\t\n\r]{0,64}") {
                prop_assert_eq!(parse_back_attribute(&s), s);
            }
        }
    }
}
