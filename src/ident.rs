//! Filesystem-safe escaping of entry ids.
//!
//! Entry ids are arbitrary IRIs but get used as file names, so the
//! characters a UNIX filesystem cannot represent are escaped with a small
//! substitution table: `\` → `\\`, NUL → `\0`, `/` → `\_`, newline → `\n`,
//! and a leading `.` gains a `\` prefix so an id can never collapse to `.`
//! or `..`. [`unescape`] inverts the table exactly.

/// Escapes an id for use as a UNIX file name.
pub fn escape(id: &str) -> String {
    let mut out = String::with_capacity(id.len() + 2);
    if id.starts_with('.') {
        out.push('\\');
    }
    for c in id.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\0' => out.push_str("\\0"),
            '/' => out.push_str("\\_"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

/// Unescapes an id escaped by [`escape`].
///
/// An unknown escape sequence keeps the escaped character as-is; a trailing
/// lone backslash is dropped.
pub fn unescape(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    let mut escaped = false;
    for c in id.chars() {
        if !escaped && c == '\\' {
            escaped = true;
            continue;
        }
        out.push(match (escaped, c) {
            (true, '0') => '\0',
            (true, '_') => '/',
            (true, 'n') => '\n',
            // Covers `\.`, `\\`, and any unknown escape
            (_, c) => c,
        });
        escaped = false;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn plain_ids_pass_through() {
        assert_eq!(escape("https:example.com-post-1"), "https:example.com-post-1");
    }

    #[test]
    fn slashes_become_underscores() {
        assert_eq!(escape("https://example.com/post"), "https:\\_\\_example.com\\_post");
        assert_eq!(unescape("https:\\_\\_example.com\\_post"), "https://example.com/post");
    }

    #[test]
    fn leading_dot_is_protected() {
        assert_eq!(escape("."), "\\.");
        assert_eq!(escape(".."), "\\..");
        assert_eq!(escape(".hidden"), "\\.hidden");
        // Only the first character needs protection
        assert_eq!(escape("a.b"), "a.b");
        assert_eq!(unescape("\\.."), "..");
    }

    #[test]
    fn backslash_newline_and_nul_round_trip() {
        assert_eq!(unescape(&escape("a\\b")), "a\\b");
        assert_eq!(unescape(&escape("a\nb")), "a\nb");
        assert_eq!(unescape(&escape("a\0b")), "a\0b");
    }

    #[test]
    fn unknown_escape_keeps_the_character() {
        assert_eq!(unescape("a\\xb"), "axb");
    }

    proptest! {
        #[test]
        fn escape_then_unescape_is_identity(id in "\\PC{0,64}") {
            prop_assert_eq!(unescape(&escape(&id)), id);
        }

        #[test]
        fn escaped_ids_are_filesystem_safe(id in "\\PC{0,64}") {
            let escaped = escape(&id);
            prop_assert!(!escaped.contains('/'));
            prop_assert!(!escaped.contains('\0'));
            prop_assert!(escaped != "." && escaped != "..");
        }
    }
}
