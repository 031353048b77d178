//! Filesystem-safe names for files and album directories.

use crate::media::DEFAULT_ALBUM_NAME;

/// Characters reserved on common filesystems.
const ILLEGAL_CHARS: &[char] = &['/', '<', '>', ':', '"', '\\', '|', '?', '*'];

/// Replacement for every illegal or control character.
const SEPARATOR: char = '_';

/// Sanitizes a candidate name for use as a file stem or directory name.
///
/// Reserved characters (`/ < > : " \ | ? *`) and control characters become
/// `_`, trailing dots and whitespace are removed, leading whitespace is
/// trimmed. A name that ends up empty becomes `_`.
///
/// The transform is idempotent: `sanitize(&sanitize(x)) == sanitize(x)`.
#[must_use]
pub fn sanitize(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if ILLEGAL_CHARS.contains(&c) || c.is_control() {
                SEPARATOR
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
        .trim_start();

    if trimmed.is_empty() {
        SEPARATOR.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Directory name for an album title, falling back to [`DEFAULT_ALBUM_NAME`]
/// when the title is blank.
#[must_use]
pub fn album_dir_name(title: &str) -> String {
    if title.trim().is_empty() {
        DEFAULT_ALBUM_NAME.to_string()
    } else {
        sanitize(title)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_reserved_characters() {
        assert_eq!(sanitize(r#"a/b<c>d:e"f\g|h?i*j"#), "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn test_sanitize_replaces_control_characters() {
        assert_eq!(sanitize("line\nbreak\ttab"), "line_break_tab");
    }

    #[test]
    fn test_sanitize_strips_trailing_dots_and_whitespace() {
        assert_eq!(sanitize("album name. . "), "album name");
        assert_eq!(sanitize("  padded  "), "padded");
    }

    #[test]
    fn test_sanitize_keeps_inner_dots() {
        assert_eq!(sanitize("v1.2 release"), "v1.2 release");
    }

    #[test]
    fn test_sanitize_empty_becomes_separator() {
        assert_eq!(sanitize(""), "_");
        assert_eq!(sanitize(" ... "), "_");
        assert_eq!(sanitize(".."), "_");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let samples = [
            "plain",
            "a/b:c",
            "trailing...",
            " lead",
            "mixed\u{0007} ?. ",
            "",
            "ünïcødé *name*",
        ];
        for sample in samples {
            let once = sanitize(sample);
            assert_eq!(sanitize(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_sanitize_output_has_no_illegal_or_trailing_chars() {
        let out = sanitize("x<y>\u{0000}z. ");
        assert!(!out.chars().any(|c| ILLEGAL_CHARS.contains(&c) || c.is_control()));
        assert!(!out.ends_with('.'));
        assert!(!out.ends_with(char::is_whitespace));
    }

    #[test]
    fn test_album_dir_name_blank_title_uses_default() {
        assert_eq!(album_dir_name("   "), DEFAULT_ALBUM_NAME);
        assert_eq!(album_dir_name("My: Album"), "My_ Album");
    }
}
