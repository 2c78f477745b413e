//! Inline `@path` mention scanning for chat input.
//!
//! Everything here is a pure function of the input text. Offsets are UTF-8
//! byte offsets; a caret that lands inside a multi-byte character is moved
//! back to the start of that character.
//!
//! Tokens start at an unescaped `@` and run until unescaped whitespace. Inside
//! a token `\ ` stands for a literal space, which is how paths with spaces are
//! written (see [`escape_path`]).

mod path;
mod scan;

use std::ops::Range;

pub use path::{escape_path, normalize_path, unescape_path};

/// The in-progress token under the caret, used to drive autocomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSegment {
    /// Offset of the `@`.
    pub start: usize,
    /// One past the last token character.
    pub end: usize,
    /// Unescaped text between the `@` and the caret.
    pub query: String,
    /// Raw token body between the `@` and `end`, escapes kept.
    pub full_segment: String,
}

impl TriggerSegment {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// A completed `@` token found in static text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTagSegment {
    /// Literal token text, `@` included.
    pub tag: String,
    pub start: usize,
    pub end: usize,
    /// Unescaped path after the `@`.
    pub path: String,
}

impl ParsedTagSegment {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Finds the `@` token the caret is inside of (or at the end of).
///
/// Returns `None` when unescaped whitespace sits between the caret and the
/// nearest unescaped `@`, or when there is no such `@` at all.
pub fn find_active_trigger_segment(text: &str, caret: usize) -> Option<TriggerSegment> {
    let caret = scan::floor_char_boundary(text, caret);
    let start = scan::trigger_start(text, caret)?;
    let body_start = start + scan::TRIGGER.len_utf8();
    let end = scan::token_end(text, body_start);

    Some(TriggerSegment {
        start,
        end,
        query: unescape_path(&text[body_start..caret]),
        full_segment: text[body_start..end].to_string(),
    })
}

/// Collects every non-empty `@` token in `text`, left to right.
pub fn extract_file_tags(text: &str) -> Vec<ParsedTagSegment> {
    let mut tags = Vec::new();
    let mut pos = 0;

    while let Some(ch) = text[pos..].chars().next() {
        if ch != scan::TRIGGER || scan::preceded_by_escape(text, pos) {
            pos += ch.len_utf8();
            continue;
        }

        let start = pos;
        let body_start = start + ch.len_utf8();
        let end = scan::token_end(text, body_start);
        if end > body_start {
            tags.push(ParsedTagSegment {
                tag: text[start..end].to_string(),
                start,
                end,
                path: unescape_path(&text[body_start..end]),
            });
        }
        pos = end;
    }

    tags
}

/// Replaces the body of the token at `range`, keeping its `@`.
///
/// The result is `text[..start + 1] + replacement + text[end..]`. Each offset
/// is clamped to `text` on its own, and `replacement` is inserted verbatim, so
/// callers should run it through [`escape_path`] first.
pub fn replace_segment(text: &str, range: Range<usize>, replacement: &str) -> String {
    let head_end = scan::floor_char_boundary(text, range.start.saturating_add(1));
    let tail_start = scan::floor_char_boundary(text, range.end);

    let mut out = String::with_capacity(head_end + replacement.len() + (text.len() - tail_start));
    out.push_str(&text[..head_end]);
    out.push_str(replacement);
    out.push_str(&text[tail_start..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_trigger_in_plain_text() {
        assert_eq!(find_active_trigger_segment("hello world", 5), None);
    }

    #[test]
    fn trigger_found_when_caret_inside_token() {
        let seg = find_active_trigger_segment("a @b c", 3).unwrap();
        assert_eq!(seg.start, 2);
        assert_eq!(seg.end, 4);
        assert_eq!(seg.query, "b");
        assert_eq!(seg.full_segment, "b");
    }

    #[test]
    fn whitespace_blocks_backward_scan() {
        assert_eq!(find_active_trigger_segment("a @b c", 5), None);
    }

    #[test]
    fn escaped_space_stays_inside_token() {
        let text = "@foo\\ bar";
        let seg = find_active_trigger_segment(text, 9).unwrap();
        assert_eq!(seg.start, 0);
        assert_eq!(seg.end, text.len());
        assert_eq!(seg.query, "foo bar");
        assert_eq!(seg.full_segment, "foo\\ bar");
    }

    #[test]
    fn caret_in_middle_of_token_truncates_query_only() {
        let text = "see @src/main.rs please";
        let seg = find_active_trigger_segment(text, 8).unwrap();
        assert_eq!(seg.start, 4);
        assert_eq!(seg.end, 16);
        assert_eq!(seg.query, "src");
        assert_eq!(seg.full_segment, "src/main.rs");
    }

    #[test]
    fn caret_right_after_trigger_gives_empty_query() {
        let seg = find_active_trigger_segment("hi @", 4).unwrap();
        assert_eq!(seg.range(), 3..4);
        assert_eq!(seg.query, "");
        assert_eq!(seg.full_segment, "");
    }

    #[test]
    fn caret_is_clamped() {
        let seg = find_active_trigger_segment("@abc", 100).unwrap();
        assert_eq!(seg.start, 0);
        assert_eq!(seg.query, "abc");
        assert_eq!(find_active_trigger_segment("@abc", 0), None);
        assert_eq!(find_active_trigger_segment("", 3), None);
    }

    #[test]
    fn escaped_trigger_is_not_a_trigger() {
        assert_eq!(find_active_trigger_segment("mail\\@host", 10), None);
    }

    #[test]
    fn caret_inside_multibyte_char_snaps_back() {
        let text = "@é";
        // Offset 2 is inside `é`.
        let seg = find_active_trigger_segment(text, 2).unwrap();
        assert_eq!(seg.query, "");
        assert_eq!(seg.full_segment, "é");
    }

    #[test]
    fn extraction_skips_empty_tags() {
        assert!(extract_file_tags("ping @ everyone").is_empty());
        assert!(extract_file_tags("@").is_empty());
        assert!(extract_file_tags("").is_empty());
    }

    #[test]
    fn extraction_finds_multiple_tags_in_order() {
        let tags = extract_file_tags("@a/b.txt and @c/d.txt");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].path, "a/b.txt");
        assert_eq!(tags[0].tag, "@a/b.txt");
        assert_eq!(tags[0].range(), 0..8);
        assert_eq!(tags[1].path, "c/d.txt");
        assert_eq!(tags[1].range(), 13..21);
    }

    #[test]
    fn extraction_unescapes_paths() {
        let tags = extract_file_tags("read @my\\ notes/todo.md now");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].tag, "@my\\ notes/todo.md");
        assert_eq!(tags[0].path, "my notes/todo.md");
    }

    #[test]
    fn extraction_does_not_split_on_inner_trigger() {
        let tags = extract_file_tags("@a@b c");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].path, "a@b");
    }

    #[test]
    fn extraction_ignores_escaped_trigger() {
        let tags = extract_file_tags("user\\@host and @x");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].path, "x");
    }

    #[test]
    fn extraction_handles_trailing_escape() {
        let tags = extract_file_tags("@dir\\");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].path, "dir\\");
        assert_eq!(tags[0].end, 5);
    }

    #[test]
    fn replacement_preserves_trigger() {
        assert_eq!(replace_segment("@fo", 0..3, "foo.txt"), "@foo.txt");
    }

    #[test]
    fn replacement_keeps_surrounding_text() {
        let text = "open @sr now";
        let seg = find_active_trigger_segment(text, 8).unwrap();
        let out = replace_segment(text, seg.range(), &escape_path("src/my file.rs"));
        assert_eq!(out, "open @src/my\\ file.rs now");
    }

    #[test]
    fn replacement_clamps_bad_ranges() {
        assert_eq!(replace_segment("@ab", 0..50, "x"), "@x");
        assert_eq!(replace_segment("@ab", 0..0, "x"), "@x@ab");
        assert_eq!(replace_segment("a@bc", 1..2, "Z"), "a@Zc");
        assert_eq!(replace_segment("", 0..1, "x"), "x");
    }
}
