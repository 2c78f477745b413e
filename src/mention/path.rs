use super::scan::ESCAPE;

/// Canonical relative form used to compare a tag against known attachments.
///
/// `./src/**` → `src`, `/abs/path/` → `abs/path`, `a\b` → `a/b`.
pub fn normalize_path(raw: &str) -> String {
    let mut current = normalize_once(raw);
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_once(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);
    let slashed = trimmed.replace('\\', "/");
    let slashed = slashed.strip_suffix("/**").unwrap_or(slashed.as_str());
    slashed.strip_suffix('/').unwrap_or(slashed).to_string()
}

/// Escapes spaces as `\ ` so a path survives as a single mention token.
///
/// Only one character of lookbehind is used: a space right after any `\` is
/// left alone, even when that `\` is itself escaped.
pub fn escape_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev: Option<char> = None;
    for ch in path.chars() {
        if ch == ' ' && prev != Some(ESCAPE) {
            out.push(ESCAPE);
        }
        out.push(ch);
        prev = Some(ch);
    }
    out
}

pub fn unescape_path(path: &str) -> String {
    path.replace("\\ ", " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_glob_and_leading_dot() {
        assert_eq!(normalize_path("./src/**"), "src");
    }

    #[test]
    fn normalize_strips_leading_and_trailing_slash() {
        assert_eq!(normalize_path("/abs/path/"), "abs/path");
    }

    #[test]
    fn normalize_converts_backslashes() {
        assert_eq!(normalize_path("a\\b"), "a/b");
        assert_eq!(normalize_path("docs\\notes\\"), "docs/notes");
    }

    #[test]
    fn normalize_trims_whitespace_and_handles_empty() {
        assert_eq!(normalize_path("  notes/readme.md \n"), "notes/readme.md");
        assert_eq!(normalize_path(""), "");
        assert_eq!(normalize_path("   "), "");
        assert_eq!(normalize_path("/"), "");
    }

    #[test]
    fn normalize_reaches_a_fixed_point() {
        assert_eq!(normalize_path("././a"), "a");
        assert_eq!(normalize_path("a/**/"), "a");
        assert_eq!(normalize_path(".\\a"), "a");
    }

    #[test]
    fn normalize_keeps_inner_globs() {
        assert_eq!(normalize_path("src/**/mod.rs"), "src/**/mod.rs");
        assert_eq!(normalize_path("src/*"), "src/*");
    }

    #[test]
    fn escape_replaces_spaces() {
        assert_eq!(escape_path("my file.txt"), r"my\ file.txt");
        assert_eq!(escape_path("a b c"), r"a\ b\ c");
        assert_eq!(escape_path("plain"), "plain");
    }

    #[test]
    fn escape_leaves_already_escaped_spaces() {
        assert_eq!(escape_path(r"my\ file.txt"), r"my\ file.txt");
    }

    #[test]
    fn escape_single_lookbehind_quirk() {
        // `\\ ` is treated as already escaped.
        assert_eq!(escape_path(r"a\\ b"), r"a\\ b");
    }

    #[test]
    fn unescape_restores_spaces() {
        assert_eq!(unescape_path(r"my\ file.txt"), "my file.txt");
        assert_eq!(unescape_path(r"a\\b"), r"a\\b");
        assert_eq!(unescape_path(r"trailing\"), r"trailing\");
    }

    #[test]
    fn escape_round_trips_without_backslashes() {
        for sample in ["", " ", "  lead", "trail  ", "a b/c d.txt"] {
            assert_eq!(unescape_path(&escape_path(sample)), sample);
        }
    }
}
