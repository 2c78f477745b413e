//! Matching `@` tags against the files a project actually has.

use crate::dispatcher::FileTagSpec;
use crate::mention::{normalize_path, ParsedTagSegment};
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

/// One entry of the file list offered to the `@` autocomplete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownFile {
    pub relative_path: String,
    #[serde(default)]
    pub is_directory: bool,
}

impl KnownFile {
    pub fn file(relative_path: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            is_directory: false,
        }
    }

    pub fn directory(relative_path: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            is_directory: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMatch {
    pub tag: ParsedTagSegment,
    pub file: KnownFile,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMatches {
    pub matched: Vec<TagMatch>,
    pub unmatched: Vec<ParsedTagSegment>,
}

impl TagMatches {
    pub fn file_tag_specs(&self) -> Vec<FileTagSpec> {
        self.matched
            .iter()
            .map(|m| FileTagSpec {
                relative_path: normalize_path(&m.file.relative_path),
                is_directory: m.file.is_directory,
            })
            .collect()
    }
}

pub(crate) fn build_globset(globs: &[String]) -> Result<Option<GlobSet>> {
    if globs.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for g in globs {
        builder.add(Glob::new(g).with_context(|| format!("invalid glob: {g}"))?);
    }
    Ok(Some(builder.build()?))
}

pub(crate) fn to_rel_string(root: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(root)?;
    Ok(rel.to_string_lossy().replace('\\', "/"))
}

/// Lists files and directories under `root`, sorted by relative path.
///
/// Hidden entries and anything ignored by `.gitignore`/`.ignore` are skipped.
/// A directory matched by `exclude_globs` is pruned together with its contents.
pub fn list_known_files(root: &Path, exclude_globs: &[String]) -> Result<Vec<KnownFile>> {
    if !root.is_dir() {
        anyhow::bail!("assets root '{}' is not a directory", root.display());
    }
    let excludes = build_globset(exclude_globs)?;

    let mut builder = WalkBuilder::new(root);
    builder.standard_filters(true).hidden(true);
    if let Some(excludes) = excludes {
        let walk_root = root.to_path_buf();
        builder.filter_entry(move |entry| match entry.path().strip_prefix(&walk_root) {
            Ok(rel) if !rel.as_os_str().is_empty() => !excludes.is_match(rel),
            _ => true,
        });
    }

    let mut out = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(v) => v,
            Err(err) => {
                debug!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        let Some(file_type) = entry.file_type() else {
            continue;
        };
        let rel = to_rel_string(root, entry.path())?;
        if file_type.is_dir() {
            out.push(KnownFile::directory(rel));
        } else if file_type.is_file() {
            out.push(KnownFile::file(rel));
        }
    }

    out.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(out)
}

/// Pairs each tag with the known entry whose normalized path equals its own.
///
/// Repeated tags for the same attachment are matched once, at their first
/// occurrence. Tags without a counterpart are returned in text order.
pub fn match_tags(tags: &[ParsedTagSegment], known: &[KnownFile]) -> TagMatches {
    let mut by_path: HashMap<String, &KnownFile> = HashMap::new();
    for file in known {
        let key = normalize_path(&file.relative_path);
        if !key.is_empty() {
            by_path.entry(key).or_insert(file);
        }
    }

    let mut out = TagMatches::default();
    let mut seen = HashSet::new();
    for tag in tags {
        let key = normalize_path(&tag.path);
        match by_path.get(&key) {
            Some(file) => {
                if seen.insert(key) {
                    out.matched.push(TagMatch {
                        tag: tag.clone(),
                        file: (*file).clone(),
                    });
                }
            }
            None => out.unmatched.push(tag.clone()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mention::extract_file_tags;
    use std::fs;

    fn sample_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("docs/guides")).unwrap();
        fs::create_dir_all(root.join("build")).unwrap();
        fs::write(root.join("docs/a.txt"), "A").unwrap();
        fs::write(root.join("docs/guides/intro.md"), "intro").unwrap();
        fs::write(root.join("build/out.bin"), "bin").unwrap();
        fs::write(root.join("my notes.md"), "notes").unwrap();
        fs::write(root.join(".secret"), "hidden").unwrap();
        dir
    }

    fn paths(files: &[KnownFile]) -> Vec<&str> {
        files.iter().map(|f| f.relative_path.as_str()).collect()
    }

    #[test]
    fn list_known_files_reports_files_and_directories() {
        let dir = sample_tree();
        let files = list_known_files(dir.path(), &[]).unwrap();
        assert_eq!(
            paths(&files),
            vec![
                "build",
                "build/out.bin",
                "docs",
                "docs/a.txt",
                "docs/guides",
                "docs/guides/intro.md",
                "my notes.md",
            ]
        );
        assert!(files.iter().find(|f| f.relative_path == "docs").unwrap().is_directory);
        assert!(!files.iter().find(|f| f.relative_path == "docs/a.txt").unwrap().is_directory);
    }

    #[test]
    fn list_known_files_prunes_excluded_directories() {
        let dir = sample_tree();
        let excludes = ["build".to_string(), "**/*.md".to_string()];
        let files = list_known_files(dir.path(), &excludes).unwrap();
        assert_eq!(paths(&files), vec!["docs", "docs/a.txt", "docs/guides"]);
    }

    #[test]
    fn list_known_files_rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_known_files(&dir.path().join("missing"), &[]).is_err());
    }

    #[test]
    fn match_tags_uses_normalized_equality() {
        let known = vec![
            KnownFile::directory("docs/"),
            KnownFile::file("docs/a.txt"),
            KnownFile::file("my notes.md"),
        ];
        let tags = extract_file_tags(
            "see @./docs/** and @docs\\a.txt plus @my\\ notes.md and @nope.txt",
        );
        let matches = match_tags(&tags, &known);

        let matched: Vec<&str> = matches
            .matched
            .iter()
            .map(|m| m.file.relative_path.as_str())
            .collect();
        assert_eq!(matched, vec!["docs/", "docs/a.txt", "my notes.md"]);
        assert_eq!(matches.unmatched.len(), 1);
        assert_eq!(matches.unmatched[0].path, "nope.txt");
    }

    #[test]
    fn match_tags_collapses_repeated_attachments() {
        let known = vec![KnownFile::file("a.txt")];
        let tags = extract_file_tags("@a.txt then @./a.txt again");
        let matches = match_tags(&tags, &known);
        assert_eq!(matches.matched.len(), 1);
        assert_eq!(matches.matched[0].tag.start, 0);
        assert!(matches.unmatched.is_empty());
    }

    #[test]
    fn file_tag_specs_carry_normalized_paths() {
        let known = vec![KnownFile::directory("docs/"), KnownFile::file("docs/a.txt")];
        let tags = extract_file_tags("@docs @docs/a.txt");
        let specs = match_tags(&tags, &known).file_tag_specs();
        assert_eq!(
            specs,
            vec![
                FileTagSpec {
                    relative_path: "docs".to_string(),
                    is_directory: true,
                },
                FileTagSpec {
                    relative_path: "docs/a.txt".to_string(),
                    is_directory: false,
                },
            ]
        );
    }
}
