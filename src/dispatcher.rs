//! Turns tagged attachments into prompt material.
//!
//! Text files become `file_intro`/`file_body` segments wrapped in a
//! preamble and epilogue, images become inline `input_image` parts, and
//! directories are expanded into their files. Directory expansion skips the
//! same entries the file list does: hidden files, anything `.gitignore`d and
//! anything matched by `scan.exclude_globs`. Problems with a single attachment
//! never fail the whole resolution; they end up in `warnings` or `errors`.

use crate::attachments::{build_globset, list_known_files, match_tags, to_rel_string};
use crate::config::{AttachmentLimits, Config};
use crate::mention::{escape_path, extract_file_tags};
use anyhow::{Context, Result};
use base64::prelude::*;
use globset::GlobSet;
use ignore::WalkBuilder;
use mime_guess::mime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

const PREAMBLE: &str = "\n--- Content from referenced files ---";
const EPILOGUE: &str = "--- End of content from referenced files ---";
const TRUNCATION_MARKER: &str = "\n[... truncated ...]";

const TEXT_FALLBACK_EXTENSIONS: &[&str] = &[
    "md", "markdown", "txt", "py", "ts", "tsx", "js", "jsx", "json", "yml", "yaml", "toml", "ini",
    "cfg", "env", "xml", "html", "css", "scss",
];

/// A request to attach one path relative to the assets directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTagSpec {
    pub relative_path: String,
    #[serde(default)]
    pub is_directory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentMetadata {
    pub relative_path: String,
    pub is_directory: bool,
    pub size_bytes: u64,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Preamble,
    FileIntro,
    FileBody,
    Epilogue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextSegment {
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<String>,
}

impl TextSegment {
    fn framing(kind: SegmentKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
            relative_path: None,
        }
    }

    fn for_file(kind: SegmentKind, text: String, relative_path: &str) -> Self {
        Self {
            kind,
            text,
            relative_path: Some(relative_path.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageUrl {
    pub url: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    InputImage { image_url: ImageUrl },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileTagResolution {
    pub parts: Vec<ContentPart>,
    pub text_segments: Vec<TextSegment>,
    pub aggregated_text: String,
    pub attachments: Vec<AttachmentMetadata>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub absolute_files: Vec<PathBuf>,
}

enum Outcome {
    Added,
    Skipped,
    BudgetExhausted,
}

struct Dispatcher<'a> {
    assets_dir: PathBuf,
    limits: &'a AttachmentLimits,
    excludes: Option<GlobSet>,
    total_bytes: u64,
    file_segments: Vec<TextSegment>,
    out: FileTagResolution,
}

/// Reads every attachment in `specs` from `assets_dir`.
///
/// Paths matched by `exclude_globs` are skipped with a warning, including
/// children found while expanding a directory. Fails only when `assets_dir`
/// itself is unusable or a glob is invalid.
pub fn resolve_tagged_files(
    assets_dir: &Path,
    specs: &[FileTagSpec],
    limits: &AttachmentLimits,
    exclude_globs: &[String],
) -> Result<FileTagResolution> {
    if specs.is_empty() {
        return Ok(FileTagResolution::default());
    }
    let excludes = build_globset(exclude_globs)?;

    let assets_dir = assets_dir
        .canonicalize()
        .with_context(|| format!("Assets directory not found: {}", assets_dir.display()))?;
    if !assets_dir.is_dir() {
        anyhow::bail!("Assets path is not a directory: {}", assets_dir.display());
    }
    info!(
        "Resolving {} tagged attachment(s) under {}",
        specs.len(),
        assets_dir.display()
    );

    let mut dispatcher = Dispatcher {
        assets_dir,
        limits,
        excludes,
        total_bytes: 0,
        file_segments: Vec::new(),
        out: FileTagResolution::default(),
    };

    for spec in specs {
        let relative_path = spec.relative_path.trim();
        if relative_path.is_empty() {
            continue;
        }
        if let Outcome::BudgetExhausted = dispatcher.add_spec(relative_path) {
            break;
        }
    }

    Ok(dispatcher.finish())
}

/// Resolves every `@` tag in `message` against the files under `assets_dir`.
pub fn resolve_message(
    assets_dir: &Path,
    message: &str,
    config: &Config,
) -> Result<FileTagResolution> {
    let tags = extract_file_tags(message);
    if tags.is_empty() {
        return Ok(FileTagResolution::default());
    }

    let known = list_known_files(assets_dir, &config.scan.exclude_globs)?;
    let matches = match_tags(&tags, &known);
    debug!(
        "{} tag(s): {} matched, {} unmatched",
        tags.len(),
        matches.matched.len(),
        matches.unmatched.len()
    );

    let mut resolution = resolve_tagged_files(
        assets_dir,
        &matches.file_tag_specs(),
        &config.attachments,
        &config.scan.exclude_globs,
    )?;
    for tag in &matches.unmatched {
        resolution
            .warnings
            .push(format!("No file matches '{}'.", tag.tag));
    }
    Ok(resolution)
}

impl Dispatcher<'_> {
    fn add_spec(&mut self, relative_path: &str) -> Outcome {
        let absolute_path = match self.resolve_asset_path(relative_path) {
            Ok(Some(path)) => path,
            Ok(None) => {
                self.error(format!("Attachment '{relative_path}' no longer exists on disk."));
                return Outcome::Skipped;
            }
            Err(err) => {
                self.error(format!("Failed to resolve '{relative_path}': {err}"));
                return Outcome::Skipped;
            }
        };

        let rel_file = match to_rel_string(&self.assets_dir, &absolute_path) {
            Ok(rel) => rel,
            Err(err) => {
                self.error(format!("Failed to resolve '{relative_path}': {err}"));
                return Outcome::Skipped;
            }
        };
        if self.is_excluded(&rel_file) {
            self.warning(format!("Skipped '{relative_path}' (excluded by scan.exclude_globs)."));
            return Outcome::Skipped;
        }

        if absolute_path.is_dir() {
            self.add_directory(relative_path, absolute_path);
            return Outcome::Skipped;
        }

        let outcome = self.add_file(&absolute_path, &rel_file);
        if let Outcome::Added = outcome {
            self.out.absolute_files.push(absolute_path);
        }
        outcome
    }

    /// `Ok(None)` when the path is well-formed but missing.
    fn resolve_asset_path(&self, relative_path: &str) -> Result<Option<PathBuf>> {
        let rel = Path::new(relative_path);
        if rel
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            anyhow::bail!("path traversal not allowed");
        }
        if rel
            .components()
            .any(|c| matches!(c, Component::RootDir | Component::Prefix(_)))
        {
            anyhow::bail!("path must stay inside the assets directory");
        }

        let joined = self.assets_dir.join(rel);
        if !joined.exists() {
            return Ok(None);
        }
        let canonical = joined.canonicalize()?;
        if !canonical.starts_with(&self.assets_dir) {
            anyhow::bail!("path must stay inside the assets directory");
        }
        Ok(Some(canonical))
    }

    /// True when `rel` or one of its parent directories is excluded.
    fn is_excluded(&self, rel: &str) -> bool {
        let Some(excludes) = self.excludes.as_ref() else {
            return false;
        };
        Path::new(rel)
            .ancestors()
            .filter(|p| !p.as_os_str().is_empty())
            .any(|p| excludes.is_match(p))
    }

    fn add_directory(&mut self, relative_path: &str, absolute_path: PathBuf) {
        let max_files = self.limits.max_files_per_directory;
        let files = gather_directory_files(
            &self.assets_dir,
            &absolute_path,
            self.excludes.as_ref(),
            max_files,
        );

        self.out.absolute_files.push(absolute_path);
        self.out.attachments.push(AttachmentMetadata {
            relative_path: relative_path.trim_end_matches('/').to_string(),
            is_directory: true,
            size_bytes: 0,
            mime_type: None,
        });

        if files.len() >= max_files {
            self.warning(format!(
                "Directory '{relative_path}' truncated to the first {max_files} files."
            ));
        }

        for child in files {
            let rel_child = match to_rel_string(&self.assets_dir, &child) {
                Ok(rel) => rel,
                Err(_) => continue,
            };
            if let Outcome::BudgetExhausted = self.add_file(&child, &rel_child) {
                break;
            }
        }
    }

    fn add_file(&mut self, path: &Path, rel: &str) -> Outcome {
        let size_bytes = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(err) => {
                self.error(format!("Failed to read '{rel}': {err}"));
                return Outcome::Skipped;
            }
        };

        if size_bytes > self.limits.max_single_file_bytes {
            self.warning(format!(
                "Skipped '{rel}' (>{}MB)",
                self.limits.max_single_file_bytes / (1024 * 1024)
            ));
            return Outcome::Skipped;
        }
        if self.total_bytes + size_bytes > self.limits.max_total_attachment_bytes {
            self.warning("Attachment size limit reached; remaining files skipped.".to_string());
            return Outcome::BudgetExhausted;
        }

        let mime_type = mime_guess::from_path(path).first();
        let read = if is_text_file(path, mime_type.as_ref()) {
            self.add_text(path, rel)
        } else if is_image_file(mime_type.as_ref()) {
            let essence = mime_type
                .as_ref()
                .map(|m| m.essence_str().to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            self.add_image(path, &essence)
        } else {
            self.warning(format!("Skipped '{rel}' (unsupported file type)."));
            return Outcome::Skipped;
        };
        if let Err(err) = read {
            self.error(format!("Failed to read '{rel}': {err}"));
            return Outcome::Skipped;
        }

        debug!("Attached {} ({} bytes)", rel, size_bytes);
        self.out.attachments.push(AttachmentMetadata {
            relative_path: rel.to_string(),
            is_directory: false,
            size_bytes,
            mime_type: mime_type.map(|m| m.essence_str().to_string()),
        });
        self.total_bytes += size_bytes;
        Outcome::Added
    }

    fn add_text(&mut self, path: &Path, rel: &str) -> Result<()> {
        let max_chars = self.limits.max_text_characters;
        let (content, truncated) = read_text_file(path, max_chars)?;

        let mut intro = format!("Content from @{}:", escape_path(rel));
        if truncated {
            intro.push_str(&format!("\n[truncated to {max_chars} characters]"));
        }
        self.file_segments
            .push(TextSegment::for_file(SegmentKind::FileIntro, intro, rel));
        self.file_segments
            .push(TextSegment::for_file(SegmentKind::FileBody, content, rel));
        Ok(())
    }

    fn add_image(&mut self, path: &Path, mime_type: &str) -> Result<()> {
        let data = fs::read(path)?;
        let url = format!("data:{};base64,{}", mime_type, BASE64_STANDARD.encode(data));
        self.out.parts.push(ContentPart::InputImage {
            image_url: ImageUrl {
                url,
                details: "high".to_string(),
            },
        });
        Ok(())
    }

    fn warning(&mut self, message: String) {
        warn!("{}", message);
        self.out.warnings.push(message);
    }

    fn error(&mut self, message: String) {
        warn!("{}", message);
        self.out.errors.push(message);
    }

    fn finish(mut self) -> FileTagResolution {
        if !self.file_segments.is_empty() {
            let mut segments = Vec::with_capacity(self.file_segments.len() + 2);
            segments.push(TextSegment::framing(SegmentKind::Preamble, PREAMBLE));
            segments.append(&mut self.file_segments);
            segments.push(TextSegment::framing(SegmentKind::Epilogue, EPILOGUE));

            self.out.aggregated_text = segments
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            self.out.text_segments = segments;
        }
        self.out
    }
}

fn is_text_file(path: &Path, mime_type: Option<&mime::Mime>) -> bool {
    if let Some(m) = mime_type {
        if m.type_() == mime::TEXT {
            return true;
        }
        if matches!(m.essence_str(), "application/json" | "application/javascript") {
            return true;
        }
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| TEXT_FALLBACK_EXTENSIONS.contains(&e.as_str()))
}

fn is_image_file(mime_type: Option<&mime::Mime>) -> bool {
    mime_type.is_some_and(|m| m.type_() == mime::IMAGE)
}

/// Lossy UTF-8 read, cut after `max_chars` characters.
fn read_text_file(path: &Path, max_chars: usize) -> Result<(String, bool)> {
    let bytes = fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => Ok((format!("{}{}", &content[..cut], TRUNCATION_MARKER), true)),
        None => Ok((content.into_owned(), false)),
    }
}

/// Files under `dir`, at most `max_files`.
///
/// Each directory contributes its own files in name order before any of its
/// subdirectories are entered. Hidden, ignored and excluded entries are
/// skipped the way [`list_known_files`] skips them, with `excludes` matched
/// against paths relative to `assets_dir`.
fn gather_directory_files(
    assets_dir: &Path,
    dir: &Path,
    excludes: Option<&GlobSet>,
    max_files: usize,
) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(dir);
    builder
        .standard_filters(true)
        .hidden(true)
        .sort_by_file_path(files_before_directories);
    if let Some(excludes) = excludes.cloned() {
        let root = assets_dir.to_path_buf();
        builder.filter_entry(move |entry| match entry.path().strip_prefix(&root) {
            Ok(rel) if !rel.as_os_str().is_empty() => !excludes.is_match(rel),
            _ => true,
        });
    }

    let mut collected = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(v) => v,
            Err(err) => {
                debug!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        collected.push(entry.into_path());
        if collected.len() >= max_files {
            break;
        }
    }
    collected
}

fn files_before_directories(a: &Path, b: &Path) -> Ordering {
    a.is_dir()
        .cmp(&b.is_dir())
        .then_with(|| a.file_name().cmp(&b.file_name()))
}
