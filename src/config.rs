use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "filetag.toml";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub attachments: AttachmentLimits,
    pub scan: ScanConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub directory: Option<String>,
    pub retention_days: Option<u64>,
}

/// Budgets applied when tagged files are turned into prompt content.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AttachmentLimits {
    /// Default root that `@` paths are resolved against.
    pub assets_root: Option<PathBuf>,
    pub max_single_file_bytes: u64,
    pub max_total_attachment_bytes: u64,
    pub max_files_per_directory: usize,
    /// Text files are cut after this many characters.
    pub max_text_characters: usize,
}

impl Default for AttachmentLimits {
    fn default() -> Self {
        Self {
            assets_root: None,
            max_single_file_bytes: 5 * 1024 * 1024,
            max_total_attachment_bytes: 8 * 1024 * 1024,
            max_files_per_directory: 40,
            max_text_characters: 40_000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ScanConfig {
    /// Globs (relative to the assets root) hidden from the known file list.
    pub exclude_globs: Vec<String>,
}

impl Config {
    pub fn load_with_path(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            let config = Self::load_from(path)?;
            return Ok((config, Some(path.to_path_buf())));
        }

        for path in crate::paths::config_candidates() {
            if path.exists() {
                let config = Self::load_from(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((Config::default(), None))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let limits = &self.attachments;
        if limits.max_single_file_bytes == 0 {
            anyhow::bail!("attachments.max_single_file_bytes must be greater than 0");
        }
        if limits.max_total_attachment_bytes == 0 {
            anyhow::bail!("attachments.max_total_attachment_bytes must be greater than 0");
        }
        if limits.max_single_file_bytes > limits.max_total_attachment_bytes {
            anyhow::bail!(
                "attachments.max_single_file_bytes ({}) must not exceed max_total_attachment_bytes ({})",
                limits.max_single_file_bytes,
                limits.max_total_attachment_bytes
            );
        }
        if limits.max_files_per_directory == 0 {
            anyhow::bail!("attachments.max_files_per_directory must be greater than 0");
        }
        if limits.max_text_characters == 0 {
            anyhow::bail!("attachments.max_text_characters must be greater than 0");
        }
        for glob in &self.scan.exclude_globs {
            globset::Glob::new(glob)
                .with_context(|| format!("Invalid scan.exclude_globs entry: {glob}"))?;
        }
        Ok(())
    }
}
