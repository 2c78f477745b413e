use super::{print_json, text_or_stdin};
use anyhow::Result;
use filetag::attachments::list_known_files;
use filetag::config::Config;
use filetag::dispatcher::resolve_message;
use filetag::workspace::resolve_assets_root;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub enum AttachAction {
    Files { root: Option<PathBuf> },
    Resolve { root: Option<PathBuf>, text: Option<String> },
}

pub fn run(action: AttachAction, config: &Config) -> Result<()> {
    match action {
        AttachAction::Files { root } => {
            let root = resolve_assets_root(root, &config.attachments)?;
            info!("Listing known files under {}", root.display());
            let files = list_known_files(&root, &config.scan.exclude_globs)?;
            print_json(&files)
        }
        AttachAction::Resolve { root, text } => {
            let root = resolve_assets_root(root, &config.attachments)?;
            let message = text_or_stdin(text)?;
            let resolution = resolve_message(&root, &message, config)?;
            info!(
                "Resolved {} attachment(s), {} warning(s), {} error(s)",
                resolution.attachments.len(),
                resolution.warnings.len(),
                resolution.errors.len()
            );
            print_json(&resolution)
        }
    }
}
