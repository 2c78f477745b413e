use crate::config::AttachmentLimits;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Picks the directory `@` paths are resolved against.
///
/// Order: explicit `--root`, `attachments.assets_root` from config, the
/// enclosing git repository, the current directory.
pub fn resolve_assets_root(
    explicit: Option<PathBuf>,
    limits: &AttachmentLimits,
) -> Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p);
    }
    if let Some(p) = limits.assets_root.as_ref() {
        return Ok(crate::paths::expand_tilde(p));
    }

    let cwd = std::env::current_dir().context("Failed to get current dir")?;
    Ok(find_git_root(&cwd).unwrap_or(cwd))
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_root_wins() {
        let limits = AttachmentLimits {
            assets_root: Some(PathBuf::from("/configured")),
            ..AttachmentLimits::default()
        };
        let root = resolve_assets_root(Some(PathBuf::from("/explicit")), &limits).unwrap();
        assert_eq!(root, PathBuf::from("/explicit"));
    }

    #[test]
    fn configured_root_beats_discovery() {
        let limits = AttachmentLimits {
            assets_root: Some(PathBuf::from("/configured")),
            ..AttachmentLimits::default()
        };
        assert_eq!(
            resolve_assets_root(None, &limits).unwrap(),
            PathBuf::from("/configured")
        );
    }

    #[test]
    fn git_root_found_from_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_git_root(&nested), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn no_git_root_outside_repository() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("plain");
        std::fs::create_dir_all(&nested).unwrap();
        let found = find_git_root(&nested);
        assert!(found.map_or(true, |root| !root.starts_with(dir.path())));
    }
}
