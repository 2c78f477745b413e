//! Locations of filetag's own files.
//!
//! Logs and the fallback config live under one home directory, `~/.filetag`
//! unless `$FILETAG_HOME` points elsewhere.

use crate::config::CONFIG_FILE_NAME;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const HOME_ENV: &str = "FILETAG_HOME";
const CONFIG_ENV: &str = "FILETAG_CONFIG";

static HOME: OnceLock<PathBuf> = OnceLock::new();

/// Resolved once per process.
pub fn filetag_home() -> &'static Path {
    HOME.get_or_init(|| home_from(std::env::var_os(HOME_ENV), dirs::home_dir()))
}

fn home_from(override_dir: Option<OsString>, user_home: Option<PathBuf>) -> PathBuf {
    match override_dir {
        Some(dir) if !dir.is_empty() => expand_tilde(Path::new(&dir)),
        _ => user_home
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".filetag"),
    }
}

pub fn logs_dir() -> PathBuf {
    filetag_home().join("logs")
}

/// Config files to try when none is given on the command line, most specific
/// first: `$FILETAG_CONFIG`, `./filetag.toml`, the platform config directory,
/// then `<home>/config/filetag.toml`.
pub fn config_candidates() -> Vec<PathBuf> {
    candidates_from(
        std::env::var_os(CONFIG_ENV),
        dirs::config_dir(),
        filetag_home(),
    )
}

fn candidates_from(
    env_path: Option<OsString>,
    platform_config: Option<PathBuf>,
    home: &Path,
) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = env_path.filter(|p| !p.is_empty()) {
        candidates.push(PathBuf::from(path));
    }
    candidates.push(PathBuf::from(CONFIG_FILE_NAME));
    if let Some(dir) = platform_config {
        candidates.push(dir.join("filetag").join(CONFIG_FILE_NAME));
    }
    candidates.push(home.join("config").join(CONFIG_FILE_NAME));
    candidates
}

/// Replaces a leading `~` component with the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) if rest.as_os_str().is_empty() => home,
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
