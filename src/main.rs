mod cli;

use crate::cli::attach_cmd::{self, AttachAction};
use crate::cli::scan_cmd::{self, ScanAction};
use anyhow::Result;
use clap::{Parser, Subcommand};
use filetag::config::Config;
use filetag::logging;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "filetag", version)]
#[command(about = "Scan and resolve @file mentions in chat messages", long_about = None)]
struct Cli {
    /// Config file (defaults to filetag.toml lookup)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the canonical form of a path
    Normalize { path: String },
    /// Escape spaces in a path so it stays one mention token
    Escape { path: String },
    /// Undo `escape`
    Unescape { path: String },
    /// Show the mention token under the caret (null if none)
    Trigger {
        /// Caret byte offset (defaults to the end of the text)
        #[arg(long)]
        caret: Option<usize>,

        /// Text to scan; read from stdin when omitted
        text: Option<String>,
    },
    /// List every completed mention token in the text
    Extract {
        /// Text to scan; read from stdin when omitted
        text: Option<String>,
    },
    /// Replace a token body, keeping its `@`
    Replace {
        #[arg(long)]
        start: usize,

        #[arg(long)]
        end: usize,

        /// New token body (inserted verbatim)
        replacement: String,

        /// Text to edit; read from stdin when omitted
        text: Option<String>,
    },
    /// List the files that can be mentioned
    Files {
        /// Assets root (defaults to config, then git root, then cwd)
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Resolve the mentions in a message into attachment content
    Resolve {
        /// Assets root (defaults to config, then git root, then cwd)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Message text; read from stdin when omitted
        text: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, config_path) = match cli.config.as_deref() {
        Some(path) => Config::load_with_path(Some(path))?,
        None => Config::load_with_path(None).unwrap_or_else(|e| {
            eprintln!("Warning: failed to load config, using defaults: {e}");
            (Config::default(), None)
        }),
    };

    // Pure scanning commands run without tracing.
    let attach_action = match cli.cmd {
        Command::Normalize { path } => return scan_cmd::run(ScanAction::Normalize { path }),
        Command::Escape { path } => return scan_cmd::run(ScanAction::Escape { path }),
        Command::Unescape { path } => return scan_cmd::run(ScanAction::Unescape { path }),
        Command::Trigger { caret, text } => {
            return scan_cmd::run(ScanAction::Trigger { text, caret });
        }
        Command::Extract { text } => return scan_cmd::run(ScanAction::Extract { text }),
        Command::Replace {
            start,
            end,
            replacement,
            text,
        } => {
            return scan_cmd::run(ScanAction::Replace {
                text,
                start,
                end,
                replacement,
            });
        }
        Command::Files { root } => AttachAction::Files { root },
        Command::Resolve { root, text } => AttachAction::Resolve { root, text },
    };

    let mut settings = logging::LoggingSettings::from(&config.logging);
    if let Some(level) = cli.log_level.as_deref() {
        settings.level = Some(level);
    }
    match logging::setup_tracing_with_settings(settings) {
        Ok(log_dir) => tracing::debug!("Log directory: {}", log_dir.display()),
        Err(err) => eprintln!("Failed to initialize logging: {err}"),
    }
    match config_path.as_ref() {
        Some(path) => tracing::debug!("Config File: {}", path.display()),
        None => tracing::debug!("Config File: (default)"),
    }

    attach_cmd::run(attach_action, &config)
}
