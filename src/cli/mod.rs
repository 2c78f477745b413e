pub mod attach_cmd;
pub mod scan_cmd;

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Read;

/// Uses the positional text when given, otherwise reads all of stdin.
///
/// A single trailing newline from stdin is dropped so piped input behaves
/// like the typed message.
pub(crate) fn text_or_stdin(text: Option<String>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read text from stdin")?;
    if buf.ends_with('\n') {
        buf.pop();
        if buf.ends_with('\r') {
            buf.pop();
        }
    }
    Ok(buf)
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
