use super::{print_json, text_or_stdin};
use anyhow::Result;
use filetag::mention::{
    escape_path, extract_file_tags, find_active_trigger_segment, normalize_path, replace_segment,
    unescape_path, ParsedTagSegment, TriggerSegment,
};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub enum ScanAction {
    Normalize {
        path: String,
    },
    Escape {
        path: String,
    },
    Unescape {
        path: String,
    },
    Trigger {
        text: Option<String>,
        caret: Option<usize>,
    },
    Extract {
        text: Option<String>,
    },
    Replace {
        text: Option<String>,
        start: usize,
        end: usize,
        replacement: String,
    },
}

pub fn run(action: ScanAction) -> Result<()> {
    let output = match action {
        ScanAction::Normalize { path } => json!(normalize_path(&path)),
        ScanAction::Escape { path } => json!(escape_path(&path)),
        ScanAction::Unescape { path } => json!(unescape_path(&path)),
        ScanAction::Trigger { text, caret } => {
            let text = text_or_stdin(text)?;
            trigger_json(&text, caret)
        }
        ScanAction::Extract { text } => {
            let text = text_or_stdin(text)?;
            extract_json(&text)
        }
        ScanAction::Replace {
            text,
            start,
            end,
            replacement,
        } => {
            let text = text_or_stdin(text)?;
            json!(replace_segment(&text, start..end, &replacement))
        }
    };
    print_json(&output)
}

/// Caret defaults to the end of the text, like a cursor after typing.
fn trigger_json(text: &str, caret: Option<usize>) -> Value {
    let caret = caret.unwrap_or(text.len());
    find_active_trigger_segment(text, caret)
        .map(|seg| trigger_to_json(&seg))
        .unwrap_or(Value::Null)
}

fn extract_json(text: &str) -> Value {
    Value::Array(extract_file_tags(text).iter().map(tag_to_json).collect())
}

fn trigger_to_json(seg: &TriggerSegment) -> Value {
    json!({
        "start": seg.start,
        "end": seg.end,
        "query": seg.query,
        "fullSegment": seg.full_segment,
    })
}

fn tag_to_json(tag: &ParsedTagSegment) -> Value {
    json!({
        "tag": tag.tag,
        "start": tag.start,
        "end": tag.end,
        "path": tag.path,
    })
}
