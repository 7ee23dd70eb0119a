//! In-place edits of binding blocks.
//!
//! Edits are textual so comments, ordering and formatting outside the
//! touched lines survive. A block is found by its `binding` value; its name
//! and id lines are rewritten with a regex scoped to the block's lines. A
//! key the block lacks is inserted after its last key line. If no block
//! carries the binding, a new block is appended at the end of the file.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::binding::{BINDING_KEY, ID_KEYS, NAME_KEYS};
use crate::core::{block_spans, BLOCK_MARKER};

static NAME_LINE: LazyLock<Regex> = LazyLock::new(|| key_line(&NAME_KEYS));
static ID_LINE: LazyLock<Regex> = LazyLock::new(|| key_line(&ID_KEYS));

/// `<indent><key><sep><value><rest>` for any of `keys`.
fn key_line(keys: &[&str]) -> Regex {
    Regex::new(&format!(
        r#"^(\s*)({})(\s*=\s*)("[^"]*"|'[^']*'|[^\s#]+)(.*)$"#,
        keys.join("|")
    ))
    .expect("valid regex")
}

/// How a rewrite changed the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// An existing block was rewritten.
    Updated,
    /// A new block was added.
    Appended,
}

/// Result of [`set_binding`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub kind: EditKind,
    pub text: String,
}

/// Quote `value` as a TOML basic string.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Point binding `binding_name` at `resource_name` / `resource_id`.
pub fn set_binding(text: &str, binding_name: &str, resource_name: &str, resource_id: &str) -> Edit {
    let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };

    let span = block_spans(text)
        .into_iter()
        .find(|s| s.declaration.binding_name.as_deref() == Some(binding_name));

    let Some(span) = span else {
        return Edit {
            kind: EditKind::Appended,
            text: append_block(text, newline, binding_name, resource_name, resource_id),
        };
    };

    let mut lines: Vec<String> = text.lines().map(String::from).collect();
    let mut has_name = false;
    let mut has_id = false;

    for line in &mut lines[span.lines.clone()] {
        if let Some(updated) = replace_value(&NAME_LINE, line, resource_name) {
            *line = updated;
            has_name = true;
        } else if let Some(updated) = replace_value(&ID_LINE, line, resource_id) {
            *line = updated;
            has_id = true;
        }
    }

    let indent = lines[span.lines.end - 1]
        .chars()
        .take_while(|c| c.is_whitespace())
        .collect::<String>();
    let mut insert_at = span.lines.end;
    if !has_name {
        lines.insert(
            insert_at,
            format!("{}{} = {}", indent, NAME_KEYS[0], quote(resource_name)),
        );
        insert_at += 1;
    }
    if !has_id {
        lines.insert(
            insert_at,
            format!("{}{} = {}", indent, ID_KEYS[0], quote(resource_id)),
        );
    }

    let mut out = lines.join(newline);
    if text.ends_with('\n') {
        out.push_str(newline);
    }

    Edit {
        kind: EditKind::Updated,
        text: out,
    }
}

fn replace_value(re: &Regex, line: &str, value: &str) -> Option<String> {
    let caps = re.captures(line)?;
    Some(format!(
        "{}{}{}{}{}",
        &caps[1],
        &caps[2],
        &caps[3],
        quote(value),
        &caps[5]
    ))
}

fn append_block(
    text: &str,
    newline: &str,
    binding_name: &str,
    resource_name: &str,
    resource_id: &str,
) -> String {
    let mut out = text.to_string();
    if !out.is_empty() {
        if !out.ends_with('\n') {
            out.push_str(newline);
        }
        out.push_str(newline);
    }

    for line in [
        BLOCK_MARKER.to_string(),
        format!("{} = {}", BINDING_KEY, quote(binding_name)),
        format!("{} = {}", NAME_KEYS[0], quote(resource_name)),
        format!("{} = {}", ID_KEYS[0], quote(resource_id)),
    ] {
        out.push_str(&line);
        out.push_str(newline);
    }
    out
}
