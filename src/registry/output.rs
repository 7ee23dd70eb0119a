//! Parsing the control command's text output.
//!
//! `list` prints a table; the first two cells of every data row are the
//! resource id and name. Headers, rulers and banner lines are skipped.
//! `create` prints a snippet that contains `resource_id = "<id>"`.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::ResourceRecord;

/// Words that only appear in a table header's first column.
const HEADER_WORDS: [&str; 4] = ["id", "uuid", "name", "database_id"];

static ID_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("valid regex"));

static CREATED_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:resource_id|database_id)\s*=\s*"([^"]+)""#).expect("valid regex")
});

fn is_cell_border(c: char) -> bool {
    matches!(c, '│' | '|' | '┃' | '║')
}

fn is_ruler(line: &str) -> bool {
    line.chars().all(|c| {
        c.is_whitespace()
            || matches!(c, '-' | '=' | '+' | '|')
            || ('\u{2500}'..='\u{257F}').contains(&c)
    })
}

/// Parse the tabular output of the `list` command.
pub fn parse_list_output(stdout: &str) -> Vec<ResourceRecord> {
    let mut records = Vec::new();

    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() || is_ruler(line) {
            continue;
        }

        let mut tokens = line
            .split(|c: char| c.is_whitespace() || is_cell_border(c))
            .filter(|t| !t.is_empty());

        let (Some(id), Some(name)) = (tokens.next(), tokens.next()) else {
            continue;
        };

        if HEADER_WORDS.contains(&id.to_ascii_lowercase().as_str()) {
            continue;
        }
        if !ID_TOKEN.is_match(id) {
            tracing::debug!("skipping non-record line: {}", line);
            continue;
        }

        records.push(ResourceRecord::new(id, name));
    }

    records
}

/// Extract the id of a freshly created resource from `create` output.
pub fn parse_created_id(stdout: &str) -> Option<String> {
    CREATED_ID
        .captures(stdout)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
