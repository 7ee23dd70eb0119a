//! Binding declarations and the block scanner that extracts them.
//!
//! The binding file is TOML-like, but only a narrow slice of it matters
//! here: blocks opened by a literal `[[resource_bindings]]` line followed by
//! flat `key = "value"` lines. Everything else in the file is skipped. This
//! is not a TOML parser; nested tables, arrays, multi-line
//! strings and inline tables inside a binding block are not understood.
//!
//! ```text
//! [[resource_bindings]]
//! binding = "DB"
//! database_name = "mydb"
//! database_id = "0f1c..."
//! ```

use std::ops::Range;

use serde::Serialize;

/// Line that opens a binding block.
pub const BLOCK_MARKER: &str = "[[resource_bindings]]";

/// Keys recognised inside a block.
pub const BINDING_KEY: &str = "binding";
pub const NAME_KEYS: [&str; 2] = ["database_name", "resource_name"];
pub const ID_KEYS: [&str; 2] = ["database_id", "resource_id"];

/// One binding block, in file order.
///
/// Fields are optional because extraction is purely structural; whether a
/// declaration is complete is decided by the validator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BindingDeclaration {
    /// Name the application code uses to reach the resource.
    pub binding_name: Option<String>,
    /// Name of the resource in the registry.
    pub resource_name: Option<String>,
    /// Registry id of the resource.
    pub resource_id: Option<String>,
}

impl BindingDeclaration {
    /// Create a fully populated declaration.
    pub fn new(
        binding_name: impl Into<String>,
        resource_name: impl Into<String>,
        resource_id: Option<String>,
    ) -> Self {
        BindingDeclaration {
            binding_name: Some(binding_name.into()),
            resource_name: Some(resource_name.into()),
            resource_id,
        }
    }

    /// True when no field was populated.
    pub fn is_empty(&self) -> bool {
        self.binding_name.is_none() && self.resource_name.is_none() && self.resource_id.is_none()
    }

    fn set(&mut self, key: &str, value: String) {
        if key == BINDING_KEY {
            self.binding_name = Some(value);
        } else if NAME_KEYS.contains(&key) {
            self.resource_name = Some(value);
        } else if ID_KEYS.contains(&key) {
            self.resource_id = Some(value);
        }
    }
}

/// Classification of a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    /// Blank line or `#` comment.
    Trivia,
    /// The `[[resource_bindings]]` marker.
    BlockStart,
    /// Any other `[`-prefixed header.
    OtherSection,
    /// `key = value`, value with surrounding quotes removed.
    KeyValue { key: &'a str, value: &'a str },
    /// Anything else.
    Other,
}

/// Classify one line of the binding file.
pub fn lex_line(line: &str) -> Line<'_> {
    let trimmed = line.trim();

    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Line::Trivia;
    }
    if trimmed == BLOCK_MARKER {
        return Line::BlockStart;
    }
    if trimmed.starts_with('[') {
        return Line::OtherSection;
    }

    match trimmed.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Line::KeyValue {
            key: key.trim(),
            value: strip_quotes(value.trim()),
        },
        _ => Line::Other,
    }
}

/// Remove surrounding quotes and any trailing `#` comment.
pub fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(end) = value.strip_prefix(quote).and_then(|rest| rest.find(quote)) {
            return &value[1..end + 1];
        }
    }
    match value.split_once('#') {
        Some((before, _)) => before.trim_end(),
        None => value,
    }
}

/// Scanner state.
#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    OutsideBlock,
    InsideBlock {
        current: BindingDeclaration,
        start: usize,
        last_key: Option<usize>,
    },
}

/// A binding block located in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    /// Parsed contents of the block.
    pub declaration: BindingDeclaration,
    /// Line range of the block, marker included, trailing trivia excluded.
    pub lines: Range<usize>,
}

/// Line state machine over the binding file.
#[derive(Debug)]
pub struct BlockScanner {
    state: State,
    blocks: Vec<BlockSpan>,
}

impl BlockScanner {
    fn new() -> Self {
        BlockScanner {
            state: State::OutsideBlock,
            blocks: Vec::new(),
        }
    }

    fn feed(&mut self, index: usize, line: &str) {
        match lex_line(line) {
            Line::BlockStart => {
                self.close();
                self.state = State::InsideBlock {
                    current: BindingDeclaration::default(),
                    start: index,
                    last_key: None,
                };
            }
            Line::OtherSection => self.close(),
            Line::KeyValue { key, value } => {
                if let State::InsideBlock {
                    current, last_key, ..
                } = &mut self.state
                {
                    current.set(key, value.to_string());
                    *last_key = Some(index);
                }
            }
            Line::Trivia | Line::Other => {}
        }
    }

    fn close(&mut self) {
        let state = std::mem::replace(&mut self.state, State::OutsideBlock);
        if let State::InsideBlock {
            current,
            start,
            last_key,
        } = state
        {
            if !current.is_empty() {
                let end = last_key.map_or(start + 1, |i| i + 1);
                self.blocks.push(BlockSpan {
                    declaration: current,
                    lines: start..end,
                });
            }
        }
    }

    fn finish(mut self) -> Vec<BlockSpan> {
        self.close();
        self.blocks
    }
}

/// Locate every non-empty binding block in `text`.
pub fn block_spans(text: &str) -> Vec<BlockSpan> {
    let mut scanner = BlockScanner::new();
    for (index, line) in text.lines().enumerate() {
        scanner.feed(index, line);
    }
    scanner.finish()
}

/// Extract binding declarations from `text`, in file order.
///
/// Never fails: a file without any block marker yields an empty list,
/// unknown keys are ignored and incomplete blocks are returned as-is.
pub fn parse_bindings(text: &str) -> Vec<BindingDeclaration> {
    block_spans(text)
        .into_iter()
        .map(|span| span.declaration)
        .collect()
}
