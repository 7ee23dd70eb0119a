//! Test doubles for Tether unit tests.
//!
//! [`FakeRegistry`] stands in for the registry command and
//! [`ScriptedDecisions`] answers prompts from a queue, so the validator and
//! the recovery state machine can be exercised without subprocesses or a
//! terminal.
//!
//! # Example
//!
//! ```rust,ignore
//! use tether::test_support::{FakeRegistry, ScriptedDecisions, Answer};
//!
//! let registry = FakeRegistry::with_records(&[("abc-1", "mydb")]);
//! let mut decisions = ScriptedDecisions::new([Answer::Choice(0)]);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::core::ResourceRecord;
use crate::ops::recover::DecisionPort;
use crate::registry::{RegistryError, ResourceRegistry};

/// In-memory registry with call counters and failure injection.
#[derive(Debug, Default)]
pub struct FakeRegistry {
    records: RefCell<Vec<ResourceRecord>>,
    fail_list: bool,
    fail_create: bool,
    list_calls: Cell<usize>,
    created: RefCell<Vec<String>>,
}

impl FakeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        FakeRegistry::default()
    }

    /// Create a registry holding `(id, name)` records.
    pub fn with_records(records: &[(&str, &str)]) -> Self {
        let registry = FakeRegistry::new();
        registry.records.replace(
            records
                .iter()
                .map(|(id, name)| ResourceRecord::new(*id, *name))
                .collect(),
        );
        registry
    }

    /// Make every `list` call fail as if the command exited non-zero.
    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    /// Make every `create` call fail.
    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Number of `list` calls so far (including those made by `exists`).
    pub fn list_calls(&self) -> usize {
        self.list_calls.get()
    }

    /// Names passed to `create`, in call order.
    pub fn created(&self) -> Vec<String> {
        self.created.borrow().clone()
    }
}

impl ResourceRegistry for FakeRegistry {
    fn list(&self) -> Result<Vec<ResourceRecord>, RegistryError> {
        self.list_calls.set(self.list_calls.get() + 1);
        if self.fail_list {
            return Err(RegistryError::CommandFailed {
                command: "fake list".to_string(),
                code: Some(1),
                stderr: "registry unavailable".to_string(),
            });
        }
        Ok(self.records.borrow().clone())
    }

    fn create(&self, name: &str) -> Result<ResourceRecord, RegistryError> {
        self.created.borrow_mut().push(name.to_string());
        if self.fail_create {
            return Err(RegistryError::CommandFailed {
                command: format!("fake create {}", name),
                code: Some(1),
                stderr: "quota exceeded".to_string(),
            });
        }
        let record = ResourceRecord::new(format!("id-{}", name), name);
        self.records.borrow_mut().push(record.clone());
        Ok(record)
    }
}

/// One scripted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    YesNo(bool),
    Choice(usize),
    Text(String),
}

/// Decision port that replays queued answers and records every question.
///
/// Panics when asked a question of a different kind than the next answer,
/// or when the queue runs dry, so a test fails loudly on an unexpected
/// prompt.
#[derive(Debug, Default)]
pub struct ScriptedDecisions {
    answers: VecDeque<Answer>,
    questions: Vec<String>,
}

impl ScriptedDecisions {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        ScriptedDecisions {
            answers: answers.into_iter().collect(),
            questions: Vec::new(),
        }
    }

    /// Questions asked so far.
    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    /// True when every answer was consumed.
    pub fn exhausted(&self) -> bool {
        self.answers.is_empty()
    }

    fn next(&mut self, question: &str) -> Answer {
        self.questions.push(question.to_string());
        self.answers
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected prompt: {}", question))
    }
}

impl DecisionPort for ScriptedDecisions {
    fn ask_yes_no(&mut self, question: &str, _default: bool) -> bool {
        match self.next(question) {
            Answer::YesNo(answer) => answer,
            other => panic!("expected yes/no answer for `{}`, got {:?}", question, other),
        }
    }

    fn ask_choice(&mut self, question: &str, _options: &[String]) -> usize {
        match self.next(question) {
            Answer::Choice(index) => index,
            other => panic!("expected choice for `{}`, got {:?}", question, other),
        }
    }

    fn ask_text(&mut self, question: &str) -> String {
        match self.next(question) {
            Answer::Text(text) => text,
            other => panic!("expected text for `{}`, got {:?}", question, other),
        }
    }
}

/// Write a binding file into `dir` and return its path.
pub fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("wrangler.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

/// Backup files written next to `path`.
pub fn backups_of(path: &Path) -> Vec<PathBuf> {
    let prefix = format!(
        "{}.backup.",
        path.file_name().unwrap().to_string_lossy()
    );
    let mut backups: Vec<PathBuf> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().starts_with(&prefix))
                .unwrap_or(false)
        })
        .collect();
    backups.sort();
    backups
}
