//! Interactive recovery from binding/resource mismatches.
//!
//! [`RecoveryOrchestrator::handle_error`] takes the raw text of a failed
//! deploy, classifies it and, when the failure is recoverable, walks a small
//! state machine:
//!
//! ```text
//! Idle -> Classified -> Discovering -> PresentingOptions -+-> Creating -> Completed
//!            |                                            +-> Updating -> Completed
//!            +-> Failed                                   +-> Cancelled
//! ```
//!
//! Every question goes through a [`DecisionPort`]; the orchestrator never
//! reads or writes the terminal itself. Every file mutation goes through
//! [`ConfigFile::commit`], which backs the file up before touching it.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::{parse_bindings, BindingDeclaration, ResourceRecord};
use crate::ops::classify::{classify, ErrorAnalysis};
use crate::ops::rewrite::set_binding;
use crate::registry::{Lookup, ResourceRegistry};
use crate::util::fs::ConfigFile;

/// Binding name offered when nothing better is known.
pub const DEFAULT_BINDING: &str = "DB";

/// Source of user decisions.
pub trait DecisionPort {
    /// Ask a yes/no question; `default` is the answer for an empty reply.
    fn ask_yes_no(&mut self, question: &str, default: bool) -> bool;

    /// Ask the user to pick one of `options`; returns its index.
    fn ask_choice(&mut self, question: &str, options: &[String]) -> usize;

    /// Ask for free text.
    fn ask_text(&mut self, question: &str) -> String;
}

/// States of one recovery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecoveryState {
    Idle,
    Classified,
    Discovering,
    PresentingOptions,
    Creating,
    Updating,
    Cancelled,
    Completed,
    Failed,
}

impl RecoveryState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RecoveryState::Cancelled | RecoveryState::Completed | RecoveryState::Failed
        )
    }
}

/// What a recovery attempt ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    CreatedAndConfigured,
    SelectedExisting,
    UpdatedBinding,
    AlreadyConfigured,
    Cancelled,
    NotRecoverable,
    Failed,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecoveryAction::CreatedAndConfigured => "created_and_configured",
            RecoveryAction::SelectedExisting => "selected_existing",
            RecoveryAction::UpdatedBinding => "updated_binding",
            RecoveryAction::AlreadyConfigured => "already_configured",
            RecoveryAction::Cancelled => "cancelled",
            RecoveryAction::NotRecoverable => "not_recoverable",
            RecoveryAction::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Outcome of one recovery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryResult {
    /// True when the configuration was changed and a retry makes sense.
    pub handled: bool,
    pub action: RecoveryAction,
    pub resource_name: Option<String>,
    pub resource_id: Option<String>,
    pub binding_name: Option<String>,
    pub error: Option<String>,
    /// Backup written before the configuration file was rewritten.
    pub backup: Option<PathBuf>,
    pub analysis: ErrorAnalysis,
}

impl RecoveryResult {
    fn unhandled(action: RecoveryAction, analysis: ErrorAnalysis) -> Self {
        RecoveryResult {
            handled: false,
            action,
            resource_name: None,
            resource_id: None,
            binding_name: None,
            error: None,
            backup: None,
            analysis,
        }
    }

    fn configured(
        action: RecoveryAction,
        binding: String,
        record: ResourceRecord,
        backup: PathBuf,
        analysis: ErrorAnalysis,
    ) -> Self {
        RecoveryResult {
            handled: true,
            action,
            resource_name: Some(record.name),
            resource_id: Some(record.id),
            binding_name: Some(binding),
            error: None,
            backup: Some(backup),
            analysis,
        }
    }
}

enum MissingChoice {
    Create,
    Select,
    Cancel,
}

/// Drives one recovery attempt at a time.
pub struct RecoveryOrchestrator<'a, R: ResourceRegistry + ?Sized, D: DecisionPort + ?Sized> {
    registry: &'a R,
    decisions: &'a mut D,
    config_path: PathBuf,
    state: RecoveryState,
    history: Vec<RecoveryState>,
}

impl<'a, R, D> RecoveryOrchestrator<'a, R, D>
where
    R: ResourceRegistry + ?Sized,
    D: DecisionPort + ?Sized,
{
    pub fn new(registry: &'a R, decisions: &'a mut D, config_path: impl AsRef<Path>) -> Self {
        RecoveryOrchestrator {
            registry,
            decisions,
            config_path: config_path.as_ref().to_path_buf(),
            state: RecoveryState::Idle,
            history: vec![RecoveryState::Idle],
        }
    }

    /// Current state.
    pub fn state(&self) -> RecoveryState {
        self.state
    }

    /// States visited by the last attempt, `Idle` first.
    pub fn history(&self) -> &[RecoveryState] {
        &self.history
    }

    fn transition(&mut self, next: RecoveryState) {
        tracing::debug!("recovery: {:?} -> {:?}", self.state, next);
        self.state = next;
        self.history.push(next);
    }

    fn cancel(&mut self, analysis: ErrorAnalysis) -> RecoveryResult {
        self.transition(RecoveryState::Cancelled);
        RecoveryResult::unhandled(RecoveryAction::Cancelled, analysis)
    }

    /// Try to recover from a failed deploy whose output was `message`.
    ///
    /// Domain outcomes (not recoverable, cancelled, create failed) are
    /// reported in the result. `Err` means the registry could not be listed
    /// or the configuration file could not be read or written.
    pub fn handle_error(&mut self, message: &str) -> Result<RecoveryResult> {
        self.state = RecoveryState::Idle;
        self.history = vec![RecoveryState::Idle];

        let analysis = classify(message);
        self.transition(RecoveryState::Classified);

        if !analysis.is_domain_error || !analysis.can_recover {
            tracing::info!("`{}` errors are not recoverable here", analysis.category);
            self.transition(RecoveryState::Failed);
            return Ok(RecoveryResult::unhandled(
                RecoveryAction::NotRecoverable,
                analysis,
            ));
        }

        let resource_name = match analysis.resource_name.clone() {
            Some(name) => name,
            None => {
                let answer = self
                    .decisions
                    .ask_text("Which database should the binding point at?");
                let answer = answer.trim();
                if answer.is_empty() {
                    return Ok(self.cancel(analysis));
                }
                answer.to_string()
            }
        };

        let file = ConfigFile::load(&self.config_path)?;
        let bindings = parse_bindings(file.contents());
        let target = target_binding(&bindings, &analysis, &resource_name).cloned();

        self.transition(RecoveryState::Discovering);
        let lookup = self
            .registry
            .exists(&resource_name)
            .with_context(|| format!("failed to look up `{}` in the registry", resource_name))?;

        self.transition(RecoveryState::PresentingOptions);
        match lookup {
            Lookup::Found(record) => self.offer_update(&file, target, record, analysis),
            Lookup::Missing { available } => {
                self.offer_create_or_select(&file, target, &resource_name, available, analysis)
            }
        }
    }

    fn offer_update(
        &mut self,
        file: &ConfigFile,
        target: Option<BindingDeclaration>,
        record: ResourceRecord,
        analysis: ErrorAnalysis,
    ) -> Result<RecoveryResult> {
        let up_to_date = target.as_ref().is_some_and(|b| {
            b.resource_name.as_deref() == Some(record.name.as_str())
                && b.resource_id.as_deref() == Some(record.id.as_str())
        });
        if up_to_date {
            tracing::info!("binding already points at {}", record);
            self.transition(RecoveryState::Completed);
            let mut result = RecoveryResult::unhandled(RecoveryAction::AlreadyConfigured, analysis);
            result.binding_name = target.and_then(|b| b.binding_name);
            result.resource_name = Some(record.name);
            result.resource_id = Some(record.id);
            return Ok(result);
        }

        let question = format!(
            "Database `{}` exists with id {}. Update the binding to match it?",
            record.name, record.id
        );
        if !self.decisions.ask_yes_no(&question, true) {
            return Ok(self.cancel(analysis));
        }

        let binding = self.binding_name(target.as_ref(), &analysis);
        self.transition(RecoveryState::Updating);
        let backup = self.write_binding(file, &binding, &record)?;
        self.transition(RecoveryState::Completed);

        Ok(RecoveryResult::configured(
            RecoveryAction::UpdatedBinding,
            binding,
            record,
            backup,
            analysis,
        ))
    }

    fn offer_create_or_select(
        &mut self,
        file: &ConfigFile,
        target: Option<BindingDeclaration>,
        resource_name: &str,
        available: Vec<ResourceRecord>,
        analysis: ErrorAnalysis,
    ) -> Result<RecoveryResult> {
        let mut options = vec![(
            format!("Create a new database `{}`", resource_name),
            MissingChoice::Create,
        )];
        if !available.is_empty() {
            options.push((
                "Select an existing database".to_string(),
                MissingChoice::Select,
            ));
        }
        options.push(("Cancel".to_string(), MissingChoice::Cancel));

        let labels: Vec<String> = options.iter().map(|(label, _)| label.clone()).collect();
        let question = format!("Database `{}` was not found. What should happen?", resource_name);
        let index = self.decisions.ask_choice(&question, &labels);

        match options.get(index).map(|(_, choice)| choice) {
            Some(MissingChoice::Create) => {
                let binding = self.binding_name(target.as_ref(), &analysis);
                self.transition(RecoveryState::Creating);

                let record = match self.registry.create(resource_name) {
                    Ok(record) => record,
                    Err(err) => {
                        tracing::warn!("failed to create `{}`: {}", resource_name, err);
                        self.transition(RecoveryState::Failed);
                        let mut result =
                            RecoveryResult::unhandled(RecoveryAction::Failed, analysis);
                        result.resource_name = Some(resource_name.to_string());
                        result.binding_name = Some(binding);
                        result.error = Some(err.to_string());
                        return Ok(result);
                    }
                };

                let backup = self.write_binding(file, &binding, &record)?;
                self.transition(RecoveryState::Completed);
                Ok(RecoveryResult::configured(
                    RecoveryAction::CreatedAndConfigured,
                    binding,
                    record,
                    backup,
                    analysis,
                ))
            }
            Some(MissingChoice::Select) => {
                let mut labels: Vec<String> = available.iter().map(|r| r.to_string()).collect();
                labels.push("Cancel".to_string());

                let index = self
                    .decisions
                    .ask_choice("Which database should the binding use?", &labels);
                let Some(record) = available.get(index).cloned() else {
                    return Ok(self.cancel(analysis));
                };

                let binding = self.binding_name(target.as_ref(), &analysis);
                self.transition(RecoveryState::Updating);
                let backup = self.write_binding(file, &binding, &record)?;
                self.transition(RecoveryState::Completed);
                Ok(RecoveryResult::configured(
                    RecoveryAction::SelectedExisting,
                    binding,
                    record,
                    backup,
                    analysis,
                ))
            }
            Some(MissingChoice::Cancel) | None => Ok(self.cancel(analysis)),
        }
    }

    /// Binding to rewrite: the matched block's, else asked for.
    fn binding_name(
        &mut self,
        target: Option<&BindingDeclaration>,
        analysis: &ErrorAnalysis,
    ) -> String {
        if let Some(name) = target.and_then(|b| b.binding_name.clone()) {
            return name;
        }

        let default = analysis
            .binding_name
            .clone()
            .unwrap_or_else(|| DEFAULT_BINDING.to_string());
        let answer = self.decisions.ask_text(&format!(
            "Binding name your code uses for this database [{}]",
            default
        ));
        let answer = answer.trim();
        if answer.is_empty() {
            default
        } else {
            answer.to_string()
        }
    }

    fn write_binding(
        &self,
        file: &ConfigFile,
        binding: &str,
        record: &ResourceRecord,
    ) -> Result<PathBuf> {
        let edit = set_binding(file.contents(), binding, &record.name, &record.id);
        let backup = file
            .commit(&edit.text)
            .with_context(|| format!("failed to update {}", file.path().display()))?;
        tracing::info!(
            "binding `{}` now points at {} ({:?})",
            binding,
            record,
            edit.kind
        );
        Ok(backup)
    }
}

/// The declared binding the failure refers to, if any.
///
/// A block named by the extracted binding wins; otherwise the block that
/// already references the resource by name or id.
fn target_binding<'b>(
    bindings: &'b [BindingDeclaration],
    analysis: &ErrorAnalysis,
    resource_name: &str,
) -> Option<&'b BindingDeclaration> {
    analysis
        .binding_name
        .as_deref()
        .and_then(|name| {
            bindings
                .iter()
                .find(|b| b.binding_name.as_deref() == Some(name))
        })
        .or_else(|| {
            bindings.iter().find(|b| {
                b.resource_name.as_deref() == Some(resource_name)
                    || b.resource_id.as_deref() == Some(resource_name)
            })
        })
        .filter(|b| b.binding_name.is_some())
}
