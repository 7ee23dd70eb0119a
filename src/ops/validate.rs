//! Cross-checking binding declarations against the registry.
//!
//! Each pass fetches the registry listing at most once and resolves every
//! binding against that snapshot, so a report is internally consistent and
//! two passes over an unchanged registry produce the same report. If the
//! listing cannot be fetched the pass still completes: the failure becomes a
//! single issue under the `configuration` key and only the checks that need
//! no registry data are run.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::{find_record, BindingDeclaration, ResourceRecord};
use crate::registry::{RegistryError, ResourceRegistry};

/// Issue key used for failures that belong to no single binding.
pub const CONFIGURATION_KEY: &str = "configuration";

/// Problems found with one binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub binding_name: String,
    pub issues: Vec<String>,
}

/// A declared resource the registry does not know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingResource {
    pub binding_name: Option<String>,
    pub resource_name: Option<String>,
    pub resource_id: Option<String>,
}

/// Fixed advice attached to a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Suggestion {
    NoBindings,
    MissingFields,
    CreateMissing,
    FixMismatch,
    CheckRegistry,
}

impl Suggestion {
    pub fn text(&self) -> &'static str {
        match self {
            Suggestion::NoBindings => {
                "No bindings configured. Consider adding a [[resource_bindings]] block if your application needs a managed store"
            }
            Suggestion::MissingFields => {
                "Every [[resource_bindings]] block needs a `binding` and a `database_name`"
            }
            Suggestion::CreateMissing => {
                "Create the missing resources, or run `tether recover` to point the bindings at existing ones"
            }
            Suggestion::FixMismatch => {
                "Update `database_id` so it matches the id the registry reports for the resource"
            }
            Suggestion::CheckRegistry => {
                "Check that the registry command is installed, on PATH and logged in"
            }
        }
    }
}

/// Outcome of one validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// True iff `issues` is empty.
    pub valid: bool,
    pub bindings: Vec<BindingDeclaration>,
    pub issues: Vec<ValidationIssue>,
    pub missing_resources: Vec<MissingResource>,
    pub suggestions: Vec<String>,
}

impl ValidationReport {
    /// Issues recorded for `binding_name`.
    pub fn issues_for(&self, binding_name: &str) -> Option<&ValidationIssue> {
        self.issues.iter().find(|i| i.binding_name == binding_name)
    }
}

/// Validates bindings against a [`ResourceRegistry`].
pub struct BindingValidator<'a, R: ResourceRegistry + ?Sized> {
    registry: &'a R,
}

impl<'a, R: ResourceRegistry + ?Sized> BindingValidator<'a, R> {
    pub fn new(registry: &'a R) -> Self {
        BindingValidator { registry }
    }

    /// Validate `bindings`. Never fails; registry trouble is reported as an
    /// issue.
    pub fn validate(&self, bindings: &[BindingDeclaration]) -> ValidationReport {
        let mut issues = Vec::new();
        let mut missing_resources = Vec::new();
        let mut suggestions = BTreeSet::new();

        if bindings.is_empty() {
            suggestions.insert(Suggestion::NoBindings);
        }

        let snapshot = if bindings.iter().any(|b| b.resource_name.is_some()) {
            match self.registry.list() {
                Ok(records) => Some(records),
                Err(err) => {
                    tracing::warn!("registry unavailable during validation: {}", err);
                    issues.push(registry_issue(&err));
                    suggestions.insert(Suggestion::CheckRegistry);
                    None
                }
            }
        } else {
            Some(Vec::new())
        };

        for (index, binding) in bindings.iter().enumerate() {
            let key = binding
                .binding_name
                .clone()
                .unwrap_or_else(|| format!("binding #{}", index + 1));
            let mut problems = Vec::new();

            if binding.binding_name.is_none() {
                problems.push("missing binding name (`binding`)".to_string());
                suggestions.insert(Suggestion::MissingFields);
            }

            match (&binding.resource_name, &snapshot) {
                (None, _) => {
                    problems.push("missing resource name (`database_name`)".to_string());
                    suggestions.insert(Suggestion::MissingFields);
                }
                (Some(_), None) => {}
                (Some(name), Some(records)) => {
                    match resolve(records, name, binding.resource_id.as_deref()) {
                        Some(record) => {
                            let mismatches = consistency_issues(binding, record);
                            if !mismatches.is_empty() {
                                suggestions.insert(Suggestion::FixMismatch);
                            }
                            problems.extend(mismatches);
                        }
                        None => {
                            problems.push(format!("resource not found: {}", name));
                            missing_resources.push(MissingResource {
                                binding_name: binding.binding_name.clone(),
                                resource_name: binding.resource_name.clone(),
                                resource_id: binding.resource_id.clone(),
                            });
                            suggestions.insert(Suggestion::CreateMissing);
                        }
                    }
                }
            }

            if !problems.is_empty() {
                issues.push(ValidationIssue {
                    binding_name: key,
                    issues: problems,
                });
            }
        }

        let report = ValidationReport {
            valid: issues.is_empty(),
            bindings: bindings.to_vec(),
            issues,
            missing_resources,
            suggestions: suggestions.iter().map(|s| s.text().to_string()).collect(),
        };

        tracing::debug!(
            "validated {} bindings: {} with issues",
            report.bindings.len(),
            report.issues.len()
        );

        report
    }
}

fn registry_issue(err: &RegistryError) -> ValidationIssue {
    ValidationIssue {
        binding_name: CONFIGURATION_KEY.to_string(),
        issues: vec![format!("could not query the resource registry: {}", err)],
    }
}

/// Resolve by name first, then by declared id.
fn resolve<'r>(
    records: &'r [ResourceRecord],
    name: &str,
    id: Option<&str>,
) -> Option<&'r ResourceRecord> {
    find_record(records, name).or_else(|| id.and_then(|id| find_record(records, id)))
}

/// Only checked when both name and id are declared.
fn consistency_issues(binding: &BindingDeclaration, record: &ResourceRecord) -> Vec<String> {
    let (Some(name), Some(id)) = (&binding.resource_name, &binding.resource_id) else {
        return Vec::new();
    };

    let mut issues = Vec::new();
    if record.id != *id {
        issues.push(format!("ID mismatch: expected {}, found {}", id, record.id));
    }
    if record.name != *name {
        issues.push(format!(
            "name mismatch: expected {}, found {}",
            name, record.name
        ));
    }
    issues
}
