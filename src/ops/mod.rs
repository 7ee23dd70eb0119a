//! High-level operations.
//!
//! This module contains the engine behind the Tether commands.

pub mod classify;
pub mod deploy;
pub mod recover;
pub mod rewrite;
pub mod validate;

pub use classify::{classify, ErrorAnalysis, ErrorCategory, ErrorSeverity};
pub use deploy::{deploy, DeployAttempt, DeployOptions, DeployOutcome};
pub use recover::{
    DecisionPort, RecoveryAction, RecoveryOrchestrator, RecoveryResult, RecoveryState,
};
pub use rewrite::{set_binding, Edit, EditKind};
pub use validate::{BindingValidator, MissingResource, ValidationIssue, ValidationReport};
