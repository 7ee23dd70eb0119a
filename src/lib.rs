//! Tether - binding validation and recovery for deploy configurations
//!
//! Tether reads the `[[resource_bindings]]` blocks of a deploy
//! configuration file, cross-checks them against the resource registry
//! reached through an external control command, classifies deploy-time
//! error text, and walks the user through fixing the binding file when a
//! deploy fails because a resource is missing or misconfigured.

pub mod core;
pub mod ops;
pub mod registry;
pub mod util;

/// Test doubles for Tether unit tests.
///
/// Only compiled for tests. Provides an in-memory registry and a scripted
/// decision port.
#[cfg(test)]
pub mod test_support;

pub use core::{parse_bindings, BindingDeclaration, ResourceRecord};
pub use ops::{
    classify, BindingValidator, DecisionPort, ErrorAnalysis, RecoveryOrchestrator,
    RecoveryResult, ValidationReport,
};
pub use registry::{CommandRegistry, Lookup, RegistryError, ResourceRegistry};
pub use util::context::GlobalContext;
