//! User-facing diagnostic messages.
//!
//! Every failure shown to the user carries what went wrong, the facts that
//! led there, and numbered steps to fix it.

use std::fmt;
use std::path::PathBuf;

use crate::ops::classify::ErrorAnalysis;
use crate::ops::validate::ValidationReport;

/// Common suggestion messages.
pub mod suggestions {
    /// No binding file was found walking up from the working directory.
    pub const NO_CONFIG_FILE: &str =
        "Run tether from your project directory, or pass `--config <PATH>`";

    /// The registry command is not installed.
    pub const INSTALL_REGISTRY_COMMAND: &str =
        "Install the registry command or point `--registry-command` at it";

    /// The registry rejected the request.
    pub const CHECK_LOGIN: &str = "Make sure you are logged in with the registry command";

    /// Deploy failed and recovery did not change anything.
    pub const RUN_VALIDATE: &str = "Run `tether validate` to cross-check bindings";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    fn label(&self, color: bool) -> &'static str {
        match (self, color) {
            (Severity::Error, true) => "\x1b[1;31merror\x1b[0m",
            (Severity::Warning, true) => "\x1b[1;33mwarning\x1b[0m",
            (Severity::Note, true) => "\x1b[1;36mnote\x1b[0m",
            (Severity::Error, false) => "error",
            (Severity::Warning, false) => "warning",
            (Severity::Note, false) => "note",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label(false))
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes, shown numbered
    pub suggestions: Vec<String>,
    /// File the diagnostic is about
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Warning, message)
    }

    pub fn note(message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Note, message)
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions<I, S>(mut self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions
            .extend(suggestions.into_iter().map(Into::into));
        self
    }

    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Describe a classified error.
    ///
    /// Non-domain errors become a note; everything else is an error carrying
    /// the category's troubleshooting steps.
    pub fn from_analysis(analysis: &ErrorAnalysis) -> Self {
        if !analysis.is_domain_error {
            return Diagnostic::note("error is not related to resource bindings");
        }

        let mut diag = Diagnostic::error(format!("{} error", analysis.category));
        if let Some(severity) = analysis.severity {
            diag = diag.with_context(format!("severity: {}", severity));
        }
        if let Some(name) = &analysis.resource_name {
            diag = diag.with_context(format!("resource: {}", name));
        }
        if let Some(name) = &analysis.binding_name {
            diag = diag.with_context(format!("binding: {}", name));
        }
        diag = diag.with_context(if analysis.can_recover {
            "recoverable: run `tether recover` with this message"
        } else {
            "not recoverable automatically"
        });

        diag.with_suggestions(analysis.suggestions.iter().cloned())
    }

    /// Describe an invalid validation report; one context line per issue.
    pub fn from_report(report: &ValidationReport) -> Self {
        let count: usize = report.issues.iter().map(|i| i.issues.len()).sum();
        let mut diag = Diagnostic::error(format!(
            "binding validation failed with {} issue{}",
            count,
            if count == 1 { "" } else { "s" }
        ));
        for issue in &report.issues {
            for text in &issue.issues {
                diag = diag.with_context(format!("{}: {}", issue.binding_name, text));
            }
        }
        diag.with_suggestions(report.suggestions.iter().cloned())
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = format!("{}: {}\n", self.severity.label(color), self.message);

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            let help = if color { "\x1b[1;32mhelp\x1b[0m" } else { "help" };
            output.push_str(&format!("\n{}: try:\n", help));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
