//! Classification of raw deploy-time error text.
//!
//! Classification is a pure function of the message. Rules are evaluated in
//! order against the lower-cased text and the first match wins, so the rule
//! table is the single place where precedence is decided. Identifier
//! extraction runs independently and never fails; a field it cannot find is
//! left as `None`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    ResourceNotFound,
    BindingConfiguration,
    Authentication,
    Migration,
    General,
    NotDomainError,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::ResourceNotFound => "resource_not_found",
            ErrorCategory::BindingConfiguration => "binding_configuration",
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Migration => "migration",
            ErrorCategory::General => "general",
            ErrorCategory::NotDomainError => "not_domain_error",
        }
    }

    /// Ordered troubleshooting steps shown to the user for this category.
    pub fn troubleshooting_steps(&self) -> &'static [&'static str] {
        match self {
            ErrorCategory::ResourceNotFound => &[
                "Run `tether resources` to list the databases your account can see",
                "Check that `database_name` in the binding block matches an existing database",
                "Create the database, or run `tether recover` to create or select one",
                "Make sure you are logged in to the account that owns the database",
            ],
            ErrorCategory::BindingConfiguration => &[
                "Check that every [[resource_bindings]] block has `binding` and `database_name`",
                "Make sure the binding name matches the one used in your code",
                "Run `tether validate` to cross-check bindings against the registry",
            ],
            ErrorCategory::Authentication => &[
                "Log in again with the registry command (for example `wrangler login`)",
                "Check that your API token has permission to manage databases",
                "Confirm the account id in the configuration file is correct",
            ],
            ErrorCategory::Migration => &[
                "Review the failing migration file for syntax errors",
                "List applied migrations to see which one stopped",
                "Apply migrations against a local database first to reproduce the failure",
            ],
            ErrorCategory::General => &[
                "Re-run the command with verbose logging for more detail",
                "Run `tether validate` to check the binding configuration",
                "Check the registry service status",
            ],
            ErrorCategory::NotDomainError => &[],
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much attention an error needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    High,
    Medium,
    Low,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::High => f.write_str("high"),
            ErrorSeverity::Medium => f.write_str("medium"),
            ErrorSeverity::Low => f.write_str("low"),
        }
    }
}

/// Result of classifying one error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorAnalysis {
    pub is_domain_error: bool,
    pub category: ErrorCategory,
    pub severity: Option<ErrorSeverity>,
    pub auto_fixable: bool,
    pub can_recover: bool,
    pub resource_name: Option<String>,
    pub binding_name: Option<String>,
    /// Troubleshooting steps for `category`, in display order.
    pub suggestions: Vec<String>,
}

impl ErrorAnalysis {
    fn unrelated() -> Self {
        ErrorAnalysis {
            is_domain_error: false,
            category: ErrorCategory::NotDomainError,
            severity: None,
            auto_fixable: false,
            can_recover: false,
            resource_name: None,
            binding_name: None,
            suggestions: Vec::new(),
        }
    }
}

/// One entry of the classification table.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    /// Receives the lower-cased message.
    pub matches: fn(&str) -> bool,
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub auto_fixable: bool,
    pub can_recover: bool,
}

static RESOURCE_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:d1|database|databases|db)\b").expect("valid regex"));

fn mentions_resource(msg: &str) -> bool {
    RESOURCE_KEYWORD.is_match(msg)
}

fn is_not_found(msg: &str) -> bool {
    msg.contains("couldn't find") || msg.contains("not found")
}

fn resource_not_found(msg: &str) -> bool {
    is_not_found(msg) && mentions_resource(msg)
}

fn binding_not_found(msg: &str) -> bool {
    msg.contains("binding") && msg.contains("not found")
}

fn auth_failure(msg: &str) -> bool {
    msg.contains("unauthorized") || msg.contains("forbidden")
}

fn migration_failure(msg: &str) -> bool {
    msg.contains("migration")
}

static RULES: [Rule; 5] = [
    Rule {
        name: "resource-not-found",
        matches: resource_not_found,
        category: ErrorCategory::ResourceNotFound,
        severity: ErrorSeverity::High,
        auto_fixable: true,
        can_recover: true,
    },
    Rule {
        name: "binding-not-found",
        matches: binding_not_found,
        category: ErrorCategory::BindingConfiguration,
        severity: ErrorSeverity::Medium,
        auto_fixable: true,
        can_recover: true,
    },
    Rule {
        name: "authentication",
        matches: auth_failure,
        category: ErrorCategory::Authentication,
        severity: ErrorSeverity::High,
        auto_fixable: false,
        can_recover: false,
    },
    Rule {
        name: "migration",
        matches: migration_failure,
        category: ErrorCategory::Migration,
        severity: ErrorSeverity::Medium,
        auto_fixable: false,
        can_recover: false,
    },
    Rule {
        name: "general",
        matches: mentions_resource,
        category: ErrorCategory::General,
        severity: ErrorSeverity::Medium,
        auto_fixable: false,
        can_recover: false,
    },
];

/// The classification table, in evaluation order.
pub fn rules() -> &'static [Rule] {
    &RULES
}

/// Resource name patterns, tried in order.
static RESOURCE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // "... DB with the name or binding 'mydb'", "database `mydb`"
        r#"(?i)\b(?:database|db)\b\s[^'"`\n]*?['"`]([A-Za-z0-9_-]+)['"`]"#,
        // database_name = "mydb", database: mydb
        r#"(?i)\b(?:database_name|database|db)\s*[=:]\s*['"]?([A-Za-z0-9_-]+)"#,
        // database named mydb
        r"(?i)\b(?:database|db)\s+named\s+([A-Za-z0-9_-]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Binding name patterns, tried in order.
static BINDING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)\bbinding\s+['"`]([A-Za-z0-9_-]+)['"`]"#,
        r#"(?i)\bbinding\s*[=:]\s*['"]?([A-Za-z0-9_-]+)"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

fn first_capture(patterns: &[Regex], message: &str) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(message)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Best-effort resource name mentioned in `message`.
pub fn extract_resource_name(message: &str) -> Option<String> {
    first_capture(&RESOURCE_PATTERNS, message)
}

/// Best-effort binding name mentioned in `message`.
pub fn extract_binding_name(message: &str) -> Option<String> {
    first_capture(&BINDING_PATTERNS, message)
}

/// Classify an error message.
pub fn classify(message: &str) -> ErrorAnalysis {
    let lower = message.to_lowercase();

    let Some(rule) = RULES.iter().find(|rule| (rule.matches)(&lower)) else {
        return ErrorAnalysis::unrelated();
    };

    tracing::debug!("error message matched rule `{}`", rule.name);

    ErrorAnalysis {
        is_domain_error: true,
        category: rule.category,
        severity: Some(rule.severity),
        auto_fixable: rule.auto_fixable,
        can_recover: rule.can_recover,
        resource_name: extract_resource_name(message),
        binding_name: extract_binding_name(message),
        suggestions: rule
            .category
            .troubleshooting_steps()
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_not_found() {
        let analysis = classify("Couldn't find a D1 DB with the name or binding 'mydb'");
        assert!(analysis.is_domain_error);
        assert_eq!(analysis.category, ErrorCategory::ResourceNotFound);
        assert_eq!(analysis.severity, Some(ErrorSeverity::High));
        assert_eq!(analysis.resource_name.as_deref(), Some("mydb"));
        assert_eq!(analysis.binding_name.as_deref(), Some("mydb"));
        assert!(analysis.can_recover);
        assert!(analysis.auto_fixable);
        assert!(!analysis.suggestions.is_empty());
    }

    #[test]
    fn test_authentication() {
        let analysis = classify("Unauthorized: insufficient permissions");
        assert_eq!(analysis.category, ErrorCategory::Authentication);
        assert!(!analysis.can_recover);
        assert!(!analysis.auto_fixable);
        assert_eq!(
            analysis.suggestions.len(),
            ErrorCategory::Authentication.troubleshooting_steps().len()
        );
    }

    #[test]
    fn test_binding_not_found_without_resource_keyword() {
        let analysis = classify("Error: binding 'CACHE' not found in environment");
        assert_eq!(analysis.category, ErrorCategory::BindingConfiguration);
        assert_eq!(analysis.severity, Some(ErrorSeverity::Medium));
        assert_eq!(analysis.binding_name.as_deref(), Some("CACHE"));
        assert!(analysis.resource_name.is_none());
        assert!(analysis.can_recover);
    }

    #[test]
    fn test_rule_order_not_found_beats_auth() {
        let analysis = classify("Forbidden: database 'x' not found");
        assert_eq!(analysis.category, ErrorCategory::ResourceNotFound);
    }

    #[test]
    fn test_migration() {
        let analysis = classify("Migration 0003_add_users.sql failed to apply");
        assert_eq!(analysis.category, ErrorCategory::Migration);
        assert!(!analysis.can_recover);
    }

    #[test]
    fn test_general_database_error() {
        let analysis = classify("D1_ERROR: database is locked");
        assert!(analysis.is_domain_error);
        assert_eq!(analysis.category, ErrorCategory::General);
        assert!(!analysis.can_recover);
    }

    #[test]
    fn test_unrelated_error() {
        let analysis = classify("TypeError: cannot read properties of undefined");
        assert!(!analysis.is_domain_error);
        assert_eq!(analysis.category, ErrorCategory::NotDomainError);
        assert!(analysis.severity.is_none());
        assert!(analysis.suggestions.is_empty());
    }

    #[test]
    fn test_not_found_without_resource_keyword_is_not_resource_rule() {
        let analysis = classify("Script not found");
        assert!(!analysis.is_domain_error);
    }

    #[test]
    fn test_extract_resource_name_variants() {
        assert_eq!(
            extract_resource_name("database_name = \"prod-db\" is invalid").as_deref(),
            Some("prod-db")
        );
        assert_eq!(
            extract_resource_name("no database named analytics exists").as_deref(),
            Some("analytics")
        );
        assert_eq!(
            extract_resource_name("Database `users_v2` is unavailable").as_deref(),
            Some("users_v2")
        );
        assert!(extract_resource_name("something went wrong").is_none());
    }

    #[test]
    fn test_possessive_keyword_is_not_a_resource_name() {
        assert_eq!(
            extract_resource_name("the db's binding 'ANALYTICS' is missing"),
            None
        );
        assert_eq!(
            extract_resource_name("the db's binding 'ANALYTICS' for database 'events'").as_deref(),
            Some("events")
        );
    }

    #[test]
    fn test_classification_is_deterministic() {
        let msg = "Couldn't find a D1 DB with the name or binding 'mydb'";
        assert_eq!(classify(msg), classify(msg));
    }

    #[test]
    fn test_rule_table_order() {
        let names: Vec<_> = rules().iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "resource-not-found",
                "binding-not-found",
                "authentication",
                "migration",
                "general"
            ]
        );
    }
}
