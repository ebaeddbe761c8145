//! Structured Feedback Module
//!
//! Diagnostics produced while generating code, and the machine-readable
//! report the CLI prints with `--json`.

use serde::{Deserialize, Serialize};

use crate::utils::{Error, Span};

// ==================== Diagnostics ====================

pub const LEX_ERROR: &str = "E0001";
pub const PARSE_ERROR: &str = "E0002";
/// Field annotation and constructor parameter disagree
pub const TYPE_CONFLICT: &str = "W0001";
/// KV class with no view mapping
pub const UNKNOWN_WIDGET: &str = "W0002";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl From<Span> for Location {
    fn from(span: Span) -> Self {
        Self {
            line: span.line,
            column: span.column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable code (e.g., "E0002")
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub location: Option<Location>,
}

impl Diagnostic {
    /// Create a diagnostic from a front-end error
    pub fn from_error(error: &Error) -> Self {
        let code = match error {
            Error::Lex { .. } => LEX_ERROR,
            Error::Parse { .. } => PARSE_ERROR,
        };
        Self {
            code: code.to_string(),
            severity: Severity::Error,
            message: error.to_string(),
            location: Some(error.span().into()),
        }
    }

    pub fn warning(code: &str, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            code: code.to_string(),
            severity: Severity::Warning,
            message: message.into(),
            location: span.map(Location::from),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// `// error: <message> (line L, column C)`
    pub fn to_comment_line(&self) -> String {
        self.comment_line("//")
    }

    /// The same line behind another comment marker (`#` for Python output)
    pub fn comment_line(&self, marker: &str) -> String {
        match self.location {
            Some(loc) => format!(
                "{} {}: {} (line {}, column {})",
                marker,
                self.severity.as_str(),
                self.message,
                loc.line,
                loc.column
            ),
            None => format!("{} {}: {}", marker, self.severity.as_str(), self.message),
        }
    }
}

// ==================== Report ====================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub tokens: usize,
    /// Widgets, or classes plus members
    pub nodes: usize,
    /// Lines of generated output
    pub lines: usize,
}

/// Complete result of one CLI run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub success: bool,
    pub frontend: String,
    pub output: String,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: Stats,
}

impl Report {
    pub fn new(frontend: &str, output: String, diagnostics: Vec<Diagnostic>, stats: Stats) -> Self {
        Self {
            success: !diagnostics.iter().any(Diagnostic::is_error),
            frontend: frontend.to_string(),
            output,
            diagnostics,
            stats,
        }
    }

    /// Output as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Output as compact JSON (for programmatic use)
    pub fn to_json_compact(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_comment_line() {
        let err = Error::parse("widget header", "property 'text'", Span::new(0, 4, 1, 1));
        let diag = Diagnostic::from_error(&err);
        assert_eq!(diag.code, PARSE_ERROR);
        assert_eq!(
            diag.to_comment_line(),
            "// error: parse error: expected widget header, found property 'text' (line 1, column 1)"
        );
    }

    #[test]
    fn test_warning_without_location() {
        let diag = Diagnostic::warning(UNKNOWN_WIDGET, "unknown widget 'Foo'", None);
        assert!(!diag.is_error());
        assert_eq!(diag.to_comment_line(), "// warning: unknown widget 'Foo'");
        assert_eq!(diag.comment_line("#"), "# warning: unknown widget 'Foo'");
    }

    #[test]
    fn test_report_success_and_json() {
        let warn = Diagnostic::warning(TYPE_CONFLICT, "conflict", Some(Span::new(0, 1, 2, 5)));
        let report = Report::new("py", "class A {}\n".to_string(), vec![warn], Stats::default());
        assert!(report.success);

        let json: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(json["frontend"], "py");
        assert_eq!(json["diagnostics"][0]["severity"], "Warning");
        assert_eq!(json["diagnostics"][0]["location"]["line"], 2);

        let err = Diagnostic::from_error(&Error::lex("bad", Span::dummy()));
        assert!(!Report::new("kv", String::new(), vec![err], Stats::default()).success);
    }
}
