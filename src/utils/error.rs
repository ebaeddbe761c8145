//! Error handling for pyswiftgen

use crate::utils::Span;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Front-end error.
///
/// Unmapped types never fail: they degrade to `TypeDescriptor::Unknown`,
/// so there is no mapping variant here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Lexer Errors ====================

    #[error("lex error: {reason}")]
    Lex { reason: String, span: Span },

    // ==================== Parser Errors ====================

    #[error("parse error: expected {expected}, found {found}")]
    Parse {
        expected: String,
        found: String,
        span: Span,
    },
}

impl Error {
    pub fn lex(reason: impl Into<String>, span: Span) -> Self {
        Self::Lex { reason: reason.into(), span }
    }

    pub fn parse(expected: impl Into<String>, found: impl Into<String>, span: Span) -> Self {
        Self::Parse {
            expected: expected.into(),
            found: found.into(),
            span,
        }
    }

    /// Get the span associated with this error
    pub fn span(&self) -> Span {
        match self {
            Self::Lex { span, .. } => *span,
            Self::Parse { span, .. } => *span,
        }
    }

    /// Short stage name, used in diagnostics
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Lex { .. } => "lex",
            Self::Parse { .. } => "parse",
        }
    }
}
