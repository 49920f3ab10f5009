//! Transform error types.

use ecmaform_types::{Diagnostic, ErrorCode, SourceFile, Span};
use thiserror::Error;

/// A pass met input its preconditions rule out. Fatal: the pipeline stops
/// and no code is emitted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// A node shape an earlier stage should have removed or never produces.
    #[error("{pass}: unexpected node: {message}")]
    UnexpectedNode {
        pass: &'static str,
        message: String,
        span: Span,
    },

    /// An internal consistency check failed.
    #[error("{pass}: internal transform error: {message}")]
    Internal { pass: &'static str, message: String },
}

impl TransformError {
    pub fn unexpected(pass: &'static str, message: impl Into<String>, span: Span) -> Self {
        Self::UnexpectedNode {
            pass,
            message: message.into(),
            span,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnexpectedNode { .. } => ErrorCode::UNEXPECTED_NODE,
            Self::Internal { .. } => ErrorCode::INTERNAL_FAULT,
        }
    }

    /// Name of the pass that failed.
    pub fn pass(&self) -> &'static str {
        match self {
            Self::UnexpectedNode { pass, .. } | Self::Internal { pass, .. } => pass,
        }
    }

    pub fn to_diagnostic(&self, source_file: &SourceFile) -> Diagnostic {
        match self {
            Self::UnexpectedNode { span, .. } => {
                Diagnostic::at(source_file, self.code(), self.to_string(), *span)
            }
            Self::Internal { .. } => {
                Diagnostic::global(source_file.name.clone(), self.code(), self.to_string())
            }
        }
    }
}

/// Pass result type alias.
pub type PassResult<T> = Result<T, TransformError>;

/// A construct a pass left as written, or lowered with a caveat. Output is
/// still produced; the engine reports these as warning diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformWarning {
    pub pass: &'static str,
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
}

impl TransformWarning {
    pub fn new(pass: &'static str, code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            pass,
            code,
            message: message.into(),
            span,
        }
    }

    pub fn to_diagnostic(&self, source_file: &SourceFile) -> Diagnostic {
        Diagnostic::at(source_file, self.code, self.to_string(), self.span)
    }
}

impl std::fmt::Display for TransformWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.pass, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecmaform_types::ErrorCategory;

    #[test]
    fn test_unexpected_node_diagnostic_is_positioned() {
        let sf = SourceFile::new("a.js", "let x;\nfoo as T;");
        let err = TransformError::unexpected("es2015", "TypeScript `as` expression", Span::new(7, 15));
        let diag = err.to_diagnostic(&sf);
        assert_eq!(diag.code, ErrorCode::UNEXPECTED_NODE);
        assert_eq!(diag.category, ErrorCategory::Transform);
        assert_eq!(diag.line, 2);
        assert_eq!(diag.column, 1);
        assert!(diag.message.starts_with("es2015:"));
    }

    #[test]
    fn test_warning_diagnostic() {
        let sf = SourceFile::new("a.js", "x = 10n ** 2n;");
        let warning = TransformWarning::new(
            "es2016",
            ErrorCode::BIGINT_EXPONENT_KEPT,
            "BigInt exponentiation kept",
            Span::new(4, 13),
        );
        let diag = warning.to_diagnostic(&sf);
        assert_eq!(diag.severity, ecmaform_types::Severity::Warning);
        assert_eq!(diag.category, ErrorCategory::Transform);
        assert!(!diag.is_fatal());
        assert_eq!((diag.line, diag.column), (1, 5));
        assert_eq!(diag.message, "es2016: BigInt exponentiation kept");
    }

    #[test]
    fn test_internal_fault_is_global() {
        let sf = SourceFile::new("a.js", "x");
        let err = TransformError::Internal {
            pass: "compress",
            message: "lost statement".into(),
        };
        let diag = err.to_diagnostic(&sf);
        assert_eq!(diag.code, ErrorCode::INTERNAL_FAULT);
        assert_eq!(diag.line, 0);
        assert_eq!(err.pass(), "compress");
    }
}
