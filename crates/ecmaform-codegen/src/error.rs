//! Emitter error types.

use ecmaform_types::{Diagnostic, ErrorCode, SourceFile, Span};
use thiserror::Error;

/// Errors that can occur while printing a tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmitError {
    /// A node with no JavaScript form: TypeScript syntax that was not
    /// stripped, or a placeholder left by a pass.
    #[error("cannot emit {what}")]
    UnexpectedNode { what: &'static str, span: Span },

    /// The source map could not be serialized.
    #[error("source map serialization failed: {0}")]
    SourceMap(String),
}

impl EmitError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnexpectedNode { .. } => ErrorCode::UNEXPECTED_NODE,
            Self::SourceMap(_) => ErrorCode::INTERNAL_FAULT,
        }
    }

    pub fn to_diagnostic(&self, source_file: &SourceFile) -> Diagnostic {
        match self {
            Self::UnexpectedNode { span, .. } => {
                Diagnostic::at(source_file, self.code(), self.to_string(), *span)
            }
            Self::SourceMap(_) => {
                Diagnostic::global(source_file.name.clone(), self.code(), self.to_string())
            }
        }
    }
}

/// Emitter result type alias.
pub type EmitResult<T> = Result<T, EmitError>;
