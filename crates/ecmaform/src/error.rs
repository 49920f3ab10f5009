//! Engine-level failures: problems at the input boundary and in the worker
//! plumbing, as opposed to problems in the source being transformed.

use ecmaform_types::{Diagnostic, ErrorCode};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The input buffer is not valid UTF-8.
    #[error("source is not valid UTF-8: {0}")]
    InvalidEncoding(String),

    /// The worker dropped its result channel without answering.
    #[error("transform worker was lost before it reported a result")]
    WorkerLost,

    /// The pipeline panicked. The panic is caught at the engine boundary.
    #[error("internal fault during transform: {0}")]
    Panicked(String),

    /// The worker pool could not be started.
    #[error("failed to start transform workers: {0}")]
    PoolStartup(String),
}

impl EngineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidEncoding(_) => ErrorCode::INVALID_ENCODING,
            Self::WorkerLost | Self::PoolStartup(_) => ErrorCode::WORKER_LOST,
            Self::Panicked(_) => ErrorCode::INTERNAL_FAULT,
        }
    }

    /// None of these failures point into the source, so the diagnostic has
    /// no position.
    pub fn to_diagnostic(&self, file: &str) -> Diagnostic {
        Diagnostic::global(file, self.code(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecmaform_types::{ErrorCategory, Severity};

    #[test]
    fn test_codes() {
        assert_eq!(EngineError::InvalidEncoding("x".into()).code(), ErrorCode::INVALID_ENCODING);
        assert_eq!(EngineError::WorkerLost.code(), ErrorCode::WORKER_LOST);
        assert_eq!(EngineError::Panicked("boom".into()).code(), ErrorCode::INTERNAL_FAULT);
    }

    #[test]
    fn test_diagnostic_is_fatal_and_unpositioned() {
        let d = EngineError::WorkerLost.to_diagnostic("input.js");
        assert_eq!(d.category, ErrorCategory::IoBoundary);
        assert_eq!(d.severity, Severity::Error);
        assert!(d.is_fatal());
        assert_eq!((d.line, d.column), (0, 0));
        assert_eq!(d.file, "input.js");
    }
}
