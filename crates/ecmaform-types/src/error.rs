use crate::{SourceFile, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of diagnostics stored per invocation. The total count keeps
/// running past the cap.
pub const MAX_DIAGNOSTICS: usize = 100;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Diagnostic category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Invalid character sequences (recoverable, per token).
    Lex,
    /// Malformed constructs (recoverable, per statement).
    Parse,
    /// Internal invariant violation inside a pass or the emitter (fatal), or
    /// a construct a pass could only lower with a caveat (warning).
    Transform,
    /// Malformed config payload (recoverable, defaults are used).
    Config,
    /// Malformed input buffer or encoding (fatal).
    IoBoundary,
}

impl ErrorCategory {
    /// Fatal categories abort the pipeline; the result carries no code.
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::Transform | Self::IoBoundary)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex => write!(f, "lex"),
            Self::Parse => write!(f, "parse"),
            Self::Transform => write!(f, "transform"),
            Self::Config => write!(f, "config"),
            Self::IoBoundary => write!(f, "io"),
        }
    }
}

/// Numeric error code (E100–E599).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Lex errors (E100–E199) ──
    pub const UNEXPECTED_CHARACTER: Self = Self(100);
    pub const UNTERMINATED_STRING: Self = Self(101);
    pub const UNTERMINATED_TEMPLATE: Self = Self(102);
    pub const UNTERMINATED_REGEX: Self = Self(103);
    pub const UNTERMINATED_COMMENT: Self = Self(104);
    pub const INVALID_ESCAPE: Self = Self(105);
    pub const INVALID_NUMBER: Self = Self(106);

    // ── Parse errors (E200–E299) ──
    pub const UNEXPECTED_TOKEN: Self = Self(200);
    pub const INVALID_ASSIGNMENT_TARGET: Self = Self(201);
    pub const MODULE_SYNTAX_IN_SCRIPT: Self = Self(202);
    pub const NESTING_LIMIT_EXCEEDED: Self = Self(203);
    pub const UNSUPPORTED_SYNTAX: Self = Self(204);
    pub const MISSING_INITIALIZER: Self = Self(205);

    // ── Transform errors (E300–E399) ──
    pub const UNEXPECTED_NODE: Self = Self(300);
    pub const INTERNAL_FAULT: Self = Self(301);
    /// Loop bindings captured by closures were kept as `let`/`const`.
    pub const BLOCK_SCOPE_KEPT: Self = Self(310);
    /// `**` on a BigInt operand was left as written.
    pub const BIGINT_EXPONENT_KEPT: Self = Self(311);
    /// Array spread of a value that may not be an array.
    pub const SPREAD_ASSUMES_ARRAY: Self = Self(312);

    // ── Config errors (E400–E499) ──
    pub const MALFORMED_CONFIG: Self = Self(400);
    pub const INVALID_CONFIG_VALUE: Self = Self(401);

    // ── IO boundary errors (E500–E599) ──
    pub const INVALID_ENCODING: Self = Self(500);
    pub const WORKER_LOST: Self = Self(501);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Lex,
            200..=299 => ErrorCategory::Parse,
            300..=399 => ErrorCategory::Transform,
            400..=499 => ErrorCategory::Config,
            500..=599 => ErrorCategory::IoBoundary,
            _ => ErrorCategory::Transform,
        }
    }

    /// Default severity for codes in this range. Config problems fall back to
    /// defaults and E310–E399 mark degraded lowering, so they only warn.
    pub fn default_severity(self) -> Severity {
        match (self.category(), self.0) {
            (ErrorCategory::Config, _) => Severity::Warning,
            (ErrorCategory::Transform, 310..=399) => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A structured diagnostic.
///
/// Hosts render these; they must not parse free-form strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Source file name.
    pub file: String,
    pub code: ErrorCode,
    pub severity: Severity,
    /// Derived from `code`.
    pub category: ErrorCategory,
    pub message: String,
    pub span: Span,
    /// 1-based line; 0 for diagnostics with no source position.
    pub line: u32,
    /// 1-based column in UTF-16 units; 0 for diagnostics with no source position.
    pub column: u32,
    /// The exact source line for context.
    pub source_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic positioned at `span` inside `source_file`.
    pub fn at(
        source_file: &SourceFile,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        let pos = source_file.position(span.start);
        Self {
            file: source_file.name.clone(),
            code,
            severity: code.default_severity(),
            category: code.category(),
            message: message.into(),
            span,
            line: pos.line,
            column: pos.column,
            source_line: source_file.line(pos.line).unwrap_or("").to_string(),
            suggestion: None,
        }
    }

    /// Create a diagnostic that is not tied to a source position (config
    /// payload, input buffer, worker faults).
    pub fn global(file: impl Into<String>, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            code,
            severity: code.default_severity(),
            category: code.category(),
            message: message.into(),
            span: Span::default(),
            line: 0,
            column: 0,
            source_line: String::new(),
            suggestion: None,
        }
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// An error in a fatal category. Transform warnings are not fatal.
    pub fn is_fatal(&self) -> bool {
        self.is_error() && self.category.is_fatal()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line > 0 {
            write!(f, "{}:{}:{}: ", self.file, self.line, self.column)?;
        } else {
            write!(f, "{}: ", self.file)?;
        }
        write!(f, "{} [{}] {}", self.code, self.category, self.message)
    }
}

impl std::error::Error for Diagnostic {}

/// An ordered, capped collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub items: Vec<Diagnostic>,
    /// Total diagnostics pushed, including those dropped past the cap.
    pub total: usize,
    /// Total error-severity diagnostics pushed.
    pub total_errors: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic, respecting the [`MAX_DIAGNOSTICS`] limit.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.total_errors += 1;
        }
        self.total += 1;
        if self.items.len() < MAX_DIAGNOSTICS {
            self.items.push(diagnostic);
        }
    }

    /// Append all diagnostics from `other`, preserving order and totals.
    pub fn extend(&mut self, other: Diagnostics) {
        let dropped = other.total - other.items.len();
        let dropped_errors = other.total_errors
            - other.items.iter().filter(|d| d.is_error()).count();
        for d in other.items {
            self.push(d);
        }
        self.total += dropped;
        self.total_errors += dropped_errors;
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    pub fn has_fatal(&self) -> bool {
        self.items.iter().any(Diagnostic::is_fatal)
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    /// Returns `true` once the stored list is full. Producers use this to
    /// stop scanning runaway input.
    pub fn is_full(&self) -> bool {
        self.items.len() >= MAX_DIAGNOSTICS
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(code: ErrorCode) -> Diagnostic {
        let sf = SourceFile::new("test.js", "let x = ;\nfoo();");
        Diagnostic::at(&sf, code, "expected expression", Span::new(8, 9))
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::UNEXPECTED_CHARACTER.category(), ErrorCategory::Lex);
        assert_eq!(ErrorCode::UNEXPECTED_TOKEN.category(), ErrorCategory::Parse);
        assert_eq!(ErrorCode::UNEXPECTED_NODE.category(), ErrorCategory::Transform);
        assert_eq!(ErrorCode::MALFORMED_CONFIG.category(), ErrorCategory::Config);
        assert_eq!(ErrorCode::INVALID_ENCODING.category(), ErrorCategory::IoBoundary);
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(format!("{}", ErrorCode::UNEXPECTED_TOKEN), "E200");
        assert_eq!(format!("{}", ErrorCode::INVALID_ESCAPE), "E105");
    }

    #[test]
    fn test_severity_defaults() {
        assert_eq!(sample(ErrorCode::UNEXPECTED_TOKEN).severity, Severity::Error);
        assert_eq!(sample(ErrorCode::MALFORMED_CONFIG).severity, Severity::Warning);
        assert!(sample(ErrorCode::UNEXPECTED_NODE).is_fatal());
        assert!(!sample(ErrorCode::UNEXPECTED_TOKEN).is_fatal());
    }

    #[test]
    fn test_transform_warnings_are_not_fatal() {
        let d = sample(ErrorCode::BLOCK_SCOPE_KEPT);
        assert_eq!(d.category, ErrorCategory::Transform);
        assert_eq!(d.severity, Severity::Warning);
        assert!(!d.is_fatal());
        assert_eq!(sample(ErrorCode::INTERNAL_FAULT).severity, Severity::Error);
    }

    #[test]
    fn test_diagnostic_position() {
        let d = sample(ErrorCode::UNEXPECTED_TOKEN);
        assert_eq!(d.line, 1);
        assert_eq!(d.column, 9);
        assert_eq!(d.source_line, "let x = ;");
        assert_eq!(d.to_string(), "test.js:1:9: E200 [parse] expected expression");
    }

    #[test]
    fn test_global_diagnostic_display() {
        let d = Diagnostic::global("input.js", ErrorCode::MALFORMED_CONFIG, "bad json");
        assert_eq!(d.line, 0);
        assert_eq!(d.to_string(), "input.js: E400 [config] bad json");
    }

    #[test]
    fn test_diagnostic_json_serialization() {
        let d = sample(ErrorCode::UNEXPECTED_TOKEN).with_suggestion("add a value");
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"code\":200"));
        assert!(json.contains("\"severity\":\"error\""));
        assert!(json.contains("\"category\":\"parse\""));
        assert!(json.contains("\"suggestion\":\"add a value\""));
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_diagnostics_cap() {
        let mut diags = Diagnostics::new();
        for _ in 0..MAX_DIAGNOSTICS + 5 {
            diags.push(sample(ErrorCode::UNEXPECTED_TOKEN));
        }
        assert_eq!(diags.len(), MAX_DIAGNOSTICS);
        assert_eq!(diags.total, MAX_DIAGNOSTICS + 5);
        assert_eq!(diags.total_errors, MAX_DIAGNOSTICS + 5);
        assert!(diags.is_full());
    }

    #[test]
    fn test_diagnostics_extend_keeps_order_and_totals() {
        let mut a = Diagnostics::new();
        a.push(sample(ErrorCode::MALFORMED_CONFIG));
        let mut b = Diagnostics::new();
        b.push(sample(ErrorCode::UNEXPECTED_CHARACTER));
        b.push(sample(ErrorCode::UNEXPECTED_TOKEN));
        a.extend(b);
        let codes: Vec<_> = a.iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            vec![
                ErrorCode::MALFORMED_CONFIG,
                ErrorCode::UNEXPECTED_CHARACTER,
                ErrorCode::UNEXPECTED_TOKEN
            ]
        );
        assert_eq!(a.total, 3);
        assert_eq!(a.total_errors, 2);
        assert!(a.has_errors());
    }

    #[test]
    fn test_warnings_only_is_not_error() {
        let mut diags = Diagnostics::new();
        diags.push(sample(ErrorCode::INVALID_CONFIG_VALUE));
        assert!(!diags.has_errors());
        assert!(!diags.is_empty());
    }
}
