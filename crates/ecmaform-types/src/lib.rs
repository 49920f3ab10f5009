//! Shared types for the ecmaform engine.
//!
//! This crate defines the AST node types, source spans, diagnostics, the
//! transform configuration, and the mutable visitor used by every stage.

mod config;
mod error;
mod span;
pub mod ast;
pub mod visit;

pub use config::{
    ConfigError, EsVersion, MinifyOptions, ModuleKind, Syntax, TransformConfig,
    TransformConfigBuilder, DEFAULT_FILENAME,
};
pub use error::{
    Diagnostic, Diagnostics, ErrorCategory, ErrorCode, Severity, MAX_DIAGNOSTICS,
};
pub use span::{Position, SourceFile, Span};
