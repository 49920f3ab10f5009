//! ecmaform: a source-to-source JavaScript/TypeScript transformation engine.
//!
//! Source text goes through the lexer, the parser, the configured transform
//! passes and the emitter, and comes back as code plus an optional source
//! map and structured diagnostics.
//!
//! ```no_run
//! let result = ecmaform::transform_sync("const f = (x) => x ** 2;", true, br#"{"jsc":{"target":"es5"}}"#);
//! assert_eq!(
//!     result.code.as_deref(),
//!     Some("var f = function(x) {\n    return Math.pow(x, 2);\n};")
//! );
//! ```
//!
//! [`transform`] runs the same pipeline on a worker pool and returns a
//! [`TransformHandle`] that can be awaited or waited on.

mod engine;
mod error;
mod result;

pub use engine::{transform, transform_sync, transform_sync_bytes, Engine, TransformHandle};
pub use error::EngineError;
pub use result::TransformResult;

pub use ecmaform_types::{
    Diagnostic, Diagnostics, ErrorCategory, ErrorCode, EsVersion, MinifyOptions, ModuleKind,
    Severity, Syntax, TransformConfig,
};

/// The target triple this engine was built for.
pub fn get_target_triple() -> &'static str {
    env!("ECMAFORM_TARGET_TRIPLE")
}

/// Return the engine version string.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

const SELF_TEST_INPUT: &str = "const greet = (name) => `hello ${name}`;\nconsole.log(greet(\"world\"));";

const SELF_TEST_EXPECTED: &str =
    "var greet = function(name) {\n    return \"hello \" + name;\n};\nconsole.log(greet(\"world\"));";

/// Run the full pipeline on a built-in fixture with the default config and
/// check the output. A cheap smoke test for hosts.
pub fn test_file() -> bool {
    let result = transform_sync(SELF_TEST_INPUT, true, b"{}");
    let ok = result.diagnostics.is_empty() && result.code.as_deref() == Some(SELF_TEST_EXPECTED);
    if !ok {
        tracing::warn!(code = ?result.code, diagnostics = result.diagnostics.total, "self-test failed");
    }
    ok
}
